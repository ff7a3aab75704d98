//! Dashboard shell
//!
//! Owns the main window, the app registry and every controller, and routes
//! activation requests, host events and clipboard changes between them. The
//! dashboard view only talks to the shell through [`UiRequest`] and
//! [`UiEvent`].

use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

use crossbeam::channel::Sender;
use tracing::{debug, error, info, warn};

use crate::clipboard::{ClipboardNotifier, ClipboardSource};
use crate::config::{AppConfig, ContentMode};
use crate::content_windows::{ContentWindowController, GenericController};
use crate::error::ShellError;
use crate::host::{HostEvent, HotkeyAction, Rect, WindowContent, WindowHandle, WindowHost, WindowSpec};
use crate::ipc::{UiEvent, UiRequest};
use crate::overlay::{FocusController, Overlay, OverlayKind, OverlaySettings, SettingsPatch, TimeBarController};
use crate::registry::{AppIdentifier, AppRegistry, Resolution};
use crate::ticker::earliest;

/// Which owner a window belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Main,
    Overlay(OverlayKind),
    Mono,
    Bionic,
    Generic,
}

pub struct DashboardShell {
    config: AppConfig,
    registry: AppRegistry,
    events: Sender<UiEvent>,
    main_window: Option<WindowHandle>,
    focus: FocusController,
    timebar: TimeBarController,
    mono: ContentWindowController,
    bionic: ContentWindowController,
    generic: GenericController,
    clipboard: ClipboardNotifier,
    routes: HashMap<WindowHandle, Route>,
    exit_requested: bool,
}

impl DashboardShell {
    pub fn new(config: AppConfig, registry: AppRegistry, events: Sender<UiEvent>) -> Self {
        let focus = FocusController::new(
            config.focus.settings(),
            config.intervals.cursor(),
            config.intervals.z_order(),
        );
        let timebar = TimeBarController::new(&config.timebar);
        let clipboard = ClipboardNotifier::new(config.intervals.clipboard());

        DashboardShell {
            config,
            registry,
            events,
            main_window: None,
            focus,
            timebar,
            mono: ContentWindowController::mono(),
            bionic: ContentWindowController::bionic(),
            generic: GenericController::new(),
            clipboard,
            routes: HashMap::new(),
            exit_requested: false,
        }
    }

    pub fn registry(&self) -> &AppRegistry {
        &self.registry
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn main_window(&self) -> Option<WindowHandle> {
        self.main_window
    }

    pub fn focus_settings(&self) -> &OverlaySettings {
        self.focus.settings()
    }

    pub fn route_of(&self, window: WindowHandle) -> Option<Route> {
        self.routes.get(&window).copied()
    }

    pub fn overlay(&self, kind: OverlayKind) -> &dyn Overlay {
        match kind {
            OverlayKind::Focus => &self.focus,
            OverlayKind::TimeBar => &self.timebar,
        }
    }

    fn overlay_mut(&mut self, kind: OverlayKind) -> &mut dyn Overlay {
        match kind {
            OverlayKind::Focus => &mut self.focus,
            OverlayKind::TimeBar => &mut self.timebar,
        }
    }

    pub fn should_exit(&self) -> bool {
        self.exit_requested
    }

    /// Create the dashboard window, publish the app list and start polling
    pub fn start(&mut self, host: &mut dyn WindowHost, now: Instant) -> Result<WindowHandle, ShellError> {
        let geometry = &self.config.dashboard;
        let area = host
            .primary_display()
            .map(|d| d.work_area)
            .ok_or(ShellError::NoDisplay)?;

        let mut spec = WindowSpec::normal(
            geometry.title.clone(),
            Rect {
                x: area.x + (area.width.saturating_sub(geometry.width) / 2) as i32,
                y: area.y + (area.height.saturating_sub(geometry.height) / 2) as i32,
                width: geometry.width,
                height: geometry.height,
            },
            WindowContent::Dashboard,
        );
        spec.min_size = Some((geometry.min_width, geometry.min_height));

        let window = host.create_window(spec)?;
        info!("Dashboard window created");
        self.main_window = Some(window);
        self.rebuild_routes();

        self.emit(UiEvent::AppList(self.registry.identifiers()));
        self.clipboard.start(now);
        Ok(window)
    }

    /// Route a sidebar activation to its overlay or content
    pub fn activate(&mut self, identifier: &str, host: &mut dyn WindowHost, now: Instant) {
        let resolution = match self.registry.resolve(identifier) {
            Ok(resolution) => resolution,
            Err(e) => {
                error!("Cannot activate {}: {}", identifier, e);
                return;
            }
        };

        match resolution {
            Resolution::Overlay(kind) => {
                info!("Launching {:?} overlay for {}", kind, identifier);
                self.overlay_mut(kind).launch(host, now);
                self.emit(UiEvent::OverlayActivated(identifier.to_string()));
            }
            Resolution::Content(path) => match self.config.content_mode {
                ContentMode::Embedded => {
                    self.emit(UiEvent::ContentReady {
                        identifier: identifier.to_string(),
                        path,
                    });
                }
                ContentMode::Detached => self.launch_detached(identifier, &path, host),
            },
        }

        self.rebuild_routes();
    }

    fn launch_detached(&mut self, identifier: &str, page: &Path, host: &mut dyn WindowHost) {
        if identifier == self.config.content_apps.mono {
            self.mono.launch(page, host);
        } else if identifier == self.config.content_apps.bionic {
            self.bionic.launch(page, host);
        } else if let Some(app_dir) = page.parent() {
            let name = crate::catalog::label_for(identifier).title;
            self.generic.launch(app_dir, &name, host);
        }
    }

    pub fn update_focus_settings(&mut self, patch: &SettingsPatch, host: &mut dyn WindowHost) {
        self.focus.update_settings(patch, host);
    }

    pub fn minimize(&mut self, host: &mut dyn WindowHost) {
        if let Some(window) = self.main_window {
            host.minimize(window);
        }
    }

    /// Tear down every window of every controller and ask the loop to exit
    pub fn quit(&mut self, host: &mut dyn WindowHost) {
        info!("Shutting down");
        self.clipboard.stop();
        self.focus.close(host);
        self.timebar.close(host);
        self.mono.close(host);
        self.bionic.close(host);
        self.generic.close_all(host);
        if let Some(window) = self.main_window.take() {
            if host.is_alive(window) {
                host.destroy(window);
            }
        }
        self.routes.clear();
        self.exit_requested = true;
    }

    pub fn handle_request(&mut self, request: UiRequest, host: &mut dyn WindowHost, now: Instant) {
        match request {
            UiRequest::Activate(identifier) => self.activate(&identifier, host, now),
            UiRequest::UpdateFocusSettings(patch) => self.update_focus_settings(&patch, host),
            UiRequest::Minimize => self.minimize(host),
            UiRequest::Close => self.quit(host),
        }
    }

    pub fn handle_host_event(&mut self, event: HostEvent, host: &mut dyn WindowHost) {
        match event {
            HostEvent::CloseRequested(window) => self.window_closed(window, host),
            HostEvent::Hotkey(HotkeyAction::ToggleFocusOverlay) => self.focus.toggle_overlay(host),
            HostEvent::Hotkey(HotkeyAction::ResetTimeBar) => self.timebar.reset(host),
            HostEvent::TimeBar { sender, request } => match self.route_of(sender) {
                Some(Route::Overlay(OverlayKind::TimeBar)) => self.timebar.handle(sender, request, host),
                _ => warn!("Ignoring {:?} from {:?}, not a time bar", request, sender),
            },
            HostEvent::Dashboard(input) => {
                debug!("Dashboard input reached the shell: {:?}", input);
            }
        }
    }

    pub fn window_closed(&mut self, window: WindowHandle, host: &mut dyn WindowHost) {
        match self.route_of(window) {
            Some(Route::Main) => {
                self.quit(host);
                return;
            }
            Some(Route::Overlay(kind)) => self.overlay_mut(kind).window_closed(window, host),
            Some(Route::Mono) => self.mono.window_closed(window, host),
            Some(Route::Bionic) => self.bionic.window_closed(window, host),
            Some(Route::Generic) => self.generic.window_closed(window, host),
            None => debug!("Close for unrouted window {:?}", window),
        }
        self.rebuild_routes();
    }

    /// Run whatever periodic work is due
    pub fn tick(&mut self, now: Instant, host: &mut dyn WindowHost, source: &mut dyn ClipboardSource) {
        if let Some(text) = self.clipboard.poll(now, source) {
            if self.main_window.is_some_and(|w| host.is_alive(w)) {
                self.emit(UiEvent::ClipboardUpdate(text.clone()));
            }
            if self.config.content_mode == ContentMode::Detached {
                self.bionic.post_text(&text, host);
            }
        }

        self.focus.tick(now, host);
        self.timebar.tick(now, host);
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        earliest([
            self.clipboard.next_deadline(),
            self.focus.next_deadline(),
            self.timebar.next_deadline(),
        ])
    }

    fn rebuild_routes(&mut self) {
        let mut routes = HashMap::new();
        if let Some(window) = self.main_window {
            routes.insert(window, Route::Main);
        }
        for kind in [OverlayKind::Focus, OverlayKind::TimeBar] {
            for window in self.overlay(kind).windows() {
                routes.insert(*window, Route::Overlay(kind));
            }
        }
        if let Some(window) = self.mono.window() {
            routes.insert(window, Route::Mono);
        }
        if let Some(window) = self.bionic.window() {
            routes.insert(window, Route::Bionic);
        }
        for window in self.generic.windows() {
            routes.insert(window, Route::Generic);
        }
        self.routes = routes;
    }

    fn emit(&self, event: UiEvent) {
        if self.events.send(event).is_err() {
            debug!("Dashboard view is gone, dropping event");
        }
    }

    /// Identifiers bound to overlay controllers
    pub fn overlay_identifiers(&self) -> Vec<AppIdentifier> {
        [OverlayKind::Focus, OverlayKind::TimeBar]
            .into_iter()
            .filter_map(|kind| self.registry.overlay_identifier(kind).map(str::to_string))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::testing::ScriptedClipboard;
    use crate::host::testing::{Call, FakeHost};
    use crate::ipc::TimeBarRequest;
    use crate::overlay::OverlayState;
    use crate::registry::CONTENT_ENTRY;
    use crossbeam::channel::{unbounded, Receiver};
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    const FOCUS: &str = "Focus-Visuel-main";
    const TIMEBAR: &str = "Barre-de-Temps-Visuelle-main";
    const MONO: &str = "Mono-T-cheur-main";
    const BIONIC: &str = "Lecture-Bionique-main";

    fn apps_dir() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        for name in [FOCUS, TIMEBAR] {
            fs::create_dir_all(dir.path().join(name)).unwrap();
        }
        for name in [MONO, BIONIC, "Notes"] {
            let app = dir.path().join(name);
            fs::create_dir_all(&app).unwrap();
            fs::write(app.join(CONTENT_ENTRY), "<html></html>").unwrap();
        }
        fs::create_dir_all(dir.path().join("Broken")).unwrap();
        dir
    }

    fn shell_with(config: AppConfig, dir: &TempDir) -> (DashboardShell, Receiver<UiEvent>) {
        let registry = AppRegistry::discover(dir.path(), &config.overlays);
        let (tx, rx) = unbounded();
        (DashboardShell::new(config, registry, tx), rx)
    }

    fn started(config: AppConfig, dir: &TempDir, host: &mut FakeHost) -> (DashboardShell, Receiver<UiEvent>) {
        let (mut shell, rx) = shell_with(config, dir);
        shell.start(host, Instant::now()).unwrap();
        rx.try_iter().for_each(drop);
        (shell, rx)
    }

    fn detached() -> AppConfig {
        AppConfig {
            content_mode: ContentMode::Detached,
            ..AppConfig::default()
        }
    }

    #[test]
    fn start_opens_the_dashboard_and_lists_apps() {
        let dir = apps_dir();
        let mut host = FakeHost::new();
        let (mut shell, rx) = shell_with(AppConfig::default(), &dir);

        let window = shell.start(&mut host, Instant::now()).unwrap();
        let spec = &host.window(window).spec;
        assert_eq!(spec.min_size, Some((900, 600)));
        assert_eq!((spec.bounds.width, spec.bounds.height), (1200, 800));
        assert_eq!(shell.route_of(window), Some(Route::Main));

        match rx.try_recv().unwrap() {
            UiEvent::AppList(mut ids) => {
                ids.sort();
                assert_eq!(ids.len(), 6);
                assert!(ids.contains(&FOCUS.to_string()));
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert!(shell.next_deadline().is_some());
    }

    #[test]
    fn start_without_displays_fails() {
        let dir = apps_dir();
        let mut host = FakeHost::with_displays(Vec::new());
        let (mut shell, _rx) = shell_with(AppConfig::default(), &dir);
        assert!(matches!(shell.start(&mut host, Instant::now()), Err(ShellError::NoDisplay)));
    }

    #[test]
    fn overlay_activation_launches_and_notifies() {
        let dir = apps_dir();
        let mut host = FakeHost::new();
        let (mut shell, rx) = started(AppConfig::default(), &dir, &mut host);

        shell.activate(FOCUS, &mut host, Instant::now());
        assert_eq!(shell.overlay(OverlayKind::Focus).state(), OverlayState::Visible);
        assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![UiEvent::OverlayActivated(FOCUS.into())]);

        let overlay_window = shell.overlay(OverlayKind::Focus).windows()[0];
        assert_eq!(shell.route_of(overlay_window), Some(Route::Overlay(OverlayKind::Focus)));
    }

    #[test]
    fn content_activation_reports_the_page() {
        let dir = apps_dir();
        let mut host = FakeHost::new();
        let (mut shell, rx) = started(AppConfig::default(), &dir, &mut host);
        host.take_calls();

        shell.activate("Notes", &mut host, Instant::now());
        assert_eq!(
            rx.try_iter().collect::<Vec<_>>(),
            vec![UiEvent::ContentReady {
                identifier: "Notes".into(),
                path: dir.path().join("Notes").join(CONTENT_ENTRY),
            }]
        );
        assert!(host.calls.is_empty());
    }

    /// Counts warn and error events while installed as the thread's subscriber
    struct DiagnosticCounter(Arc<AtomicUsize>);

    impl<S: tracing::Subscriber> Layer<S> for DiagnosticCounter {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() <= tracing::Level::WARN {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    fn diagnostics_during(f: impl FnOnce()) -> usize {
        let count = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(DiagnosticCounter(Arc::clone(&count)));
        tracing::subscriber::with_default(subscriber, f);
        count.load(Ordering::SeqCst)
    }

    #[test]
    fn unresolvable_activation_is_silent_to_the_ui() {
        let dir = apps_dir();
        let mut host = FakeHost::new();
        let (mut shell, rx) = started(AppConfig::default(), &dir, &mut host);
        host.take_calls();

        for id in ["Nope", "Broken", "../Notes"] {
            let logged = diagnostics_during(|| shell.activate(id, &mut host, Instant::now()));
            assert_eq!(logged, 1, "diagnostics logged for {id}");
        }
        assert!(rx.try_iter().next().is_none());
        assert!(host.calls.is_empty());
    }

    #[test]
    fn resolvable_activation_logs_no_diagnostic() {
        let dir = apps_dir();
        let mut host = FakeHost::new();
        let (mut shell, _rx) = started(AppConfig::default(), &dir, &mut host);

        let logged = diagnostics_during(|| shell.activate("Notes", &mut host, Instant::now()));
        assert_eq!(logged, 0);
    }

    #[test]
    fn detached_mode_opens_dedicated_windows() {
        let dir = apps_dir();
        let mut host = FakeHost::new();
        let (mut shell, rx) = started(detached(), &dir, &mut host);
        let now = Instant::now();

        shell.activate(MONO, &mut host, now);
        shell.activate(BIONIC, &mut host, now);
        shell.activate("Notes", &mut host, now);
        assert!(rx.try_iter().next().is_none());

        let routes: Vec<Route> = host
            .live_windows()
            .into_iter()
            .filter_map(|w| shell.route_of(w))
            .collect();
        assert!(routes.contains(&Route::Mono));
        assert!(routes.contains(&Route::Bionic));
        assert!(routes.contains(&Route::Generic));
    }

    #[test]
    fn clipboard_changes_reach_the_dashboard() {
        let dir = apps_dir();
        let mut host = FakeHost::new();
        let (mut shell, rx) = shell_with(AppConfig::default(), &dir);
        let t0 = Instant::now();
        shell.start(&mut host, t0).unwrap();
        rx.try_iter().for_each(drop);

        let mut source = ScriptedClipboard::new(&["", "A", "A", "  ", "B"]);
        for i in 1..=5 {
            shell.tick(t0 + Duration::from_millis(1000) * i, &mut host, &mut source);
        }
        assert_eq!(
            rx.try_iter().collect::<Vec<_>>(),
            vec![UiEvent::ClipboardUpdate("A".into()), UiEvent::ClipboardUpdate("B".into())]
        );
    }

    #[test]
    fn detached_bionic_window_gets_clipboard_text() {
        let dir = apps_dir();
        let mut host = FakeHost::new();
        let (mut shell, _rx) = shell_with(detached(), &dir);
        let t0 = Instant::now();
        shell.start(&mut host, t0).unwrap();
        shell.activate(BIONIC, &mut host, t0);
        let bionic = host
            .live_windows()
            .into_iter()
            .find(|w| shell.route_of(*w) == Some(Route::Bionic))
            .unwrap();

        let mut source = ScriptedClipboard::new(&["hello"]);
        shell.tick(t0 + Duration::from_millis(1000), &mut host, &mut source);
        assert!(host.calls.contains(&Call::Send(bionic, crate::host::WindowMessage::NewText("hello".into()))));
    }

    #[test]
    fn time_bar_requests_are_routed_by_sender() {
        let dir = apps_dir();
        let mut host = FakeHost::new();
        let (mut shell, _rx) = started(AppConfig::default(), &dir, &mut host);
        shell.activate(TIMEBAR, &mut host, Instant::now());
        let bar = shell.overlay(OverlayKind::TimeBar).windows()[0];
        host.take_calls();

        shell.handle_host_event(HostEvent::TimeBar { sender: bar, request: TimeBarRequest::TimeExpired }, &mut host);
        assert_eq!(host.take_calls(), vec![Call::Beep]);

        let main = shell.main_window().unwrap();
        shell.handle_host_event(HostEvent::TimeBar { sender: main, request: TimeBarRequest::TimeExpired }, &mut host);
        assert!(host.calls.is_empty());
    }

    #[test]
    fn hotkeys_drive_the_overlays() {
        let dir = apps_dir();
        let mut host = FakeHost::new();
        let (mut shell, _rx) = started(AppConfig::default(), &dir, &mut host);
        let now = Instant::now();
        shell.activate(FOCUS, &mut host, now);
        shell.activate(TIMEBAR, &mut host, now);

        shell.handle_host_event(HostEvent::Hotkey(HotkeyAction::ToggleFocusOverlay), &mut host);
        assert_eq!(shell.overlay(OverlayKind::Focus).state(), OverlayState::Hidden);

        let bar = shell.overlay(OverlayKind::TimeBar).windows()[0];
        host.take_calls();
        shell.handle_host_event(HostEvent::Hotkey(HotkeyAction::ResetTimeBar), &mut host);
        assert!(host.calls.contains(&Call::Send(bar, crate::host::WindowMessage::ResetTimer)));
    }

    #[test]
    fn closing_an_overlay_window_only_closes_that_overlay() {
        let dir = apps_dir();
        let mut host = FakeHost::new();
        let (mut shell, _rx) = started(AppConfig::default(), &dir, &mut host);
        let now = Instant::now();
        shell.activate(FOCUS, &mut host, now);
        shell.activate(TIMEBAR, &mut host, now);
        let overlay_window = shell.overlay(OverlayKind::Focus).windows()[0];

        shell.handle_host_event(HostEvent::CloseRequested(overlay_window), &mut host);
        assert_eq!(shell.overlay(OverlayKind::Focus).state(), OverlayState::Uninitialized);
        assert_eq!(shell.overlay(OverlayKind::TimeBar).state(), OverlayState::Visible);
        assert_eq!(shell.route_of(overlay_window), None);
        assert!(!shell.should_exit());
    }

    #[test]
    fn closing_the_dashboard_tears_everything_down() {
        let dir = apps_dir();
        let mut host = FakeHost::new();
        let (mut shell, _rx) = started(detached(), &dir, &mut host);
        let now = Instant::now();
        shell.activate(FOCUS, &mut host, now);
        shell.activate(TIMEBAR, &mut host, now);
        shell.activate(MONO, &mut host, now);
        shell.activate("Notes", &mut host, now);
        assert!(host.live_windows().len() >= 5);

        let main = shell.main_window().unwrap();
        shell.handle_host_event(HostEvent::CloseRequested(main), &mut host);

        assert!(host.live_windows().is_empty());
        assert!(host.shortcuts.is_empty());
        assert!(shell.should_exit());
        assert_eq!(shell.next_deadline(), None);
    }

    #[test]
    fn ui_requests_map_to_shell_operations() {
        let dir = apps_dir();
        let mut host = FakeHost::new();
        let (mut shell, _rx) = started(AppConfig::default(), &dir, &mut host);
        let now = Instant::now();
        let main = shell.main_window().unwrap();

        shell.handle_request(UiRequest::Minimize, &mut host, now);
        assert!(host.calls.contains(&Call::Minimize(main)));

        shell.handle_request(UiRequest::UpdateFocusSettings(SettingsPatch::size(42.0)), &mut host, now);
        assert_eq!(shell.focus_settings().size, 42.0);

        shell.handle_request(UiRequest::Close, &mut host, now);
        assert!(shell.should_exit());
    }

    #[test]
    fn overlay_identifiers_come_from_the_bindings() {
        let dir = apps_dir();
        let (shell, _rx) = shell_with(AppConfig::default(), &dir);
        assert_eq!(shell.overlay_identifiers(), vec![FOCUS.to_string(), TIMEBAR.to_string()]);
    }
}
