//! Time bar overlay
//!
//! A single bar pinned to the top of the primary display's work area. Its
//! content drives it through [`TimeBarRequest`]s (resize, click-through while
//! the timer runs, alert, fullscreen flash); a global shortcut resets it.

use std::time::Instant;

use tracing::{info, warn};

use super::{Overlay, OverlayKind, OverlayState, ReLaunchBehavior, WindowSet};
use crate::config::TimeBarConfig;
use crate::host::{
    HotkeyAction, Rect, StackLevel, WindowContent, WindowHandle, WindowHost, WindowMessage,
    WindowSpec,
};
use crate::ipc::TimeBarRequest;
use crate::shortcut::Shortcut;

pub struct TimeBarController {
    windows: WindowSet,
    active: bool,
    collapsed_height: u32,
    accelerator: String,
    registered: Option<Shortcut>,
}

impl TimeBarController {
    pub fn new(config: &TimeBarConfig) -> Self {
        TimeBarController {
            windows: WindowSet::new(),
            active: false,
            collapsed_height: config.collapsed_height,
            accelerator: config.shortcut.clone(),
            registered: None,
        }
    }

    pub fn window(&self) -> Option<WindowHandle> {
        self.windows.primary()
    }

    /// Global shortcut: restart the timer and make the bar clickable again
    pub fn reset(&mut self, host: &mut dyn WindowHost) {
        let Some(window) = self.live_window(host) else {
            return;
        };
        host.send(window, WindowMessage::ResetTimer);
        host.set_click_through(window, false);
        host.focus(window);
    }

    /// Handle a request from the bar's own content. The sender must be our window.
    pub fn handle(&mut self, sender: WindowHandle, request: TimeBarRequest, host: &mut dyn WindowHost) {
        if !self.windows.contains(sender) || !host.is_alive(sender) {
            warn!("Ignoring {:?} from unknown time bar window {:?}", request, sender);
            return;
        }

        let Some(area) = host.primary_display().map(|d| d.work_area) else {
            warn!("No display for time bar request {:?}", request);
            return;
        };

        match request {
            TimeBarRequest::Resize(height) => {
                host.set_size(sender, area.width, height);
            }
            TimeBarRequest::BeginTimer => {
                host.set_click_through(sender, true);
            }
            TimeBarRequest::TimeExpired => {
                host.beep();
            }
            TimeBarRequest::SetFullscreenFlash(true) => {
                host.set_size(sender, area.width, area.height);
                host.set_click_through(sender, true);
            }
            TimeBarRequest::SetFullscreenFlash(false) => {
                host.set_size(sender, area.width, self.collapsed_height);
            }
        }
    }

    fn live_window(&self, host: &dyn WindowHost) -> Option<WindowHandle> {
        self.windows.primary().filter(|w| host.is_alive(*w))
    }

    fn create_bar(&mut self, host: &mut dyn WindowHost) {
        let Some(display) = host.primary_display() else {
            warn!("No display available for the time bar");
            return;
        };
        let area = display.work_area;

        let spec = WindowSpec {
            title: "Barre de Temps".to_string(),
            bounds: Rect {
                x: area.x,
                y: area.y,
                width: area.width,
                height: self.collapsed_height,
            },
            min_size: None,
            frameless: true,
            transparent: true,
            level: Some(StackLevel::Floating),
            skip_taskbar: true,
            focusable: true,
            click_through: false,
            visible: true,
            content: WindowContent::TimeBar,
        };

        match host.create_window(spec) {
            Ok(window) => {
                host.set_click_through(window, false);
                self.windows.adopt(vec![window], true);
            }
            Err(e) => warn!("Failed to create time bar: {}", e),
        }
    }

    fn register_shortcut(&mut self, host: &mut dyn WindowHost) {
        if self.registered.is_some() {
            return;
        }
        let result = Shortcut::parse(&self.accelerator).and_then(|shortcut| {
            host.register_shortcut(&shortcut, HotkeyAction::ResetTimeBar)
                .map(|()| shortcut)
        });
        match result {
            Ok(shortcut) => self.registered = Some(shortcut),
            Err(e) => warn!("Time bar shortcut unavailable: {}", e),
        }
    }
}

impl Overlay for TimeBarController {
    fn kind(&self) -> OverlayKind {
        OverlayKind::TimeBar
    }

    fn relaunch_behavior(&self) -> ReLaunchBehavior {
        ReLaunchBehavior::ReShow
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn state(&self) -> OverlayState {
        if !self.active {
            OverlayState::Uninitialized
        } else if self.windows.is_visible() {
            OverlayState::Visible
        } else {
            OverlayState::Hidden
        }
    }

    fn windows(&self) -> &[WindowHandle] {
        self.windows.handles()
    }

    fn activate(&mut self, host: &mut dyn WindowHost, _now: Instant) {
        info!("Activating time bar");
        self.active = true;
        self.create_bar(host);
        self.register_shortcut(host);
    }

    fn reshow(&mut self, host: &mut dyn WindowHost, now: Instant) {
        match self.live_window(host) {
            Some(window) => {
                self.windows.set_visible(true, host);
                host.focus(window);
            }
            None => {
                self.windows.destroy_all(host);
                self.activate(host, now);
            }
        }
    }

    fn toggle_overlay(&mut self, host: &mut dyn WindowHost) {
        self.windows.toggle(host);
    }

    fn close(&mut self, host: &mut dyn WindowHost) {
        if let Some(shortcut) = self.registered.take() {
            host.unregister_shortcut(&shortcut);
        }
        self.windows.destroy_all(host);
        if self.active {
            info!("Time bar closed");
        }
        self.active = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::testing::{Call, FakeHost};

    fn controller() -> TimeBarController {
        TimeBarController::new(&TimeBarConfig::default())
    }

    fn launched(host: &mut FakeHost) -> (TimeBarController, WindowHandle) {
        let mut bar = controller();
        bar.launch(host, Instant::now());
        let window = bar.window().unwrap();
        host.take_calls();
        (bar, window)
    }

    #[test]
    fn launch_pins_a_bar_to_the_top_of_the_work_area() {
        let mut host = FakeHost::new();
        let (bar, window) = launched(&mut host);

        assert_eq!(bar.state(), OverlayState::Visible);
        let spec = &host.window(window).spec;
        assert_eq!(spec.bounds, Rect { x: 0, y: 0, width: 1920, height: 60 });
        assert!(!host.window(window).click_through);
        assert_eq!(host.shortcuts.get("Alt+T"), Some(&HotkeyAction::ResetTimeBar));
    }

    #[test]
    fn every_launch_reshows_and_focuses() {
        let mut host = FakeHost::new();
        let (mut bar, window) = launched(&mut host);
        let now = Instant::now();

        for _ in 0..4 {
            bar.toggle_overlay(&mut host);
            bar.launch(&mut host, now);
            assert_eq!(bar.state(), OverlayState::Visible);
            assert!(host.window(window).visible);
            assert!(host.window(window).focused);
        }
        assert_eq!(host.live_windows(), vec![window]);
    }

    #[test]
    fn launch_rebuilds_a_destroyed_bar() {
        let mut host = FakeHost::new();
        let (mut bar, window) = launched(&mut host);
        host.kill(window);

        bar.launch(&mut host, Instant::now());
        let rebuilt = bar.window().unwrap();
        assert_ne!(rebuilt, window);
        assert!(host.is_alive(rebuilt));
        assert_eq!(bar.state(), OverlayState::Visible);
    }

    #[test]
    fn reset_restores_click_handling() {
        let mut host = FakeHost::new();
        let (mut bar, window) = launched(&mut host);

        bar.handle(window, TimeBarRequest::BeginTimer, &mut host);
        assert!(host.window(window).click_through);

        bar.reset(&mut host);
        assert!(!host.window(window).click_through);
        assert!(host.messages_to(window).contains(&WindowMessage::ResetTimer));
        assert!(host.window(window).focused);
    }

    #[test]
    fn fullscreen_flash_expands_and_collapses() {
        let mut host = FakeHost::new();
        let (mut bar, window) = launched(&mut host);

        bar.handle(window, TimeBarRequest::SetFullscreenFlash(true), &mut host);
        assert_eq!(host.window(window).size, (1920, 1040));
        assert!(host.window(window).click_through);

        bar.handle(window, TimeBarRequest::SetFullscreenFlash(false), &mut host);
        assert_eq!(host.window(window).size, (1920, 60));
    }

    #[test]
    fn resize_keeps_full_width() {
        let mut host = FakeHost::new();
        let (mut bar, window) = launched(&mut host);
        bar.handle(window, TimeBarRequest::Resize(120), &mut host);
        assert_eq!(host.calls, vec![Call::Size(window, 1920, 120)]);
    }

    #[test]
    fn time_expired_beeps_without_touching_the_window() {
        let mut host = FakeHost::new();
        let (mut bar, window) = launched(&mut host);
        bar.handle(window, TimeBarRequest::TimeExpired, &mut host);
        assert_eq!(host.calls, vec![Call::Beep]);
    }

    #[test]
    fn requests_from_foreign_windows_are_ignored() {
        let mut host = FakeHost::new();
        let (mut bar, _) = launched(&mut host);
        bar.handle(WindowHandle(999), TimeBarRequest::TimeExpired, &mut host);
        assert!(host.calls.is_empty());
    }

    #[test]
    fn close_is_idempotent_and_frees_the_shortcut() {
        let mut host = FakeHost::new();
        let (mut bar, _) = launched(&mut host);

        bar.close(&mut host);
        bar.close(&mut host);
        assert_eq!(bar.state(), OverlayState::Uninitialized);
        assert!(bar.window().is_none());
        assert!(host.shortcuts.is_empty());
        assert!(host.live_windows().is_empty());
    }

    #[test]
    fn shortcut_conflict_is_not_fatal() {
        let mut host = FakeHost::new();
        host.taken_shortcuts.insert("Alt+T".to_string());
        let (bar, window) = launched(&mut host);
        assert_eq!(bar.state(), OverlayState::Visible);
        assert!(host.is_alive(window));
    }
}
