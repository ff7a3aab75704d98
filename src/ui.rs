//! Dashboard view model
//!
//! Sidebar, home/content switching, the focus settings panel and the shortcut
//! recorder. The view consumes [`UiEvent`]s from the shell and turns user
//! input into [`UiRequest`]s; drawing lives in the desktop backend and reads
//! the layout and state from here.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{label_for, AppLabel};
use crate::host::Rect;
use crate::ipc::{UiEvent, UiRequest};
use crate::overlay::SettingsPatch;
use crate::reader::BionicReader;
use crate::registry::AppIdentifier;
use crate::shortcut::accelerator_from_keys;

/// How long an activated overlay's sidebar item stays highlighted
pub const FLASH_DURATION: Duration = Duration::from_millis(500);

pub const SIZE_RANGE: (f64, f64) = (20.0, 400.0);

/// Raw input on the dashboard window, in window pixels
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardInput {
    Click { x: f64, y: f64 },
    Key {
        /// Logical key: a character, or a name such as "Escape" / "Shift"
        key: String,
        ctrl: bool,
        meta: bool,
        shift: bool,
        alt: bool,
    },
}

/// Where the dashboard shows embedded app pages
pub trait ContentView {
    fn load(&mut self, identifier: &str, path: &Path);
    fn clear(&mut self);
    fn post_text(&mut self, text: &str);

    /// Reader shown in place of the page, if any
    fn reader(&self) -> Option<&BionicReader> {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppItem {
    pub identifier: AppIdentifier,
    pub label: AppLabel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Page {
    Home,
    Content { identifier: AppIdentifier, path: PathBuf },
}

/// Focus overlay controls as shown in the panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusPanel {
    pub size: f64,
    pub opacity: f64,
    pub active: bool,
    pub shortcut: String,
    pub recording: bool,
}

/// Fixed dashboard geometry for a window of a given size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub width: u32,
    pub height: u32,
}

impl Layout {
    pub const HEADER: u32 = 40;
    pub const SIDEBAR: u32 = 260;
    pub const ROW: u32 = 48;
    const BUTTON: u32 = 36;
    const PANEL_ROW: u32 = 56;

    pub fn new(width: u32, height: u32) -> Self {
        Layout { width, height }
    }

    pub fn header(&self) -> Rect {
        Rect { x: 0, y: 0, width: self.width, height: Self::HEADER }
    }

    pub fn minimize_button(&self) -> Rect {
        Rect {
            x: self.width as i32 - 2 * Self::BUTTON as i32 - 8,
            y: 2,
            width: Self::BUTTON,
            height: Self::BUTTON,
        }
    }

    pub fn close_button(&self) -> Rect {
        Rect {
            x: self.width as i32 - Self::BUTTON as i32 - 4,
            y: 2,
            width: Self::BUTTON,
            height: Self::BUTTON,
        }
    }

    pub fn sidebar(&self) -> Rect {
        Rect {
            x: 0,
            y: Self::HEADER as i32,
            width: Self::SIDEBAR.min(self.width),
            height: self.height.saturating_sub(Self::HEADER),
        }
    }

    /// Row 0 is Home, row n is app n - 1
    pub fn sidebar_row(&self, row: usize) -> Rect {
        Rect {
            x: 0,
            y: (Self::HEADER + 8 + row as u32 * Self::ROW) as i32,
            width: Self::SIDEBAR.min(self.width),
            height: Self::ROW - 4,
        }
    }

    pub fn main_area(&self) -> Rect {
        Rect {
            x: Self::SIDEBAR as i32,
            y: Self::HEADER as i32,
            width: self.width.saturating_sub(Self::SIDEBAR),
            height: self.height.saturating_sub(Self::HEADER),
        }
    }

    /// Focus panel control rows: 0 size, 1 opacity, 2 toggle, 3 shortcut
    pub fn panel_row(&self, row: usize) -> Rect {
        let area = self.main_area();
        Rect {
            x: area.x + 24,
            y: area.y + 24 + (row as u32 * Self::PANEL_ROW) as i32,
            width: area.width.saturating_sub(48),
            height: Self::PANEL_ROW - 16,
        }
    }
}

pub fn contains(rect: Rect, x: f64, y: f64) -> bool {
    x >= rect.x as f64
        && y >= rect.y as f64
        && x < rect.x as f64 + rect.width as f64
        && y < rect.y as f64 + rect.height as f64
}

/// Fraction of the way across `rect` at `x`, clamped to 0..=1
fn fraction(rect: Rect, x: f64) -> f64 {
    if rect.width == 0 {
        return 0.0;
    }
    ((x - rect.x as f64) / rect.width as f64).clamp(0.0, 1.0)
}

pub struct DashboardView<V: ContentView> {
    apps: Vec<AppItem>,
    active_folder: Option<AppIdentifier>,
    page: Page,
    flash: Option<(AppIdentifier, Instant)>,
    focus_identifier: AppIdentifier,
    clipboard_consumer: AppIdentifier,
    panel: FocusPanel,
    layout: Layout,
    content: V,
}

impl<V: ContentView> DashboardView<V> {
    pub fn new(
        focus_identifier: impl Into<String>,
        clipboard_consumer: impl Into<String>,
        panel: FocusPanel,
        content: V,
    ) -> Self {
        DashboardView {
            apps: Vec::new(),
            active_folder: None,
            page: Page::Home,
            flash: None,
            focus_identifier: focus_identifier.into(),
            clipboard_consumer: clipboard_consumer.into(),
            panel,
            layout: Layout::new(1200, 800),
            content,
        }
    }

    pub fn apps(&self) -> &[AppItem] {
        &self.apps
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn active_folder(&self) -> Option<&str> {
        self.active_folder.as_deref()
    }

    pub fn panel(&self) -> &FocusPanel {
        &self.panel
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn content(&self) -> &V {
        &self.content
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.layout = Layout::new(width, height);
    }

    /// The settings panel is only shown while the focus overlay is selected
    pub fn focus_panel_visible(&self) -> bool {
        self.active_folder.as_deref() == Some(self.focus_identifier.as_str())
    }

    /// Identifier whose sidebar item is currently flashing
    pub fn flashing(&self, now: Instant) -> Option<&str> {
        self.flash
            .as_ref()
            .filter(|(_, until)| now < *until)
            .map(|(id, _)| id.as_str())
    }

    /// When the current flash ends, so the loop can redraw
    pub fn flash_deadline(&self) -> Option<Instant> {
        self.flash.as_ref().map(|(_, until)| *until)
    }

    /// Drop a finished flash; true when the sidebar needs repainting
    pub fn expire_flash(&mut self, now: Instant) -> bool {
        if self.flash.as_ref().is_some_and(|(_, until)| now >= *until) {
            self.flash = None;
            return true;
        }
        false
    }

    pub fn apply(&mut self, event: UiEvent, now: Instant) {
        match event {
            UiEvent::AppList(identifiers) => {
                self.apps = identifiers
                    .into_iter()
                    .map(|identifier| AppItem {
                        label: label_for(&identifier),
                        identifier,
                    })
                    .collect();
            }
            UiEvent::OverlayActivated(identifier) => {
                self.flash = Some((identifier, now + FLASH_DURATION));
            }
            UiEvent::ContentReady { identifier, path } => {
                self.content.load(&identifier, &path);
                self.page = Page::Content { identifier, path };
            }
            UiEvent::ClipboardUpdate(text) => {
                let showing_consumer = matches!(self.page, Page::Content { .. })
                    && self.active_folder.as_deref() == Some(self.clipboard_consumer.as_str());
                if showing_consumer {
                    self.content.post_text(&text);
                } else {
                    debug!("Clipboard update not forwarded, consumer view inactive");
                }
            }
        }
    }

    /// Sidebar click on an app
    pub fn select(&mut self, index: usize) -> Vec<UiRequest> {
        let Some(app) = self.apps.get(index) else {
            return Vec::new();
        };
        let identifier = app.identifier.clone();
        self.active_folder = Some(identifier.clone());
        self.panel.recording = false;
        vec![UiRequest::Activate(identifier)]
    }

    pub fn go_home(&mut self) {
        self.active_folder = None;
        self.panel.recording = false;
        if matches!(self.page, Page::Content { .. }) {
            self.content.clear();
        }
        self.page = Page::Home;
    }

    pub fn set_focus_size(&mut self, size: f64) -> UiRequest {
        self.panel.size = size.clamp(SIZE_RANGE.0, SIZE_RANGE.1).round();
        UiRequest::UpdateFocusSettings(SettingsPatch::size(self.panel.size))
    }

    pub fn set_focus_opacity(&mut self, opacity: f64) -> UiRequest {
        self.panel.opacity = (opacity.clamp(0.0, 1.0) * 100.0).round() / 100.0;
        UiRequest::UpdateFocusSettings(SettingsPatch::opacity(self.panel.opacity))
    }

    pub fn toggle_focus(&mut self) -> UiRequest {
        self.panel.active = !self.panel.active;
        UiRequest::UpdateFocusSettings(SettingsPatch::active(self.panel.active))
    }

    pub fn start_recording(&mut self) {
        self.panel.recording = true;
    }

    /// Feed a key press to the shortcut recorder
    pub fn record_key(&mut self, key: &str, ctrl: bool, meta: bool, shift: bool, alt: bool) -> Option<UiRequest> {
        let accelerator = accelerator_from_keys(key, ctrl, meta, shift, alt)?;
        self.panel.recording = false;
        self.panel.shortcut = accelerator.clone();
        Some(UiRequest::UpdateFocusSettings(SettingsPatch::shortcut(accelerator)))
    }

    pub fn handle_input(&mut self, input: DashboardInput) -> Vec<UiRequest> {
        match input {
            DashboardInput::Click { x, y } => self.click(x, y),
            DashboardInput::Key { key, ctrl, meta, shift, alt } => {
                if self.panel.recording && self.focus_panel_visible() {
                    return self.record_key(&key, ctrl, meta, shift, alt).into_iter().collect();
                }
                if key == "Escape" {
                    self.go_home();
                }
                Vec::new()
            }
        }
    }

    fn click(&mut self, x: f64, y: f64) -> Vec<UiRequest> {
        let layout = self.layout;

        if contains(layout.close_button(), x, y) {
            return vec![UiRequest::Close];
        }
        if contains(layout.minimize_button(), x, y) {
            return vec![UiRequest::Minimize];
        }

        if contains(layout.sidebar(), x, y) {
            if contains(layout.sidebar_row(0), x, y) {
                self.go_home();
                return Vec::new();
            }
            let hit = (0..self.apps.len()).find(|i| contains(layout.sidebar_row(i + 1), x, y));
            return match hit {
                Some(index) => self.select(index),
                None => Vec::new(),
            };
        }

        if self.focus_panel_visible() {
            let size_row = layout.panel_row(0);
            if contains(size_row, x, y) {
                let (lo, hi) = SIZE_RANGE;
                return vec![self.set_focus_size(lo + fraction(size_row, x) * (hi - lo))];
            }
            let opacity_row = layout.panel_row(1);
            if contains(opacity_row, x, y) {
                return vec![self.set_focus_opacity(fraction(opacity_row, x))];
            }
            if contains(layout.panel_row(2), x, y) {
                return vec![self.toggle_focus()];
            }
            if contains(layout.panel_row(3), x, y) {
                self.start_recording();
            }
        }

        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingView {
        loaded: Vec<String>,
        cleared: usize,
        posted: Vec<String>,
    }

    impl ContentView for RecordingView {
        fn load(&mut self, identifier: &str, _path: &Path) {
            self.loaded.push(identifier.to_string());
        }

        fn clear(&mut self) {
            self.cleared += 1;
        }

        fn post_text(&mut self, text: &str) {
            self.posted.push(text.to_string());
        }
    }

    fn view() -> DashboardView<RecordingView> {
        let panel = FocusPanel {
            size: 100.0,
            opacity: 0.5,
            active: false,
            shortcut: String::new(),
            recording: false,
        };
        let mut view = DashboardView::new(
            "Focus-Visuel-main",
            "Lecture-Bionique-main",
            panel,
            RecordingView::default(),
        );
        view.apply(
            UiEvent::AppList(vec![
                "Focus-Visuel-main".into(),
                "Lecture-Bionique-main".into(),
                "Mono-T-cheur-main".into(),
            ]),
            Instant::now(),
        );
        view
    }

    fn row_center(view: &DashboardView<RecordingView>, row: usize) -> (f64, f64) {
        let rect = view.layout().sidebar_row(row);
        (rect.x as f64 + 10.0, rect.y as f64 + rect.height as f64 / 2.0)
    }

    fn content_ready(id: &str) -> UiEvent {
        UiEvent::ContentReady {
            identifier: id.into(),
            path: PathBuf::from(format!("apps/{id}/index.html")),
        }
    }

    #[test]
    fn app_list_uses_catalog_labels() {
        let view = view();
        assert_eq!(view.apps().len(), 3);
        assert_eq!(view.apps()[0].label.title, "Focus Visuel");
    }

    #[test]
    fn clicking_a_row_activates_its_app() {
        let mut view = view();
        let (x, y) = row_center(&view, 3);
        let requests = view.handle_input(DashboardInput::Click { x, y });
        assert_eq!(requests, vec![UiRequest::Activate("Mono-T-cheur-main".into())]);
        assert_eq!(view.active_folder(), Some("Mono-T-cheur-main"));
        assert!(!view.focus_panel_visible());
    }

    #[test]
    fn focus_selection_shows_the_panel() {
        let mut view = view();
        view.select(0);
        assert!(view.focus_panel_visible());
        view.go_home();
        assert!(!view.focus_panel_visible());
    }

    #[test]
    fn overlay_activation_flashes_briefly() {
        let mut view = view();
        let t0 = Instant::now();
        view.apply(UiEvent::OverlayActivated("Focus-Visuel-main".into()), t0);
        assert_eq!(view.flashing(t0), Some("Focus-Visuel-main"));
        assert_eq!(view.flashing(t0 + FLASH_DURATION), None);

        assert!(!view.expire_flash(t0));
        assert!(view.expire_flash(t0 + FLASH_DURATION));
        assert_eq!(view.flash_deadline(), None);
    }

    #[test]
    fn content_ready_switches_to_the_content_page() {
        let mut view = view();
        view.select(2);
        view.apply(content_ready("Mono-T-cheur-main"), Instant::now());
        assert!(matches!(view.page(), Page::Content { identifier, .. } if identifier == "Mono-T-cheur-main"));
        assert_eq!(view.content().loaded, vec!["Mono-T-cheur-main".to_string()]);

        view.handle_input(DashboardInput::Key {
            key: "Escape".into(),
            ctrl: false,
            meta: false,
            shift: false,
            alt: false,
        });
        assert_eq!(view.page(), &Page::Home);
        assert_eq!(view.content().cleared, 1);
    }

    #[test]
    fn clipboard_reaches_only_the_consumer_view() {
        let mut view = view();
        let now = Instant::now();

        view.select(2);
        view.apply(content_ready("Mono-T-cheur-main"), now);
        view.apply(UiEvent::ClipboardUpdate("ignored".into()), now);
        assert!(view.content().posted.is_empty());

        view.select(1);
        view.apply(content_ready("Lecture-Bionique-main"), now);
        view.apply(UiEvent::ClipboardUpdate("read me".into()), now);
        assert_eq!(view.content().posted, vec!["read me".to_string()]);
    }

    #[test]
    fn panel_controls_emit_partial_updates() {
        let mut view = view();
        view.select(0);
        let layout = view.layout();

        let size_row = layout.panel_row(0);
        let end = size_row.x as f64 + size_row.width as f64 - 0.5;
        let requests = view.handle_input(DashboardInput::Click { x: end, y: size_row.y as f64 + 1.0 });
        assert_eq!(requests, vec![UiRequest::UpdateFocusSettings(SettingsPatch::size(400.0))]);

        let toggle = layout.panel_row(2);
        let requests = view.handle_input(DashboardInput::Click { x: toggle.x as f64 + 1.0, y: toggle.y as f64 + 1.0 });
        assert_eq!(requests, vec![UiRequest::UpdateFocusSettings(SettingsPatch::active(true))]);
    }

    #[test]
    fn shortcut_recorder_captures_the_next_combo() {
        let mut view = view();
        view.select(0);
        view.start_recording();

        let bare = view.handle_input(DashboardInput::Key {
            key: "Shift".into(),
            ctrl: false,
            meta: false,
            shift: true,
            alt: false,
        });
        assert!(bare.is_empty());
        assert!(view.panel().recording);

        let requests = view.handle_input(DashboardInput::Key {
            key: "f".into(),
            ctrl: true,
            meta: false,
            shift: true,
            alt: false,
        });
        assert_eq!(
            requests,
            vec![UiRequest::UpdateFocusSettings(SettingsPatch::shortcut("CommandOrControl+Shift+F"))]
        );
        assert!(!view.panel().recording);
        assert_eq!(view.panel().shortcut, "CommandOrControl+Shift+F");
    }

    #[test]
    fn header_buttons_map_to_window_requests() {
        let mut view = view();
        let layout = view.layout();
        let close = layout.close_button();
        let minimize = layout.minimize_button();

        assert_eq!(
            view.handle_input(DashboardInput::Click { x: close.x as f64 + 2.0, y: close.y as f64 + 2.0 }),
            vec![UiRequest::Close]
        );
        assert_eq!(
            view.handle_input(DashboardInput::Click { x: minimize.x as f64 + 2.0, y: minimize.y as f64 + 2.0 }),
            vec![UiRequest::Minimize]
        );
    }
}
