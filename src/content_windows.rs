//! Detached content windows
//!
//! When the shell runs in detached mode each web app gets a window of its own
//! instead of the dashboard's content view. The dedicated apps (mono, bionic)
//! have one window each; everything else goes through [`GenericController`],
//! which keeps one window per page.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::host::{Rect, StackLevel, WindowContent, WindowHandle, WindowHost, WindowMessage, WindowSpec};
use crate::registry::CONTENT_ENTRY;

/// Centre a window of the given size on the primary work area
fn centered(host: &dyn WindowHost, width: u32, height: u32) -> Rect {
    let area = host
        .primary_display()
        .map(|d| d.work_area)
        .unwrap_or(Rect {
            x: 0,
            y: 0,
            width,
            height,
        });
    Rect {
        x: area.x + (area.width.saturating_sub(width) / 2) as i32,
        y: area.y + (area.height.saturating_sub(height) / 2) as i32,
        width,
        height,
    }
}

/// Launch/show/focus/close controller for one dedicated app window
pub struct ContentWindowController {
    title: String,
    width: u32,
    height: u32,
    always_on_top: bool,
    /// Shows a native reader instead of the page
    reader: bool,
    window: Option<WindowHandle>,
    active: bool,
}

impl ContentWindowController {
    pub fn new(title: impl Into<String>, width: u32, height: u32) -> Self {
        ContentWindowController {
            title: title.into(),
            width,
            height,
            always_on_top: false,
            reader: false,
            window: None,
            active: false,
        }
    }

    /// Single-task app
    pub fn mono() -> Self {
        Self::new("Mono-Tâcheur", 1000, 800)
    }

    /// Bionic reader: small, floating, fed with clipboard text
    pub fn bionic() -> Self {
        ContentWindowController {
            always_on_top: true,
            reader: true,
            ..Self::new("Lecteur Bionique", 600, 400)
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn window(&self) -> Option<WindowHandle> {
        self.window
    }

    pub fn launch(&mut self, page: &Path, host: &mut dyn WindowHost) {
        if self.active {
            if let Some(window) = self.window.filter(|w| host.is_alive(*w)) {
                host.show(window);
                host.focus(window);
                return;
            }
        }

        let content = if self.reader {
            WindowContent::Reader
        } else {
            WindowContent::Page(page.to_path_buf())
        };
        let mut spec = WindowSpec::normal(self.title.clone(), centered(host, self.width, self.height), content);
        if self.always_on_top {
            spec.level = Some(StackLevel::Floating);
        }

        match host.create_window(spec) {
            Ok(window) => {
                info!("Opened {} window", self.title);
                self.window = Some(window);
                self.active = true;
            }
            Err(e) => error!("Failed to open {}: {}", self.title, e),
        }
    }

    /// Push clipboard text into the window, if it is up
    pub fn post_text(&self, text: &str, host: &mut dyn WindowHost) {
        if let Some(window) = self.window.filter(|w| host.is_alive(*w)) {
            host.send(window, WindowMessage::NewText(text.to_string()));
        }
    }

    pub fn close(&mut self, host: &mut dyn WindowHost) {
        self.active = false;
        if let Some(window) = self.window.take() {
            if host.is_alive(window) {
                host.destroy(window);
            }
        }
    }

    pub fn window_closed(&mut self, window: WindowHandle, host: &mut dyn WindowHost) {
        if self.window == Some(window) {
            self.close(host);
        }
    }
}

/// One window per generic app page
#[derive(Default)]
pub struct GenericController {
    windows: HashMap<PathBuf, WindowHandle>,
}

impl GenericController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open `app_dir/index.html`, or bring its window back if already open
    pub fn launch(&mut self, app_dir: &Path, name: &str, host: &mut dyn WindowHost) -> Option<WindowHandle> {
        let page = app_dir.join(CONTENT_ENTRY);
        if !page.is_file() {
            error!("GenericController: No index.html found in {}", app_dir.display());
            return None;
        }

        if let Some(window) = self.windows.get(app_dir).copied() {
            if host.is_alive(window) {
                host.show(window);
                host.focus(window);
                return Some(window);
            }
            self.windows.remove(app_dir);
        }

        let spec = WindowSpec::normal(name, centered(host, 1024, 768), WindowContent::Page(page));
        match host.create_window(spec) {
            Ok(window) => {
                self.windows.insert(app_dir.to_path_buf(), window);
                Some(window)
            }
            Err(e) => {
                warn!("Failed to open {}: {}", name, e);
                None
            }
        }
    }

    pub fn windows(&self) -> Vec<WindowHandle> {
        self.windows.values().copied().collect()
    }

    pub fn window_closed(&mut self, window: WindowHandle, host: &mut dyn WindowHost) {
        let before = self.windows.len();
        self.windows.retain(|_, w| *w != window);
        if self.windows.len() != before && host.is_alive(window) {
            host.destroy(window);
        }
    }

    pub fn close_all(&mut self, host: &mut dyn WindowHost) {
        for (_, window) in self.windows.drain() {
            if host.is_alive(window) {
                host.destroy(window);
            }
        }
    }
}
