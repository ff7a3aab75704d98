use crate::host::{WindowHandle, WindowHost, WindowMessage};

/// Windows owned by one controller, shown and hidden as a unit.
///
/// `visible` is the single source of truth for the whole set; the windows are
/// kept in step with it rather than queried for their own state.
#[derive(Debug, Default, Clone)]
pub struct WindowSet {
    handles: Vec<WindowHandle>,
    visible: bool,
}

impl WindowSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of freshly created windows
    pub fn adopt(&mut self, handles: Vec<WindowHandle>, visible: bool) {
        self.handles = handles;
        self.visible = visible && !self.handles.is_empty();
    }

    pub fn handles(&self) -> &[WindowHandle] {
        &self.handles
    }

    pub fn primary(&self) -> Option<WindowHandle> {
        self.handles.first().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn contains(&self, window: WindowHandle) -> bool {
        self.handles.contains(&window)
    }

    /// Owned windows that still exist, checked right now
    pub fn live(&self, host: &dyn WindowHost) -> Vec<WindowHandle> {
        self.handles
            .iter()
            .copied()
            .filter(|h| host.is_alive(*h))
            .collect()
    }

    pub fn has_live(&self, host: &dyn WindowHost) -> bool {
        self.handles.iter().any(|h| host.is_alive(*h))
    }

    pub fn set_visible(&mut self, visible: bool, host: &mut dyn WindowHost) {
        let live = self.live(host);
        if live.is_empty() {
            return;
        }

        self.visible = visible;
        for window in live {
            if visible {
                host.show(window);
            } else {
                host.hide(window);
            }
        }
    }

    /// Flip the whole set. Returns the new visibility, or None without live windows.
    pub fn toggle(&mut self, host: &mut dyn WindowHost) -> Option<bool> {
        if !self.has_live(host) {
            return None;
        }
        let next = !self.visible;
        self.set_visible(next, host);
        Some(next)
    }

    pub fn broadcast(&self, message: &WindowMessage, host: &mut dyn WindowHost) {
        for window in self.live(host) {
            host.send(window, message.clone());
        }
    }

    pub fn destroy_all(&mut self, host: &mut dyn WindowHost) {
        for window in self.live(host) {
            host.destroy(window);
        }
        self.handles.clear();
        self.visible = false;
    }
}
