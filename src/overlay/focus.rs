//! Focus overlay
//!
//! One borderless, click-through window per display dims everything except a
//! band around the cursor. Two background tasks keep it honest: a fast cursor
//! broadcast and a slower z-order enforcement pass, because some window
//! managers let other windows climb back above a top-most window.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::{Overlay, OverlayKind, OverlaySettings, OverlayState, ReLaunchBehavior, SettingsPatch, WindowSet};
use crate::host::{
    HotkeyAction, StackLevel, WindowContent, WindowHandle, WindowHost, WindowMessage, WindowSpec,
};
use crate::shortcut::Shortcut;
use crate::ticker::{earliest, Ticker};

pub struct FocusController {
    windows: WindowSet,
    settings: OverlaySettings,
    active: bool,
    /// Shortcut actually registered with the host, which can lag behind
    /// `settings.shortcut` when a registration failed
    registered: Option<Shortcut>,
    cursor_interval: Duration,
    z_order_interval: Duration,
    cursor_task: Option<Ticker>,
    z_order_task: Option<Ticker>,
}

impl FocusController {
    pub fn new(settings: OverlaySettings, cursor_interval: Duration, z_order_interval: Duration) -> Self {
        FocusController {
            windows: WindowSet::new(),
            settings,
            active: false,
            registered: None,
            cursor_interval,
            z_order_interval,
            cursor_task: None,
            z_order_task: None,
        }
    }

    pub fn settings(&self) -> &OverlaySettings {
        &self.settings
    }

    pub fn registered_shortcut(&self) -> Option<&str> {
        self.registered.as_ref().map(Shortcut::accelerator)
    }

    /// Apply a partial settings update coming from the dashboard
    pub fn update_settings(&mut self, patch: &SettingsPatch, host: &mut dyn WindowHost) {
        if let Some(ref accelerator) = patch.shortcut {
            if self.settings.shortcut.as_deref() != Some(accelerator.as_str()) {
                self.rebind_shortcut(accelerator, host);
            }
        }

        if let Some(active) = patch.active {
            if active != self.windows.is_visible() {
                self.toggle_overlay(host);
            }
        }

        self.settings.merge(patch);
        self.windows
            .broadcast(&WindowMessage::FocusSettings(self.settings.clone()), host);
    }

    /// Register the new binding first so a failure leaves the old one working
    fn rebind_shortcut(&mut self, accelerator: &str, host: &mut dyn WindowHost) {
        let shortcut = match Shortcut::parse(accelerator) {
            Ok(shortcut) => shortcut,
            Err(e) => {
                warn!("Failed to register shortcut: {}", e);
                return;
            }
        };

        match host.register_shortcut(&shortcut, HotkeyAction::ToggleFocusOverlay) {
            Ok(()) => {
                if let Some(old) = self.registered.take() {
                    host.unregister_shortcut(&old);
                }
                info!("Shortcut updated to: {}", accelerator);
                self.registered = Some(shortcut);
            }
            Err(e) => {
                warn!("Failed to register shortcut: {}", e);
            }
        }
    }

    /// Register the stored binding if nothing is registered yet
    fn ensure_shortcut(&mut self, host: &mut dyn WindowHost) {
        if self.registered.is_some() {
            return;
        }
        if let Some(accelerator) = self.settings.shortcut.clone() {
            self.rebind_shortcut(&accelerator, host);
        }
    }

    fn create_overlay_windows(&mut self, host: &mut dyn WindowHost) {
        let displays = host.displays();
        if displays.is_empty() {
            warn!("No displays reported, focus overlay has nothing to cover");
        }

        let mut handles = Vec::with_capacity(displays.len());
        for (index, display) in displays.iter().enumerate() {
            let spec = WindowSpec {
                title: format!("Focus Visuel {}", index + 1),
                bounds: display.bounds,
                min_size: None,
                frameless: true,
                transparent: true,
                level: Some(StackLevel::ScreenSaver),
                skip_taskbar: true,
                focusable: false,
                click_through: true,
                visible: true,
                content: WindowContent::FocusOverlay,
            };

            match host.create_window(spec) {
                Ok(window) => {
                    host.set_stack_level(window, StackLevel::ScreenSaver);
                    host.set_click_through(window, true);
                    host.send(window, WindowMessage::FocusSettings(self.settings.clone()));
                    handles.push(window);
                }
                Err(e) => warn!("Skipping display {}: {}", index + 1, e),
            }
        }

        self.windows.adopt(handles, true);
    }

    fn broadcast_cursor(&mut self, host: &mut dyn WindowHost) {
        if self.windows.is_empty() {
            return;
        }
        let live = self.windows.live(host);
        if live.is_empty() {
            return;
        }
        let Some(point) = host.cursor_position() else {
            return;
        };
        for window in live {
            host.send(window, WindowMessage::Cursor(point));
        }
    }

    fn enforce_z_order(&mut self, host: &mut dyn WindowHost) {
        if self.windows.is_empty() || !self.windows.is_visible() {
            return;
        }
        for window in self.windows.live(host) {
            host.set_stack_level(window, StackLevel::ScreenSaver);
            host.raise(window);
        }
    }
}

impl Overlay for FocusController {
    fn kind(&self) -> OverlayKind {
        OverlayKind::Focus
    }

    fn relaunch_behavior(&self) -> ReLaunchBehavior {
        ReLaunchBehavior::Toggle
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

    fn activate(&mut self, host: &mut dyn WindowHost, now: Instant) {
        info!("Activating focus overlay");
        self.active = true;
        self.settings.active = true;
        self.create_overlay_windows(host);
        self.cursor_task = Some(Ticker::start(self.cursor_interval, now));
        self.z_order_task = Some(Ticker::start(self.z_order_interval, now));
        self.ensure_shortcut(host);
    }

    fn reshow(&mut self, host: &mut dyn WindowHost, _now: Instant) {
        self.windows.set_visible(true, host);
    }

    fn toggle_overlay(&mut self, host: &mut dyn WindowHost) {
        if let Some(visible) = self.windows.toggle(host) {
            self.settings.active = visible;
            info!("Focus overlay {}", if visible { "shown" } else { "hidden" });
        }
    }

    fn close(&mut self, host: &mut dyn WindowHost) {
        self.cursor_task = None;
        self.z_order_task = None;
        if let Some(shortcut) = self.registered.take() {
            host.unregister_shortcut(&shortcut);
        }
        self.windows.destroy_all(host);
        if self.active {
            info!("Focus overlay closed");
        }
        self.active = false;
        self.settings.active = false;
    }

    fn tick(&mut self, now: Instant, host: &mut dyn WindowHost) {
        if self.cursor_task.as_mut().is_some_and(|t| t.fire(now)) {
            self.broadcast_cursor(host);
        }
        if self.z_order_task.as_mut().is_some_and(|t| t.fire(now)) {
            debug!("Re-asserting focus overlay z-order");
            self.enforce_z_order(host);
        }
    }

    fn next_deadline(&self) -> Option<Instant> {
        earliest([
            self.cursor_task.map(|t| t.next_due()),
            self.z_order_task.map(|t| t.next_due()),
        ])
    }
}
