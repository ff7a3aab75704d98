//! Overlay controllers
//!
//! An overlay controller owns a set of always-on-top windows and walks them
//! through `Uninitialized -> Active(Visible) <-> Active(Hidden) -> Destroyed`.
//! `launch()` is shared by every controller; what a second launch does is
//! each controller's [`ReLaunchBehavior`]:
//!
//! - the focus overlay toggles visibility,
//! - the time bar shows and focuses its window again.

mod focus;
mod timebar;
mod window_set;

pub use focus::FocusController;
pub use timebar::TimeBarController;
pub use window_set::WindowSet;

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::host::{WindowHandle, WindowHost};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OverlayKind {
    Focus,
    TimeBar,
}

/// What `launch()` means once a controller is already active
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReLaunchBehavior {
    /// Show and focus again
    ReShow,
    /// Flip visibility
    Toggle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayState {
    Uninitialized,
    Visible,
    Hidden,
}

/// Overlay appearance, merged field by field from partial updates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlaySettings {
    pub size: f64,
    pub opacity: f64,
    pub shortcut: Option<String>,
    pub active: bool,
}

impl Default for OverlaySettings {
    fn default() -> Self {
        OverlaySettings {
            size: 100.0,
            opacity: 0.5,
            shortcut: None,
            active: false,
        }
    }
}

/// Partial settings update; absent fields keep their current value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsPatch {
    pub size: Option<f64>,
    pub opacity: Option<f64>,
    pub shortcut: Option<String>,
    pub active: Option<bool>,
}

impl SettingsPatch {
    pub fn size(size: f64) -> Self {
        SettingsPatch {
            size: Some(size),
            ..Self::default()
        }
    }

    pub fn opacity(opacity: f64) -> Self {
        SettingsPatch {
            opacity: Some(opacity),
            ..Self::default()
        }
    }

    pub fn shortcut(accelerator: impl Into<String>) -> Self {
        SettingsPatch {
            shortcut: Some(accelerator.into()),
            ..Self::default()
        }
    }

    pub fn active(active: bool) -> Self {
        SettingsPatch {
            active: Some(active),
            ..Self::default()
        }
    }
}

impl OverlaySettings {
    pub fn merge(&mut self, patch: &SettingsPatch) {
        if let Some(size) = patch.size {
            self.size = size;
        }
        if let Some(opacity) = patch.opacity {
            self.opacity = opacity.clamp(0.0, 1.0);
        }
        if let Some(ref shortcut) = patch.shortcut {
            self.shortcut = Some(shortcut.clone());
        }
        if let Some(active) = patch.active {
            self.active = active;
        }
    }
}

/// Lifecycle contract shared by the focus overlay and the time bar
pub trait Overlay {
    fn kind(&self) -> OverlayKind;

    fn relaunch_behavior(&self) -> ReLaunchBehavior;

    fn is_active(&self) -> bool;

    fn state(&self) -> OverlayState;

    /// Handles of the windows this controller currently owns
    fn windows(&self) -> &[WindowHandle];

    /// First launch: build windows, start tasks, register shortcuts
    fn activate(&mut self, host: &mut dyn WindowHost, now: Instant);

    fn reshow(&mut self, host: &mut dyn WindowHost, now: Instant);

    fn toggle_overlay(&mut self, host: &mut dyn WindowHost);

    /// Tear everything down. Safe to call repeatedly.
    fn close(&mut self, host: &mut dyn WindowHost);

    /// Run whichever background tasks are due
    fn tick(&mut self, _now: Instant, _host: &mut dyn WindowHost) {}

    fn next_deadline(&self) -> Option<Instant> {
        None
    }

    fn launch(&mut self, host: &mut dyn WindowHost, now: Instant) {
        if !self.is_active() {
            self.activate(host, now);
            return;
        }

        match self.relaunch_behavior() {
            ReLaunchBehavior::Toggle => self.toggle_overlay(host),
            ReLaunchBehavior::ReShow => self.reshow(host, now),
        }
    }

    /// One of our windows was closed by the user: the set goes as a unit
    fn window_closed(&mut self, window: WindowHandle, host: &mut dyn WindowHost) {
        if self.windows().contains(&window) {
            tracing::info!("{:?} overlay window closed, closing overlay", self.kind());
            self.close(host);
        }
    }
}
