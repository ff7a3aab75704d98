/// Messages exchanged between the shell, the dashboard UI and window content
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::overlay::SettingsPatch;
use crate::registry::AppIdentifier;

/// Messages from the dashboard UI to the shell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UiRequest {
    /// Sidebar item clicked
    Activate(AppIdentifier),
    /// Focus settings panel changed (fire-and-forget)
    UpdateFocusSettings(SettingsPatch),
    /// Title bar minimize button
    Minimize,
    /// Title bar close button: tear everything down
    Close,
}

/// Messages from the shell to the dashboard UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UiEvent {
    /// Apps discovered at startup, in directory order
    AppList(Vec<AppIdentifier>),
    /// An overlay was launched (transient feedback only)
    OverlayActivated(AppIdentifier),
    /// Load this page into the content view
    ContentReady { identifier: AppIdentifier, path: PathBuf },
    /// New clipboard text
    ClipboardUpdate(String),
}

/// Messages from the time bar's content to its controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeBarRequest {
    /// Change bar height, keeping full width
    Resize(u32),
    /// Timer started: let clicks through
    BeginTimer,
    /// Timer ran out: audible alert
    TimeExpired,
    /// Expand over the whole work area, or collapse back
    SetFullscreenFlash(bool),
}
