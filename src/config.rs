//! Configuration module for the launcher shell.
//!
//! This module provides the launcher's static configuration:
//! - Where the bundled apps live and which folders are overlays
//! - Default focus overlay settings and the time bar geometry
//! - Polling intervals for the clipboard, cursor and z-order tasks
//! - Dashboard window geometry and the splash process to dismiss
//!
//! The configuration is read from a `config.json` file located in the
//! platform-specific application data directory
//! (%APPDATA%/SuperProductivite/ on Windows). It is never written back:
//! user settings live only as long as the process does.
//!
//! # Example
//!
//! ```rust
//! use super_productivite::config::load_config;
//!
//! let config = load_config();
//! let apps_dir = config.resolve_apps_dir();
//! println!("apps live in {}", apps_dir.display());
//! ```

use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::overlay::OverlaySettings;

/// How generic apps are shown when activated
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContentMode {
    /// Dashboard loads the page into its own content view
    #[default]
    Embedded,
    /// Each app gets a window of its own
    Detached,
}

/// Folder names that are backed by an overlay controller
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct OverlayBindings {
    pub focus: String,
    pub timebar: String,
}

impl Default for OverlayBindings {
    fn default() -> Self {
        OverlayBindings {
            focus: "Focus-Visuel-main".to_string(),
            timebar: "Barre-de-Temps-Visuelle-main".to_string(),
        }
    }
}

/// Folder names of the dedicated single-window apps (detached mode)
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct ContentBindings {
    pub mono: String,
    pub bionic: String,
}

impl Default for ContentBindings {
    fn default() -> Self {
        ContentBindings {
            mono: "Mono-T-cheur-main".to_string(),
            bionic: "Lecture-Bionique-main".to_string(),
        }
    }
}

/// Initial focus overlay settings
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct FocusDefaults {
    /// Height of the clear band around the cursor, in pixels
    pub size: f64,
    pub opacity: f64,
    pub shortcut: Option<String>,
}

impl Default for FocusDefaults {
    fn default() -> Self {
        FocusDefaults {
            size: 100.0,
            opacity: 0.5,
            shortcut: None,
        }
    }
}

impl FocusDefaults {
    pub fn settings(&self) -> OverlaySettings {
        OverlaySettings {
            size: self.size,
            opacity: self.opacity.clamp(0.0, 1.0),
            shortcut: self.shortcut.clone(),
            active: false,
        }
    }
}

/// Time bar geometry and reset shortcut
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct TimeBarConfig {
    pub collapsed_height: u32,
    pub expanded_height: u32,
    pub shortcut: String,
    pub default_minutes: u32,
}

impl Default for TimeBarConfig {
    fn default() -> Self {
        TimeBarConfig {
            collapsed_height: 60,
            expanded_height: 120,
            shortcut: "Alt+T".to_string(),
            default_minutes: 25,
        }
    }
}

/// Periods of the background tasks, in milliseconds
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct PollIntervals {
    pub clipboard_ms: u64,
    pub cursor_ms: u64,
    pub z_order_ms: u64,
}

impl Default for PollIntervals {
    fn default() -> Self {
        PollIntervals {
            clipboard_ms: 1000,
            cursor_ms: 16,
            z_order_ms: 500,
        }
    }
}

impl PollIntervals {
    pub fn clipboard(&self) -> Duration {
        Duration::from_millis(self.clipboard_ms.max(1))
    }

    pub fn cursor(&self) -> Duration {
        Duration::from_millis(self.cursor_ms.max(1))
    }

    pub fn z_order(&self) -> Duration {
        Duration::from_millis(self.z_order_ms.max(1))
    }
}

/// Main window geometry
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct DashboardGeometry {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub min_width: u32,
    pub min_height: u32,
}

impl Default for DashboardGeometry {
    fn default() -> Self {
        DashboardGeometry {
            title: "Super Productivité".to_string(),
            width: 1200,
            height: 800,
            min_width: 900,
            min_height: 600,
        }
    }
}

/// Launcher configuration
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Apps directory (None = `apps` next to the executable)
    pub apps_dir: Option<PathBuf>,
    pub content_mode: ContentMode,
    /// App whose content view receives clipboard text
    pub clipboard_consumer: Option<String>,
    pub overlays: OverlayBindings,
    pub content_apps: ContentBindings,
    pub focus: FocusDefaults,
    pub timebar: TimeBarConfig,
    pub intervals: PollIntervals,
    pub dashboard: DashboardGeometry,
    /// Executable name of the splash screen to dismiss once the dashboard is up
    pub splash_process: Option<String>,
}

impl AppConfig {
    /// Identifier of the clipboard-consuming app
    pub fn clipboard_consumer(&self) -> &str {
        self.clipboard_consumer
            .as_deref()
            .unwrap_or(&self.content_apps.bionic)
    }

    /// Resolve the apps directory, defaulting to `apps/` beside the executable
    pub fn resolve_apps_dir(&self) -> PathBuf {
        if let Some(ref dir) = self.apps_dir {
            return dir.clone();
        }

        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join("apps")))
            .unwrap_or_else(|| PathBuf::from("apps"))
    }
}

/// Get the application's data directory
/// Returns %APPDATA%/SuperProductivite/ on Windows
pub fn get_data_directory() -> Result<PathBuf> {
    let project_dirs = ProjectDirs::from("", "", "SuperProductivite")
        .ok_or_else(|| anyhow!("Failed to determine user data directory"))?;

    Ok(project_dirs.data_dir().to_path_buf())
}

/// Parse a config file
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load application configuration from config.json
/// Returns default config if file doesn't exist or on error
pub fn load_config() -> AppConfig {
    let Ok(data_dir) = get_data_directory() else {
        return AppConfig::default();
    };

    let config_path = data_dir.join("config.json");

    if !config_path.exists() {
        return AppConfig::default();
    }

    match load_config_from(&config_path) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Using default config: {:#}", e);
            AppConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.content_mode, ContentMode::Embedded);
        assert_eq!(config.clipboard_consumer(), "Lecture-Bionique-main");
        assert_eq!(config.timebar.collapsed_height, 60);
        assert_eq!(config.timebar.shortcut, "Alt+T");
        assert_eq!(config.intervals.cursor(), Duration::from_millis(16));
        assert_eq!(config.intervals.z_order(), Duration::from_millis(500));
        assert_eq!(config.intervals.clipboard(), Duration::from_millis(1000));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{ "content_mode": "detached", "focus": { "opacity": 0.8 } }"#,
        )
        .unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.content_mode, ContentMode::Detached);
        assert_eq!(config.focus.opacity, 0.8);
        assert_eq!(config.focus.size, 100.0);
        assert_eq!(config.overlays, OverlayBindings::default());
    }

    #[test]
    fn test_focus_defaults_clamp_opacity() {
        let defaults = FocusDefaults {
            opacity: 3.0,
            ..FocusDefaults::default()
        };
        assert_eq!(defaults.settings().opacity, 1.0);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(load_config_from(&path).is_err());
    }

    #[test]
    fn test_get_data_directory() {
        if let Ok(path) = get_data_directory() {
            assert!(path.to_string_lossy().contains("SuperProductivite"));
        }
    }
}
