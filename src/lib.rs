//! Super Productivite Library
//!
//! Launcher shell for the bundled productivity apps
//!
//! Architecture:
//! - `shell` owns the dashboard window, the app registry and every controller
//! - `overlay` holds the focus and time bar controllers
//! - `host` is the seam to the windowing framework; `desktop` implements it with winit

pub mod catalog;
pub mod clipboard;
pub mod config;
pub mod content_windows;
pub mod desktop;
pub mod error;
pub mod host;
pub mod ipc;
pub mod overlay;
pub mod reader;
pub mod registry;
pub mod shell;
pub mod shortcut;
pub mod splash;
pub mod ticker;
pub mod ui;
