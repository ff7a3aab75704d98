/// Error types shared by the shell, the controllers and the host seam
use std::path::PathBuf;
use thiserror::Error;

/// Failures reported by the windowing host or while preparing a host call
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("invalid shortcut '{accelerator}': {reason}")]
    InvalidShortcut { accelerator: String, reason: String },

    #[error("failed to register shortcut '{accelerator}': {reason}")]
    ShortcutRegistration { accelerator: String, reason: String },

    #[error("failed to create window '{title}': {reason}")]
    WindowCreation { title: String, reason: String },

    #[error("no display available")]
    NoDisplay,
}

/// Why an activation request could not be routed anywhere
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("no app registered under '{0}'")]
    UnknownApp(String),

    #[error("index.html not found for {identifier} (looked in {})", .path.display())]
    MissingContent { identifier: String, path: PathBuf },
}
