//! App registry
//!
//! Built once at startup from the folder names under the apps directory.
//! Overlay identifiers come from the config bindings and always resolve to
//! their controller; everything else is generic web content served from
//! `<apps_dir>/<identifier>/index.html`.

use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::OverlayBindings;
use crate::error::ResolveError;
use crate::overlay::OverlayKind;

/// Opaque folder-name key of an installed app
pub type AppIdentifier = String;

pub const CONTENT_ENTRY: &str = "index.html";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppKind {
    Overlay(OverlayKind),
    GenericContent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppRegistryEntry {
    pub identifier: AppIdentifier,
    pub kind: AppKind,
    pub content_path: Option<PathBuf>,
}

/// Where an activation request should go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Overlay(OverlayKind),
    Content(PathBuf),
}

#[derive(Debug, Clone)]
pub struct AppRegistry {
    apps_dir: PathBuf,
    entries: Vec<AppRegistryEntry>,
    overlays: HashMap<AppIdentifier, OverlayKind>,
}

impl AppRegistry {
    /// Enumerate app folders. A missing apps directory yields an empty registry.
    pub fn discover(apps_dir: &Path, bindings: &OverlayBindings) -> Self {
        let folders = match list_app_folders(apps_dir) {
            Ok(folders) => folders,
            Err(e) => {
                warn!("No apps found in {}: {}", apps_dir.display(), e);
                Vec::new()
            }
        };

        info!("Discovered {} apps in {}", folders.len(), apps_dir.display());
        Self::from_folders(apps_dir, folders, bindings)
    }

    pub fn from_folders(
        apps_dir: &Path,
        folders: Vec<AppIdentifier>,
        bindings: &OverlayBindings,
    ) -> Self {
        let overlays: HashMap<AppIdentifier, OverlayKind> = [
            (bindings.focus.clone(), OverlayKind::Focus),
            (bindings.timebar.clone(), OverlayKind::TimeBar),
        ]
        .into_iter()
        .collect();

        let entries = folders
            .into_iter()
            .map(|identifier| match overlays.get(&identifier) {
                Some(kind) => AppRegistryEntry {
                    identifier,
                    kind: AppKind::Overlay(*kind),
                    content_path: None,
                },
                None => AppRegistryEntry {
                    content_path: Some(apps_dir.join(&identifier).join(CONTENT_ENTRY)),
                    identifier,
                    kind: AppKind::GenericContent,
                },
            })
            .collect();

        AppRegistry {
            apps_dir: apps_dir.to_path_buf(),
            entries,
            overlays,
        }
    }

    pub fn apps_dir(&self) -> &Path {
        &self.apps_dir
    }

    pub fn entries(&self) -> &[AppRegistryEntry] {
        &self.entries
    }

    /// Identifiers in discovery order
    pub fn identifiers(&self) -> Vec<AppIdentifier> {
        self.entries.iter().map(|e| e.identifier.clone()).collect()
    }

    pub fn get(&self, identifier: &str) -> Option<&AppRegistryEntry> {
        self.entries.iter().find(|e| e.identifier == identifier)
    }

    /// Identifier bound to an overlay controller
    pub fn overlay_identifier(&self, kind: OverlayKind) -> Option<&str> {
        self.overlays
            .iter()
            .find(|(_, k)| **k == kind)
            .map(|(id, _)| id.as_str())
    }

    /// Decide where an activation goes. Content must exist on disk right now.
    pub fn resolve(&self, identifier: &str) -> Result<Resolution, ResolveError> {
        if let Some(kind) = self.overlays.get(identifier) {
            return Ok(Resolution::Overlay(*kind));
        }

        if !is_plain_folder_name(identifier) {
            return Err(ResolveError::UnknownApp(identifier.to_string()));
        }

        let path = self.apps_dir.join(identifier).join(CONTENT_ENTRY);
        if path.is_file() {
            debug!("Resolved {} to {}", identifier, path.display());
            return Ok(Resolution::Content(path));
        }

        if self.get(identifier).is_some() {
            Err(ResolveError::MissingContent {
                identifier: identifier.to_string(),
                path,
            })
        } else {
            Err(ResolveError::UnknownApp(identifier.to_string()))
        }
    }
}

/// Directory names directly under `apps_dir`, in listing order
fn list_app_folders(apps_dir: &Path) -> std::io::Result<Vec<AppIdentifier>> {
    let mut folders = Vec::new();
    for entry in fs::read_dir(apps_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            folders.push(name.to_string());
        }
    }
    Ok(folders)
}

/// Reject identifiers that would escape the apps directory
fn is_plain_folder_name(identifier: &str) -> bool {
    let mut components = Path::new(identifier).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
