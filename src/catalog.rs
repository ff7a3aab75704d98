/// Display names and icons for the bundled apps
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppLabel {
    pub title: String,
    pub icon: String,
}

/// Folder name -> (title, icon) of the apps shipped with the launcher
pub const KNOWN_APPS: &[(&str, &str, &str)] = &[
    ("Mono-T-cheur-main", "Mono-Tâcheur", "🎯"),
    ("Focus-Visuel-main", "Focus Visuel", "👁️"),
    ("Lecture-Bionique-main", "Lecture Bionique", "🧠"),
    ("Barre-de-Temps-Visuelle-main", "Barre de Temps", "⏳"),
];

/// Icon used for folders the catalog does not know about
pub const FALLBACK_ICON: &str = "📦";

/// Label for a folder; unknown folders show their own name
pub fn label_for(identifier: &str) -> AppLabel {
    match find_known_app(identifier) {
        Some((_, title, icon)) => AppLabel {
            title: title.to_string(),
            icon: icon.to_string(),
        },
        None => AppLabel {
            title: identifier.to_string(),
            icon: FALLBACK_ICON.to_string(),
        },
    }
}

pub fn find_known_app(identifier: &str) -> Option<&'static (&'static str, &'static str, &'static str)> {
    KNOWN_APPS.iter().find(|(folder, _, _)| *folder == identifier)
}
