use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// UI preferences persisted between sessions. The view mode is stored by
/// display name so a hand-edited file with an unknown name degrades to the
/// default instead of failing deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UiPrefs {
    pub view_mode: Option<String>,
}

/// Platform config directory for the app, if one can be determined.
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "Ganttboard")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

fn prefs_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("prefs.json"))
}

/// Load preferences; any failure falls back to defaults.
pub fn load() -> UiPrefs {
    let Some(path) = prefs_path() else {
        return UiPrefs::default();
    };
    match std::fs::read_to_string(&path) {
        Ok(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "malformed prefs file, using defaults");
            UiPrefs::default()
        }),
        Err(_) => UiPrefs::default(),
    }
}

/// Persist preferences; failures are logged, never surfaced.
pub fn save(prefs: &UiPrefs) {
    let Some(path) = prefs_path() else { return };
    if let Some(dir) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(dir) {
            tracing::warn!(error = %e, "could not create config dir");
            return;
        }
    }
    match serde_json::to_string_pretty(prefs) {
        Ok(json) => {
            if let Err(e) = std::fs::write(&path, json) {
                tracing::warn!(error = %e, "could not write prefs");
            }
        }
        Err(e) => tracing::warn!(error = %e, "could not serialize prefs"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ViewMode;

    #[test]
    fn prefs_serialize_the_view_mode_by_name() {
        let prefs = UiPrefs {
            view_mode: Some(ViewMode::Month.label().to_string()),
        };
        let json = serde_json::to_string(&prefs).unwrap();
        let back: UiPrefs = serde_json::from_str(&json).unwrap();
        assert_eq!(
            back.view_mode.as_deref().map(ViewMode::from_name).unwrap().ok(),
            Some(ViewMode::Month)
        );
    }

    #[test]
    fn unknown_mode_names_still_deserialize() {
        let back: UiPrefs = serde_json::from_str(r#"{"view_mode":"Fortnight"}"#).unwrap();
        assert!(ViewMode::from_name(back.view_mode.as_deref().unwrap()).is_err());
    }
}
