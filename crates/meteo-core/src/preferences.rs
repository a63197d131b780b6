//! Persisted widget preferences.
//!
//! A single JSON document stored under the fixed key `weatherApp`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Storage key, also used as the file stem.
pub const STORAGE_KEY: &str = "weatherApp";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default)]
    pub dark_mode: bool,
}

impl Preferences {
    pub fn theme(&self) -> &'static str {
        if self.dark_mode {
            "dark"
        } else {
            "light"
        }
    }
}

/// File-backed store for [`Preferences`].
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    /// Store living in `dir`, as `dir/weatherApp.json`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(format!("{}.json", STORAGE_KEY)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read preferences. A missing or unreadable document yields the defaults.
    pub fn load(&self) -> Preferences {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(_) => return Preferences::default(),
        };

        match serde_json::from_str(&contents) {
            Ok(prefs) => prefs,
            Err(e) => {
                tracing::warn!(
                    "Ignoring malformed preferences at {}: {}",
                    self.path.display(),
                    e
                );
                Preferences::default()
            }
        }
    }

    pub fn save(&self, prefs: &Preferences) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create preferences directory")?;
        }
        let contents = serde_json::to_string(prefs).context("Failed to serialize preferences")?;
        std::fs::write(&self.path, contents).context("Failed to write preferences")?;
        Ok(())
    }

    /// Flip dark mode, persist, and return the new state.
    pub fn toggle_dark_mode(&self, prefs: &mut Preferences) -> Result<bool> {
        prefs.dark_mode = !prefs.dark_mode;
        self.save(prefs)?;
        tracing::debug!("Theme switched to {}", prefs.theme());
        Ok(prefs.dark_mode)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferenceStore::in_dir(dir.path());
        assert_eq!(store.load(), Preferences::default());
        assert_eq!(store.load().theme(), "light");
    }

    #[test]
    fn test_toggle_persists() {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferenceStore::in_dir(dir.path());
        let mut prefs = store.load();

        assert!(store.toggle_dark_mode(&mut prefs).unwrap());
        assert_eq!(store.load(), Preferences { dark_mode: true });

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(raw, r#"{"darkMode":true}"#);

        assert!(!store.toggle_dark_mode(&mut prefs).unwrap());
        assert!(!store.load().dark_mode);
    }

    #[test]
    fn test_malformed_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferenceStore::in_dir(dir.path());
        std::fs::write(store.path(), "{not json").unwrap();
        assert_eq!(store.load(), Preferences::default());
    }
}
