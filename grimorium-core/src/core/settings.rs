//! Tunables for the hierarchy editor, persisted as JSON.
//!
//! Stored at an OS-appropriate location; a missing or corrupt file falls
//! back to defaults.

use crate::core::drop_zone::DEFAULT_GAP_SIZE;
use crate::{PurgeStrategy, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HierarchySettings {
    /// Height in pixels of the before/after bands around each row.
    pub gap_size: f32,
    /// Expand every region when a forest is (re)loaded.
    pub expand_on_load: bool,
    /// How many hierarchy operations the store keeps in its log.
    pub operation_log_keep_last: usize,
}

impl Default for HierarchySettings {
    fn default() -> Self {
        Self {
            gap_size: DEFAULT_GAP_SIZE,
            expand_on_load: true,
            operation_log_keep_last: 1000,
        }
    }
}

impl HierarchySettings {
    /// The operation log retention these settings ask for.
    #[must_use]
    pub fn purge_strategy(&self) -> PurgeStrategy {
        PurgeStrategy::LocalOnly {
            keep_last: self.operation_log_keep_last,
        }
    }
}

/// Returns the path to the settings JSON file.
///
/// - macOS / Linux: `~/.config/grimorium/hierarchy.json`
/// - Windows: `%APPDATA%/Grimorium/hierarchy.json`
pub fn settings_file_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        base.join("Grimorium").join("hierarchy.json")
    }
    #[cfg(not(target_os = "windows"))]
    {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".config").join("grimorium").join("hierarchy.json")
    }
}

/// Loads settings from the default location.
pub fn load_settings() -> HierarchySettings {
    load_settings_from(settings_file_path())
}

/// Loads settings from `path`; returns defaults if the file is missing or corrupt.
pub fn load_settings_from<P: AsRef<Path>>(path: P) -> HierarchySettings {
    let path = path.as_ref();
    match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            log::warn!("ignoring unreadable settings at {}: {e}", path.display());
            HierarchySettings::default()
        }),
        Err(_) => HierarchySettings::default(),
    }
}

/// Saves settings to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`crate::GrimoriumError::Io`] or [`crate::GrimoriumError::Json`].
pub fn save_settings_to<P: AsRef<Path>>(path: P, settings: &HierarchySettings) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(settings)?;
    fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = load_settings_from(dir.path().join("absent.json"));
        assert_eq!(settings, HierarchySettings::default());
        assert_eq!(settings.gap_size, 28.0);
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("hierarchy.json");
        let settings = HierarchySettings {
            gap_size: 12.0,
            ..HierarchySettings::default()
        };
        save_settings_to(&path, &settings).unwrap();
        assert_eq!(load_settings_from(&path), settings);
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hierarchy.json");
        fs::write(&path, r#"{ "expandOnLoad": false }"#).unwrap();
        let settings = load_settings_from(&path);
        assert!(!settings.expand_on_load);
        assert_eq!(settings.gap_size, DEFAULT_GAP_SIZE);
    }

    #[test]
    fn test_purge_strategy_follows_keep_last() {
        let settings = HierarchySettings {
            operation_log_keep_last: 7,
            ..HierarchySettings::default()
        };
        assert!(matches!(
            settings.purge_strategy(),
            PurgeStrategy::LocalOnly { keep_last: 7 }
        ));
    }

    #[test]
    fn test_corrupt_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hierarchy.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(load_settings_from(&path), HierarchySettings::default());
    }
}
