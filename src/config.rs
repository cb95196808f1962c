// Editor configuration
// Read from <config dir>/pressroom/editor.toml; every field has a default.

use crate::history::DEFAULT_HISTORY_CAPACITY;
use crate::richtext::paste::PasteOptions;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file at {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Number of values kept for undo/redo
    pub history_capacity: usize,
    /// Shown while the editor is empty, unless the host passes its own
    pub placeholder: String,
    pub paste: PasteConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PasteConfig {
    /// Lines holding only whitespace separate paragraphs like empty lines
    pub blank_whitespace_lines: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        EditorConfig {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            placeholder: String::new(),
            paste: PasteConfig::default(),
        }
    }
}

impl Default for PasteConfig {
    fn default() -> Self {
        PasteConfig {
            blank_whitespace_lines: PasteOptions::default().blank_whitespace_lines,
        }
    }
}

impl EditorConfig {
    /// Load the config from the user's config directory.
    /// A missing file yields the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::config_path() {
            Some(path) => Self::load_from_path(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "pressroom").map(|dirs| dirs.config_dir().join("editor.toml"))
    }

    pub fn paste_options(&self) -> PasteOptions {
        PasteOptions {
            blank_whitespace_lines: self.paste.blank_whitespace_lines,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = EditorConfig::default();
        assert_eq!(config.history_capacity, 50);
        assert_eq!(config.placeholder, "");
        assert!(config.paste.blank_whitespace_lines);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = EditorConfig::load_from_path(&dir.path().join("editor.toml")).unwrap();
        assert_eq!(config, EditorConfig::default());
    }

    #[test]
    fn test_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("editor.toml");
        fs::write(
            &path,
            "history_capacity = 10\n\n[paste]\nblank_whitespace_lines = false\n",
        )
        .unwrap();

        let config = EditorConfig::load_from_path(&path).unwrap();
        assert_eq!(config.history_capacity, 10);
        assert_eq!(config.placeholder, "");
        assert!(!config.paste_options().blank_whitespace_lines);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("editor.toml");
        fs::write(&path, "history_capacity = \"many\"").unwrap();

        let err = EditorConfig::load_from_path(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("editor.toml"));
    }
}
