//! Scan configuration loaded from a YAML file.
//!
//! The file carries the extension whitelist and the directory/file
//! blacklists. A missing file yields the default (empty) configuration;
//! the empty-whitelist check happens in the run pipeline, before any
//! indexing.

use crate::error::{AuditError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub whitelist: WhitelistConfig,
    pub blacklist: BlacklistConfig,
}

/// File extensions eligible for scanning.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WhitelistConfig {
    pub extensions: Vec<String>,
}

/// Directory names pruned anywhere in the tree, and file basenames always
/// excluded regardless of directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BlacklistConfig {
    pub directories: HashSet<String>,
    pub files: HashSet<String>,
}

impl Config {
    /// Load configuration from `path`. A missing file is not an error;
    /// a malformed file is.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|e| AuditError::ReadError {
            path: path.display().to_string(),
            source: e,
        })?;
        serde_yaml::from_str(&content).map_err(|e| AuditError::YamlParse {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Whitelisted extensions, lower-cased for case-insensitive lookup.
    pub fn whitelisted_extensions(&self) -> HashSet<String> {
        self.whitelist
            .extensions
            .iter()
            .map(|e| e.to_lowercase())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_file_returns_default() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(&dir.path().join("nope.yaml")).unwrap();
        assert!(config.whitelist.extensions.is_empty());
        assert!(config.blacklist.directories.is_empty());
    }

    #[test]
    fn test_load_full_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ai-audit.yaml");
        fs::write(
            &path,
            "whitelist:\n  extensions: [\".py\", \".JS\"]\nblacklist:\n  directories: [node_modules, .git]\n  files: [package-lock.json]\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.whitelist.extensions.len(), 2);
        assert!(config.blacklist.directories.contains("node_modules"));
        assert!(config.blacklist.files.contains("package-lock.json"));
    }

    #[test]
    fn test_whitelisted_extensions_lowercased() {
        let config = Config {
            whitelist: WhitelistConfig {
                extensions: vec![".PY".to_string(), ".Js".to_string()],
            },
            blacklist: BlacklistConfig::default(),
        };
        let exts = config.whitelisted_extensions();
        assert!(exts.contains(".py"));
        assert!(exts.contains(".js"));
        assert!(!exts.contains(".PY"));
    }

    #[test]
    fn test_load_malformed_yaml_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.yaml");
        fs::write(&path, "whitelist: [not: a: mapping\n").unwrap();
        assert!(matches!(
            Config::load(&path),
            Err(AuditError::YamlParse { .. })
        ));
    }
}
