//! Configuration loading.
//!
//! A small TOML file can rename the role fields (time, level, message) for
//! log files that use different names, and size the record cache. The file
//! is either passed explicitly, or discovered as `.jlv.toml` in the working
//! directory and `jlv/config.toml` under the user config directory.
//! Command-line flags override whatever the file says.

use crate::error::{JlvError, Result};
use crate::file::RoleTags;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = ".jlv.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Field name carrying the record timestamp.
    pub time_tag: Option<String>,
    /// Field name carrying the record severity.
    pub level_tag: Option<String>,
    /// Field name carrying the record message.
    pub message_tag: Option<String>,
    /// Record cache capacity.
    pub cache_size: Option<usize>,
}

impl Config {
    /// Load the explicit file, or the first discovered one, or the defaults
    /// when no config exists anywhere.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        for path in Self::discover() {
            if path.is_file() {
                log::debug!("using configuration from {}", path.display());
                return Self::from_file(&path);
            }
        }
        Ok(Self::default())
    }

    fn discover() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("jlv").join("config.toml"));
        }
        paths
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| JlvError::config(format!("{}: {}", path.display(), e)))?;
        toml::from_str(&text).map_err(|e| JlvError::config(format!("{}: {}", path.display(), e)))
    }

    /// Resolve the role mapping: command-line overrides win over the config
    /// file, which wins over the built-in defaults.
    pub fn merged_roles(
        &self,
        time: Option<String>,
        level: Option<String>,
        message: Option<String>,
    ) -> RoleTags {
        let defaults = RoleTags::default();
        RoleTags {
            time: time.or_else(|| self.time_tag.clone()).unwrap_or(defaults.time),
            level: level
                .or_else(|| self.level_tag.clone())
                .unwrap_or(defaults.level),
            message: message
                .or_else(|| self.message_tag.clone())
                .unwrap_or(defaults.message),
        }
    }
}
