//! Engine configuration file (`~/.snipkit/config.toml`).
//!
//! ```toml
//! # Text shown for function nodes that could not be evaluated in previews
//! unresolved_text = ""
//!
//! # Directories searched for `<filetype>.toml` snippet files
//! snippet_dirs = ["~/.config/snipkit/snippets"]
//!
//! # Report failed computations as warnings (otherwise debug)
//! log_failures = true
//!
//! # Filetypes that also load the snippets of other filetypes
//! [filetype_extends]
//! cpp = ["c"]
//! typescript = ["javascript"]
//! ```
//!
//! Every field is optional; a missing file yields [`EngineConfig::default`].
//! The location can be overridden with the `SNIPKIT_CONFIG` environment variable.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::parse_config;
use crate::core::SnipError;

/// Environment variable overriding the configuration path.
pub const CONFIG_ENV: &str = "SNIPKIT_CONFIG";

const fn default_log_failures() -> bool {
    true
}

/// Configuration of the engine and the snippet loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Text that previews render for function nodes that are unresolved or failed.
    #[serde(default)]
    pub unresolved_text: String,

    /// Directories searched for snippet files, in priority order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub snippet_dirs: Vec<PathBuf>,

    /// Filetype inheritance: `cpp = ["c"]` makes `cpp` buffers load `c` snippets too.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub filetype_extends: BTreeMap<String, Vec<String>>,

    /// Log evaluation failures at `warn` level instead of `debug`.
    #[serde(default = "default_log_failures")]
    pub log_failures: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            unresolved_text: String::new(),
            snippet_dirs: Vec::new(),
            filetype_extends: BTreeMap::new(),
            log_failures: default_log_failures(),
        }
    }
}

impl EngineConfig {
    /// Load from the default location, or defaults if there is no file.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined or the file
    /// exists but is invalid.
    pub fn load() -> Result<Self> {
        Self::load_with_optional(None)
    }

    /// Load from `path` if given, else from the default location.
    ///
    /// A file that does not exist yields the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => Self::default_path()?,
        };
        if path.exists() {
            Self::load_from(&path)
        } else {
            tracing::debug!("No config file at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Load from a specific file.
    ///
    /// Relative `snippet_dirs` are resolved against the directory of the file and a
    /// leading `~` is expanded to the home directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config: Self = parse_config(path)?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.snippet_dirs = config
            .snippet_dirs
            .iter()
            .map(|dir| resolve_dir(base, dir))
            .collect::<Result<Vec<_>>>()
            .with_context(|| format!("Invalid snippet_dirs in {}", path.display()))?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// The configuration path: `SNIPKIT_CONFIG` if set, else `~/.snipkit/config.toml`.
    ///
    /// On Windows the default is `%LOCALAPPDATA%\snipkit\config.toml`.
    ///
    /// # Errors
    ///
    /// Returns an error if the home (or local data) directory cannot be determined.
    pub fn default_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV)
            && !path.is_empty()
        {
            return Ok(PathBuf::from(path));
        }

        let config_dir = if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine local data directory"))?
                .join("snipkit")
        } else {
            dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?
                .join(".snipkit")
        };

        Ok(config_dir.join("config.toml"))
    }

    /// `filetype` followed by everything it extends, transitively, without repeats.
    pub fn filetypes_for(&self, filetype: &str) -> Vec<String> {
        let mut result = vec![filetype.to_string()];
        let mut index = 0;
        while index < result.len() {
            if let Some(parents) = self.filetype_extends.get(&result[index]) {
                for parent in parents {
                    if !result.contains(parent) {
                        result.push(parent.clone());
                    }
                }
            }
            index += 1;
        }
        result
    }
}

fn resolve_dir(base: &Path, dir: &Path) -> Result<PathBuf> {
    if let Ok(rest) = dir.strip_prefix("~") {
        let home = dirs::home_dir().ok_or_else(|| SnipError::ConfigError {
            message: format!("Cannot expand '~' in {}: no home directory", dir.display()),
        })?;
        return Ok(home.join(rest));
    }
    if dir.is_relative() {
        Ok(base.join(dir))
    } else {
        Ok(dir.to_path_buf())
    }
}
