//! Temporary snippet directories and configuration files.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::config::EngineConfig;

/// A temporary directory holding `snippets/` and a `config.toml`.
///
/// Everything is removed when the environment is dropped.
pub struct TestEnvironment {
    temp_dir: TempDir,
}

impl TestEnvironment {
    /// Create an empty environment with a `snippets/` directory.
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new().context("Failed to create temp directory")?;
        fs::create_dir_all(temp_dir.path().join("snippets"))?;
        Ok(Self {
            temp_dir,
        })
    }

    /// Root of the environment.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// The snippet directory.
    pub fn snippet_dir(&self) -> PathBuf {
        self.path().join("snippets")
    }

    /// Path of a file relative to the snippet directory.
    pub fn snippet_path(&self, relative: &str) -> PathBuf {
        self.snippet_dir().join(relative)
    }

    /// Path of the configuration file written by [`Self::write_config`].
    pub fn config_path(&self) -> PathBuf {
        self.path().join("config.toml")
    }

    /// Write a snippet file below the snippet directory, creating parent directories.
    pub fn add_snippet_file(&self, relative: &str, content: &str) -> Result<PathBuf> {
        let path = self.snippet_path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    /// Write `config.toml` pointing at the snippet directory, with extra TOML appended.
    pub fn write_config(&self, extra: &str) -> Result<PathBuf> {
        let dir = self.snippet_dir().display().to_string();
        let content = format!("snippet_dirs = [{dir:?}]\n{extra}");
        let path = self.config_path();
        fs::write(&path, content)?;
        Ok(path)
    }

    /// Load the configuration written by [`Self::write_config`].
    pub fn load_config(&self) -> Result<EngineConfig> {
        EngineConfig::load_from(&self.config_path())
    }
}
