//! Filetype to snippet-file bookkeeping.
//!
//! [`SnippetPathCache`] records which snippet files belong to which filetype and which
//! filetypes have already been loaded. It is an explicit service object: the loader
//! receives it by `&mut` reference instead of consulting global state.
//!
//! # Lifecycle
//!
//! | Operation | Paths | Loaded set |
//! |-----------|-------|------------|
//! | [`clean`](SnippetPathCache::clean) | cleared | kept |
//! | [`cleanup`](SnippetPathCache::cleanup) | cleared | cleared |
//!
//! `clean` is what a reload does: paths are rediscovered, but a filetype that was
//! loaded before is not lazily loaded a second time.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Filetype → snippet file paths, plus the set of filetypes already loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnippetPathCache {
    paths: BTreeMap<String, Vec<PathBuf>>,
    loaded: BTreeSet<String>,
}

impl SnippetPathCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `path` as a snippet file of `filetype`.
    ///
    /// Returns `false` if the path was already registered for that filetype.
    pub fn register(&mut self, filetype: &str, path: impl Into<PathBuf>) -> bool {
        let path = path.into();
        let entry = self.paths.entry(filetype.to_string()).or_default();
        if entry.contains(&path) {
            return false;
        }
        tracing::trace!("Registered {} for filetype '{filetype}'", path.display());
        entry.push(path);
        true
    }

    /// Snippet files of `filetype`, in registration order.
    pub fn paths(&self, filetype: &str) -> &[PathBuf] {
        self.paths.get(filetype).map_or(&[], Vec::as_slice)
    }

    /// Filetypes with at least one registered path.
    pub fn filetypes(&self) -> impl Iterator<Item = &str> {
        self.paths.keys().map(String::as_str)
    }

    /// Filetypes whose registered paths include `path`.
    pub fn filetypes_of(&self, path: &Path) -> Vec<&str> {
        self.paths
            .iter()
            .filter(|(_, paths)| paths.iter().any(|p| p == path))
            .map(|(filetype, _)| filetype.as_str())
            .collect()
    }

    /// Record that `filetype` has been loaded.
    ///
    /// Returns `false` if it was already marked.
    pub fn mark_loaded(&mut self, filetype: &str) -> bool {
        self.loaded.insert(filetype.to_string())
    }

    /// Whether `filetype` has been loaded.
    pub fn is_loaded(&self, filetype: &str) -> bool {
        self.loaded.contains(filetype)
    }

    /// Loaded filetypes, sorted.
    pub fn loaded(&self) -> impl Iterator<Item = &str> {
        self.loaded.iter().map(String::as_str)
    }

    /// Forget every path but keep the loaded set.
    pub fn clean(&mut self) {
        tracing::debug!("Cleaning snippet path cache ({} filetypes)", self.paths.len());
        self.paths.clear();
    }

    /// Reset the cache completely.
    pub fn cleanup(&mut self) {
        tracing::debug!("Resetting snippet path cache");
        self.paths.clear();
        self.loaded.clear();
    }
}
