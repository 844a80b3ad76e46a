//! Loading snippets from TOML files.
//!
//! Snippet files are looked up per filetype in the configured snippet directories:
//! a file `<filetype>.toml` anywhere below a directory, or any `*.toml` file inside a
//! `<filetype>/` directory. Discovered paths are recorded in a [`SnippetPathCache`],
//! which also remembers which filetypes were loaded so that lazy loading happens once.
//!
//! # Examples
//!
//! ```rust,no_run
//! use snipkit::cache::SnippetPathCache;
//! use snipkit::config::EngineConfig;
//! use snipkit::loader::SnippetLoader;
//!
//! # fn example() -> anyhow::Result<()> {
//! let config = EngineConfig::load()?;
//! let loader = SnippetLoader::default();
//! let mut cache = SnippetPathCache::new();
//!
//! for snippet in loader.load_filetype(&mut cache, &config, "rust")? {
//!     println!("{}", snippet.trigger());
//! }
//! # Ok(())
//! # }
//! ```

mod format;
mod transforms;

pub use format::{ArgSpec, NodeSpec, SnippetFile, SnippetSpec};
pub use transforms::{Transform, TransformParams, TransformRegistry};

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::cache::SnippetPathCache;
use crate::config::EngineConfig;
use crate::core::SnipError;
use crate::snippet::Snippet;

/// Reads snippet files and compiles their snippets.
#[derive(Debug, Clone, Default)]
pub struct SnippetLoader {
    registry: TransformRegistry,
}

impl SnippetLoader {
    /// Create a loader resolving function transforms against `registry`.
    pub const fn new(registry: TransformRegistry) -> Self {
        Self {
            registry,
        }
    }

    /// The transform registry.
    pub const fn registry(&self) -> &TransformRegistry {
        &self.registry
    }

    /// Parse and compile every snippet of a TOML document.
    ///
    /// `origin` names the document in error messages.
    ///
    /// # Errors
    ///
    /// Returns [`SnipError::SnippetFileParse`] for invalid TOML and the first
    /// definition error otherwise, with the origin as context.
    pub fn parse_str(&self, content: &str, origin: &str) -> Result<Vec<Snippet>> {
        let file: SnippetFile = toml::from_str(content).map_err(|e| SnipError::SnippetFileParse {
            file: origin.to_string(),
            reason: e.message().to_string(),
        })?;

        file.snippets
            .iter()
            .map(|spec| {
                let definition = spec
                    .to_definition(&self.registry)
                    .with_context(|| format!("Invalid snippet '{}' in {origin}", spec.trigger))?;
                Snippet::compile(&definition)
                    .map_err(SnipError::from)
                    .with_context(|| format!("Invalid snippet '{}' in {origin}", spec.trigger))
            })
            .collect()
    }

    /// Parse and compile every snippet of a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or [`parse_str`](Self::parse_str)
    /// fails.
    pub fn load_file(&self, path: &Path) -> Result<Vec<Snippet>> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read snippet file: {}", path.display()))?;
        let snippets = self.parse_str(&content, &path.display().to_string())?;
        tracing::debug!("Loaded {} snippets from {}", snippets.len(), path.display());
        Ok(snippets)
    }

    /// Check every snippet of a file, collecting all errors instead of stopping.
    ///
    /// Returns the triggers that compiled and one error per snippet that did not.
    ///
    /// # Errors
    ///
    /// Returns an error only if the file cannot be read or is not valid TOML.
    pub fn check_file(&self, path: &Path) -> Result<(Vec<String>, Vec<anyhow::Error>)> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read snippet file: {}", path.display()))?;
        let origin = path.display().to_string();
        let file: SnippetFile = toml::from_str(&content).map_err(|e| SnipError::SnippetFileParse {
            file: origin.clone(),
            reason: e.message().to_string(),
        })?;

        let mut valid = Vec::new();
        let mut errors = Vec::new();
        for spec in &file.snippets {
            let compiled = spec
                .to_definition(&self.registry)
                .and_then(|definition| Snippet::compile(&definition).map_err(SnipError::from));
            match compiled {
                Ok(snippet) => valid.push(snippet.trigger().to_string()),
                Err(error) => errors.push(
                    anyhow::Error::from(error)
                        .context(format!("Invalid snippet '{}' in {origin}", spec.trigger)),
                ),
            }
        }
        Ok((valid, errors))
    }

    /// Find the snippet files of `filetype` below `dirs` and register them in `cache`.
    ///
    /// Missing directories are skipped. Returns the number of newly registered paths.
    pub fn discover(
        &self,
        cache: &mut SnippetPathCache,
        dirs: &[PathBuf],
        filetype: &str,
    ) -> usize {
        let file_name = format!("{filetype}.toml");
        let mut registered = 0;

        for dir in dirs {
            if !dir.is_dir() {
                tracing::debug!("Skipping missing snippet directory {}", dir.display());
                continue;
            }

            let mut found: Vec<PathBuf> = WalkDir::new(dir)
                .follow_links(false)
                .into_iter()
                .filter_map(std::result::Result::ok)
                .filter(|entry| entry.file_type().is_file())
                .map(walkdir::DirEntry::into_path)
                .filter(|path| {
                    let by_name = path.file_name().is_some_and(|name| name == file_name.as_str());
                    let in_folder = path.extension().is_some_and(|ext| ext == "toml")
                        && path
                            .parent()
                            .and_then(Path::file_name)
                            .is_some_and(|parent| parent == filetype);
                    by_name || in_folder
                })
                .collect();
            found.sort();

            for path in found {
                if cache.register(filetype, path) {
                    registered += 1;
                }
            }
        }

        tracing::debug!("Discovered {registered} snippet files for filetype '{filetype}'");
        registered
    }

    /// Load the snippets of `filetype` and of every filetype it extends.
    ///
    /// Filetypes already marked loaded in `cache` are skipped, so calling this twice
    /// returns the snippets only once. Snippets of `filetype` itself come first.
    ///
    /// # Errors
    ///
    /// Returns the first error of any discovered file; filetypes loaded before the
    /// failing one stay marked.
    pub fn load_filetype(
        &self,
        cache: &mut SnippetPathCache,
        config: &EngineConfig,
        filetype: &str,
    ) -> Result<Vec<Snippet>> {
        let mut snippets = Vec::new();
        for current in config.filetypes_for(filetype) {
            if cache.is_loaded(&current) {
                tracing::trace!("Filetype '{current}' already loaded");
                continue;
            }
            self.discover(cache, &config.snippet_dirs, &current);
            for path in cache.paths(&current).to_vec() {
                snippets.extend(self.load_file(&path)?);
            }
            cache.mark_loaded(&current);
        }
        Ok(snippets)
    }
}

/// Find the snippet with `trigger` among `snippets`.
///
/// # Errors
///
/// Returns [`SnipError::SnippetNotFound`] naming `origin` if there is none.
pub fn find_snippet<'a>(
    snippets: &'a [Snippet],
    trigger: &str,
    origin: &str,
) -> Result<&'a Snippet, SnipError> {
    snippets.iter().find(|snippet| snippet.trigger() == trigger).ok_or_else(|| {
        SnipError::SnippetNotFound {
            trigger: trigger.to_string(),
            file: origin.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DefinitionError;
    use crate::snippet::text::lines_from;
    use tempfile::tempdir;

    const ARROW: &str = r#"
[[snippet]]
trigger = "arrow"
nodes = [
    { type = "insert", index = 1, text = "a" },
    { type = "text", text = " -> " },
    { type = "function", transform = "copy", args = [1] },
]
"#;

    #[test]
    fn test_parse_str_compiles() {
        let snippets = SnippetLoader::default().parse_str(ARROW, "inline").unwrap();
        assert_eq!(snippets.len(), 1);
        assert_eq!(snippets[0].static_text(), lines_from("a -> a"));
    }

    #[test]
    fn test_parse_error_names_origin() {
        let err = SnippetLoader::default().parse_str("[[snippet]\n", "broken.toml").unwrap_err();
        match err.downcast_ref::<SnipError>() {
            Some(SnipError::SnippetFileParse {
                file,
                ..
            }) => assert_eq!(file, "broken.toml"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_definition_error_has_context() {
        let content = r#"
[[snippet]]
trigger = "bad"
nodes = [{ type = "function", transform = "copy", args = [4] }]
"#;
        let err = SnippetLoader::default().parse_str(content, "bad.toml").unwrap_err();
        assert!(format!("{err}").contains("Invalid snippet 'bad' in bad.toml"));
        assert!(err.chain().any(|cause| matches!(
            cause.downcast_ref::<SnipError>(),
            Some(SnipError::Definition(DefinitionError::UnknownTabstop { index: 4, .. }))
        )));
    }

    #[test]
    fn test_check_file_collects_all_errors() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("mixed.toml");
        std::fs::write(
            &path,
            format!(
                "{ARROW}\n[[snippet]]\ntrigger = \"dup\"\n\
                 nodes = [{{ type = \"insert\", index = 1 }}, \
                 {{ type = \"insert\", index = 1 }}]\n\n\
                 [[snippet]]\ntrigger = \"\"\n"
            ),
        )
        .unwrap();

        let (valid, errors) = SnippetLoader::default().check_file(&path).unwrap();
        assert_eq!(valid, vec!["arrow".to_string()]);
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_discover_by_name_and_folder() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        std::fs::create_dir_all(root.join("nested")).unwrap();
        std::fs::create_dir_all(root.join("rust")).unwrap();
        std::fs::write(root.join("nested/rust.toml"), ARROW).unwrap();
        std::fs::write(root.join("rust/extra.toml"), ARROW).unwrap();
        std::fs::write(root.join("python.toml"), ARROW).unwrap();

        let loader = SnippetLoader::default();
        let mut cache = SnippetPathCache::new();
        let dirs = vec![root.to_path_buf(), root.join("missing")];

        assert_eq!(loader.discover(&mut cache, &dirs, "rust"), 2);
        assert_eq!(loader.discover(&mut cache, &dirs, "rust"), 0);
        assert_eq!(cache.paths("rust").len(), 2);
    }

    #[test]
    fn test_load_filetype_once_with_extends() {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join("c.toml"), ARROW).unwrap();
        std::fs::write(
            temp.path().join("cpp.toml"),
            ARROW.replace("\"arrow\"", "\"cpparrow\""),
        )
        .unwrap();

        let mut config = EngineConfig {
            snippet_dirs: vec![temp.path().to_path_buf()],
            ..EngineConfig::default()
        };
        config.filetype_extends.insert("cpp".into(), vec!["c".into()]);

        let loader = SnippetLoader::default();
        let mut cache = SnippetPathCache::new();
        let snippets = loader.load_filetype(&mut cache, &config, "cpp").unwrap();
        let triggers: Vec<&str> = snippets.iter().map(Snippet::trigger).collect();
        assert_eq!(triggers, vec!["cpparrow", "arrow"]);
        assert!(cache.is_loaded("c"));

        assert!(loader.load_filetype(&mut cache, &config, "cpp").unwrap().is_empty());

        // A reload rediscovers paths but keeps the loaded set
        cache.clean();
        assert!(loader.load_filetype(&mut cache, &config, "c").unwrap().is_empty());
        cache.cleanup();
        assert_eq!(loader.load_filetype(&mut cache, &config, "c").unwrap().len(), 1);
    }

    #[test]
    fn test_find_snippet() {
        let snippets = SnippetLoader::default().parse_str(ARROW, "inline").unwrap();
        assert!(find_snippet(&snippets, "arrow", "inline").is_ok());
        assert!(matches!(
            find_snippet(&snippets, "nope", "inline"),
            Err(SnipError::SnippetNotFound { .. })
        ));
    }
}
