//! Named transforms for function nodes in snippet files.
//!
//! A snippet file cannot carry code, so its function nodes name a transform from a
//! [`TransformRegistry`] instead. The builtins:
//!
//! | Name | Result |
//! |------|--------|
//! | `copy` | the first argument |
//! | `concat` | all arguments concatenated |
//! | `upper` / `lower` | concatenation, case-converted |
//! | `trim` | concatenation without surrounding whitespace |
//! | `join` | arguments joined with `separator` (default a space) |
//! | `require` | concatenation; fails while it is empty |

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::bail;

use crate::core::SnipError;
use crate::snippet::text::{append_lines, empty_lines, join_lines, lines_from};
use crate::snippet::{Computation, Lines};

/// Per-node parameters of a transform.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformParams {
    /// Separator used by `join`.
    pub separator: Option<String>,
}

/// A transform implementation.
pub type Transform = Arc<dyn Fn(&[Lines], &TransformParams) -> anyhow::Result<Lines> + Send + Sync>;

/// Transforms available to snippet files, by name.
#[derive(Clone)]
pub struct TransformRegistry {
    transforms: BTreeMap<String, Transform>,
}

impl std::fmt::Debug for TransformRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformRegistry").field("names", &self.names()).finish()
    }
}

impl Default for TransformRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl TransformRegistry {
    /// A registry without any transforms.
    pub fn empty() -> Self {
        Self {
            transforms: BTreeMap::new(),
        }
    }

    /// A registry with the builtin transforms.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register("copy", |args, _| Ok(args.first().cloned().unwrap_or_else(empty_lines)));
        registry.register("concat", |args, _| Ok(concat(args)));
        registry.register("upper", |args, _| {
            Ok(concat(args).iter().map(|line| line.to_uppercase()).collect())
        });
        registry.register("lower", |args, _| {
            Ok(concat(args).iter().map(|line| line.to_lowercase()).collect())
        });
        registry.register("trim", |args, _| Ok(lines_from(join_lines(&concat(args)).trim())));
        registry.register("join", |args, params| {
            let separator = params.separator.as_deref().unwrap_or(" ");
            let parts: Vec<String> = args.iter().map(|arg| join_lines(arg)).collect();
            Ok(lines_from(&parts.join(separator)))
        });
        registry.register("require", |args, _| {
            let value = concat(args);
            if join_lines(&value).trim().is_empty() {
                bail!("required value is empty");
            }
            Ok(value)
        });
        registry
    }

    /// Register (or replace) a transform.
    pub fn register<F>(&mut self, name: &str, transform: F)
    where
        F: Fn(&[Lines], &TransformParams) -> anyhow::Result<Lines> + Send + Sync + 'static,
    {
        self.transforms.insert(name.to_string(), Arc::new(transform));
    }

    /// Whether a transform with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.transforms.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.transforms.keys().cloned().collect()
    }

    /// Bind a transform to its parameters, producing a node computation.
    ///
    /// # Errors
    ///
    /// Returns [`SnipError::UnknownTransform`] if no transform has this name.
    pub fn computation(
        &self,
        name: &str,
        params: TransformParams,
    ) -> Result<Computation, SnipError> {
        let transform = self.transforms.get(name).cloned().ok_or_else(|| {
            SnipError::UnknownTransform {
                name: name.to_string(),
                available: self.names(),
            }
        })?;
        Ok(Arc::new(move |args: &[Lines]| transform(args, &params)))
    }
}

fn concat(args: &[Lines]) -> Lines {
    let mut out = empty_lines();
    for arg in args {
        append_lines(&mut out, arg);
    }
    out
}
