//! Author-facing snippet definitions.
//!
//! A [`SnippetDefinition`] is the tree literal a snippet author writes, either through
//! the constructors on [`NodeDefinition`] or by loading a TOML file (see
//! [`crate::loader`]). Definitions are plain data: they are validated and flattened
//! by [`Snippet::compile`](super::Snippet::compile) and never mutated afterwards.
//!
//! # Examples
//!
//! ```rust
//! use snipkit::snippet::{ArgRef, NodeDefinition as N, SnippetDefinition};
//!
//! let definition = SnippetDefinition::new(
//!     "arrow",
//!     vec![
//!         N::insert(1, "a"),
//!         N::text(" -> "),
//!         N::function([ArgRef::rel(1)], |args| Ok(args[0].clone())),
//!     ],
//! );
//! assert_eq!(definition.trigger(), "arrow");
//! ```

use std::fmt;
use std::sync::Arc;

use super::address::ArgRef;
use super::text::{Lines, lines_from};

/// Pure computation of a function node: argument texts in, rendered lines out.
///
/// Computations must be free of side effects. Returning an error marks the node as
/// failed for the current update; it keeps its previous text and is retried later.
pub type Computation = Arc<dyn Fn(&[Lines]) -> anyhow::Result<Lines> + Send + Sync>;

/// Definition of a function node.
#[derive(Clone)]
pub struct FunctionDefinition {
    pub(crate) compute: Computation,
    pub(crate) args: Vec<ArgRef>,
    pub(crate) label: Option<String>,
}

impl FunctionDefinition {
    /// Argument references, in the order the computation receives them.
    pub fn args(&self) -> &[ArgRef] {
        &self.args
    }

    /// Optional human-readable name of the computation (e.g. the transform name).
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

impl fmt::Debug for FunctionDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionDefinition")
            .field("args", &self.args)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// One node of a snippet definition tree.
#[derive(Debug, Clone)]
pub enum NodeDefinition {
    /// Static text.
    Text(Lines),
    /// User-editable tabstop with its placeholder text.
    ///
    /// The index is `None` only for the root node of a choice branch.
    Insert {
        /// Tabstop index within the enclosing snippet scope.
        index: Option<u32>,
        /// Initial text.
        placeholder: Lines,
    },
    /// Text computed from other nodes.
    Function(FunctionDefinition),
    /// Alternatives of which exactly one is live at a time.
    Choice {
        /// Tabstop index within the enclosing snippet scope.
        index: u32,
        /// Branch root nodes, addressed 1-based.
        branches: Vec<NodeDefinition>,
    },
    /// Nested snippet opening a new tabstop scope.
    Snippet {
        /// Tabstop index within the enclosing scope; `None` only as a branch root.
        index: Option<u32>,
        /// Child nodes in document order.
        nodes: Vec<NodeDefinition>,
    },
}

impl NodeDefinition {
    /// Static text node.
    pub fn text(text: &str) -> Self {
        Self::Text(lines_from(text))
    }

    /// Tabstop with placeholder text.
    pub fn insert(index: u32, placeholder: &str) -> Self {
        Self::Insert {
            index: Some(index),
            placeholder: lines_from(placeholder),
        }
    }

    /// Unindexed tabstop, used as the root of a choice branch.
    pub fn branch_insert(placeholder: &str) -> Self {
        Self::Insert {
            index: None,
            placeholder: lines_from(placeholder),
        }
    }

    /// Function node over the given arguments.
    pub fn function<I, F>(args: I, compute: F) -> Self
    where
        I: IntoIterator<Item = ArgRef>,
        F: Fn(&[Lines]) -> anyhow::Result<Lines> + Send + Sync + 'static,
    {
        Self::Function(FunctionDefinition {
            compute: Arc::new(compute),
            args: args.into_iter().collect(),
            label: None,
        })
    }

    /// Function node with a shared computation and a label.
    pub fn labeled_function(
        label: impl Into<String>,
        args: Vec<ArgRef>,
        compute: Computation,
    ) -> Self {
        Self::Function(FunctionDefinition {
            compute,
            args,
            label: Some(label.into()),
        })
    }

    /// Choice between alternative branches.
    pub fn choice(index: u32, branches: Vec<NodeDefinition>) -> Self {
        Self::Choice {
            index,
            branches,
        }
    }

    /// Nested snippet at a tabstop index.
    pub fn nested(index: u32, nodes: Vec<NodeDefinition>) -> Self {
        Self::Snippet {
            index: Some(index),
            nodes,
        }
    }

    /// Unindexed nested snippet, used as the root of a choice branch.
    pub fn branch_snippet(nodes: Vec<NodeDefinition>) -> Self {
        Self::Snippet {
            index: None,
            nodes,
        }
    }

    /// Short kind name used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Insert {
                ..
            } => "insert",
            Self::Function(_) => "function",
            Self::Choice {
                ..
            } => "choice",
            Self::Snippet {
                ..
            } => "snippet",
        }
    }
}

/// A complete snippet definition: trigger plus node tree.
#[derive(Debug, Clone)]
pub struct SnippetDefinition {
    pub(crate) trigger: String,
    pub(crate) description: Option<String>,
    pub(crate) nodes: Vec<NodeDefinition>,
}

impl SnippetDefinition {
    /// Create a definition from a trigger and its top-level nodes.
    pub fn new(trigger: impl Into<String>, nodes: Vec<NodeDefinition>) -> Self {
        Self {
            trigger: trigger.into(),
            description: None,
            nodes,
        }
    }

    /// Attach a description shown in listings.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The trigger text.
    pub fn trigger(&self) -> &str {
        &self.trigger
    }

    /// The description, if any.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Top-level nodes.
    pub fn nodes(&self) -> &[NodeDefinition] {
        &self.nodes
    }
}
