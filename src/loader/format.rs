//! TOML schema of snippet files.
//!
//! ```toml
//! [[snippet]]
//! trigger = "choice"
//! description = "Pick a value, then echo it"
//! nodes = [
//!     { type = "insert", index = 1, text = "cccc" },
//!     { type = "text", text = " " },
//!     { type = "choice", index = 2, branches = [
//!         { type = "text", text = "aaaa" },
//!         { type = "insert", text = "bbbb" },
//!     ] },
//!     { type = "function", transform = "concat", args = [[2, 2], 1] },
//! ]
//! ```
//!
//! Function arguments are written as an integer (relative tabstop), an array
//! (absolute address) or a string such as `"2.2"` (absolute address).

use serde::Deserialize;

use super::transforms::{TransformParams, TransformRegistry};
use crate::core::SnipError;
use crate::snippet::text::lines_from;
use crate::snippet::{Address, ArgRef, NodeDefinition, SnippetDefinition};

/// A whole snippet file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SnippetFile {
    /// The `[[snippet]]` tables.
    #[serde(default, rename = "snippet")]
    pub snippets: Vec<SnippetSpec>,
}

/// One `[[snippet]]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SnippetSpec {
    /// Trigger text.
    pub trigger: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Root nodes.
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
}

/// One node, tagged by `type`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeSpec {
    /// Static text.
    Text {
        /// The text; `\n` starts a new line.
        text: String,
    },
    /// Tabstop. Omit `index` only for a choice branch.
    Insert {
        /// Tabstop index.
        #[serde(default)]
        index: Option<u32>,
        /// Placeholder text.
        #[serde(default)]
        text: String,
    },
    /// Computed text.
    Function {
        /// Name of a registered transform.
        transform: String,
        /// Argument references.
        #[serde(default)]
        args: Vec<ArgSpec>,
        /// Separator for `join`.
        #[serde(default)]
        separator: Option<String>,
    },
    /// Alternatives.
    Choice {
        /// Tabstop index.
        index: u32,
        /// Branch roots, addressed 1-based.
        branches: Vec<NodeSpec>,
    },
    /// Nested snippet. Omit `index` only for a choice branch.
    Snippet {
        /// Tabstop index.
        #[serde(default)]
        index: Option<u32>,
        /// Child nodes.
        #[serde(default)]
        nodes: Vec<NodeSpec>,
    },
}

/// Argument reference as written in a file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ArgSpec {
    /// `1`: tabstop of the enclosing scope.
    Relative(u32),
    /// `[2, 2]`: absolute address.
    Absolute(Vec<u32>),
    /// `"2.2"` or `"[2][2]"`: absolute address.
    Path(String),
}

impl ArgSpec {
    /// The argument reference written in the file.
    ///
    /// # Errors
    ///
    /// Returns [`SnipError::InvalidAddress`] for a malformed path string.
    pub fn to_arg_ref(&self) -> Result<ArgRef, SnipError> {
        match self {
            Self::Relative(index) => Ok(ArgRef::Relative(*index)),
            Self::Absolute(segments) => Ok(ArgRef::Absolute(Address::new(segments.clone()))),
            Self::Path(path) => path.parse::<Address>().map(ArgRef::Absolute),
        }
    }
}

impl SnippetSpec {
    /// Build the definition, resolving transform names against `registry`.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown transforms or malformed addresses.
    pub fn to_definition(
        &self,
        registry: &TransformRegistry,
    ) -> Result<SnippetDefinition, SnipError> {
        let nodes = self
            .nodes
            .iter()
            .map(|node| node.to_definition(registry))
            .collect::<Result<Vec<_>, _>>()?;
        let definition = SnippetDefinition::new(self.trigger.clone(), nodes);
        Ok(match &self.description {
            Some(description) => definition.with_description(description.clone()),
            None => definition,
        })
    }
}

impl NodeSpec {
    fn to_definition(&self, registry: &TransformRegistry) -> Result<NodeDefinition, SnipError> {
        Ok(match self {
            Self::Text {
                text,
            } => NodeDefinition::Text(lines_from(text)),
            Self::Insert {
                index,
                text,
            } => NodeDefinition::Insert {
                index: *index,
                placeholder: lines_from(text),
            },
            Self::Function {
                transform,
                args,
                separator,
            } => {
                let compute = registry.computation(
                    transform,
                    TransformParams {
                        separator: separator.clone(),
                    },
                )?;
                let args = args.iter().map(ArgSpec::to_arg_ref).collect::<Result<Vec<_>, _>>()?;
                NodeDefinition::labeled_function(transform.clone(), args, compute)
            }
            Self::Choice {
                index,
                branches,
            } => NodeDefinition::Choice {
                index: *index,
                branches: branches
                    .iter()
                    .map(|branch| branch.to_definition(registry))
                    .collect::<Result<Vec<_>, _>>()?,
            },
            Self::Snippet {
                index,
                nodes,
            } => NodeDefinition::Snippet {
                index: *index,
                nodes: nodes
                    .iter()
                    .map(|node| node.to_definition(registry))
                    .collect::<Result<Vec<_>, _>>()?,
            },
        })
    }
}
