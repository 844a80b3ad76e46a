//! Error handling for snipkit
//!
//! This module provides the error types of the engine and user-friendly error
//! reporting for the command-line front end. The error system is designed around two
//! principles:
//! 1. **Strongly-typed errors** for precise handling in library code
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Error Categories
//!
//! - **Definition errors** ([`DefinitionError`]): a snippet definition is rejected at
//!   compile time (unknown tabstop, cycle, ...). No instance is ever produced.
//! - **Session errors** ([`SnipError`]): misuse of a live expansion session, such as
//!   editing a tabstop that is inside an unselected choice branch.
//! - **Loading errors** ([`SnipError::SnippetFileParse`], [`SnipError::UnknownTransform`],
//!   [`SnipError::ConfigError`]): problems with snippet files or configuration.
//!
//! Unresolved addresses are *not* errors: a function node whose argument lives in an
//! unselected branch simply waits. Failed computations are not errors either; they
//! are reported per node in an [`UpdateReport`](crate::engine::UpdateReport).
//!
//! # Examples
//!
//! ```rust,no_run
//! use snipkit::core::{ErrorContext, SnipError, user_friendly_error};
//!
//! let error = SnipError::NoJumpTargets {
//!     trigger: "fn".to_string(),
//! };
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display(); // Shows colored error with suggestions
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// A snippet definition that cannot be compiled.
///
/// Every variant carries the trigger of the offending snippet so that errors from a
/// file with many snippets can be traced back.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DefinitionError {
    /// The snippet has an empty trigger.
    #[error("Snippet trigger must not be empty")]
    EmptyTrigger,

    /// An address names a tabstop that does not exist in its scope.
    #[error(
        "Snippet '{trigger}': argument {address} refers to tabstop {index}, which does not exist in scope {scope}"
    )]
    UnknownTabstop {
        /// Trigger of the snippet being compiled
        trigger: String,
        /// The argument reference as written
        address: String,
        /// The missing tabstop index
        index: u32,
        /// The scope that was searched
        scope: String,
    },

    /// An address names a branch a choice does not have.
    #[error(
        "Snippet '{trigger}': argument {address} refers to branch {branch} of choice {choice}, which has {available} branches"
    )]
    UnknownBranch {
        /// Trigger of the snippet being compiled
        trigger: String,
        /// The argument reference as written
        address: String,
        /// The missing 1-based branch number
        branch: u32,
        /// The choice that was searched
        choice: String,
        /// Number of branches the choice has
        available: usize,
    },

    /// An address continues past a node that has no children.
    #[error("Snippet '{trigger}': argument {address} descends into {node}, which has no children")]
    AddressIntoLeaf {
        /// Trigger of the snippet being compiled
        trigger: String,
        /// The argument reference as written
        address: String,
        /// The leaf node reached
        node: String,
    },

    /// Two nodes of the same scope use the same tabstop index.
    #[error("Snippet '{trigger}': tabstop {index} is defined twice in scope {scope}")]
    DuplicateTabstop {
        /// Trigger of the snippet being compiled
        trigger: String,
        /// The duplicated index
        index: u32,
        /// The scope containing both nodes
        scope: String,
    },

    /// An insert or nested snippet outside a choice branch has no tabstop index.
    #[error("Snippet '{trigger}': {kind} node {node} needs a tabstop index")]
    MissingTabstopIndex {
        /// Trigger of the snippet being compiled
        trigger: String,
        /// Location of the node
        node: String,
        /// Node kind
        kind: &'static str,
    },

    /// The root of a choice branch carries its own tabstop index.
    #[error(
        "Snippet '{trigger}': {kind} node {node} is a choice branch and cannot have its own tabstop index"
    )]
    IndexedBranchRoot {
        /// Trigger of the snippet being compiled
        trigger: String,
        /// Location of the node
        node: String,
        /// Node kind
        kind: &'static str,
    },

    /// A choice node without branches.
    #[error("Snippet '{trigger}': choice {index} has no branches")]
    EmptyChoice {
        /// Trigger of the snippet being compiled
        trigger: String,
        /// Tabstop index of the choice
        index: u32,
    },

    /// Function nodes depend on each other in a cycle that can be live.
    #[error("Snippet '{trigger}': circular dependency detected: {chain}")]
    CircularDependency {
        /// Trigger of the snippet being compiled
        trigger: String,
        /// The cycle, first and last element identical
        chain: String,
    },
}

/// The main error type for snipkit operations.
#[derive(Error, Debug)]
pub enum SnipError {
    /// A snippet definition failed to compile.
    #[error(transparent)]
    Definition(#[from] DefinitionError),

    /// The address does not name a live node right now.
    ///
    /// This happens when the address points into a choice branch that is not
    /// selected.
    #[error("No live node at {address} in snippet '{trigger}'")]
    NotLive {
        /// Trigger of the expanded snippet
        trigger: String,
        /// The address that failed to resolve
        address: String,
    },

    /// The addressed node is not an insert node.
    #[error("Node at {address} is a {kind} node and cannot be edited")]
    NotEditable {
        /// The address of the node
        address: String,
        /// The node kind
        kind: &'static str,
    },

    /// The addressed node is not a choice node.
    #[error("Node at {address} is a {kind} node, not a choice")]
    NotAChoice {
        /// The address of the node
        address: String,
        /// The node kind
        kind: &'static str,
    },

    /// A branch number outside `1..=available`.
    #[error("Choice at {address} has no branch {branch} (it has {available})")]
    BranchOutOfRange {
        /// The address of the choice
        address: String,
        /// The requested 1-based branch
        branch: usize,
        /// Number of branches
        available: usize,
    },

    /// A jump was requested on a snippet without tabstops.
    #[error("Snippet '{trigger}' has no tabstops to jump to")]
    NoJumpTargets {
        /// Trigger of the expanded snippet
        trigger: String,
    },

    /// An address string could not be parsed.
    #[error("Invalid address '{input}': {reason}")]
    InvalidAddress {
        /// The input as given
        input: String,
        /// Why parsing failed
        reason: String,
    },

    /// A snippet file names a transform that is not registered.
    #[error("Unknown transform '{name}'")]
    UnknownTransform {
        /// The requested transform
        name: String,
        /// Names of the registered transforms
        available: Vec<String>,
    },

    /// A snippet file could not be parsed.
    #[error("Failed to parse snippet file {file}: {reason}")]
    SnippetFileParse {
        /// Path of the file
        file: String,
        /// Parser message
        reason: String,
    },

    /// A snippet with the requested trigger does not exist.
    #[error("No snippet with trigger '{trigger}' in {file}")]
    SnippetNotFound {
        /// The requested trigger
        trigger: String,
        /// Where it was looked up
        file: String,
    },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration error
        message: String,
    },
}

/// Error wrapper with user-facing suggestion and details.
///
/// Built by [`user_friendly_error`] and printed by the CLI with [`ErrorContext::display`].
#[derive(Debug)]
pub struct ErrorContext {
    /// The error message
    pub message: String,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context from a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors
    ///
    /// - Error message: Red and bold
    /// - Details: Yellow
    /// - Suggestion: Green
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.message);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`] with actionable suggestions
///
/// Recognizes [`SnipError`], [`DefinitionError`], [`std::io::Error`] and
/// [`toml::de::Error`] anywhere in the error chain; anything else is reported with its
/// full context chain.
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let message = format!("{error:#}");

    for cause in error.chain() {
        if let Some(snip_error) = cause.downcast_ref::<SnipError>() {
            return describe_snip_error(snip_error, message);
        }
        if let Some(definition_error) = cause.downcast_ref::<DefinitionError>() {
            return describe_definition_error(definition_error, message);
        }
        if let Some(io_error) = cause.downcast_ref::<std::io::Error>() {
            return match io_error.kind() {
                std::io::ErrorKind::NotFound => ErrorContext::new(message)
                    .with_suggestion("Check that the file or directory exists and the path is correct"),
                std::io::ErrorKind::PermissionDenied => ErrorContext::new(message)
                    .with_suggestion("Check the file permissions and ownership"),
                _ => ErrorContext::new(message),
            };
        }
        if cause.downcast_ref::<toml::de::Error>().is_some() {
            return ErrorContext::new(message)
                .with_suggestion("Check the TOML syntax: every node needs a 'type' key and strings must be quoted")
                .with_details("Snippet files contain [[snippet]] tables with trigger and nodes entries");
        }
    }

    ErrorContext::new(message)
}

fn describe_snip_error(error: &SnipError, message: String) -> ErrorContext {
    match error {
        SnipError::Definition(definition) => describe_definition_error(definition, message),
        SnipError::NotLive {
            ..
        } => ErrorContext::new(message)
            .with_suggestion("Select the choice branch containing the tabstop first")
            .with_details("Nodes inside unselected choice branches are dormant and cannot be addressed"),
        SnipError::NotEditable {
            ..
        } => ErrorContext::new(message)
            .with_suggestion("Only insert nodes accept text; address an insert tabstop instead"),
        SnipError::NotAChoice {
            ..
        }
        | SnipError::BranchOutOfRange {
            ..
        } => ErrorContext::new(message)
            .with_suggestion("Branches are numbered from 1 in the order they are defined"),
        SnipError::NoJumpTargets {
            ..
        } => ErrorContext::new(message)
            .with_details("The snippet contains no insert, choice or nested snippet nodes"),
        SnipError::InvalidAddress {
            ..
        } => ErrorContext::new(message)
            .with_suggestion("Write addresses as dot-separated numbers, e.g. '2.2' for branch 2 of tabstop 2"),
        SnipError::UnknownTransform {
            available,
            ..
        } => ErrorContext::new(message)
            .with_suggestion(format!("Use one of: {}", available.join(", "))),
        SnipError::SnippetFileParse {
            ..
        } => ErrorContext::new(message)
            .with_suggestion("Check the TOML syntax of the snippet file"),
        SnipError::SnippetNotFound {
            ..
        } => ErrorContext::new(message)
            .with_suggestion("Run 'snipkit preview <FILE>' to see the available triggers"),
        SnipError::ConfigError {
            ..
        } => ErrorContext::new(message)
            .with_suggestion("Check ~/.snipkit/config.toml or the file passed with --config"),
    }
}

fn describe_definition_error(error: &DefinitionError, message: String) -> ErrorContext {
    match error {
        DefinitionError::CircularDependency {
            ..
        } => ErrorContext::new(message)
            .with_suggestion("Break the cycle: a function node cannot read itself, a node that contains it, or a function that reads it")
            .with_details("Cycles between nodes of different branches of the same choice are allowed"),
        DefinitionError::UnknownTabstop {
            ..
        }
        | DefinitionError::UnknownBranch {
            ..
        }
        | DefinitionError::AddressIntoLeaf {
            ..
        } => ErrorContext::new(message).with_suggestion(
            "Relative arguments name tabstops of the enclosing snippet; absolute arguments are paths from the root",
        ),
        _ => ErrorContext::new(message),
    }
}
