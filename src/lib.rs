//! snipkit - snippet expansion with a reactive tabstop dependency graph
//!
//! A snippet is a tree of nodes: literal text, editable inserts (tabstops), function
//! nodes computed from other nodes, choices between alternative branches and nested
//! snippets with their own tabstop scope. snipkit compiles a snippet definition once,
//! checking its argument references and dependency cycles, and expands it into
//! independent editing sessions whose computed nodes follow the text the user types.
//!
//! # Architecture Overview
//!
//! - A [`snippet::SnippetDefinition`] is compiled into an immutable
//!   [`snippet::Snippet`] shared by every expansion.
//! - [`engine::Engine::expand`] builds an [`engine::ExpansionSession`], an arena of
//!   live nodes. Choice branches are built the first time they are selected.
//! - Edits only mark dependents pending; [`engine::ExpansionSession::update`] then
//!   re-evaluates them in dependency order and reports [`engine::TextDelta`]s for the
//!   host editor to apply.
//!
//! # Core Modules
//!
//! - [`snippet`] - definitions, addresses and compilation
//! - [`engine`] - expansion sessions, scheduling, choices and jumps
//! - [`loader`] - TOML snippet files and the transform registry
//! - [`cache`] - snippet file paths per filetype
//! - [`config`] - engine configuration (`~/.snipkit/config.toml`)
//! - [`core`] - error types and user-facing error reporting
//! - [`cli`] - the `snipkit` command-line interface
//!
//! # Snippet File Format
//!
//! ```toml
//! [[snippet]]
//! trigger = "fn"
//! description = "function with a documented name"
//! nodes = [
//!     { type = "text", text = "/// " },
//!     { type = "function", transform = "copy", args = [1] },
//!     { type = "text", text = "\nfn " },
//!     { type = "insert", index = 1, text = "name" },
//!     { type = "text", text = "() {\n    " },
//!     { type = "insert", index = 0 },
//!     { type = "text", text = "\n}" },
//! ]
//! ```
//!
//! # Command-Line Usage
//!
//! ```bash
//! # Print what each snippet renders right after expansion
//! snipkit preview snippets/rust.toml
//!
//! # Compile every snippet and report definition errors
//! snipkit check snippets/*.toml
//!
//! # Drive a session from a script
//! printf 'edit 1 main\nupdate\nshow\n' | snipkit session snippets/rust.toml --trigger fn
//! ```

// Core functionality modules
pub mod core;
pub mod engine;
pub mod snippet;

// Loading and configuration
pub mod cache;
pub mod config;
pub mod loader;

pub mod cli;

pub(crate) mod graph;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
