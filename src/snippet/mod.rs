//! Snippet definitions, addressing and compilation.
//!
//! # Node kinds
//!
//! | Kind | Renders | Addressable |
//! |------|---------|-------------|
//! | Text | its static text | only as a choice branch |
//! | Insert | user text, initially the placeholder | tabstop index or branch |
//! | Function | result of its computation over argument texts | only as a choice branch |
//! | Choice | the selected branch | tabstop index |
//! | Snippet | concatenation of its children | tabstop index or branch |
//!
//! Tabstop indices are unique per snippet scope, not globally: a nested snippet opens
//! a new scope, so `$1` of the root and `$1` of a nested snippet are different nodes.
//!
//! # Lifecycle
//!
//! 1. Author a [`SnippetDefinition`] (in code or via [`crate::loader`]).
//! 2. [`Snippet::compile`] validates it and builds the dependency graph.
//! 3. [`crate::engine::Engine::expand`] creates an independent editing session.

mod address;
mod compile;
mod definition;
pub mod text;

pub use address::{Address, ArgRef};
pub use compile::Snippet;
pub(crate) use compile::{ROOT_SLOT, SlotId, SlotKind};
pub use definition::{Computation, FunctionDefinition, NodeDefinition, SnippetDefinition};
pub use text::{Lines, Position};
