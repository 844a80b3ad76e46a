//! Dependency graph between snippet nodes.
//!
//! See [`DependencyGraph`].

mod dependency_graph;

pub(crate) use dependency_graph::{DependencyGraph, EdgeKind, Requirement};
