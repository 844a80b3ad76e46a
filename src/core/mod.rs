//! Core types shared across snipkit: error definitions and user-facing error
//! reporting.
//!
//! - [`DefinitionError`] - a snippet definition that cannot be compiled
//! - [`SnipError`] - every other failure surfaced by the library
//! - [`ErrorContext`] / [`user_friendly_error`] - colored CLI reporting with suggestions

pub mod error;

pub use error::{DefinitionError, ErrorContext, SnipError, user_friendly_error};
