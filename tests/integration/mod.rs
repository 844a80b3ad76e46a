//! Integration test suite for snipkit
//!
//! End-to-end tests of expansion sessions, snippet file loading and the command-line
//! interface.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **scenarios**: expansion, editing and ordered updates of compiled snippets
//! - **choice**: choice switching and dormant branches
//! - **loader**: snippet files, filetype discovery and the path cache
//! - **cli**: the `snipkit` binary

mod choice;
mod cli;
mod loader;
mod scenarios;
