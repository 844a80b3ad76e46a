//! Configuration for snipkit.
//!
//! - [`EngineConfig`] - user configuration (`~/.snipkit/config.toml`): preview text
//!   for unresolved function nodes, snippet directories and filetype inheritance
//! - [`parse_config`] - generic TOML loading with path context in errors

mod engine;
mod parser;

pub use engine::{CONFIG_ENV, EngineConfig};
pub use parser::parse_config;
