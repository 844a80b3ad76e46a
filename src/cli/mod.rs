//! Command-line interface for snipkit.
//!
//! # Available Commands
//!
//! - `preview` - print the static text of the snippets in a file
//! - `check` - compile snippet files and report every definition error
//! - `list` - discover the snippets of a filetype in the configured directories
//! - `session` - drive an expansion session with commands read from stdin
//!
//! # Examples
//!
//! ```bash
//! snipkit preview snippets/rust.toml --trigger fn
//! snipkit check snippets/*.toml
//! snipkit --config ./snipkit.toml list --filetype cpp
//! printf 'edit 1 hello\nupdate\nshow\n' | snipkit session rust.toml --trigger fn
//! ```
//!
//! Every command loads [`EngineConfig`] first: from `--config`, else from
//! `SNIPKIT_CONFIG`, else from `~/.snipkit/config.toml`.

mod check;
mod list;
mod preview;
mod session;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::config::EngineConfig;

pub use session::{ScriptCommand, run_script};

/// Runtime settings derived from the global flags.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Log filter used when `RUST_LOG` is not set.
    pub log_level: String,
    /// Explicit configuration file.
    pub config_path: Option<PathBuf>,
}

impl CliConfig {
    /// Install the global tracing subscriber, writing to stderr.
    ///
    /// `RUST_LOG` takes precedence over the level chosen by the flags. Calling this
    /// more than once is harmless.
    pub fn init_logging(&self) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("snipkit={}", self.log_level)));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }

    /// Load the engine configuration this invocation should use.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but is invalid.
    pub fn load_engine_config(&self) -> Result<EngineConfig> {
        EngineConfig::load_with_optional(self.config_path.clone())
    }
}

/// Snippet expansion engine with a reactive tabstop dependency graph.
#[derive(Parser)]
#[command(
    name = "snipkit",
    about = "Preview, check and exercise snippets with computed tabstops",
    version,
    long_about = "snipkit compiles snippet definitions into dependency graphs and expands \
                  them into editing sessions whose computed nodes update when the tabstops \
                  they read change."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Show debug output (equivalent to `RUST_LOG=snipkit=debug`).
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only show warnings and errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the configuration file (default: `~/.snipkit/config.toml`).
    #[arg(short, long, global = true, env = "SNIPKIT_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the static text of snippets.
    Preview(preview::PreviewCommand),

    /// Compile snippet files and report definition errors.
    Check(check::CheckCommand),

    /// List the snippets available for a filetype.
    List(list::ListCommand),

    /// Run a scripted editing session read from stdin.
    Session(session::SessionCommand),
}

impl Cli {
    /// Execute the parsed command.
    ///
    /// # Errors
    ///
    /// Returns the error of the command; `main` turns it into a colored report.
    pub fn execute(self) -> Result<()> {
        let config = self.build_config();
        config.init_logging();
        self.execute_with_config(&config)
    }

    /// Translate the global flags into a [`CliConfig`].
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        };

        CliConfig {
            log_level: log_level.to_string(),
            config_path: self.config.clone(),
        }
    }

    /// Execute with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns the error of the command.
    pub fn execute_with_config(self, config: &CliConfig) -> Result<()> {
        let engine_config = config.load_engine_config()?;
        match self.command {
            Commands::Preview(cmd) => cmd.execute(&engine_config),
            Commands::Check(cmd) => cmd.execute(&engine_config),
            Commands::List(cmd) => cmd.execute(&engine_config),
            Commands::Session(cmd) => cmd.execute(&engine_config),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_config_levels() {
        let cli = Cli::parse_from(["snipkit", "--verbose", "check", "a.toml"]);
        assert_eq!(cli.build_config().log_level, "debug");

        let cli = Cli::parse_from(["snipkit", "-q", "check", "a.toml"]);
        assert_eq!(cli.build_config().log_level, "warn");

        let cli = Cli::parse_from(["snipkit", "check", "a.toml", "--config", "x.toml"]);
        let config = cli.build_config();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.config_path, Some(PathBuf::from("x.toml")));
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["snipkit", "-v", "-q", "check", "a.toml"]).is_err());
    }
}
