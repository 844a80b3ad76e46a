//! `snipkit check`: validate snippet files.

use anyhow::{Result, anyhow};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use crate::config::EngineConfig;
use crate::loader::SnippetLoader;

/// Compile every snippet of the given files and report all definition errors.
#[derive(Args)]
pub struct CheckCommand {
    /// Snippet files to check.
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

impl CheckCommand {
    pub fn execute(self, _config: &EngineConfig) -> Result<()> {
        let loader = SnippetLoader::default();
        let mut valid_total = 0;
        let mut invalid_total = 0;

        for file in &self.files {
            let (valid, errors) = loader.check_file(file)?;
            valid_total += valid.len();
            invalid_total += errors.len();

            if errors.is_empty() {
                println!("{} {} ({} snippets)", "✓".green(), file.display(), valid.len());
                continue;
            }
            println!("{} {}", "✗".red(), file.display());
            for error in errors {
                println!("  {} {error:#}", "-".red());
            }
        }

        if invalid_total > 0 {
            return Err(anyhow!(
                "{invalid_total} of {} snippets failed to compile",
                valid_total + invalid_total
            ));
        }
        tracing::debug!("All {valid_total} snippets compiled");
        Ok(())
    }
}
