//! `snipkit preview`: static text of snippets.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::loader::{SnippetLoader, find_snippet};
use crate::snippet::Snippet;

/// Print the text each snippet renders right after expansion.
#[derive(Args)]
pub struct PreviewCommand {
    /// Snippet file to read.
    file: PathBuf,

    /// Only preview the snippet with this trigger.
    #[arg(short, long)]
    trigger: Option<String>,

    /// Print only the text, without headers.
    #[arg(long)]
    plain: bool,
}

impl PreviewCommand {
    pub fn execute(self, config: &EngineConfig) -> Result<()> {
        let snippets = SnippetLoader::default().load_file(&self.file)?;
        let origin = self.file.display().to_string();
        let selected: Vec<&Snippet> = match &self.trigger {
            Some(trigger) => vec![find_snippet(&snippets, trigger, &origin)?],
            None => snippets.iter().collect(),
        };

        let engine = Engine::new(config.clone());
        for snippet in selected {
            if !self.plain {
                match snippet.description() {
                    Some(description) => {
                        println!("{} {}", snippet.trigger().cyan().bold(), description.dimmed());
                    }
                    None => println!("{}", snippet.trigger().cyan().bold()),
                }
            }
            for line in engine.static_text(snippet) {
                println!("{line}");
            }
        }
        Ok(())
    }
}
