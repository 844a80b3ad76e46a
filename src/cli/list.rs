//! `snipkit list`: snippets available for a filetype.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

use crate::cache::SnippetPathCache;
use crate::config::EngineConfig;
use crate::loader::SnippetLoader;

/// Discover and list the snippets of a filetype and the filetypes it extends.
#[derive(Args)]
pub struct ListCommand {
    /// Filetype to list.
    #[arg(short, long)]
    filetype: String,

    /// Additional snippet directory, searched after the configured ones.
    #[arg(long = "dir")]
    dirs: Vec<PathBuf>,

    /// Output format (text, json).
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    format: String,
}

#[derive(Serialize)]
struct ListEntry {
    trigger: String,
    description: Option<String>,
    tabstops: Vec<u32>,
    functions: usize,
}

impl ListCommand {
    pub fn execute(self, config: &EngineConfig) -> Result<()> {
        let mut config = config.clone();
        config.snippet_dirs.extend(self.dirs);

        let loader = SnippetLoader::default();
        let mut cache = SnippetPathCache::new();
        let snippets = loader.load_filetype(&mut cache, &config, &self.filetype)?;

        let entries: Vec<ListEntry> = snippets
            .iter()
            .map(|snippet| ListEntry {
                trigger: snippet.trigger().to_string(),
                description: snippet.description().map(str::to_string),
                tabstops: snippet.tabstops().into_iter().collect(),
                functions: snippet.function_count(),
            })
            .collect();

        if self.format == "json" {
            println!("{}", serde_json::to_string_pretty(&entries)?);
            return Ok(());
        }

        if entries.is_empty() {
            println!("No snippets found for filetype '{}'.", self.filetype);
            return Ok(());
        }

        for filetype in cache.loaded() {
            for path in cache.paths(filetype) {
                println!("{} {}", filetype.cyan(), path.display().to_string().dimmed());
            }
        }
        for entry in &entries {
            let description = entry.description.as_deref().unwrap_or("");
            println!("  {:<16} {description}", entry.trigger.bold());
        }
        Ok(())
    }
}
