//! `snipkit session`: drive an expansion session from a script.
//!
//! Each input line is one command:
//!
//! ```text
//! edit <address> <text>      replace the text of an insert node (`\n` for line breaks)
//! update [address]           re-evaluate pending function nodes, optionally below a node
//! jump next|prev             move the active tabstop
//! select <address> <branch>  switch a choice to a 1-based branch
//! show                       print the current text
//! ```
//!
//! Blank lines and lines starting with `#` are ignored. The first failing command
//! ends the script.

use anyhow::{Context, Result, anyhow, bail};
use clap::Args;
use colored::Colorize;
use serde_json::json;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::str::FromStr;

use crate::config::EngineConfig;
use crate::engine::{Direction, Engine, ExpansionSession, UpdateReport, UpdateScope};
use crate::loader::{SnippetLoader, find_snippet};
use crate::snippet::Address;

/// Expand one snippet and apply the commands read from stdin.
#[derive(Args)]
pub struct SessionCommand {
    /// Snippet file to read.
    file: PathBuf,

    /// Trigger of the snippet to expand.
    #[arg(short, long)]
    trigger: String,

    /// Output format (text, json).
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    format: String,
}

impl SessionCommand {
    pub fn execute(self, config: &EngineConfig) -> Result<()> {
        let snippets = SnippetLoader::default().load_file(&self.file)?;
        let origin = self.file.display().to_string();
        let snippet = find_snippet(&snippets, &self.trigger, &origin)?;

        let mut session = Engine::new(config.clone()).expand(snippet);
        let stdin = std::io::stdin();
        let stdout = std::io::stdout();
        run_script(&mut session, stdin.lock(), stdout.lock(), self.format == "json")
    }
}

/// One line of a session script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptCommand {
    Edit {
        address: Address,
        text: String,
    },
    Update(Option<Address>),
    Jump(Direction),
    Select {
        address: Address,
        branch: usize,
    },
    Show,
}

impl FromStr for ScriptCommand {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim_start();
        let (word, rest) = line.split_once(' ').unwrap_or((line, ""));
        match word {
            "edit" => {
                let rest = rest.trim_start();
                let (address, text) = rest.split_once(' ').unwrap_or((rest, ""));
                if address.is_empty() {
                    bail!("'edit' needs an address");
                }
                Ok(Self::Edit {
                    address: address.parse()?,
                    text: unescape(text),
                })
            }
            "update" => {
                let rest = rest.trim();
                if rest.is_empty() {
                    Ok(Self::Update(None))
                } else {
                    Ok(Self::Update(Some(rest.parse()?)))
                }
            }
            "jump" => match rest.trim() {
                "next" | "forward" => Ok(Self::Jump(Direction::Forward)),
                "prev" | "back" | "backward" => Ok(Self::Jump(Direction::Backward)),
                other => Err(anyhow!("Unknown jump direction '{other}' (use next or prev)")),
            },
            "select" => {
                let mut parts = rest.split_whitespace();
                let (Some(address), Some(branch), None) = (parts.next(), parts.next(), parts.next())
                else {
                    bail!("'select' needs an address and a branch number");
                };
                Ok(Self::Select {
                    address: address.parse()?,
                    branch: branch
                        .parse()
                        .with_context(|| format!("Branch '{branch}' is not a number"))?,
                })
            }
            "show" => Ok(Self::Show),
            other => Err(anyhow!("Unknown command '{other}'")),
        }
    }
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Apply every command of `input` to `session`, writing results to `output`.
///
/// With `json` each command prints one JSON object per line; otherwise a short
/// human-readable summary.
///
/// # Errors
///
/// Returns the first parse or engine error, prefixed with its line number.
pub fn run_script<R: BufRead, W: Write>(
    session: &mut ExpansionSession,
    input: R,
    mut output: W,
    json: bool,
) -> Result<()> {
    for (number, line) in input.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }
        let command: ScriptCommand =
            line.parse().with_context(|| format!("Line {}: invalid command", number + 1))?;
        tracing::debug!("Script line {}: {command:?}", number + 1);

        apply(session, &command, &mut output, json)
            .with_context(|| format!("Line {}: '{}' failed", number + 1, line.trim()))?;
    }
    output.flush()?;
    Ok(())
}

fn apply<W: Write>(
    session: &mut ExpansionSession,
    command: &ScriptCommand,
    output: &mut W,
    json: bool,
) -> Result<()> {
    match command {
        ScriptCommand::Edit {
            address,
            text,
        } => {
            session.on_text_changed(address, text)?;
            let pending = session.pending_functions().len();
            if json {
                let line = json!({ "command": "edit", "address": address, "pending": pending });
                writeln!(output, "{line}")?;
            } else {
                writeln!(output, "edited {address} ({pending} pending)")?;
            }
        }
        ScriptCommand::Update(address) => {
            let scope = address.clone().map_or(UpdateScope::All, UpdateScope::Subtree);
            let report = session.update(&scope)?;
            write_report(output, "update", &report, json)?;
        }
        ScriptCommand::Jump(direction) => {
            let outcome = session.jump(*direction)?;
            if json {
                writeln!(output, "{}", json!({ "command": "jump", "outcome": outcome }))?;
            } else {
                match &outcome.address {
                    Some(address) => writeln!(output, "active {address}")?,
                    None => writeln!(output, "exited snippet")?,
                }
                write_summary(output, &outcome.report)?;
            }
        }
        ScriptCommand::Select {
            address,
            branch,
        } => {
            let report = session.select_choice(address, *branch)?;
            write_report(output, "select", &report, json)?;
        }
        ScriptCommand::Show => {
            let text = session.text();
            if json {
                writeln!(output, "{}", json!({ "command": "show", "text": text }))?;
            } else {
                for line in text {
                    writeln!(output, "{line}")?;
                }
            }
        }
    }
    Ok(())
}

fn write_report<W: Write>(
    output: &mut W,
    command: &str,
    report: &UpdateReport,
    json: bool,
) -> Result<()> {
    if json {
        writeln!(output, "{}", json!({ "command": command, "report": report }))?;
        return Ok(());
    }
    write_summary(output, report)
}

fn write_summary<W: Write>(output: &mut W, report: &UpdateReport) -> Result<()> {
    writeln!(
        output,
        "{} changed, {} evaluated, {} pending",
        report.deltas.len(),
        report.evaluated,
        report.pending
    )?;
    for failure in &report.failures {
        writeln!(output, "  {} {}: {}", "failed".yellow(), failure.path, failure.cause)?;
    }
    if let Some(abort) = &report.aborted {
        writeln!(output, "  {} {}: {}", "aborted".red(), abort.path, abort.reason)?;
    }
    Ok(())
}
