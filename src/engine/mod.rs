//! Expansion engine: live snippet instances and their reactive updates.
//!
//! An [`Engine`] turns a compiled [`Snippet`] into an [`ExpansionSession`], an
//! independent instance whose node tree lives in an arena. The session is driven by
//! the host editor:
//!
//! - [`ExpansionSession::on_text_changed`] records a user edit and marks everything
//!   derived from it pending, without recomputing;
//! - [`ExpansionSession::update`] re-evaluates pending function nodes in dependency
//!   order;
//! - [`ExpansionSession::jump`] moves between tabstops and updates what the move
//!   affects;
//! - [`ExpansionSession::select_choice`] switches a choice branch and updates the
//!   nodes that can now resolve their arguments.
//!
//! Every update returns an [`UpdateReport`] whose [`TextDelta`]s the host applies to
//! its own buffer, in order. The engine never touches a buffer.
//!
//! Function nodes whose arguments point into an unselected choice branch are
//! [`Resolution::Unresolved`]: they keep their last text (initially empty) and wait.
//!
//! # Examples
//!
//! ```rust
//! use snipkit::engine::{Engine, UpdateScope};
//! use snipkit::snippet::{Address, ArgRef, NodeDefinition as N, Snippet, SnippetDefinition};
//!
//! # fn main() -> anyhow::Result<()> {
//! let snippet = Snippet::compile(&SnippetDefinition::new(
//!     "arrow",
//!     vec![
//!         N::insert(1, "a"),
//!         N::text(" -> "),
//!         N::function([ArgRef::rel(1)], |args| Ok(args[0].clone())),
//!     ],
//! ))?;
//!
//! let engine = Engine::default();
//! assert_eq!(engine.static_text(&snippet), vec!["a -> a".to_string()]);
//!
//! let mut session = engine.expand(&snippet);
//! session.on_text_changed(&Address::from(1), "b")?;
//! assert_eq!(session.text(), vec!["b -> a".to_string()]);
//!
//! session.update(&UpdateScope::All)?;
//! assert_eq!(session.text(), vec!["b -> b".to_string()]);
//! # Ok(())
//! # }
//! ```

mod arena;
mod choice;
mod evaluator;
mod jump;
mod scheduler;
mod session;
mod static_text;

pub use arena::{NodeId, Resolution};
pub use evaluator::EvaluationFailure;
pub use jump::{Direction, JumpOutcome};
pub use scheduler::{TextDelta, UpdateAbort, UpdateReport, UpdateScope};
pub use session::ExpansionSession;

use crate::config::EngineConfig;
use crate::snippet::{Lines, Snippet};

/// Entry point for expanding snippets.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    /// Create an engine with the given configuration.
    pub const fn new(config: EngineConfig) -> Self {
        Self {
            config,
        }
    }

    /// The engine configuration.
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Start an editing session for `snippet`.
    ///
    /// Builds a fresh instance (only the first branch of every choice), evaluates
    /// every function node whose arguments resolve and makes the first tabstop
    /// active.
    pub fn expand(&self, snippet: &Snippet) -> ExpansionSession {
        let mut session = ExpansionSession::new(snippet, &self.config);
        let candidates = session.functions_below(session.arena.root());
        let report = session.run_update(&candidates);
        session.active = session.jump_targets().first().copied();

        tracing::debug!(
            "Expanded snippet '{}': {} nodes built, {} functions evaluated, {} pending",
            snippet.trigger(),
            session.built_nodes(),
            report.evaluated,
            report.pending
        );
        session
    }
}

impl Snippet {
    /// Expand with the default engine configuration.
    pub fn expand(&self) -> ExpansionSession {
        Engine::default().expand(self)
    }

    /// Static text with the default engine configuration.
    pub fn static_text(&self) -> Lines {
        Engine::default().static_text(self)
    }
}
