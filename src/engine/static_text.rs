//! Best-effort rendering before expansion.

use super::Engine;
use super::arena::NodeKind;
use super::session::ExpansionSession;
use crate::snippet::text::lines_from;
use crate::snippet::{Lines, Snippet};

impl Engine {
    /// Render a snippet as it would look right after expansion.
    ///
    /// A throwaway instance is expanded and fully updated; function nodes that stay
    /// pending (unresolved arguments or failed computations) render as
    /// [`EngineConfig::unresolved_text`](crate::config::EngineConfig::unresolved_text).
    /// The snippet is not modified, so repeated calls return the same text.
    pub fn static_text(&self, snippet: &Snippet) -> Lines {
        let session = self.expand(snippet);
        session.render_settled(&self.config.unresolved_text)
    }
}

impl ExpansionSession {
    /// Render with every pending function node replaced by `placeholder`.
    pub(super) fn render_settled(&self, placeholder: &str) -> Lines {
        let placeholder = lines_from(placeholder);
        self.arena.render(self.arena.root(), &|node| match node.kind {
            NodeKind::Function {
                ..
            } if node.pending => Some(placeholder.clone()),
            _ => None,
        })
    }
}
