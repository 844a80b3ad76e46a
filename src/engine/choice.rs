//! Choice switching.
//!
//! Each choice node is always in exactly one `BranchSelected(i)` state; the first
//! branch is selected at expansion. Selecting another branch:
//!
//! 1. leaves the previous branch dormant (kept, but neither rendered nor resolvable),
//! 2. activates the new branch, building it on first selection,
//! 3. re-resolves the arguments of every function node,
//! 4. marks the dependents of the choice pending and immediately updates the choice
//!    subtree together with everything derived from it.
//!
//! Switching away and back without edits in between re-evaluates nothing: the
//! function nodes of the dormant branch keep their values and are not pending.

use super::arena::{NodeKind, Resolution};
use super::scheduler::{TextDelta, UpdateReport};
use super::session::ExpansionSession;
use crate::core::SnipError;
use crate::snippet::Address;
use crate::snippet::text::char_len;

impl ExpansionSession {
    /// Select the 1-based `branch` of the choice at `address`.
    ///
    /// The report starts with the delta replacing the old branch text by the new
    /// one, followed by the deltas of the scoped update. Selecting the branch that is
    /// already selected is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`SnipError::NotLive`] if the address does not resolve,
    /// [`SnipError::NotAChoice`] if it names another kind of node and
    /// [`SnipError::BranchOutOfRange`] for a branch the choice does not have.
    pub fn select_choice(
        &mut self,
        address: &Address,
        branch: usize,
    ) -> Result<UpdateReport, SnipError> {
        let choice = self.live_node(address)?;
        let (available, selected) = match &self.arena.get(choice).kind {
            NodeKind::Choice {
                branches,
                selected,
                ..
            } => (branches.len(), *selected),
            other => {
                return Err(SnipError::NotAChoice {
                    address: address.to_string(),
                    kind: other.name(),
                });
            }
        };
        if branch == 0 || branch > available {
            return Err(SnipError::BranchOutOfRange {
                address: address.to_string(),
                branch,
                available,
            });
        }

        let target = branch - 1;
        if target == selected {
            tracing::debug!("Branch {branch} of choice {address} is already selected");
            return Ok(UpdateReport {
                pending: self.pending_functions().len(),
                ..UpdateReport::default()
            });
        }

        let start = self.arena.locate(choice).unwrap_or_default();
        let old_lines = self.arena.text_of(choice);

        let (_, built) = self.arena.build_branch(&self.snippet, choice, target);
        if let NodeKind::Choice {
            selected,
            ..
        } = &mut self.arena.get_mut(choice).kind
        {
            *selected = target;
        }
        self.rebind();
        if self.active.is_some_and(|active| !self.arena.is_live(active)) {
            self.active = Some(choice);
        }
        tracing::debug!(
            "Choice {address} of '{}' switched from branch {} to {branch} ({})",
            self.trigger(),
            selected + 1,
            if built { "built" } else { "reactivated" }
        );

        let switched = TextDelta {
            node: choice,
            path: self.path_of(choice),
            start,
            old_length: char_len(&old_lines),
            old_lines,
            new_lines: self.arena.text_of(choice),
        };

        self.mark_dirty(choice);
        let candidates = self.affected_functions(choice);
        let mut report = self.run_update(&candidates);
        report.deltas.insert(0, switched);
        Ok(report)
    }

    /// 1-based selected branch of the choice at `address`.
    ///
    /// # Errors
    ///
    /// Returns [`SnipError::NotLive`] or [`SnipError::NotAChoice`].
    pub fn selected_branch(&self, address: &Address) -> Result<usize, SnipError> {
        let choice = self.live_node(address)?;
        match &self.arena.get(choice).kind {
            NodeKind::Choice {
                selected,
                ..
            } => Ok(selected + 1),
            other => Err(SnipError::NotAChoice {
                address: address.to_string(),
                kind: other.name(),
            }),
        }
    }

    /// Paths of live function nodes whose arguments do not all resolve right now.
    pub fn unresolved_functions(&self) -> Vec<String> {
        let mut result: Vec<String> = self
            .bindings
            .iter()
            .filter(|(id, bindings)| {
                self.arena.is_live(**id) && bindings.contains(&Resolution::Unresolved)
            })
            .map(|(id, _)| self.path_of(*id))
            .collect();
        result.sort();
        result
    }
}
