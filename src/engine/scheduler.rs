//! Dirty tracking and ordered re-evaluation.
//!
//! Editing a node never recomputes anything by itself: [`ExpansionSession::mark_dirty`]
//! only flags the transitive dependents of the node as pending. An update then walks
//! the live part of the dependency graph in topological order (dependencies first)
//! and evaluates every pending function node of its scope whose arguments resolve.
//!
//! A function whose input is still unsettled this round (an upstream function that
//! is unresolved, failed, or outside the scope) is left pending rather than
//! evaluated against a stale value.

use std::collections::HashSet;

use serde::Serialize;

use super::arena::{NodeId, NodeKind};
use super::evaluator::{Evaluation, EvaluationFailure};
use super::session::ExpansionSession;
use crate::core::SnipError;
use crate::snippet::{Address, Lines, Position, SlotId};

/// Region of the tree an update may re-evaluate.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UpdateScope {
    /// Every live function node.
    #[default]
    All,
    /// Function nodes at or below the node at this address.
    Subtree(Address),
}

/// One change of rendered text.
///
/// `start` is where the node begins in the rendered snippet at the moment the delta
/// was produced, so deltas must be applied in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextDelta {
    /// The node whose text changed.
    pub node: NodeId,
    /// Human-readable location of the node.
    pub path: String,
    /// Start of the node in the rendered snippet.
    pub start: Position,
    /// Text before the change.
    pub old_lines: Lines,
    /// Length of the old text in characters, line breaks included.
    pub old_length: usize,
    /// Text after the change.
    pub new_lines: Lines,
}

/// A batch abandoned because a computation panicked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateAbort {
    /// The function node whose computation panicked.
    pub node: NodeId,
    /// Human-readable location of the node.
    pub path: String,
    /// Panic message.
    pub reason: String,
}

/// Result of an update, a jump or a choice switch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateReport {
    /// Text changes, in the order they must be applied.
    pub deltas: Vec<TextDelta>,
    /// Function nodes whose computation returned an error.
    pub failures: Vec<EvaluationFailure>,
    /// Set if the batch was abandoned; deltas before the abort stay applied.
    pub aborted: Option<UpdateAbort>,
    /// Number of computations run.
    pub evaluated: usize,
    /// Live function nodes still pending afterwards.
    pub pending: usize,
}

impl UpdateReport {
    /// Whether any text changed.
    pub fn changed(&self) -> bool {
        !self.deltas.is_empty()
    }

    /// Whether every computation of the batch succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.aborted.is_none()
    }
}

impl ExpansionSession {
    /// Flag every built function node derived from `node` as pending.
    ///
    /// Dependents are transitive: functions reading the node, containers holding it,
    /// functions reading those containers, and so on. Returns how many function nodes
    /// became pending.
    pub fn mark_dirty(&mut self, node: NodeId) -> usize {
        let slot = self.arena.get(node).slot;
        let mut marked = 0;
        for dependent in self.snippet.graph().dependents(slot) {
            let Some(id) = self.arena.node_for_slot(dependent) else {
                continue;
            };
            let entry = self.arena.get_mut(id);
            if matches!(entry.kind, NodeKind::Function { .. }) && !entry.pending {
                entry.pending = true;
                marked += 1;
            }
        }
        marked
    }

    /// Re-evaluate pending function nodes in `scope`.
    ///
    /// # Errors
    ///
    /// Returns [`SnipError::NotLive`] if a subtree address does not resolve.
    pub fn update(&mut self, scope: &UpdateScope) -> Result<UpdateReport, SnipError> {
        let root = match scope {
            UpdateScope::All => self.arena.root(),
            UpdateScope::Subtree(address) => self.live_node(address)?,
        };
        let candidates = self.functions_below(root);
        Ok(self.run_update(&candidates))
    }

    /// Live function nodes at or below `id`.
    pub(super) fn functions_below(&self, id: NodeId) -> HashSet<NodeId> {
        self.arena.live_subtree(id).into_iter().filter(|&node| self.is_function(node)).collect()
    }

    /// Live function nodes whose text may depend on `id` or anything below it,
    /// including the function nodes below it.
    pub(super) fn affected_functions(&self, id: NodeId) -> HashSet<NodeId> {
        let graph = self.snippet.graph();
        let mut result = HashSet::new();
        for node in self.arena.live_subtree(id) {
            if self.is_function(node) {
                result.insert(node);
            }
            for slot in graph.dependents(self.arena.get(node).slot) {
                if let Some(dependent) = self.arena.node_for_slot(slot)
                    && self.is_function(dependent)
                    && self.arena.is_live(dependent)
                {
                    result.insert(dependent);
                }
            }
        }
        result
    }

    /// Evaluate the pending, resolved members of `candidates` in dependency order.
    pub(super) fn run_update(&mut self, candidates: &HashSet<NodeId>) -> UpdateReport {
        let mut report = UpdateReport::default();

        let order = {
            let arena = &self.arena;
            self.snippet.graph().topological_order(|slot| arena.slot_live(slot))
        };
        let order = match order {
            Ok(order) => order,
            Err(error) => {
                tracing::error!("Cannot order update of '{}': {error:#}", self.trigger());
                report.aborted = Some(UpdateAbort {
                    node: self.arena.root(),
                    path: "root".to_string(),
                    reason: format!("{error:#}"),
                });
                report.pending = self.pending_functions().len();
                return report;
            }
        };

        let mut unsettled: HashSet<SlotId> = HashSet::new();
        for slot in order {
            let Some(id) = self.arena.node_for_slot(slot) else {
                continue;
            };
            let upstream_unsettled =
                self.snippet.graph().direct_deps(slot).iter().any(|dep| unsettled.contains(dep));
            let node = self.arena.get(id);

            if !matches!(node.kind, NodeKind::Function { .. }) || !node.pending {
                if upstream_unsettled {
                    unsettled.insert(slot);
                }
                continue;
            }

            if upstream_unsettled || !candidates.contains(&id) || !self.is_resolved(id) {
                tracing::trace!("Function {} stays pending", self.snippet.describe(slot));
                unsettled.insert(slot);
                continue;
            }

            match self.evaluate(id) {
                Evaluation::Changed(delta) => {
                    report.evaluated += 1;
                    report.deltas.push(delta);
                    self.mark_dirty(id);
                }
                Evaluation::Unchanged => report.evaluated += 1,
                Evaluation::Failed(failure) => {
                    report.evaluated += 1;
                    report.failures.push(failure);
                    unsettled.insert(slot);
                }
                Evaluation::Panicked(abort) => {
                    report.aborted = Some(abort);
                    break;
                }
            }
        }

        report.pending = self.pending_functions().len();
        tracing::debug!(
            "Update of '{}': {} evaluated, {} changed, {} failed, {} pending",
            self.trigger(),
            report.evaluated,
            report.deltas.len(),
            report.failures.len(),
            report.pending
        );
        report
    }
}
