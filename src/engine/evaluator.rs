//! Evaluation of function nodes.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde::Serialize;

use super::arena::{NodeId, NodeKind};
use super::scheduler::{TextDelta, UpdateAbort};
use super::session::ExpansionSession;
use crate::snippet::text::{char_len, normalize};
use crate::snippet::{Lines, SlotKind};

/// A computation that returned an error.
///
/// The node keeps its previous text and stays pending, so the next update retries it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvaluationFailure {
    /// The failed function node.
    pub node: NodeId,
    /// Human-readable location of the node.
    pub path: String,
    /// The error returned by the computation, with its context chain.
    pub cause: String,
}

pub(super) enum Evaluation {
    Changed(TextDelta),
    Unchanged,
    Failed(EvaluationFailure),
    Panicked(UpdateAbort),
}

impl ExpansionSession {
    /// Run the computation of function node `id` over its resolved arguments.
    ///
    /// Callers guarantee every argument resolves.
    pub(super) fn evaluate(&mut self, id: NodeId) -> Evaluation {
        let slot = self.arena.get(id).slot;
        let SlotKind::Function {
            definition,
            ..
        } = &self.snippet.slot(slot).kind
        else {
            return Evaluation::Unchanged;
        };
        let compute = Arc::clone(&definition.compute);
        let path = self.snippet.describe(slot);

        let args: Vec<Lines> = self
            .bindings
            .get(&id)
            .map(|bindings| {
                bindings
                    .iter()
                    .filter_map(|binding| binding.node())
                    .map(|arg| self.arena.text_of(arg))
                    .collect()
            })
            .unwrap_or_default();

        match panic::catch_unwind(AssertUnwindSafe(|| compute(&args))) {
            Ok(Ok(lines)) => {
                let lines = normalize(lines);
                let start = self.arena.locate(id).unwrap_or_default();
                let node = self.arena.get_mut(id);
                node.pending = false;
                node.kind = NodeKind::Function {
                    evaluated: true,
                };
                if node.lines == lines {
                    return Evaluation::Unchanged;
                }

                let old_lines = std::mem::replace(&mut node.lines, lines.clone());
                tracing::trace!("Function {path} now renders {lines:?}");
                Evaluation::Changed(TextDelta {
                    node: id,
                    path,
                    start,
                    old_length: char_len(&old_lines),
                    old_lines,
                    new_lines: lines,
                })
            }
            Ok(Err(error)) => {
                let cause = format!("{error:#}");
                if self.log_failures {
                    tracing::warn!(
                        "Function {path} of snippet '{}' failed: {cause}",
                        self.snippet.trigger()
                    );
                } else {
                    tracing::debug!(
                        "Function {path} of snippet '{}' failed: {cause}",
                        self.snippet.trigger()
                    );
                }
                Evaluation::Failed(EvaluationFailure {
                    node: id,
                    path,
                    cause,
                })
            }
            Err(payload) => {
                let reason = panic_message(payload.as_ref());
                tracing::error!(
                    "Function {path} of snippet '{}' panicked, abandoning update: {reason}",
                    self.snippet.trigger()
                );
                Evaluation::Panicked(UpdateAbort {
                    node: id,
                    path,
                    reason,
                })
            }
        }
    }

    /// Whether function node `id` has produced a value at least once.
    ///
    /// Always `false` for other kinds of nodes.
    pub fn was_evaluated(&self, id: NodeId) -> bool {
        matches!(
            self.arena.get(id).kind,
            NodeKind::Function {
                evaluated: true
            }
        )
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "computation panicked".to_string()
    }
}
