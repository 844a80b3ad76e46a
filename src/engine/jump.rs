//! Moving between tabstops.

use serde::Serialize;

use super::arena::{NodeId, NodeKind};
use super::scheduler::UpdateReport;
use super::session::ExpansionSession;
use crate::core::SnipError;
use crate::snippet::Address;

/// Jump direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// To the next tabstop; past the last one the snippet is exited.
    Forward,
    /// To the previous tabstop; stops at the first one.
    Backward,
}

/// Where a jump landed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JumpOutcome {
    /// The new active node, `None` if the jump left the snippet.
    pub node: Option<NodeId>,
    /// Address of the new active node.
    pub address: Option<Address>,
    /// Result of the update run by the jump.
    pub report: UpdateReport,
}

impl ExpansionSession {
    /// Move the active tabstop and update what the move affects.
    ///
    /// The update covers the dependents of the node being left and the function nodes
    /// of the scope being entered.
    ///
    /// # Errors
    ///
    /// Returns [`SnipError::NoJumpTargets`] if the snippet has no live tabstops.
    pub fn jump(&mut self, direction: Direction) -> Result<JumpOutcome, SnipError> {
        let targets = self.jump_targets();
        if targets.is_empty() {
            return Err(SnipError::NoJumpTargets {
                trigger: self.trigger().to_string(),
            });
        }

        let current = self.active.and_then(|active| targets.iter().position(|&t| t == active));
        let next = match (self.active, current, direction) {
            (_, Some(index), Direction::Forward) => targets.get(index + 1).copied(),
            (_, Some(index), Direction::Backward) => Some(targets[index.saturating_sub(1)]),
            (None, _, Direction::Forward) => None,
            (None, _, Direction::Backward) => targets.last().copied(),
            (Some(_), None, _) => targets.first().copied(),
        };

        let mut candidates = self
            .active
            .filter(|&left| self.arena.is_live(left))
            .map(|left| self.affected_functions(left))
            .unwrap_or_default();
        if let Some(entered) = next {
            candidates.extend(self.functions_below(self.arena.enclosing_scope(entered)));
        }

        self.active = next;
        let report = self.run_update(&candidates);
        match next {
            Some(id) => tracing::debug!("Jumped to {} in '{}'", self.path_of(id), self.trigger()),
            None => tracing::debug!("Left snippet '{}'", self.trigger()),
        }

        Ok(JumpOutcome {
            node: next,
            address: next.and_then(|id| self.address_of(id)),
            report,
        })
    }

    /// Live jump targets in jump order.
    ///
    /// Within a scope tabstops are ordered by index with `0` last. Inserts and
    /// choices are targets; nested snippets (including a choice's selected snippet
    /// branch) contribute their own tabstops in place.
    pub fn jump_targets(&self) -> Vec<NodeId> {
        let mut targets = Vec::new();
        self.collect_targets(self.arena.root(), &mut targets);
        targets
    }

    fn collect_targets(&self, scope: NodeId, targets: &mut Vec<NodeId>) {
        let mut indexed: Vec<(u32, NodeId)> = self
            .arena
            .live_children(scope)
            .into_iter()
            .filter_map(|child| {
                self.arena.get(child).kind.tabstop_index().map(|index| (index, child))
            })
            .collect();
        indexed.sort_by_key(|&(index, _)| (index == 0, index));

        for (_, child) in indexed {
            match &self.arena.get(child).kind {
                NodeKind::Insert {
                    ..
                } => targets.push(child),
                NodeKind::Choice {
                    ..
                } => {
                    targets.push(child);
                    for branch in self.arena.live_children(child) {
                        if matches!(self.arena.get(branch).kind, NodeKind::Snippet { .. }) {
                            self.collect_targets(branch, targets);
                        }
                    }
                }
                NodeKind::Snippet {
                    ..
                } => self.collect_targets(child, targets),
                NodeKind::Text
                | NodeKind::Function {
                    ..
                } => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;
    use crate::snippet::text::lines_from;
    use crate::snippet::{ArgRef, NodeDefinition as N, Snippet, SnippetDefinition};

    fn snippet() -> Snippet {
        Snippet::compile(&SnippetDefinition::new(
            "jumps",
            vec![
                N::insert(0, ""),
                N::insert(2, "b"),
                N::insert(1, "a"),
                N::nested(3, vec![N::insert(1, "n")]),
                N::function([ArgRef::rel(1)], |args| Ok(args[0].clone())),
            ],
        ))
        .unwrap()
    }

    #[test]
    fn test_targets_order_zero_last() {
        let session = Engine::default().expand(&snippet());
        let addresses: Vec<Address> = session
            .jump_targets()
            .into_iter()
            .filter_map(|id| session.address_of(id))
            .collect();
        assert_eq!(
            addresses,
            vec![Address::from(1), Address::from(2), Address::from([3, 1]), Address::from(0)]
        );
        assert_eq!(session.address_of(session.active().unwrap()), Some(Address::from(1)));
    }

    #[test]
    fn test_jump_updates_dependents_of_left_tabstop() {
        let mut session = Engine::default().expand(&snippet());
        session.on_text_changed(&Address::from(1), "z").unwrap();
        assert_eq!(session.text(), lines_from("bzna"));

        let outcome = session.jump(Direction::Forward).unwrap();
        assert_eq!(outcome.address, Some(Address::from(2)));
        assert_eq!(outcome.report.deltas.len(), 1);
        assert_eq!(session.text(), lines_from("bznz"));
    }

    #[test]
    fn test_jump_past_end_exits_and_backward_clamps() {
        let mut session = Engine::default().expand(&snippet());
        assert!(session.jump(Direction::Backward).unwrap().address == Some(Address::from(1)));

        for _ in 0..3 {
            assert!(session.jump(Direction::Forward).unwrap().node.is_some());
        }
        let outcome = session.jump(Direction::Forward).unwrap();
        assert_eq!(outcome.node, None);
        assert_eq!(session.active(), None);
        assert_eq!(session.jump(Direction::Forward).unwrap().node, None);

        let outcome = session.jump(Direction::Backward).unwrap();
        assert_eq!(outcome.address, Some(Address::from(0)));
    }

    #[test]
    fn test_choice_is_target_and_snippet_branch_is_entered() {
        let snippet = Snippet::compile(&SnippetDefinition::new(
            "choice_jump",
            vec![N::choice(
                1,
                vec![
                    N::text("plain"),
                    N::branch_snippet(vec![N::insert(1, "x"), N::insert(2, "y")]),
                ],
            )],
        ))
        .unwrap();
        let mut session = Engine::default().expand(&snippet);
        assert_eq!(session.jump_targets().len(), 1);

        session.select_choice(&Address::from(1), 2).unwrap();
        let targets: Vec<Option<Address>> =
            session.jump_targets().into_iter().map(|id| session.address_of(id)).collect();
        assert_eq!(
            targets,
            vec![
                Some(Address::from(1)),
                Some(Address::from([1, 2, 1])),
                Some(Address::from([1, 2, 2])),
            ]
        );
    }

    #[test]
    fn test_no_targets() {
        let snippet =
            Snippet::compile(&SnippetDefinition::new("plain", vec![N::text("static")])).unwrap();
        let mut session = Engine::default().expand(&snippet);
        assert_eq!(session.active(), None);
        assert!(matches!(session.jump(Direction::Forward), Err(SnipError::NoJumpTargets { .. })));
    }
}
