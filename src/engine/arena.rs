//! Node arena of an expanded snippet.
//!
//! Nodes live in a vector and refer to each other by [`NodeId`]; parents are plain
//! indices, so the tree has no ownership cycles. Only selected choice branches are
//! built: the other branches stay [`BranchState::NotYetBuilt`] until first selected,
//! and once built they are kept (dormant) when the selection moves away.

use std::fmt;

use crate::snippet::text::{append_lines, empty_lines};
use crate::snippet::{Lines, Position, ROOT_SLOT, Snippet, SlotId, SlotKind};

/// Per-instance identity of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub struct NodeId(usize);

impl NodeId {
    /// Index of the node in its arena.
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Outcome of resolving an address against the live tree.
///
/// `Unresolved` is a normal, transient state: the address points into a choice
/// branch that is not selected (or not built yet).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The address names this live node.
    Node(NodeId),
    /// The address cannot be reached right now.
    Unresolved,
}

impl Resolution {
    /// The resolved node, if any.
    pub const fn node(self) -> Option<NodeId> {
        match self {
            Self::Node(id) => Some(id),
            Self::Unresolved => None,
        }
    }

    /// Whether the address resolved.
    pub const fn is_resolved(self) -> bool {
        matches!(self, Self::Node(_))
    }
}

/// Build state of one choice branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BranchState {
    /// Never selected; holds the definition slot of the branch root.
    NotYetBuilt(SlotId),
    /// Built subtree root.
    Built(NodeId),
}

#[derive(Debug, Clone)]
pub(crate) enum NodeKind {
    Text,
    Insert {
        index: Option<u32>,
    },
    Function {
        evaluated: bool,
    },
    Choice {
        index: u32,
        branches: Vec<BranchState>,
        /// 0-based selected branch, always built.
        selected: usize,
    },
    Snippet {
        index: Option<u32>,
        children: Vec<NodeId>,
    },
}

impl NodeKind {
    pub(crate) const fn name(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Insert {
                ..
            } => "insert",
            Self::Function {
                ..
            } => "function",
            Self::Choice {
                ..
            } => "choice",
            Self::Snippet {
                ..
            } => "snippet",
        }
    }

    pub(crate) const fn tabstop_index(&self) -> Option<u32> {
        match self {
            Self::Insert {
                index,
            }
            | Self::Snippet {
                index,
                ..
            } => *index,
            Self::Choice {
                index,
                ..
            } => Some(*index),
            Self::Text
            | Self::Function {
                ..
            } => None,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) slot: SlotId,
    pub(crate) parent: Option<NodeId>,
    pub(crate) kind: NodeKind,
    /// Own text of leaf nodes. Containers render from their children.
    pub(crate) lines: Lines,
    /// Function nodes only: needs evaluation before its text can be trusted.
    pub(crate) pending: bool,
}

/// Arena of one snippet instance.
#[derive(Debug, Clone)]
pub(crate) struct Arena {
    nodes: Vec<Node>,
    by_slot: Vec<Option<NodeId>>,
}

impl Arena {
    /// Build the root and every initially selected (first) branch.
    pub(crate) fn build(snippet: &Snippet) -> Self {
        let mut arena = Self {
            nodes: Vec::with_capacity(snippet.node_count()),
            by_slot: vec![None; snippet.node_count()],
        };
        arena.build_subtree(snippet, ROOT_SLOT, None);
        arena
    }

    fn build_subtree(&mut self, snippet: &Snippet, slot: SlotId, parent: Option<NodeId>) -> NodeId {
        let info = snippet.slot(slot);
        let id = NodeId(self.nodes.len());
        let (kind, lines, pending) = match &info.kind {
            SlotKind::Text(lines) => (NodeKind::Text, lines.clone(), false),
            SlotKind::Insert {
                index,
                placeholder,
            } => (
                NodeKind::Insert {
                    index: *index,
                },
                placeholder.clone(),
                false,
            ),
            SlotKind::Function {
                ..
            } => (
                NodeKind::Function {
                    evaluated: false,
                },
                empty_lines(),
                true,
            ),
            SlotKind::Choice {
                index,
                branches,
            } => (
                NodeKind::Choice {
                    index: *index,
                    branches: branches.iter().map(|&root| BranchState::NotYetBuilt(root)).collect(),
                    selected: 0,
                },
                Vec::new(),
                false,
            ),
            SlotKind::Snippet {
                index,
                ..
            } => (
                NodeKind::Snippet {
                    index: *index,
                    children: Vec::new(),
                },
                Vec::new(),
                false,
            ),
        };

        self.nodes.push(Node {
            slot,
            parent,
            kind,
            lines,
            pending,
        });
        self.by_slot[slot] = Some(id);

        match &info.kind {
            SlotKind::Choice {
                ..
            } => {
                self.build_branch(snippet, id, 0);
            }
            SlotKind::Snippet {
                children,
                ..
            } => {
                let built: Vec<NodeId> = children
                    .iter()
                    .map(|&child| self.build_subtree(snippet, child, Some(id)))
                    .collect();
                if let NodeKind::Snippet {
                    children,
                    ..
                } = &mut self.nodes[id.0].kind
                {
                    *children = built;
                }
            }
            _ => {}
        }

        id
    }

    /// Build branch `branch` of `choice` if needed.
    ///
    /// Returns the branch root and whether it was built by this call.
    pub(crate) fn build_branch(
        &mut self,
        snippet: &Snippet,
        choice: NodeId,
        branch: usize,
    ) -> (NodeId, bool) {
        let state = match &self.nodes[choice.0].kind {
            NodeKind::Choice {
                branches,
                ..
            } => branches[branch],
            _ => unreachable!("build_branch called on a non-choice node"),
        };

        match state {
            BranchState::Built(root) => (root, false),
            BranchState::NotYetBuilt(slot) => {
                let root = self.build_subtree(snippet, slot, Some(choice));
                if let NodeKind::Choice {
                    branches,
                    ..
                } = &mut self.nodes[choice.0].kind
                {
                    branches[branch] = BranchState::Built(root);
                }
                (root, true)
            }
        }
    }

    pub(crate) const fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub(crate) fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    pub(crate) fn node_for_slot(&self, slot: SlotId) -> Option<NodeId> {
        self.by_slot.get(slot).copied().flatten()
    }

    /// Whether the node is built and every choice above it selects its branch.
    pub(crate) fn is_live(&self, id: NodeId) -> bool {
        let mut current = id;
        while let Some(parent) = self.nodes[current.0].parent {
            if let NodeKind::Choice {
                branches,
                selected,
                ..
            } = &self.nodes[parent.0].kind
                && branches[*selected] != BranchState::Built(current)
            {
                return false;
            }
            current = parent;
        }
        true
    }

    pub(crate) fn slot_live(&self, slot: SlotId) -> bool {
        self.node_for_slot(slot).is_some_and(|id| self.is_live(id))
    }

    /// Nearest snippet node strictly above `id`; the root for the root itself.
    pub(crate) fn enclosing_scope(&self, id: NodeId) -> NodeId {
        let mut current = self.nodes[id.0].parent;
        while let Some(node) = current {
            if matches!(self.nodes[node.0].kind, NodeKind::Snippet { .. }) {
                return node;
            }
            current = self.nodes[node.0].parent;
        }
        self.root()
    }

    /// The live child for a path segment, if any.
    fn step(&self, current: NodeId, segment: u32) -> Option<NodeId> {
        match &self.nodes[current.0].kind {
            NodeKind::Snippet {
                children,
                ..
            } => children
                .iter()
                .copied()
                .find(|&child| self.nodes[child.0].kind.tabstop_index() == Some(segment)),
            NodeKind::Choice {
                branches,
                selected,
                ..
            } => {
                let branch = (segment as usize).checked_sub(1)?;
                if branch != *selected {
                    return None;
                }
                match branches.get(branch)? {
                    BranchState::Built(root) => Some(*root),
                    BranchState::NotYetBuilt(_) => None,
                }
            }
            NodeKind::Text
            | NodeKind::Insert {
                ..
            }
            | NodeKind::Function {
                ..
            } => None,
        }
    }

    /// Walk `segments` from `start` through the live tree.
    pub(crate) fn resolve_path(&self, start: NodeId, segments: &[u32]) -> Resolution {
        let mut current = start;
        for &segment in segments {
            match self.step(current, segment) {
                Some(next) => current = next,
                None => return Resolution::Unresolved,
            }
        }
        Resolution::Node(current)
    }

    /// Live children in document order (the selected branch for a choice).
    pub(crate) fn live_children(&self, id: NodeId) -> Vec<NodeId> {
        match &self.nodes[id.0].kind {
            NodeKind::Snippet {
                children,
                ..
            } => children.clone(),
            NodeKind::Choice {
                branches,
                selected,
                ..
            } => match branches[*selected] {
                BranchState::Built(root) => vec![root],
                BranchState::NotYetBuilt(_) => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    /// `id` and every live node below it, in document order.
    pub(crate) fn live_subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            result.push(current);
            let children = self.live_children(current);
            stack.extend(children.into_iter().rev());
        }
        result
    }

    /// Current rendered text of a node.
    pub(crate) fn text_of(&self, id: NodeId) -> Lines {
        self.render(id, &|_| None)
    }

    /// Render a node, letting `leaf_override` replace the text of individual leaves.
    pub(crate) fn render(
        &self,
        id: NodeId,
        leaf_override: &dyn Fn(&Node) -> Option<Lines>,
    ) -> Lines {
        let node = &self.nodes[id.0];
        match &node.kind {
            NodeKind::Snippet {
                ..
            }
            | NodeKind::Choice {
                ..
            } => {
                let mut out = empty_lines();
                for child in self.live_children(id) {
                    append_lines(&mut out, &self.render(child, leaf_override));
                }
                out
            }
            _ => leaf_override(node).unwrap_or_else(|| node.lines.clone()),
        }
    }

    /// Start of a live node in the text rendered from the root.
    pub(crate) fn locate(&self, target: NodeId) -> Option<Position> {
        let mut position = Position::default();
        self.locate_from(self.root(), target, &mut position).then_some(position)
    }

    fn locate_from(&self, current: NodeId, target: NodeId, position: &mut Position) -> bool {
        if current == target {
            return true;
        }
        match &self.nodes[current.0].kind {
            NodeKind::Snippet {
                ..
            }
            | NodeKind::Choice {
                ..
            } => self
                .live_children(current)
                .into_iter()
                .any(|child| self.locate_from(child, target, position)),
            _ => {
                *position = position.advanced_by(&self.nodes[current.0].lines);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snippet::text::lines_from;
    use crate::snippet::{ArgRef, NodeDefinition as N, SnippetDefinition};

    fn sample() -> Snippet {
        Snippet::compile(&SnippetDefinition::new(
            "sample",
            vec![
                N::insert(1, "cccc"),
                N::text(" "),
                N::choice(2, vec![N::text("aaaa"), N::branch_insert("bbbb")]),
                N::function([ArgRef::abs([2, 2]), ArgRef::rel(1)], |args| {
                    let mut out = args[0].clone();
                    append_lines(&mut out, &args[1]);
                    Ok(out)
                }),
            ],
        ))
        .unwrap()
    }

    #[test]
    fn test_build_is_lazy() {
        let snippet = sample();
        let arena = Arena::build(&snippet);

        // root, $1, text, choice, branch 1 text, function; branch 2 not built
        assert_eq!(arena.len(), 6);
        assert_eq!(arena.node_for_slot(5), None);
        assert_eq!(arena.text_of(arena.root()), lines_from("cccc aaaa"));
    }

    #[test]
    fn test_resolve_through_unselected_branch() {
        let snippet = sample();
        let mut arena = Arena::build(&snippet);
        let root = arena.root();

        assert_eq!(arena.resolve_path(root, &[2, 2]), Resolution::Unresolved);
        assert!(arena.resolve_path(root, &[2, 1]).is_resolved());
        assert_eq!(arena.resolve_path(root, &[7]), Resolution::Unresolved);

        let choice = arena.resolve_path(root, &[2]).node().unwrap();
        let (branch_root, built) = arena.build_branch(&snippet, choice, 1);
        assert!(built);
        assert!(!arena.is_live(branch_root));

        if let NodeKind::Choice {
            selected,
            ..
        } = &mut arena.get_mut(choice).kind
        {
            *selected = 1;
        }
        assert!(arena.is_live(branch_root));
        assert_eq!(arena.resolve_path(root, &[2, 2]), Resolution::Node(branch_root));
        assert_eq!(arena.text_of(root), lines_from("cccc bbbb"));
    }

    #[test]
    fn test_locate_counts_characters() {
        let snippet = sample();
        let arena = Arena::build(&snippet);
        let function = arena.node_for_slot(6).unwrap();
        assert_eq!(arena.locate(function), Some(Position::new(0, 9)));
        assert_eq!(arena.enclosing_scope(function), arena.root());
    }

    #[test]
    fn test_subtrees() {
        let snippet = sample();
        let arena = Arena::build(&snippet);
        let choice = arena.resolve_path(arena.root(), &[2]).node().unwrap();
        assert_eq!(arena.live_subtree(choice).len(), 2);
        assert_eq!(arena.len(), 6);
    }
}
