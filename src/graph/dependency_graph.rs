//! Dependency graph management for function node evaluation.
//!
//! This module provides the graph data structure and algorithms needed to order
//! function node evaluation: cycle detection that understands choice branches,
//! topological ordering restricted to the live part of a snippet, and reverse
//! reachability for dirty propagation.
//!
//! Nodes are definition slots (see [`crate::snippet::Snippet`]). An edge `a → b` means
//! "the text of `a` is derived from the text of `b`": either a function reading an
//! argument, or a container whose text is the concatenation of its children.

use anyhow::{Result, anyhow};
use petgraph::Direction;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};

use crate::snippet::SlotId;

/// Why one slot depends on another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EdgeKind {
    /// A function node reads the target as an argument.
    Argument,
    /// A snippet or choice node renders the target as part of its text.
    Contains,
}

/// A choice slot together with the 0-based branch that must be selected.
pub(crate) type Requirement = (SlotId, usize);

/// Dependency graph over definition slots.
pub(crate) struct DependencyGraph {
    /// The underlying directed graph.
    graph: DiGraph<SlotId, EdgeKind>,
    /// Map from slots to their graph indices.
    node_map: HashMap<SlotId, NodeIndex>,
}

impl DependencyGraph {
    /// Create a new empty dependency graph.
    pub(crate) fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_map: HashMap::new(),
        }
    }

    /// Add a slot to the graph if it doesn't already exist.
    pub(crate) fn ensure_node(&mut self, slot: SlotId) -> NodeIndex {
        if let Some(&index) = self.node_map.get(&slot) {
            index
        } else {
            let index = self.graph.add_node(slot);
            self.node_map.insert(slot, index);
            index
        }
    }

    /// `from` depends on `to`: `to` must be current before `from` is evaluated.
    pub(crate) fn add_dependency(&mut self, from: SlotId, to: SlotId, kind: EdgeKind) {
        let from_idx = self.ensure_node(from);
        let to_idx = self.ensure_node(to);

        if !self.graph.contains_edge(from_idx, to_idx) {
            self.graph.add_edge(from_idx, to_idx, kind);
        }
    }

    /// Find a cycle whose slots can all be live at the same time.
    ///
    /// `requirements[slot]` lists the choice branches that must be selected for the
    /// slot to be live. A cycle passing through two different branches of the same
    /// choice can never be observed and is ignored.
    ///
    /// Returns the cycle as a slot path that starts and ends with the same slot.
    pub(crate) fn find_live_cycle(&self, requirements: &[Vec<Requirement>]) -> Option<Vec<SlotId>> {
        for component in tarjan_scc(&self.graph) {
            let cyclic = component.len() > 1
                || self.graph.contains_edge(component[0], component[0]);
            if !cyclic {
                continue;
            }

            let members: HashSet<NodeIndex> = component.iter().copied().collect();
            let mut starts = component.clone();
            starts.sort_by_key(|index| index.index());

            for &start in &starts {
                let mut chosen = HashMap::new();
                if admit(&mut chosen, self.requirements_of(start, requirements)).is_none() {
                    continue;
                }
                let mut path = vec![start];
                if let Some(cycle) =
                    self.search_cycle(start, start, &members, requirements, &mut path, &mut chosen)
                {
                    return Some(cycle);
                }
            }
        }

        None
    }

    /// Depth-first search for a consistent elementary cycle through `start`.
    ///
    /// Only slots with a graph index >= `start` are visited so each cycle is found
    /// from its smallest member.
    fn search_cycle(
        &self,
        start: NodeIndex,
        current: NodeIndex,
        members: &HashSet<NodeIndex>,
        requirements: &[Vec<Requirement>],
        path: &mut Vec<NodeIndex>,
        chosen: &mut HashMap<SlotId, usize>,
    ) -> Option<Vec<SlotId>> {
        for neighbor in self.graph.neighbors(current) {
            if !members.contains(&neighbor) || neighbor.index() < start.index() {
                continue;
            }
            if neighbor == start {
                let mut cycle: Vec<SlotId> = path.iter().map(|&idx| self.graph[idx]).collect();
                cycle.push(self.graph[start]);
                return Some(cycle);
            }
            if path.contains(&neighbor) {
                continue;
            }
            let Some(added) = admit(chosen, self.requirements_of(neighbor, requirements)) else {
                continue;
            };

            path.push(neighbor);
            if let Some(cycle) =
                self.search_cycle(start, neighbor, members, requirements, path, chosen)
            {
                return Some(cycle);
            }
            path.pop();
            for choice in added {
                chosen.remove(&choice);
            }
        }

        None
    }

    fn requirements_of<'a>(
        &self,
        index: NodeIndex,
        requirements: &'a [Vec<Requirement>],
    ) -> &'a [Requirement] {
        requirements.get(self.graph[index]).map_or(&[], Vec::as_slice)
    }

    /// Get the evaluation order of the live part of the graph.
    ///
    /// Returns live slots in an order where every slot comes after everything it
    /// depends on. Among slots that are ready at the same time the lowest slot id
    /// (earliest in document order) goes first, so the order is deterministic.
    /// Edges touching a slot that is not live are ignored.
    pub(crate) fn topological_order(&self, live: impl Fn(SlotId) -> bool) -> Result<Vec<SlotId>> {
        let live_nodes: Vec<NodeIndex> =
            self.graph.node_indices().filter(|&index| live(self.graph[index])).collect();
        let is_live: HashSet<NodeIndex> = live_nodes.iter().copied().collect();

        let mut remaining: HashMap<NodeIndex, usize> = HashMap::new();
        let mut ready = BinaryHeap::new();
        for &index in &live_nodes {
            let deps = self.graph.neighbors(index).filter(|dep| is_live.contains(dep)).count();
            if deps == 0 {
                ready.push(Reverse((self.graph[index], index)));
            } else {
                remaining.insert(index, deps);
            }
        }

        let mut order = Vec::with_capacity(live_nodes.len());
        while let Some(Reverse((slot, index))) = ready.pop() {
            order.push(slot);
            for dependent in self.graph.neighbors_directed(index, Direction::Incoming) {
                if let Some(count) = remaining.get_mut(&dependent) {
                    *count -= 1;
                    if *count == 0 {
                        remaining.remove(&dependent);
                        ready.push(Reverse((self.graph[dependent], dependent)));
                    }
                }
            }
        }

        match remaining.keys().map(|&index| self.graph[index]).min() {
            None => Ok(order),
            Some(slot) => {
                Err(anyhow!("Circular dependency detected among live nodes at slot {slot}"))
            }
        }
    }

    /// Get every slot whose text is derived, directly or indirectly, from `slot`.
    pub(crate) fn dependents(&self, slot: SlotId) -> Vec<SlotId> {
        let mut seen = HashSet::new();
        let mut result = Vec::new();
        let mut queue = VecDeque::new();

        if let Some(&start) = self.node_map.get(&slot) {
            queue.push_back(start);

            while let Some(current) = queue.pop_front() {
                for dependent in self.graph.neighbors_directed(current, Direction::Incoming) {
                    if seen.insert(dependent) {
                        result.push(self.graph[dependent]);
                        queue.push_back(dependent);
                    }
                }
            }
        }

        result
    }

    /// Get the slots `slot` depends on directly.
    pub(crate) fn direct_deps(&self, slot: SlotId) -> Vec<SlotId> {
        if let Some(&index) = self.node_map.get(&slot) {
            self.graph.neighbors(index).map(|idx| self.graph[idx]).collect()
        } else {
            Vec::new()
        }
    }

    /// Get the argument edges only, as `(function, argument)` pairs.
    pub(crate) fn argument_edges(&self) -> Vec<(SlotId, SlotId)> {
        self.graph
            .edge_references()
            .filter(|edge| *edge.weight() == EdgeKind::Argument)
            .map(|edge| (self.graph[edge.source()], self.graph[edge.target()]))
            .collect()
    }

    /// Get the total number of slots in the graph.
    pub(crate) fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Get the total number of dependency edges in the graph.
    pub(crate) fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Record `requirements` in `chosen`, or return `None` if one conflicts.
///
/// On success returns the choices that were newly recorded, so callers can undo.
fn admit(chosen: &mut HashMap<SlotId, usize>, requirements: &[Requirement]) -> Option<Vec<SlotId>> {
    if requirements
        .iter()
        .any(|(choice, branch)| chosen.get(choice).is_some_and(|existing| existing != branch))
    {
        return None;
    }

    let mut added = Vec::new();
    for &(choice, branch) in requirements {
        if chosen.insert(choice, branch).is_none() {
            added.push(choice);
        }
    }
    Some(added)
}
