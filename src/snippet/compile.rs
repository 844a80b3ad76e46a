//! Compilation of snippet definitions.
//!
//! Compiling flattens a [`SnippetDefinition`] into a vector of *slots*, one per
//! definition node, including every branch of every choice. Slot ids are assigned
//! depth-first in document order, so slot `0` is always the root snippet. While
//! flattening, tabstops are indexed by `(scope, index)`; afterwards every function
//! argument is located statically and the dependency graph is checked for cycles
//! that could ever be live.
//!
//! A compiled [`Snippet`] is immutable and cheap to clone. Each expansion builds a
//! fresh node arena from its slots (see [`crate::engine`]).

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use super::address::{Address, ArgRef};
use super::definition::{FunctionDefinition, NodeDefinition, SnippetDefinition};
use super::text::Lines;
use crate::core::DefinitionError;
use crate::graph::{DependencyGraph, EdgeKind, Requirement};

/// Identity of a definition node inside a compiled snippet.
pub(crate) type SlotId = usize;

/// Slot id of the root snippet.
pub(crate) const ROOT_SLOT: SlotId = 0;

/// Kind-specific data of a slot.
#[derive(Clone)]
pub(crate) enum SlotKind {
    Text(Lines),
    Insert {
        index: Option<u32>,
        placeholder: Lines,
    },
    Function {
        definition: FunctionDefinition,
        /// Statically located argument slots, parallel to `definition.args`.
        targets: Vec<SlotId>,
    },
    Choice {
        index: u32,
        branches: Vec<SlotId>,
    },
    Snippet {
        index: Option<u32>,
        children: Vec<SlotId>,
    },
}

/// A flattened definition node.
#[derive(Clone)]
pub(crate) struct Slot {
    pub(crate) kind: SlotKind,
    pub(crate) parent: Option<SlotId>,
    /// Position in the parent's child sequence (0-based branch for branch roots).
    pub(crate) position: usize,
    /// Nearest enclosing snippet scope; the root is its own scope.
    pub(crate) scope: SlotId,
    /// Choice branches that must be selected for this slot to be live.
    pub(crate) requires: Vec<Requirement>,
}

impl Slot {
    pub(crate) fn tabstop_index(&self) -> Option<u32> {
        match &self.kind {
            SlotKind::Insert {
                index,
                ..
            }
            | SlotKind::Snippet {
                index,
                ..
            } => *index,
            SlotKind::Choice {
                index,
                ..
            } => Some(*index),
            SlotKind::Text(_)
            | SlotKind::Function {
                ..
            } => None,
        }
    }

    pub(crate) const fn is_function(&self) -> bool {
        matches!(self.kind, SlotKind::Function { .. })
    }
}

struct CompiledSnippet {
    trigger: String,
    description: Option<String>,
    slots: Vec<Slot>,
    tabstops: HashMap<(SlotId, u32), SlotId>,
    graph: DependencyGraph,
}

/// A validated, immutable snippet ready to be expanded.
///
/// Cloning is cheap; clones share the compiled layout.
#[derive(Clone)]
pub struct Snippet {
    inner: Arc<CompiledSnippet>,
}

impl std::fmt::Debug for Snippet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Snippet")
            .field("trigger", &self.inner.trigger)
            .field("slots", &self.inner.slots.len())
            .finish_non_exhaustive()
    }
}

impl Snippet {
    /// Compile a definition.
    ///
    /// # Errors
    ///
    /// Returns a [`DefinitionError`] if the trigger is empty, a tabstop index is
    /// missing or duplicated, a choice has no branches, an argument address does not
    /// name a node of the definition, or function nodes form a cycle whose members
    /// can all be live at once.
    pub fn compile(definition: &SnippetDefinition) -> Result<Self, DefinitionError> {
        if definition.trigger.trim().is_empty() {
            return Err(DefinitionError::EmptyTrigger);
        }

        let mut flattener = Flattener {
            trigger: &definition.trigger,
            slots: Vec::new(),
            tabstops: HashMap::new(),
        };
        flattener.flatten_root(&definition.nodes)?;

        let Flattener {
            mut slots,
            tabstops,
            ..
        } = flattener;

        let locator = Locator {
            trigger: &definition.trigger,
            slots: &slots,
            tabstops: &tabstops,
        };
        let mut located = Vec::new();
        for (id, slot) in slots.iter().enumerate() {
            if let SlotKind::Function {
                definition: function,
                ..
            } = &slot.kind
            {
                let targets = function
                    .args
                    .iter()
                    .map(|arg| locator.locate_arg(id, arg))
                    .collect::<Result<Vec<_>, _>>()?;
                located.push((id, targets));
            }
        }
        for (id, resolved) in located {
            if let SlotKind::Function {
                targets,
                ..
            } = &mut slots[id].kind
            {
                *targets = resolved;
            }
        }

        let graph = build_graph(&slots);
        let requirements: Vec<Vec<Requirement>> =
            slots.iter().map(|slot| slot.requires.clone()).collect();
        if let Some(cycle) = graph.find_live_cycle(&requirements) {
            let chain = cycle
                .iter()
                .map(|&slot| describe_slot(&slots, slot))
                .collect::<Vec<_>>()
                .join(" → ");
            return Err(DefinitionError::CircularDependency {
                trigger: definition.trigger.clone(),
                chain,
            });
        }

        tracing::debug!(
            "Compiled snippet '{}': {} slots, {} dependency edges",
            definition.trigger,
            graph.node_count(),
            graph.edge_count()
        );

        Ok(Self {
            inner: Arc::new(CompiledSnippet {
                trigger: definition.trigger.clone(),
                description: definition.description.clone(),
                slots,
                tabstops,
                graph,
            }),
        })
    }

    /// The trigger text.
    pub fn trigger(&self) -> &str {
        &self.inner.trigger
    }

    /// The description, if any.
    pub fn description(&self) -> Option<&str> {
        self.inner.description.as_deref()
    }

    /// Tabstop indices defined directly by the root scope.
    pub fn tabstops(&self) -> BTreeSet<u32> {
        self.inner
            .tabstops
            .keys()
            .filter(|(scope, _)| *scope == ROOT_SLOT)
            .map(|(_, index)| *index)
            .collect()
    }

    /// Number of definition nodes, counting every branch and the root.
    pub fn node_count(&self) -> usize {
        self.inner.slots.len()
    }

    /// Number of function nodes, counting those in every branch.
    pub fn function_count(&self) -> usize {
        self.inner.slots.iter().filter(|slot| slot.is_function()).count()
    }

    /// Number of argument dependencies between nodes.
    pub fn dependency_count(&self) -> usize {
        self.inner.graph.argument_edges().len()
    }

    pub(crate) fn slot(&self, id: SlotId) -> &Slot {
        &self.inner.slots[id]
    }

    pub(crate) fn graph(&self) -> &DependencyGraph {
        &self.inner.graph
    }

    /// Human-readable location of a slot, e.g. `$2.b2` or `#4`.
    pub(crate) fn describe(&self, slot: SlotId) -> String {
        describe_slot(&self.inner.slots, slot)
    }

    /// Absolute address of a slot, if every step of its path is addressable.
    pub(crate) fn address_of(&self, slot: SlotId) -> Option<Address> {
        let slots = &self.inner.slots;
        let mut segments = Vec::new();
        let mut current = slot;
        while let Some(parent) = slots[current].parent {
            let segment = match &slots[parent].kind {
                SlotKind::Choice {
                    ..
                } => u32::try_from(slots[current].position + 1).ok()?,
                _ => slots[current].tabstop_index()?,
            };
            segments.push(segment);
            current = parent;
        }
        segments.reverse();
        Some(Address::new(segments))
    }
}

struct Flattener<'a> {
    trigger: &'a str,
    slots: Vec<Slot>,
    tabstops: HashMap<(SlotId, u32), SlotId>,
}

impl Flattener<'_> {
    fn flatten_root(&mut self, nodes: &[NodeDefinition]) -> Result<(), DefinitionError> {
        self.slots.push(Slot {
            kind: SlotKind::Snippet {
                index: None,
                children: Vec::new(),
            },
            parent: None,
            position: 0,
            scope: ROOT_SLOT,
            requires: Vec::new(),
        });

        let children = nodes
            .iter()
            .enumerate()
            .map(|(position, node)| {
                self.flatten(node, ROOT_SLOT, position, ROOT_SLOT, &[], false)
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.set_children(ROOT_SLOT, children);
        Ok(())
    }

    fn flatten(
        &mut self,
        node: &NodeDefinition,
        parent: SlotId,
        position: usize,
        scope: SlotId,
        requires: &[Requirement],
        branch_root: bool,
    ) -> Result<SlotId, DefinitionError> {
        let id = self.slots.len();
        let kind = match node {
            NodeDefinition::Text(lines) => SlotKind::Text(lines.clone()),
            NodeDefinition::Insert {
                index,
                placeholder,
            } => SlotKind::Insert {
                index: *index,
                placeholder: placeholder.clone(),
            },
            NodeDefinition::Function(definition) => SlotKind::Function {
                definition: definition.clone(),
                targets: Vec::new(),
            },
            NodeDefinition::Choice {
                index,
                branches,
            } => {
                if branches.is_empty() {
                    return Err(DefinitionError::EmptyChoice {
                        trigger: self.trigger.to_string(),
                        index: *index,
                    });
                }
                SlotKind::Choice {
                    index: *index,
                    branches: Vec::new(),
                }
            }
            NodeDefinition::Snippet {
                index,
                ..
            } => SlotKind::Snippet {
                index: *index,
                children: Vec::new(),
            },
        };

        self.slots.push(Slot {
            kind,
            parent: Some(parent),
            position,
            scope,
            requires: requires.to_vec(),
        });

        let tabstop = self.slots[id].tabstop_index();
        let indexed_kind = matches!(
            node,
            NodeDefinition::Insert { .. }
                | NodeDefinition::Choice { .. }
                | NodeDefinition::Snippet { .. }
        );
        match (branch_root, tabstop) {
            (true, Some(_)) => {
                return Err(DefinitionError::IndexedBranchRoot {
                    trigger: self.trigger.to_string(),
                    node: describe_slot(&self.slots, id),
                    kind: node.kind_name(),
                });
            }
            (false, None) if indexed_kind => {
                return Err(DefinitionError::MissingTabstopIndex {
                    trigger: self.trigger.to_string(),
                    node: describe_slot(&self.slots, id),
                    kind: node.kind_name(),
                });
            }
            (false, Some(index)) => self.register(scope, index, id)?,
            _ => {}
        }

        match node {
            NodeDefinition::Choice {
                branches,
                ..
            } => {
                let roots = branches
                    .iter()
                    .enumerate()
                    .map(|(branch, root)| {
                        let mut branch_requires = requires.to_vec();
                        branch_requires.push((id, branch));
                        self.flatten(root, id, branch, scope, &branch_requires, true)
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                if let SlotKind::Choice {
                    branches,
                    ..
                } = &mut self.slots[id].kind
                {
                    *branches = roots;
                }
            }
            NodeDefinition::Snippet {
                nodes,
                ..
            } => {
                let children = nodes
                    .iter()
                    .enumerate()
                    .map(|(position, child)| self.flatten(child, id, position, id, requires, false))
                    .collect::<Result<Vec<_>, _>>()?;
                self.set_children(id, children);
            }
            _ => {}
        }

        Ok(id)
    }

    fn register(&mut self, scope: SlotId, index: u32, id: SlotId) -> Result<(), DefinitionError> {
        if self.tabstops.insert((scope, index), id).is_some() {
            return Err(DefinitionError::DuplicateTabstop {
                trigger: self.trigger.to_string(),
                index,
                scope: describe_slot(&self.slots, scope),
            });
        }
        Ok(())
    }

    fn set_children(&mut self, id: SlotId, new_children: Vec<SlotId>) {
        if let SlotKind::Snippet {
            children,
            ..
        } = &mut self.slots[id].kind
        {
            *children = new_children;
        }
    }
}

/// Static address lookup against the full definition (every branch included).
struct Locator<'a> {
    trigger: &'a str,
    slots: &'a [Slot],
    tabstops: &'a HashMap<(SlotId, u32), SlotId>,
}

impl Locator<'_> {
    fn locate_arg(&self, function: SlotId, arg: &ArgRef) -> Result<SlotId, DefinitionError> {
        match arg {
            ArgRef::Relative(index) => {
                let scope = self.slots[function].scope;
                self.tabstops.get(&(scope, *index)).copied().ok_or_else(|| {
                    DefinitionError::UnknownTabstop {
                        trigger: self.trigger.to_string(),
                        address: arg.to_string(),
                        index: *index,
                        scope: describe_slot(self.slots, scope),
                    }
                })
            }
            ArgRef::Absolute(address) => self.locate(address, arg),
        }
    }

    fn locate(&self, address: &Address, arg: &ArgRef) -> Result<SlotId, DefinitionError> {
        let mut current = ROOT_SLOT;
        for &segment in address.segments() {
            current = match &self.slots[current].kind {
                SlotKind::Snippet {
                    ..
                } => self.tabstops.get(&(current, segment)).copied().ok_or_else(|| {
                    DefinitionError::UnknownTabstop {
                        trigger: self.trigger.to_string(),
                        address: arg.to_string(),
                        index: segment,
                        scope: describe_slot(self.slots, current),
                    }
                })?,
                SlotKind::Choice {
                    branches,
                    ..
                } => {
                    let branch = (segment as usize).checked_sub(1).and_then(|b| branches.get(b));
                    *branch.ok_or_else(|| DefinitionError::UnknownBranch {
                        trigger: self.trigger.to_string(),
                        address: arg.to_string(),
                        branch: segment,
                        choice: describe_slot(self.slots, current),
                        available: branches.len(),
                    })?
                }
                SlotKind::Text(_)
                | SlotKind::Insert {
                    ..
                }
                | SlotKind::Function {
                    ..
                } => {
                    return Err(DefinitionError::AddressIntoLeaf {
                        trigger: self.trigger.to_string(),
                        address: arg.to_string(),
                        node: describe_slot(self.slots, current),
                    });
                }
            };
        }
        Ok(current)
    }
}

fn build_graph(slots: &[Slot]) -> DependencyGraph {
    let mut graph = DependencyGraph::new();
    for (id, slot) in slots.iter().enumerate() {
        graph.ensure_node(id);
        match &slot.kind {
            SlotKind::Snippet {
                children: targets,
                ..
            }
            | SlotKind::Choice {
                branches: targets,
                ..
            } => {
                for &child in targets {
                    graph.add_dependency(id, child, EdgeKind::Contains);
                }
            }
            SlotKind::Function {
                targets,
                ..
            } => {
                for &target in targets {
                    graph.add_dependency(id, target, EdgeKind::Argument);
                }
            }
            SlotKind::Text(_)
            | SlotKind::Insert {
                ..
            } => {}
        }
    }
    graph
}

fn describe_slot(slots: &[Slot], slot: SlotId) -> String {
    let mut parts = Vec::new();
    let mut current = slot;
    while let Some(parent) = slots[current].parent {
        let part = match &slots[parent].kind {
            SlotKind::Choice {
                ..
            } => format!("b{}", slots[current].position + 1),
            _ => match slots[current].tabstop_index() {
                Some(index) => format!("${index}"),
                None => format!("#{}", slots[current].position),
            },
        };
        parts.push(part);
        current = parent;
    }

    if parts.is_empty() {
        "root".to_string()
    } else {
        parts.reverse();
        parts.join(".")
    }
}
