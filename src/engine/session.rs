//! A live expansion of a snippet.

use std::collections::HashMap;

use super::arena::{Arena, NodeId, NodeKind, Resolution};
use crate::config::EngineConfig;
use crate::core::SnipError;
use crate::snippet::text::lines_from;
use crate::snippet::{Address, ArgRef, Lines, Position, Snippet, SlotKind};

/// One expanded instance of a [`Snippet`].
///
/// The session owns its node tree exclusively: every mutation goes through
/// [`on_text_changed`](Self::on_text_changed), [`update`](Self::update),
/// [`jump`](Self::jump) or [`select_choice`](Self::select_choice), all of which take
/// `&mut self`. Two sessions of the same snippet share nothing but the compiled
/// definition.
pub struct ExpansionSession {
    pub(super) snippet: Snippet,
    pub(super) arena: Arena,
    /// Current resolution of every argument of every built function node.
    pub(super) bindings: HashMap<NodeId, Vec<Resolution>>,
    pub(super) active: Option<NodeId>,
    pub(super) log_failures: bool,
}

impl std::fmt::Debug for ExpansionSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpansionSession")
            .field("trigger", &self.snippet.trigger())
            .field("nodes", &self.arena.len())
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

impl ExpansionSession {
    /// Build the instance tree without evaluating anything.
    pub(super) fn new(snippet: &Snippet, config: &EngineConfig) -> Self {
        let mut session = Self {
            snippet: snippet.clone(),
            arena: Arena::build(snippet),
            bindings: HashMap::new(),
            active: None,
            log_failures: config.log_failures,
        };
        session.rebind();
        session
    }

    /// The compiled snippet this session was expanded from.
    pub fn snippet(&self) -> &Snippet {
        &self.snippet
    }

    /// Trigger of the expanded snippet.
    pub fn trigger(&self) -> &str {
        self.snippet.trigger()
    }

    /// Rendered text of the whole snippet.
    pub fn text(&self) -> Lines {
        self.arena.text_of(self.arena.root())
    }

    /// Rendered text of the node at `address`.
    ///
    /// # Errors
    ///
    /// Returns [`SnipError::NotLive`] if the address does not resolve.
    pub fn text_at(&self, address: &Address) -> Result<Lines, SnipError> {
        let id = self.live_node(address)?;
        Ok(self.arena.text_of(id))
    }

    /// Resolve an absolute address against the live tree.
    pub fn lookup(&self, address: &Address) -> Resolution {
        let resolution = self.arena.resolve_path(self.arena.root(), address.segments());
        tracing::trace!("Resolved {address} in '{}': {resolution:?}", self.trigger());
        resolution
    }

    /// Resolve an argument reference as seen from node `from`.
    ///
    /// Relative references are looked up in the nearest snippet scope enclosing
    /// `from`; absolute ones from the root.
    pub fn resolve(&self, arg: &ArgRef, from: NodeId) -> Resolution {
        match arg {
            ArgRef::Relative(index) => {
                let scope = self.arena.enclosing_scope(from);
                self.arena.resolve_path(scope, &[*index])
            }
            ArgRef::Absolute(address) => self.lookup(address),
        }
    }

    /// Replace the text of an insert node after the user edited it.
    ///
    /// Everything derived from the node is marked pending; nothing is re-evaluated
    /// until the next [`update`](Self::update), [`jump`](Self::jump) or
    /// [`select_choice`](Self::select_choice).
    ///
    /// # Errors
    ///
    /// Returns [`SnipError::NotLive`] if the address does not resolve and
    /// [`SnipError::NotEditable`] if it names anything but an insert node.
    pub fn on_text_changed(&mut self, address: &Address, text: &str) -> Result<(), SnipError> {
        let id = self.live_node(address)?;
        let node = self.arena.get_mut(id);
        if !matches!(node.kind, NodeKind::Insert { .. }) {
            return Err(SnipError::NotEditable {
                address: address.to_string(),
                kind: node.kind.name(),
            });
        }

        let lines = lines_from(text);
        if node.lines == lines {
            return Ok(());
        }
        node.lines = lines;
        let marked = self.mark_dirty(id);
        tracing::debug!(
            "Tabstop {address} of '{}' edited, {marked} dependents pending",
            self.trigger()
        );
        Ok(())
    }

    /// Whether the function node at `address` is waiting for evaluation.
    ///
    /// Nodes other than function nodes are never pending.
    ///
    /// # Errors
    ///
    /// Returns [`SnipError::NotLive`] if the address does not resolve.
    pub fn is_pending(&self, address: &Address) -> Result<bool, SnipError> {
        let id = self.live_node(address)?;
        Ok(self.arena.get(id).pending)
    }

    /// Live function nodes that are waiting for evaluation, in arena order.
    pub fn pending_functions(&self) -> Vec<NodeId> {
        self.arena
            .ids()
            .filter(|&id| self.arena.get(id).pending && self.arena.is_live(id))
            .collect()
    }

    /// The node the cursor is on, or `None` once the snippet was exited.
    pub fn active(&self) -> Option<NodeId> {
        self.active
    }

    /// Absolute address of a node, if every step of its path is addressable.
    pub fn address_of(&self, id: NodeId) -> Option<Address> {
        self.snippet.address_of(self.arena.get(id).slot)
    }

    /// Human-readable location of a node, e.g. `$2.b2`.
    pub fn path_of(&self, id: NodeId) -> String {
        self.snippet.describe(self.arena.get(id).slot)
    }

    /// Kind name of a node (`"insert"`, `"function"`, ...).
    pub fn kind_of(&self, id: NodeId) -> &'static str {
        self.arena.get(id).kind.name()
    }

    /// Start of a live node in [`text`](Self::text).
    pub fn position_of(&self, id: NodeId) -> Option<Position> {
        self.arena.is_live(id).then(|| self.arena.locate(id)).flatten()
    }

    /// Number of nodes built so far (unselected branches are built lazily).
    pub fn built_nodes(&self) -> usize {
        self.arena.len()
    }

    pub(super) fn live_node(&self, address: &Address) -> Result<NodeId, SnipError> {
        self.lookup(address).node().ok_or_else(|| SnipError::NotLive {
            trigger: self.trigger().to_string(),
            address: address.to_string(),
        })
    }

    pub(super) fn is_function(&self, id: NodeId) -> bool {
        matches!(self.arena.get(id).kind, NodeKind::Function { .. })
    }

    /// Whether every argument of a function node currently resolves.
    pub(super) fn is_resolved(&self, id: NodeId) -> bool {
        self.bindings
            .get(&id)
            .is_some_and(|bindings| bindings.iter().all(|binding| binding.is_resolved()))
    }

    /// Re-resolve the arguments of every built function node.
    pub(super) fn rebind(&mut self) {
        let mut bindings = HashMap::new();
        for id in self.arena.ids() {
            let SlotKind::Function {
                definition,
                ..
            } = &self.snippet.slot(self.arena.get(id).slot).kind
            else {
                continue;
            };
            let resolved: Vec<Resolution> =
                definition.args().iter().map(|arg| self.resolve(arg, id)).collect();
            bindings.insert(id, resolved);
        }
        self.bindings = bindings;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;
    use crate::snippet::NodeDefinition as N;
    use crate::snippet::SnippetDefinition;

    fn session() -> ExpansionSession {
        let snippet = Snippet::compile(&SnippetDefinition::new(
            "scoped",
            vec![
                N::insert(1, "outer"),
                N::nested(2, vec![N::insert(1, "inner"), N::function([ArgRef::rel(1)], |args| {
                    Ok(args[0].clone())
                })]),
                N::choice(3, vec![N::text("one"), N::branch_insert("two")]),
            ],
        ))
        .unwrap();
        Engine::default().expand(&snippet)
    }

    #[test]
    fn test_relative_args_resolve_in_enclosing_scope() {
        let session = session();
        let function = session.pending_functions().first().copied();
        assert!(function.is_none(), "function should be evaluated on expand");

        let inner = session.lookup(&Address::from([2, 1])).node().unwrap();
        let nested = session.lookup(&Address::from(2)).node().unwrap();
        let function = session.arena.live_children(nested)[1];
        assert_eq!(session.resolve(&ArgRef::rel(1), function), Resolution::Node(inner));
        assert_eq!(session.text(), lines_from("outerinnerinnerone"));
    }

    #[test]
    fn test_edit_errors() {
        let mut session = session();
        let err = session.on_text_changed(&Address::from([3, 2]), "x").unwrap_err();
        assert!(matches!(err, SnipError::NotLive { .. }));

        let err = session.on_text_changed(&Address::from([3, 1]), "x").unwrap_err();
        assert!(matches!(err, SnipError::NotEditable { kind: "text", .. }));

        let err = session.on_text_changed(&Address::from(3), "x").unwrap_err();
        assert!(matches!(err, SnipError::NotEditable { kind: "choice", .. }));
    }

    #[test]
    fn test_edit_marks_pending_without_evaluating() {
        let mut session = session();
        session.on_text_changed(&Address::from([2, 1]), "changed").unwrap();
        assert_eq!(session.pending_functions().len(), 1);
        assert_eq!(session.text(), lines_from("outerchangedinnerone"));

        // Same text again does not mark anything new
        session.on_text_changed(&Address::from(1), "outer").unwrap();
        assert_eq!(session.pending_functions().len(), 1);
    }

    #[test]
    fn test_queries() {
        let session = session();
        let inner = session.lookup(&Address::from([2, 1])).node().unwrap();
        assert_eq!(session.kind_of(inner), "insert");
        assert_eq!(session.path_of(inner), "$2.$1");
        assert_eq!(session.address_of(inner), Some(Address::from([2, 1])));
        assert_eq!(session.position_of(inner), Some(Position::new(0, 5)));
        assert_eq!(session.text_at(&Address::from(3)).unwrap(), lines_from("one"));
        assert!(!session.is_pending(&Address::from(1)).unwrap());
    }
}
