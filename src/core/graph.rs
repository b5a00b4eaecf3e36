//! The immutable state graph.
//!
//! States live in an arena and refer to each other by [`StateId`], so the
//! parent/child back-references of a hierarchy never form ownership
//! cycles and ancestor walks stay O(depth).

use crate::core::callback::Action;
use crate::core::guard::Guard;
use crate::core::state::{StateId, StateNode};
use crate::effects::MachineError;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// One candidate transition for a (source state, event) pair.
pub struct TransitionCandidate<A> {
    pub(crate) guard: Option<Guard<A>>,
    pub(crate) target: Option<StateId>,
    pub(crate) actions: Vec<Action<A>>,
}

impl<A> TransitionCandidate<A> {
    pub fn guard(&self) -> Option<&Guard<A>> {
        self.guard.as_ref()
    }

    /// Target state, `None` for internal transitions.
    pub fn target(&self) -> Option<StateId> {
        self.target
    }

    pub fn actions(&self) -> &[Action<A>] {
        &self.actions
    }

    /// Internal transitions run their actions without leaving the state.
    pub fn is_internal(&self) -> bool {
        self.target.is_none()
    }
}

/// Read-only description of all states, their hierarchy and transitions.
pub struct StateGraph<S, E, A> {
    pub(crate) nodes: Vec<StateNode<S, E, A>>,
    pub(crate) index: HashMap<S, StateId>,
}

impl<S, E, A> StateGraph<S, E, A>
where
    S: Clone + Eq + Hash + Debug,
    E: Eq + Hash,
{
    /// Look up a declared state by key.
    pub fn resolve(&self, key: &S) -> Result<&StateNode<S, E, A>, MachineError> {
        self.id_of(key).map(|id| self.node(id))
    }

    pub fn id_of(&self, key: &S) -> Result<StateId, MachineError> {
        self.index
            .get(key)
            .copied()
            .ok_or_else(|| MachineError::UnknownState {
                state: format!("{key:?}"),
            })
    }

    /// Access a node by id. Ids are only handed out by this graph.
    pub fn node(&self, id: StateId) -> &StateNode<S, E, A> {
        &self.nodes[id.0]
    }

    pub fn key(&self, id: StateId) -> &S {
        &self.nodes[id.0].key
    }

    pub fn parent(&self, id: StateId) -> Option<StateId> {
        self.nodes[id.0].parent
    }

    pub fn level(&self, id: StateId) -> usize {
        self.nodes[id.0].level
    }

    /// `id` followed by each of its ancestors up to the root.
    pub fn ancestors(&self, id: StateId) -> impl Iterator<Item = StateId> + '_ {
        std::iter::successors(Some(id), move |current| self.parent(*current))
    }

    /// True when `id` lies strictly below `ancestor`.
    pub fn is_descendant_of(&self, id: StateId, ancestor: StateId) -> bool {
        self.ancestors(id).skip(1).any(|candidate| candidate == ancestor)
    }

    /// True when `child` is a direct sub-state of `parent`.
    pub fn is_child_of(&self, child: StateId, parent: StateId) -> bool {
        self.parent(child) == Some(parent)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All state keys in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = &S> + '_ {
        self.nodes.iter().map(|node| &node.key)
    }
}

impl<S: Debug, E, A> Debug for StateGraph<S, E, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateGraph")
            .field("states", &self.nodes.iter().map(|n| &n.key).collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::StateMachineBuilder;
    use crate::core::HistoryPolicy;

    #[derive(Clone, PartialEq, Eq, Hash, Debug)]
    enum TestState {
        Root,
        Left,
        LeftLeaf,
        Right,
        Unused,
    }

    fn graph() -> StateGraph<TestState, u8, ()> {
        StateMachineBuilder::new()
            .hierarchy(
                TestState::Root,
                HistoryPolicy::None,
                TestState::Left,
                [TestState::Left, TestState::Right],
            )
            .hierarchy(
                TestState::Left,
                HistoryPolicy::None,
                TestState::LeftLeaf,
                [TestState::LeftLeaf],
            )
            .build()
            .unwrap()
    }

    #[test]
    fn resolve_finds_declared_states() {
        let graph = graph();
        let node = graph.resolve(&TestState::LeftLeaf).unwrap();

        assert_eq!(node.key(), &TestState::LeftLeaf);
        assert_eq!(node.level(), 2);
    }

    #[test]
    fn resolve_rejects_unknown_states() {
        let graph = graph();

        let result = graph.resolve(&TestState::Unused);

        assert!(matches!(result, Err(MachineError::UnknownState { .. })));
    }

    #[test]
    fn ancestors_walk_to_root() {
        let graph = graph();
        let leaf = graph.id_of(&TestState::LeftLeaf).unwrap();

        let keys: Vec<_> = graph.ancestors(leaf).map(|id| graph.key(id).clone()).collect();

        assert_eq!(
            keys,
            vec![TestState::LeftLeaf, TestState::Left, TestState::Root]
        );
    }

    #[test]
    fn descendant_relation_is_strict() {
        let graph = graph();
        let root = graph.id_of(&TestState::Root).unwrap();
        let leaf = graph.id_of(&TestState::LeftLeaf).unwrap();
        let right = graph.id_of(&TestState::Right).unwrap();

        assert!(graph.is_descendant_of(leaf, root));
        assert!(!graph.is_descendant_of(root, root));
        assert!(!graph.is_descendant_of(leaf, right));
        assert!(graph.is_child_of(right, root));
    }
}
