//! History tracking and resolution.
//!
//! Every time a state is exited it becomes the *last active* sub-state of
//! its super-state. When a super-state is entered later, its
//! [`HistoryPolicy`] decides whether that record is used.
//!
//! Resolution is a pure function of the graph and the recorded history:
//! it only plans which states to enter, the engine performs the entries.

use crate::core::graph::StateGraph;
use crate::core::state::{HistoryPolicy, StateId};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Last active sub-state per super-state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StateHistory {
    last_active: HashMap<StateId, StateId>,
}

impl StateHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `exited` was left while its super-state was `parent`.
    pub fn record(&mut self, parent: StateId, exited: StateId) {
        self.last_active.insert(parent, exited);
    }

    pub fn last_active(&self, super_state: StateId) -> Option<StateId> {
        self.last_active.get(&super_state).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (StateId, StateId)> + '_ {
        self.last_active.iter().map(|(k, v)| (*k, *v))
    }

    pub fn len(&self) -> usize {
        self.last_active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_active.is_empty()
    }

    pub(crate) fn replace(&mut self, entries: HashMap<StateId, StateId>) {
        self.last_active = entries;
    }
}

/// Plan the sub-states to enter below `state`, ending at a leaf.
///
/// `state` itself is not part of the result. The first step follows the
/// history policy of `state`:
///
/// - [`HistoryPolicy::None`]: declared initial sub-state, then declared
///   initial sub-states all the way down.
/// - [`HistoryPolicy::Shallow`]: last active sub-state (initial when none
///   is recorded), then declared initial sub-states below it.
/// - [`HistoryPolicy::Deep`]: last active sub-state at every level,
///   falling back to the initial sub-state where nothing is recorded.
pub fn resolve_descent<S, E, A>(
    graph: &StateGraph<S, E, A>,
    state: StateId,
    history: &StateHistory,
) -> Vec<StateId>
where
    S: Clone + Eq + Hash + Debug,
    E: Eq + Hash,
{
    let mut path = Vec::new();
    let mut policy = graph.node(state).history();
    let mut current = state;

    loop {
        let node = graph.node(current);
        if node.is_leaf() {
            break;
        }

        let next = match policy {
            HistoryPolicy::None => node.initial(),
            HistoryPolicy::Shallow | HistoryPolicy::Deep => history
                .last_active(current)
                .filter(|child| graph.is_child_of(*child, current))
                .or_else(|| node.initial()),
        };

        let Some(next) = next else {
            break;
        };

        path.push(next);
        if policy == HistoryPolicy::Shallow {
            policy = HistoryPolicy::None;
        }
        current = next;
    }

    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::StateMachineBuilder;

    #[derive(Clone, PartialEq, Eq, Hash, Debug)]
    enum TestState {
        Top,
        Inner1,
        Inner1a,
        Inner1b,
        Inner2,
        Inner2a,
        Inner2b,
    }

    fn graph(policy: HistoryPolicy) -> StateGraph<TestState, u8, ()> {
        StateMachineBuilder::new()
            .hierarchy(
                TestState::Top,
                policy,
                TestState::Inner1,
                [TestState::Inner1, TestState::Inner2],
            )
            .hierarchy(
                TestState::Inner1,
                HistoryPolicy::None,
                TestState::Inner1a,
                [TestState::Inner1a, TestState::Inner1b],
            )
            .hierarchy(
                TestState::Inner2,
                HistoryPolicy::None,
                TestState::Inner2a,
                [TestState::Inner2a, TestState::Inner2b],
            )
            .build()
            .unwrap()
    }

    fn keys(graph: &StateGraph<TestState, u8, ()>, path: Vec<StateId>) -> Vec<TestState> {
        path.into_iter().map(|id| graph.key(id).clone()).collect()
    }

    fn visited_inner2b(graph: &StateGraph<TestState, u8, ()>) -> StateHistory {
        let id = |s: TestState| graph.id_of(&s).unwrap();
        let mut history = StateHistory::new();
        history.record(id(TestState::Top), id(TestState::Inner2));
        history.record(id(TestState::Inner2), id(TestState::Inner2b));
        history
    }

    #[test]
    fn none_policy_ignores_history() {
        let graph = graph(HistoryPolicy::None);
        let history = visited_inner2b(&graph);
        let top = graph.id_of(&TestState::Top).unwrap();

        let path = resolve_descent(&graph, top, &history);

        assert_eq!(
            keys(&graph, path),
            vec![TestState::Inner1, TestState::Inner1a]
        );
    }

    #[test]
    fn shallow_policy_restores_one_level() {
        let graph = graph(HistoryPolicy::Shallow);
        let history = visited_inner2b(&graph);
        let top = graph.id_of(&TestState::Top).unwrap();

        let path = resolve_descent(&graph, top, &history);

        assert_eq!(
            keys(&graph, path),
            vec![TestState::Inner2, TestState::Inner2a]
        );
    }

    #[test]
    fn deep_policy_restores_leaf() {
        let graph = graph(HistoryPolicy::Deep);
        let history = visited_inner2b(&graph);
        let top = graph.id_of(&TestState::Top).unwrap();

        let path = resolve_descent(&graph, top, &history);

        assert_eq!(
            keys(&graph, path),
            vec![TestState::Inner2, TestState::Inner2b]
        );
    }

    #[test]
    fn history_policies_fall_back_to_initial() {
        let graph = graph(HistoryPolicy::Deep);
        let top = graph.id_of(&TestState::Top).unwrap();

        let path = resolve_descent(&graph, top, &StateHistory::new());

        assert_eq!(
            keys(&graph, path),
            vec![TestState::Inner1, TestState::Inner1a]
        );
    }

    #[test]
    fn leaf_has_empty_descent() {
        let graph = graph(HistoryPolicy::Deep);
        let leaf = graph.id_of(&TestState::Inner1b).unwrap();

        assert!(resolve_descent(&graph, leaf, &StateHistory::new()).is_empty());
    }

    #[test]
    fn record_overwrites_previous_child() {
        let graph = graph(HistoryPolicy::Deep);
        let id = |s: TestState| graph.id_of(&s).unwrap();
        let mut history = StateHistory::new();

        history.record(id(TestState::Inner1), id(TestState::Inner1a));
        history.record(id(TestState::Inner1), id(TestState::Inner1b));

        assert_eq!(
            history.last_active(id(TestState::Inner1)),
            Some(id(TestState::Inner1b))
        );
        assert_eq!(history.len(), 1);
    }
}
