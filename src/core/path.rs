//! Exit/entry planning for hierarchical transitions.
//!
//! A transition declared on `source` and targeting `target` leaves states
//! bottom-up, runs its actions once, then enters states top-down. The
//! point where actions run is where the source and target paths first
//! coincide, so the plan is a list of exits followed by a list of entries.

use crate::core::graph::StateGraph;
use crate::core::state::StateId;
use std::fmt::Debug;
use std::hash::Hash;

/// States to exit (in order) before the transition actions and states to
/// enter (in order) after them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransitionPath {
    pub exits: Vec<StateId>,
    pub entries: Vec<StateId>,
}

/// Plan an external transition.
///
/// `current` is the active leaf, `source` the ancestor-or-self of
/// `current` on which the transition was declared. Everything between
/// `current` and `source` is exited first.
pub fn plan_transition<S, E, A>(
    graph: &StateGraph<S, E, A>,
    current: StateId,
    source: StateId,
    target: StateId,
) -> TransitionPath
where
    S: Clone + Eq + Hash + Debug,
    E: Eq + Hash,
{
    let mut path = TransitionPath::default();

    path.exits
        .extend(graph.ancestors(current).take_while(|state| *state != source));

    traverse(graph, source, target, target, &mut path);
    path
}

fn traverse<S, E, A>(
    graph: &StateGraph<S, E, A>,
    source: StateId,
    target: StateId,
    final_target: StateId,
    path: &mut TransitionPath,
) where
    S: Clone + Eq + Hash + Debug,
    E: Eq + Hash,
{
    if source == final_target {
        // self-transition, or climbed from below up to the target
        path.exits.push(source);
        path.entries.push(final_target);
    } else if source == target {
        // descended from the target up to the source: nothing to exit
    } else if graph.parent(source) == graph.parent(target) {
        path.exits.push(source);
        path.entries.push(target);
    } else {
        let source_level = graph.level(source);
        let target_level = graph.level(target);
        let source_parent = graph.parent(source);
        let target_parent = graph.parent(target);

        match (source_parent, target_parent) {
            (Some(up), _) if source_level > target_level => {
                path.exits.push(source);
                traverse(graph, up, target, final_target, path);
            }
            (_, Some(up)) if source_level < target_level => {
                traverse(graph, source, up, final_target, path);
                path.entries.push(target);
            }
            (Some(source_up), Some(target_up)) => {
                path.exits.push(source);
                traverse(graph, source_up, target_up, final_target, path);
                path.entries.push(target);
            }
            _ => {
                // only reachable for malformed level data; treat as siblings
                path.exits.push(source);
                path.entries.push(target);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::StateMachineBuilder;
    use crate::core::HistoryPolicy;

    //   A            B
    //  / \          / \
    // A1  A2       B1  B2
    //     |
    //    A2x
    #[derive(Clone, PartialEq, Eq, Hash, Debug)]
    enum S {
        A,
        A1,
        A2,
        A2x,
        B,
        B1,
        B2,
    }

    fn graph() -> StateGraph<S, u8, ()> {
        StateMachineBuilder::new()
            .hierarchy(S::A, HistoryPolicy::None, S::A1, [S::A1, S::A2])
            .hierarchy(S::A2, HistoryPolicy::None, S::A2x, [S::A2x])
            .hierarchy(S::B, HistoryPolicy::None, S::B1, [S::B1, S::B2])
            .build()
            .unwrap()
    }

    fn plan(current: S, source: S, target: S) -> (Vec<S>, Vec<S>) {
        let graph = graph();
        let id = |s: &S| graph.id_of(s).unwrap();
        let path = plan_transition(&graph, id(&current), id(&source), id(&target));
        let keys = |ids: Vec<StateId>| -> Vec<S> {
            ids.into_iter().map(|i| graph.key(i).clone()).collect()
        };
        (keys(path.exits), keys(path.entries))
    }

    #[test]
    fn self_transition_exits_and_reenters() {
        assert_eq!(plan(S::A1, S::A1, S::A1), (vec![S::A1], vec![S::A1]));
    }

    #[test]
    fn siblings_exit_and_enter_once() {
        assert_eq!(plan(S::B1, S::B1, S::B2), (vec![S::B1], vec![S::B2]));
    }

    #[test]
    fn descending_to_a_substate_exits_nothing() {
        assert_eq!(plan(S::A, S::A, S::A2x), (vec![], vec![S::A2, S::A2x]));
    }

    #[test]
    fn climbing_to_an_ancestor_reenters_it() {
        assert_eq!(
            plan(S::A2x, S::A2x, S::A),
            (vec![S::A2x, S::A2, S::A], vec![S::A])
        );
    }

    #[test]
    fn crossing_branches_meets_at_common_ancestor() {
        assert_eq!(
            plan(S::A2x, S::A2x, S::B2),
            (vec![S::A2x, S::A2, S::A], vec![S::B, S::B2])
        );
    }

    #[test]
    fn nested_current_state_unwinds_to_declared_source() {
        assert_eq!(
            plan(S::A2x, S::A, S::B1),
            (vec![S::A2x, S::A2, S::A], vec![S::B, S::B1])
        );
    }

    #[test]
    fn cousins_at_equal_depth() {
        assert_eq!(
            plan(S::A1, S::A1, S::B1),
            (vec![S::A1, S::A], vec![S::B, S::B1])
        );
    }
}
