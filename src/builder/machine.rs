//! Builder for constructing state graphs.

use crate::builder::error::BuildError;
use crate::builder::state::StateBuilder;
use crate::builder::transition::{Transition, TransitionBuilder};
use crate::builder::validate::validate;
use crate::core::{
    EventArgument, EventKey, HistoryPolicy, StateGraph, StateId, StateKey, StateNode,
    TransitionCandidate,
};
use std::collections::HashMap;
use stillwater::validation::Validation;
use tracing::debug;

/// A super-state together with its sub-states.
pub struct Hierarchy<S> {
    pub super_state: S,
    pub history: HistoryPolicy,
    pub initial: S,
    pub children: Vec<S>,
}

/// Builder for constructing a [`StateGraph`] with a fluent API.
///
/// States referenced by a state declaration, a hierarchy or a transition
/// are declared implicitly. Structural problems are collected and
/// reported together by [`build`](Self::build).
///
/// # Example
///
/// ```rust
/// use strata::builder::{StateMachineBuilder, TransitionBuilder};
/// use strata::core::HistoryPolicy;
///
/// #[derive(Clone, PartialEq, Eq, Hash, Debug)]
/// enum Player { Off, On, Playing, Paused }
///
/// #[derive(Clone, PartialEq, Eq, Hash, Debug)]
/// enum Button { Power, Play }
///
/// let graph = StateMachineBuilder::<Player, Button, ()>::new()
///     .hierarchy(Player::On, HistoryPolicy::Shallow, Player::Paused, [Player::Paused, Player::Playing])
///     .transition(TransitionBuilder::new().from(Player::Off).on(Button::Power).to(Player::On))
///     .unwrap()
///     .transition(TransitionBuilder::new().from(Player::On).on(Button::Power).to(Player::Off))
///     .unwrap()
///     .build()
///     .unwrap();
///
/// assert_eq!(graph.len(), 4);
/// ```
pub struct StateMachineBuilder<S, E, A> {
    order: Vec<S>,
    states: Vec<StateBuilder<S, A>>,
    hierarchies: Vec<Hierarchy<S>>,
    transitions: Vec<Transition<S, E, A>>,
}

impl<S: StateKey, E: EventKey, A: EventArgument> StateMachineBuilder<S, E, A> {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            states: Vec::new(),
            hierarchies: Vec::new(),
            transitions: Vec::new(),
        }
    }

    fn declare(&mut self, key: &S) {
        if !self.order.contains(key) {
            self.order.push(key.clone());
        }
    }

    /// Declare entry and exit actions for a state.
    pub fn state(mut self, state: StateBuilder<S, A>) -> Self {
        self.declare(&state.key);
        self.states.push(state);
        self
    }

    /// Declare `children` as sub-states of `super_state`.
    pub fn hierarchy(
        mut self,
        super_state: S,
        history: HistoryPolicy,
        initial: S,
        children: impl IntoIterator<Item = S>,
    ) -> Self {
        let mut unique: Vec<S> = Vec::new();
        for child in children {
            if !unique.contains(&child) {
                unique.push(child);
            }
        }

        self.declare(&super_state);
        self.declare(&initial);
        for child in &unique {
            self.declare(child);
        }

        self.hierarchies.push(Hierarchy {
            super_state,
            history,
            initial,
            children: unique,
        });
        self
    }

    /// Add a transition using a builder.
    /// Returns an error if the builder fails validation.
    pub fn transition(self, builder: TransitionBuilder<S, E, A>) -> Result<Self, BuildError> {
        let transition = builder.build()?;
        Ok(self.add_transition(transition))
    }

    /// Add a pre-built transition.
    pub fn add_transition(mut self, transition: Transition<S, E, A>) -> Self {
        self.declare(&transition.from);
        if let Some(to) = &transition.to {
            self.declare(to);
        }
        self.transitions.push(transition);
        self
    }

    /// Validate the definition and build the state graph.
    pub fn build(self) -> Result<StateGraph<S, E, A>, BuildError> {
        if let Validation::Failure(errors) = validate(&self.hierarchies, &self.transitions) {
            return Err(BuildError::Invalid(errors.iter().cloned().collect()));
        }

        let index: HashMap<S, StateId> = self
            .order
            .iter()
            .enumerate()
            .map(|(i, key)| (key.clone(), StateId(i)))
            .collect();
        let mut nodes: Vec<StateNode<S, E, A>> =
            self.order.into_iter().map(StateNode::new).collect();

        for hierarchy in self.hierarchies {
            let super_id = index[&hierarchy.super_state];
            let children: Vec<StateId> = hierarchy.children.iter().map(|c| index[c]).collect();
            for child in &children {
                nodes[child.0].parent = Some(super_id);
            }
            let node = &mut nodes[super_id.0];
            node.children = children;
            node.initial = Some(index[&hierarchy.initial]);
            node.history = hierarchy.history;
        }

        let levels: Vec<usize> = (0..nodes.len())
            .map(|i| std::iter::successors(nodes[i].parent, |p| nodes[p.0].parent).count())
            .collect();
        for (node, level) in nodes.iter_mut().zip(levels) {
            node.level = level;
        }

        for state in self.states {
            let node = &mut nodes[index[&state.key].0];
            node.entry_actions.extend(state.entry);
            node.exit_actions.extend(state.exit);
        }

        for transition in self.transitions {
            let candidate = TransitionCandidate {
                guard: transition.guard,
                target: transition.to.as_ref().map(|to| index[to]),
                actions: transition.actions,
            };
            nodes[index[&transition.from].0]
                .transitions
                .entry(transition.event)
                .or_default()
                .push(candidate);
        }

        debug!(states = nodes.len(), "state graph built");
        Ok(StateGraph { nodes, index })
    }
}

impl<S: StateKey, E: EventKey, A: EventArgument> Default for StateMachineBuilder<S, E, A> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::StructuralError;

    #[derive(Clone, PartialEq, Eq, Hash, Debug)]
    enum TestState {
        Idle,
        Active,
        Running,
        Paused,
    }

    #[derive(Clone, PartialEq, Eq, Hash, Debug)]
    enum TestEvent {
        Toggle,
    }

    #[test]
    fn builder_creates_graph_with_hierarchy() {
        let graph = StateMachineBuilder::<TestState, TestEvent, ()>::new()
            .hierarchy(
                TestState::Active,
                HistoryPolicy::Deep,
                TestState::Running,
                [TestState::Running, TestState::Paused],
            )
            .transition(
                TransitionBuilder::new()
                    .from(TestState::Idle)
                    .on(TestEvent::Toggle)
                    .to(TestState::Active),
            )
            .unwrap()
            .build()
            .unwrap();

        let active = graph.resolve(&TestState::Active).unwrap();
        assert_eq!(active.children().len(), 2);
        assert_eq!(active.history(), HistoryPolicy::Deep);
        assert_eq!(
            active.initial().map(|id| graph.key(id)),
            Some(&TestState::Running)
        );

        let paused = graph.resolve(&TestState::Paused).unwrap();
        assert_eq!(paused.level(), 1);
        assert_eq!(
            paused.parent().map(|id| graph.key(id)),
            Some(&TestState::Active)
        );

        let idle = graph.resolve(&TestState::Idle).unwrap();
        assert_eq!(idle.candidates(&TestEvent::Toggle).len(), 1);
    }

    #[test]
    fn state_actions_accumulate() {
        let graph = StateMachineBuilder::<TestState, TestEvent, ()>::new()
            .state(StateBuilder::new(TestState::Idle).on_entry(|_| {}))
            .state(
                StateBuilder::new(TestState::Idle)
                    .on_entry(|_| {})
                    .on_exit(|_| {}),
            )
            .build()
            .unwrap();

        let idle = graph.resolve(&TestState::Idle).unwrap();
        assert_eq!(idle.entry_actions.len(), 2);
        assert_eq!(idle.exit_actions.len(), 1);
    }

    #[test]
    fn second_unguarded_transition_fails_build() {
        let result = StateMachineBuilder::<TestState, TestEvent, ()>::new()
            .transition(
                TransitionBuilder::new()
                    .from(TestState::Idle)
                    .on(TestEvent::Toggle)
                    .to(TestState::Active),
            )
            .unwrap()
            .transition(
                TransitionBuilder::new()
                    .from(TestState::Idle)
                    .on(TestEvent::Toggle)
                    .to(TestState::Paused),
            )
            .unwrap()
            .build();

        match result {
            Err(BuildError::Invalid(errors)) => assert_eq!(
                errors,
                vec![StructuralError::MultipleUnguardedTransitions {
                    state: "Idle".to_string(),
                    event: "Toggle".to_string(),
                }]
            ),
            other => panic!("expected structural error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn second_parent_fails_build() {
        let result = StateMachineBuilder::<TestState, TestEvent, ()>::new()
            .hierarchy(
                TestState::Active,
                HistoryPolicy::None,
                TestState::Running,
                [TestState::Running],
            )
            .hierarchy(
                TestState::Idle,
                HistoryPolicy::None,
                TestState::Running,
                [TestState::Running],
            )
            .build();

        assert!(matches!(result, Err(BuildError::Invalid(_))));
    }
}
