//! Build errors for state machine definitions.

use thiserror::Error;

/// A structural problem in a state machine definition.
///
/// All structural problems of a definition are collected before
/// [`StateMachineBuilder::build`](crate::builder::StateMachineBuilder::build)
/// reports them.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StructuralError {
    #[error("State '{state}' already has super-state '{existing}', cannot add it to '{requested}'")]
    DuplicateSuperState {
        state: String,
        existing: String,
        requested: String,
    },

    #[error("State '{state}' declares more than one transition without guard for event '{event}'")]
    MultipleUnguardedTransitions { state: String, event: String },

    #[error("State '{state}' declares a transition without guard for event '{event}' that is not the last one")]
    UnguardedTransitionNotLast { state: String, event: String },

    #[error("Initial state '{initial}' is not a sub-state of '{super_state}'")]
    InitialStateNotSubState { super_state: String, initial: String },

    #[error("Hierarchy of '{super_state}' has no sub-states")]
    EmptyHierarchy { super_state: String },

    #[error("Hierarchy of '{super_state}' is declared more than once")]
    DuplicateHierarchy { super_state: String },

    #[error("State '{state}' is its own ancestor")]
    CyclicHierarchy { state: String },
}

/// Errors that can occur when building state machines and transitions.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Transition source state not specified. Call .from(state)")]
    MissingFromState,

    #[error("Transition event not specified. Call .on(event)")]
    MissingEvent,

    #[error("Invalid state machine definition: {}", describe(.0))]
    Invalid(Vec<StructuralError>),
}

fn describe(errors: &[StructuralError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
