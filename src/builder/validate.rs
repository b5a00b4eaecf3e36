//! Structural validation of a definition.
//!
//! Uses `Validation` to accumulate ALL violations instead of stopping at
//! the first one, so a broken definition is reported in a single pass.

use crate::builder::error::StructuralError;
use crate::builder::machine::Hierarchy;
use crate::builder::transition::Transition;
use crate::core::{EventKey, StateKey};
use std::collections::{HashMap, HashSet};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

pub(crate) type Check = Validation<(), NonEmptyVec<StructuralError>>;

fn name<T: std::fmt::Debug>(value: &T) -> String {
    format!("{value:?}")
}

/// Validate every hierarchy and transition group of a definition.
pub(crate) fn validate<S: StateKey, E: EventKey, A>(
    hierarchies: &[Hierarchy<S>],
    transitions: &[Transition<S, E, A>],
) -> Check {
    let mut checks = vec![Validation::success(())];
    checks.extend(check_hierarchies(hierarchies));
    checks.extend(check_cycles(hierarchies));
    checks.extend(check_transitions(transitions));

    Validation::all_vec(checks).map(|_| ())
}

fn check_hierarchies<S: StateKey>(hierarchies: &[Hierarchy<S>]) -> Vec<Check> {
    let mut checks = Vec::new();
    let mut declared: HashSet<&S> = HashSet::new();
    let mut parents: HashMap<&S, &S> = HashMap::new();

    for hierarchy in hierarchies {
        if !declared.insert(&hierarchy.super_state) {
            checks.push(Validation::fail(StructuralError::DuplicateHierarchy {
                super_state: name(&hierarchy.super_state),
            }));
        }

        if hierarchy.children.is_empty() {
            checks.push(Validation::fail(StructuralError::EmptyHierarchy {
                super_state: name(&hierarchy.super_state),
            }));
        } else if !hierarchy.children.contains(&hierarchy.initial) {
            checks.push(Validation::fail(StructuralError::InitialStateNotSubState {
                super_state: name(&hierarchy.super_state),
                initial: name(&hierarchy.initial),
            }));
        }

        for child in &hierarchy.children {
            match parents.get(child) {
                Some(existing) if *existing != &hierarchy.super_state => {
                    checks.push(Validation::fail(StructuralError::DuplicateSuperState {
                        state: name(child),
                        existing: name(*existing),
                        requested: name(&hierarchy.super_state),
                    }));
                }
                Some(_) => {}
                None => {
                    parents.insert(child, &hierarchy.super_state);
                }
            }
        }
    }

    checks
}

fn check_cycles<S: StateKey>(hierarchies: &[Hierarchy<S>]) -> Vec<Check> {
    let mut parents: HashMap<&S, &S> = HashMap::new();
    for hierarchy in hierarchies {
        for child in &hierarchy.children {
            parents.entry(child).or_insert(&hierarchy.super_state);
        }
    }

    let mut checks = Vec::new();
    for start in parents.keys() {
        let mut visited: HashSet<&S> = HashSet::new();
        let mut current = *start;
        while let Some(parent) = parents.get(current) {
            if *parent == *start {
                checks.push(Validation::fail(StructuralError::CyclicHierarchy {
                    state: name(*start),
                }));
                break;
            }
            if !visited.insert(*parent) {
                break;
            }
            current = *parent;
        }
    }
    checks
}

fn check_transitions<S: StateKey, E: EventKey, A>(
    transitions: &[Transition<S, E, A>],
) -> Vec<Check> {
    let mut order: Vec<(&S, &E)> = Vec::new();
    let mut groups: HashMap<(&S, &E), Vec<bool>> = HashMap::new();

    for transition in transitions {
        let key = (&transition.from, &transition.event);
        groups
            .entry(key)
            .or_insert_with(|| {
                order.push(key);
                Vec::new()
            })
            .push(transition.guard.is_some());
    }

    let mut checks = Vec::new();
    for key in order {
        let guarded = &groups[&key];
        let unguarded = guarded.iter().filter(|g| !**g).count();

        if unguarded > 1 {
            checks.push(Validation::fail(
                StructuralError::MultipleUnguardedTransitions {
                    state: name(key.0),
                    event: name(key.1),
                },
            ));
        } else if unguarded == 1 && guarded.last() != Some(&false) {
            checks.push(Validation::fail(StructuralError::UnguardedTransitionNotLast {
                state: name(key.0),
                event: name(key.1),
            }));
        }
    }
    checks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TransitionBuilder;
    use crate::core::HistoryPolicy;

    #[derive(Clone, PartialEq, Eq, Hash, Debug)]
    enum S {
        A,
        B,
        C,
        D,
    }

    fn hierarchy(super_state: S, initial: S, children: Vec<S>) -> Hierarchy<S> {
        Hierarchy {
            super_state,
            history: HistoryPolicy::None,
            initial,
            children,
        }
    }

    fn transition(guarded: bool) -> Transition<S, u8, ()> {
        let builder = TransitionBuilder::new().from(S::A).on(1).to(S::B);
        let builder = if guarded { builder.when(|_| true) } else { builder };
        builder.build().unwrap()
    }

    fn errors(check: Check) -> Vec<StructuralError> {
        match check {
            Validation::Success(_) => Vec::new(),
            Validation::Failure(errors) => errors.iter().cloned().collect(),
        }
    }

    #[test]
    fn valid_definition_passes() {
        let hierarchies = vec![hierarchy(S::A, S::B, vec![S::B, S::C])];
        let transitions = vec![transition(true), transition(false)];

        assert!(validate(&hierarchies, &transitions).is_success());
    }

    #[test]
    fn second_super_state_is_rejected() {
        let hierarchies = vec![
            hierarchy(S::A, S::B, vec![S::B]),
            hierarchy(S::C, S::B, vec![S::B]),
        ];
        let no_transitions: Vec<Transition<S, u8, ()>> = Vec::new();

        let found = errors(validate(&hierarchies, &no_transitions));

        assert_eq!(found.len(), 1);
        assert!(matches!(
            found[0],
            StructuralError::DuplicateSuperState { .. }
        ));
    }

    #[test]
    fn validation_accumulates_all_violations() {
        let hierarchies = vec![
            hierarchy(S::A, S::D, vec![S::B]),
            hierarchy(S::C, S::C, vec![]),
        ];
        let transitions = vec![transition(false), transition(false)];

        let found = errors(validate(&hierarchies, &transitions));

        assert_eq!(found.len(), 3);
        assert!(found
            .iter()
            .any(|e| matches!(e, StructuralError::InitialStateNotSubState { .. })));
        assert!(found
            .iter()
            .any(|e| matches!(e, StructuralError::EmptyHierarchy { .. })));
        assert!(found
            .iter()
            .any(|e| matches!(e, StructuralError::MultipleUnguardedTransitions { .. })));
    }

    #[test]
    fn unguarded_transition_must_be_last() {
        let transitions = vec![transition(false), transition(true)];

        let found = errors(validate(&[], &transitions));

        assert_eq!(
            found,
            vec![StructuralError::UnguardedTransitionNotLast {
                state: "A".to_string(),
                event: "1".to_string(),
            }]
        );
    }

    #[test]
    fn cycles_are_detected() {
        let hierarchies = vec![
            hierarchy(S::A, S::B, vec![S::B]),
            hierarchy(S::B, S::A, vec![S::A]),
        ];
        let no_transitions: Vec<Transition<S, u8, ()>> = Vec::new();

        let found = errors(validate(&hierarchies, &no_transitions));

        assert!(found
            .iter()
            .all(|e| matches!(e, StructuralError::CyclicHierarchy { .. })));
        assert_eq!(found.len(), 2);
    }
}
