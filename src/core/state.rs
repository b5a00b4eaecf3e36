//! State keys and the nodes of the state graph.
//!
//! States are identified by caller-supplied keys. Keys are only ever
//! compared for equality and hashed; no ordering is required.

use crate::core::callback::Action;
use crate::core::graph::TransitionCandidate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Trait for state keys.
///
/// Blanket-implemented for every type that is cloneable, hashable,
/// comparable for equality, debuggable and thread-safe, so enums like the
/// one below work without any further code.
///
/// # Example
///
/// ```rust
/// use strata::core::StateKey;
///
/// #[derive(Clone, PartialEq, Eq, Hash, Debug)]
/// enum Door {
///     Open,
///     Closed,
/// }
///
/// fn assert_key<K: StateKey>() {}
/// assert_key::<Door>();
/// ```
pub trait StateKey: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> StateKey for T where T: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

/// Trait for event keys. Same requirements as [`StateKey`].
pub trait EventKey: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> EventKey for T where T: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

/// Trait for the opaque argument that travels with an event.
pub trait EventArgument: Clone + Debug + Send + Sync + 'static {}

impl<T> EventArgument for T where T: Clone + Debug + Send + Sync + 'static {}

/// Rule for choosing which sub-state to enter when a super-state is targeted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistoryPolicy {
    /// Always enter the declared initial sub-state.
    #[default]
    None,

    /// Enter the last active sub-state, then follow declared initial
    /// sub-states below it.
    Shallow,

    /// Restore the last active sub-state at every level down to a leaf.
    Deep,
}

/// Index of a state inside a [`StateGraph`](crate::core::StateGraph) arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(pub(crate) usize);

impl StateId {
    /// Position of the state in the arena.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A single state of the graph.
///
/// Nodes are created by the [builder](crate::builder) and never change
/// afterwards. Relations to other nodes are stored as [`StateId`]s.
pub struct StateNode<S, E, A> {
    pub(crate) key: S,
    pub(crate) parent: Option<StateId>,
    pub(crate) children: Vec<StateId>,
    pub(crate) initial: Option<StateId>,
    pub(crate) history: HistoryPolicy,
    pub(crate) level: usize,
    pub(crate) entry_actions: Vec<Action<A>>,
    pub(crate) exit_actions: Vec<Action<A>>,
    pub(crate) transitions: HashMap<E, Vec<TransitionCandidate<A>>>,
}

impl<S, E, A> StateNode<S, E, A>
where
    E: Eq + Hash,
{
    pub(crate) fn new(key: S) -> Self {
        Self {
            key,
            parent: None,
            children: Vec::new(),
            initial: None,
            history: HistoryPolicy::None,
            level: 0,
            entry_actions: Vec::new(),
            exit_actions: Vec::new(),
            transitions: HashMap::new(),
        }
    }

    pub fn key(&self) -> &S {
        &self.key
    }

    /// The super-state, `None` for root states.
    pub fn parent(&self) -> Option<StateId> {
        self.parent
    }

    /// Sub-states in declaration order.
    pub fn children(&self) -> &[StateId] {
        &self.children
    }

    pub fn initial(&self) -> Option<StateId> {
        self.initial
    }

    pub fn history(&self) -> HistoryPolicy {
        self.history
    }

    /// Depth in the hierarchy; root states are at level 0.
    pub fn level(&self) -> usize {
        self.level
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Candidates declared on this state for `event`, in declaration order.
    pub fn candidates(&self, event: &E) -> &[TransitionCandidate<A>] {
        self.transitions
            .get(event)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
