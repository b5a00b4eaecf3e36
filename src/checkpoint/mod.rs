//! Saving and loading the current state and history of a machine.
//!
//! A machine is saved through a [`StateMachineSaver`] and restored through
//! a [`StateMachineLoader`]. Only the current state and the history map
//! are persisted; queued events and transition callbacks are not.
//! [`PersistedSnapshot`] implements both traits in memory and encodes to
//! JSON or binary for storage.
//!
//! A snapshot can only be loaded into a machine that has not entered any
//! state yet. Every history entry is validated against the machine
//! definition before anything is applied.

mod gateway;

pub mod error;

pub use error::CheckpointError;
pub(crate) use gateway::{load, save};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;
use uuid::Uuid;

/// Version identifier for snapshot format
pub const SNAPSHOT_VERSION: u32 = 1;

/// Receives the persisted parts of a machine.
pub trait StateMachineSaver<S> {
    /// `None` when the machine was never initialized.
    fn save_current_state(&mut self, state: Option<&S>) -> Result<(), CheckpointError>;

    /// Last active sub-state per super-state.
    fn save_history(&mut self, history: &HashMap<S, S>) -> Result<(), CheckpointError>;
}

/// Supplies the persisted parts of a machine.
pub trait StateMachineLoader<S> {
    fn load_current_state(&mut self) -> Result<Option<S>, CheckpointError>;

    fn load_history(&mut self) -> Result<HashMap<S, S>, CheckpointError>;
}

/// One super-state and its last active sub-state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry<S> {
    pub super_state: S,
    pub last_active: S,
}

/// Serializable snapshot of a machine.
///
/// History is stored as a list of entries so that state keys need not be
/// strings in JSON.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound(serialize = "S: Serialize", deserialize = "S: DeserializeOwned"))]
pub struct PersistedSnapshot<S> {
    /// Snapshot format version
    pub version: u32,

    /// Unique snapshot identifier
    pub id: Uuid,

    /// When the snapshot was last written
    pub taken_at: DateTime<Utc>,

    pub current_state: Option<S>,

    pub history: Vec<HistoryEntry<S>>,
}

impl<S> Default for PersistedSnapshot<S> {
    fn default() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            id: Uuid::new_v4(),
            taken_at: Utc::now(),
            current_state: None,
            history: Vec::new(),
        }
    }
}

impl<S> PersistedSnapshot<S> {
    /// Create an empty snapshot, ready to be passed to `save`.
    pub fn new() -> Self {
        Self::default()
    }

    fn check_version(self) -> Result<Self, CheckpointError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(CheckpointError::UnsupportedVersion {
                found: self.version,
                supported: SNAPSHOT_VERSION,
            });
        }
        Ok(self)
    }
}

impl<S: Clone + Eq + Hash> PersistedSnapshot<S> {
    /// History entries as a map from super-state to last active sub-state.
    pub fn history_map(&self) -> HashMap<S, S> {
        self.history
            .iter()
            .map(|entry| (entry.super_state.clone(), entry.last_active.clone()))
            .collect()
    }
}

impl<S: Serialize> PersistedSnapshot<S> {
    pub fn to_json(&self) -> Result<String, CheckpointError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_binary(&self) -> Result<Vec<u8>, CheckpointError> {
        Ok(bincode::serialize(self)?)
    }
}

impl<S: DeserializeOwned> PersistedSnapshot<S> {
    /// Decode a JSON snapshot, rejecting unsupported versions.
    pub fn from_json(json: &str) -> Result<Self, CheckpointError> {
        serde_json::from_str::<Self>(json)?.check_version()
    }

    /// Decode a binary snapshot, rejecting unsupported versions.
    pub fn from_binary(bytes: &[u8]) -> Result<Self, CheckpointError> {
        bincode::deserialize::<Self>(bytes)?.check_version()
    }
}

impl<S: Clone> StateMachineSaver<S> for PersistedSnapshot<S> {
    fn save_current_state(&mut self, state: Option<&S>) -> Result<(), CheckpointError> {
        self.current_state = state.cloned();
        self.taken_at = Utc::now();
        Ok(())
    }

    fn save_history(&mut self, history: &HashMap<S, S>) -> Result<(), CheckpointError> {
        self.history = history
            .iter()
            .map(|(super_state, last_active)| HistoryEntry {
                super_state: super_state.clone(),
                last_active: last_active.clone(),
            })
            .collect();
        Ok(())
    }
}

impl<S: Clone + Eq + Hash> StateMachineLoader<S> for PersistedSnapshot<S> {
    fn load_current_state(&mut self) -> Result<Option<S>, CheckpointError> {
        Ok(self.current_state.clone())
    }

    fn load_history(&mut self) -> Result<HashMap<S, S>, CheckpointError> {
        Ok(self.history_map())
    }
}
