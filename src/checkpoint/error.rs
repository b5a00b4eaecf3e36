//! Checkpoint error types.

use thiserror::Error;

/// Errors raised while encoding, decoding or storing a snapshot.
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("JSON snapshot encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Binary snapshot encoding failed: {0}")]
    Binary(#[from] bincode::Error),

    /// The snapshot was written by a newer or older format.
    #[error("Unsupported snapshot version {found}, supported: {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// A custom saver or loader could not reach its storage.
    #[error("Snapshot storage unavailable: {0}")]
    Storage(String),
}
