//! Error types for the simulation core.
//!
//! Every failure is local and recoverable: a refused spawn or a stale id leaves
//! the world unchanged for that frame. Degenerate geometry (coincident centers)
//! is resolved internally with a random unit normal and never surfaces here.

use thiserror::Error;

/// Errors returned by the simulation core's public operations.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimError {
    /// All body slots are occupied; the spawn was refused with no partial state
    #[error("body capacity exceeded ({max} slots occupied)")]
    CapacityExceeded { max: usize },

    /// Operation referenced a deactivated or out-of-range body id
    #[error("invalid body index {0}")]
    InvalidIndex(usize),
}
