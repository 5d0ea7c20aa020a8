//! Error types for votable-core

use thiserror::Error;

use votable_state::{HostRef, StoreError};

use crate::validate::MarkRejection;

/// Result type for vote operations
pub type Result<T> = std::result::Result<T, VoteError>;

/// Errors surfaced by the voting aggregate
#[derive(Error, Debug)]
pub enum VoteError {
    /// The candidate mark failed validation; per-field details inside
    #[error("Vote rejected: {0}")]
    Rejected(#[from] MarkRejection),

    /// The voter already holds a mark on this host
    #[error("Voter {voter_id} ({voter_type}) already voted on this host")]
    AlreadyVoted {
        voter_id: String,
        voter_type: String,
    },

    /// No mark from this voter to retract
    #[error("Voter {voter_id} has not voted on this host")]
    NotVoted { voter_id: String },

    /// No host document at this address
    #[error("Host not found: {host}")]
    HostNotFound { host: HostRef },

    /// The guarded update matched no document: the host changed or vanished
    /// underneath us. The in-memory aggregate is ahead of storage until the
    /// caller re-hydrates.
    #[error("Update not applied on {host}: host changed or vanished")]
    NotApplied { host: HostRef },

    /// Storage backend failure
    #[error("Vote store failure: {0}")]
    Store(#[from] StoreError),
}
