//! Votable Core Library
//!
//! Race-safe vote aggregates for document-store entities: any host document
//! can carry a running count, a mean value, and an embedded audit list of
//! individual vote marks, maintained through single-document atomic compound
//! updates rather than read-modify-write transactions.
//!
//! ## Key Components
//!
//! - `Votable`: the per-host aggregate; casts and retracts votes
//! - `Voter`: the identity seam applications implement
//! - `VoteValidator` / `VoteRange`: per-host-type voting policy
//! - `tally`: the incremental mean arithmetic
//!
//! Persistence lives in `votable-state`; its main types are re-exported here.

mod error;
pub mod range;
pub mod tally;
pub mod validate;
mod votable;

pub use error::{Result, VoteError};
pub use range::VoteRange;
pub use validate::{
    FieldViolation, MarkDraft, MarkField, MarkRejection, ViolationKind, VoteValidator,
};
pub use votable::{Votable, Voter};

pub use votable_state::{
    fakes, migrations, HostRef, MarkId, StateError, StoreError, StoreResult, SurrealVoteStore,
    VoteMark, VoteState, VoteStore,
};

/// Votable version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
