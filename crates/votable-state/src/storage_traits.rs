//! Storage trait for vote persistence
//!
//! `VoteStore` is the one abstraction the aggregate layer talks to:
//! - guarded compound updates for casting and retracting a vote
//! - a point lookup used to hydrate aggregates
//! - declarative host scopes (not_voted, voted, voted_by, vote_value_in,
//!   highest_voted)
//!
//! All methods are async and backend-agnostic. An in-memory fake with the
//! same guard semantics is provided for testing via the `fakes` module.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::schema::{HostRef, MarkId, VoteMark, VoteState};

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Vote persistence store.
///
/// Guarantees:
/// - `apply_vote` and `apply_retract` each issue ONE compound update against
///   ONE host document; the backend applies it atomically or not at all.
/// - Both return `Ok(true)` iff exactly one document was modified.
///   `Ok(false)` means the guard failed or the host vanished, and nothing
///   was written.
/// - Scope queries never modify state.
#[async_trait]
pub trait VoteStore: Send + Sync {
    /// Atomically append `mark`, increment the stored count, and set the
    /// stored mean to `new_value`.
    ///
    /// Guarded: applies only if the host exists and holds no mark from the
    /// same `(voted_by_id, voter_type)` pair.
    async fn apply_vote(
        &self,
        host: &HostRef,
        mark: &VoteMark,
        new_value: f64,
    ) -> StoreResult<bool>;

    /// Atomically remove the mark with `mark_id`, decrement the stored
    /// count, and set the stored mean to `new_value` (`None` unsets it).
    ///
    /// Guarded: applies only if the host exists and still holds that mark.
    async fn apply_retract(
        &self,
        host: &HostRef,
        mark_id: &MarkId,
        new_value: Option<f64>,
    ) -> StoreResult<bool>;

    /// Load the vote fields of a host. `None` if the document does not exist.
    async fn load_vote_state(&self, host: &HostRef) -> StoreResult<Option<VoteState>>;

    /// Hosts in `table` with no votes yet.
    async fn not_voted(&self, table: &str) -> StoreResult<Vec<HostRef>>;

    /// Hosts in `table` with at least one vote.
    async fn voted(&self, table: &str) -> StoreResult<Vec<HostRef>>;

    /// Hosts in `table` carrying a mark from the given voter.
    async fn voted_by(
        &self,
        table: &str,
        voter_id: &str,
        voter_type: &str,
    ) -> StoreResult<Vec<HostRef>>;

    /// Hosts in `table` whose mean value lies in `[min, max]`.
    async fn vote_value_in(&self, table: &str, min: f64, max: f64) -> StoreResult<Vec<HostRef>>;

    /// Up to `limit` voted hosts in `table`, highest mean first.
    /// Unvoted hosts are never returned.
    async fn highest_voted(&self, table: &str, limit: usize) -> StoreResult<Vec<HostRef>>;
}
