//! Votable-State: SurrealDB persistence for vote aggregates
//!
//! This crate is the storage layer for votable host documents. It owns the
//! persisted shapes (`VoteMark`, `VoteState`), the `VoteStore` abstraction
//! with its guarded compound updates, the SurrealDB implementation, and an
//! in-memory fake for tests.
//!
//! ## Key Components
//!
//! - `VoteStore`: atomic cast/retract plus the host scope queries
//! - `SurrealVoteStore`: SurrealDB-backed implementation
//! - `MemoryVoteStore`: in-memory fake with identical guard semantics
//! - `migrations::init_votable_table`: per-table schema setup

mod error;
pub mod fakes;
pub mod migrations;
mod schema;
pub mod storage_traits;
pub mod surreal_votes;

pub use error::{StateError, StoreError};
pub use schema::{HostRef, MarkId, VoteMark, VoteState};
pub use storage_traits::{StoreResult, VoteStore};
pub use surreal_votes::SurrealVoteStore;

/// Result type for connection and schema operations
pub type Result<T> = std::result::Result<T, StateError>;
