//! Error types for votable-state

use thiserror::Error;

/// Errors from connection management and schema setup
#[derive(Error, Debug)]
pub enum StateError {
    /// Database connection error
    #[error("Database connection failed: {0}")]
    Connection(String),

    /// Database query error
    #[error("Database query failed: {0}")]
    Query(String),

    /// Schema setup error
    #[error("Schema setup failed: {0}")]
    SchemaSetup(String),
}

impl From<surrealdb::Error> for StateError {
    fn from(err: surrealdb::Error) -> Self {
        StateError::Query(err.to_string())
    }
}

/// Errors from vote store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Backend failure (connection, query, serialization)
    #[error("Vote store backend failed: {0}")]
    Backend(String),
}
