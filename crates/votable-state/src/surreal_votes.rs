//! SurrealDB-backed VoteStore implementation
//!
//! Casting and retracting are single `UPDATE` statements, so the backend
//! applies each one atomically against one host document. Guard clauses in
//! the WHERE position turn the update into a no-op when the host vanished,
//! when the voter already holds a mark (cast), or when the mark is already
//! gone (retract); the caller sees `Ok(false)` and decides what that means.
//!
//! Since SurrealDB 2.0, `UPDATE` on a specific record id never creates the
//! record, which is exactly the semantics the guards rely on.

use async_trait::async_trait;
use serde::Deserialize;
use surrealdb::engine::any::Any;
use surrealdb::sql::Thing;
use surrealdb::Surreal;
use tracing::{debug, info, instrument};

use crate::error::{StateError, StoreError};
use crate::schema::{HostRef, MarkId, VoteMark, VoteState};
use crate::storage_traits::{StoreResult, VoteStore};

/// SurrealDB-backed implementation of [`VoteStore`].
pub struct SurrealVoteStore {
    db: Surreal<Any>,
}

/// Row shape returned by the guarded updates.
#[derive(Debug, Deserialize)]
struct AppliedRow {
    vote_count: i64,
}

/// Row shape returned by the scope queries. Extra projected fields (the
/// ranked scope must project its ordering field) are ignored.
#[derive(Debug, Deserialize)]
struct HostRow {
    id: Thing,
}

fn thing_to_host(id: Thing) -> HostRef {
    HostRef {
        table: id.tb,
        id: id.id.to_raw(),
    }
}

impl SurrealVoteStore {
    /// Wrap an existing connection (namespace and database already selected).
    pub fn new(db: Surreal<Any>) -> Self {
        Self { db }
    }

    /// Create an in-memory instance for testing.
    ///
    /// Connects to `mem://` and selects `votable/main`. Host tables still
    /// need [`crate::migrations::init_votable_table`] before use.
    pub async fn in_memory() -> crate::Result<Self> {
        let db = surrealdb::engine::any::connect("mem://")
            .await
            .map_err(|e| StateError::Connection(e.to_string()))?;

        db.use_ns("votable")
            .use_db("main")
            .await
            .map_err(|e| StateError::Connection(e.to_string()))?;

        info!("SurrealVoteStore connected (in-memory)");
        Ok(Self { db })
    }

    /// Connect to the given endpoint and select `votable/main`.
    pub async fn connect(endpoint: &str) -> crate::Result<Self> {
        let db = surrealdb::engine::any::connect(endpoint)
            .await
            .map_err(|e| StateError::Connection(e.to_string()))?;

        db.use_ns("votable")
            .use_db("main")
            .await
            .map_err(|e| StateError::Connection(e.to_string()))?;

        info!("SurrealVoteStore connected ({})", endpoint);
        Ok(Self { db })
    }

    /// Create from environment variables.
    ///
    /// `SURREALDB_URL` selects the endpoint; `SURREALDB_USERNAME` and
    /// `SURREALDB_PASSWORD`, when both are set, sign in as root.
    /// `SURREALDB_NAMESPACE` / `SURREALDB_DATABASE` override the default
    /// `votable/main` selection. Without a URL the store falls back to
    /// local persistence in `.votable/db`.
    pub async fn from_env() -> crate::Result<Self> {
        use surrealdb::opt::auth::Root;

        let ns = std::env::var("SURREALDB_NAMESPACE").unwrap_or_else(|_| "votable".to_string());
        let dbname = std::env::var("SURREALDB_DATABASE").unwrap_or_else(|_| "main".to_string());

        if let Ok(url) = std::env::var("SURREALDB_URL") {
            let db = surrealdb::engine::any::connect(&url)
                .await
                .map_err(|e| StateError::Connection(e.to_string()))?;

            if let (Ok(username), Ok(password)) = (
                std::env::var("SURREALDB_USERNAME"),
                std::env::var("SURREALDB_PASSWORD"),
            ) {
                db.signin(Root {
                    username: &username,
                    password: &password,
                })
                .await
                .map_err(|e| StateError::Connection(format!("Root auth failed: {e}")))?;
            }

            db.use_ns(&ns)
                .use_db(&dbname)
                .await
                .map_err(|e| StateError::Connection(e.to_string()))?;

            info!("SurrealVoteStore connected ({})", url);
            return Ok(Self { db });
        }

        // Default to local persistence in .votable/db
        let path = ".votable/db";
        std::fs::create_dir_all(path).map_err(|e| {
            StateError::Connection(format!(
                "Failed to create database directory {}: {}",
                path, e
            ))
        })?;
        let url = format!("surrealkv://{}", path);
        info!(
            "No SURREALDB_URL found, using local persistence: {}",
            url
        );

        let db = surrealdb::engine::any::connect(&url)
            .await
            .map_err(|e| StateError::Connection(format!("Failed to connect to {}: {}", url, e)))?;

        db.use_ns(&ns)
            .use_db(&dbname)
            .await
            .map_err(|e| StateError::Connection(e.to_string()))?;

        Ok(Self { db })
    }

    /// Access the underlying connection (schema setup, application queries).
    pub fn client(&self) -> &Surreal<Any> {
        &self.db
    }

    // -- private helpers -----------------------------------------------------

    /// Extract `id` rows from the first statement into host refs.
    fn take_hosts(mut res: surrealdb::Response) -> StoreResult<Vec<HostRef>> {
        let rows: Vec<HostRow> = res
            .take(0)
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(rows.into_iter().map(|row| thing_to_host(row.id)).collect())
    }
}

#[async_trait]
impl VoteStore for SurrealVoteStore {
    #[instrument(skip(self, mark), fields(host = %host, voter_id = mark.voted_by_id()))]
    async fn apply_vote(
        &self,
        host: &HostRef,
        mark: &VoteMark,
        new_value: f64,
    ) -> StoreResult<bool> {
        let mut res = self
            .db
            .query(
                "UPDATE type::thing($tb, $id) SET \
                     vote_count = (vote_count ?? 0) + 1, \
                     vote_value = $value, \
                     votes = array::append(votes ?? [], $mark) \
                 WHERE array::len((votes ?? [])[WHERE voted_by_id = $vid AND voter_type = $vt]) = 0 \
                 RETURN vote_count",
            )
            .bind(("tb", host.table.clone()))
            .bind(("id", host.id.clone()))
            .bind(("value", new_value))
            .bind(("mark", mark.clone()))
            .bind(("vid", mark.voted_by_id().to_string()))
            .bind(("vt", mark.voter_type().to_string()))
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let rows: Vec<AppliedRow> = res
            .take(0)
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        match rows.first() {
            Some(row) => {
                debug!(vote_count = row.vote_count, "cast applied");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    #[instrument(skip(self), fields(host = %host, mark_id = %mark_id))]
    async fn apply_retract(
        &self,
        host: &HostRef,
        mark_id: &MarkId,
        new_value: Option<f64>,
    ) -> StoreResult<bool> {
        let mut res = self
            .db
            .query(
                "UPDATE type::thing($tb, $id) SET \
                     vote_count = (vote_count ?? 0) - 1, \
                     vote_value = $value, \
                     votes = (votes ?? [])[WHERE id != $mid] \
                 WHERE array::len((votes ?? [])[WHERE id = $mid]) > 0 \
                 RETURN vote_count",
            )
            .bind(("tb", host.table.clone()))
            .bind(("id", host.id.clone()))
            .bind(("value", new_value))
            .bind(("mid", mark_id.0.clone()))
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let rows: Vec<AppliedRow> = res
            .take(0)
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        match rows.first() {
            Some(row) => {
                debug!(vote_count = row.vote_count, "retract applied");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn load_vote_state(&self, host: &HostRef) -> StoreResult<Option<VoteState>> {
        let mut res = self
            .db
            .query(
                "SELECT (vote_count ?? 0) AS vote_count, vote_value, (votes ?? []) AS votes \
                 FROM type::thing($tb, $id)",
            )
            .bind(("tb", host.table.clone()))
            .bind(("id", host.id.clone()))
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let rows: Vec<VoteState> = res
            .take(0)
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(rows.into_iter().next())
    }

    async fn not_voted(&self, table: &str) -> StoreResult<Vec<HostRef>> {
        let res = self
            .db
            .query("SELECT id FROM type::table($tb) WHERE vote_value = NONE")
            .bind(("tb", table.to_string()))
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Self::take_hosts(res)
    }

    async fn voted(&self, table: &str) -> StoreResult<Vec<HostRef>> {
        let res = self
            .db
            .query("SELECT id FROM type::table($tb) WHERE vote_value != NONE")
            .bind(("tb", table.to_string()))
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Self::take_hosts(res)
    }

    async fn voted_by(
        &self,
        table: &str,
        voter_id: &str,
        voter_type: &str,
    ) -> StoreResult<Vec<HostRef>> {
        let res = self
            .db
            .query(
                "SELECT id FROM type::table($tb) \
                 WHERE array::len((votes ?? [])[WHERE voted_by_id = $vid AND voter_type = $vt]) > 0",
            )
            .bind(("tb", table.to_string()))
            .bind(("vid", voter_id.to_string()))
            .bind(("vt", voter_type.to_string()))
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Self::take_hosts(res)
    }

    async fn vote_value_in(&self, table: &str, min: f64, max: f64) -> StoreResult<Vec<HostRef>> {
        let res = self
            .db
            .query(
                "SELECT id FROM type::table($tb) \
                 WHERE vote_value != NONE AND vote_value >= $min AND vote_value <= $max",
            )
            .bind(("tb", table.to_string()))
            .bind(("min", min))
            .bind(("max", max))
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Self::take_hosts(res)
    }

    async fn highest_voted(&self, table: &str, limit: usize) -> StoreResult<Vec<HostRef>> {
        let res = self
            .db
            .query(
                "SELECT id, vote_value FROM type::table($tb) \
                 WHERE vote_value != NONE \
                 ORDER BY vote_value DESC \
                 LIMIT $limit",
            )
            .bind(("tb", table.to_string()))
            .bind(("limit", limit as i64))
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Self::take_hosts(res)
    }
}
