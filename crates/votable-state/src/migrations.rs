//! SurrealDB schema setup for votable host tables
//!
//! Host tables belong to the application; this module only defines the
//! three vote fields and their indexes on a table the application names.

use surrealdb::engine::any::Any;
use surrealdb::Surreal;
use tracing::{debug, info};

use crate::error::StateError;
use crate::Result;

/// True if `table` is a bare identifier (letters, digits, underscore).
///
/// DDL statements cannot take bound parameters for table names, so the
/// name is checked before being spliced into the statement text.
fn is_safe_table_name(table: &str) -> bool {
    let mut chars = table.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Define the vote fields and indexes on a host table
///
/// Schema (added to whatever the application already defines):
/// ```text
/// TABLE <table> {
///   vote_count:  INT (default 0, indexed)
///   vote_value:  FLOAT? (absent while unvoted, indexed)
///   votes:       ARRAY (embedded marks)
/// }
/// ```
///
/// Safe to call multiple times (idempotent). There is no unique index over
/// the embedded voter ids: a voter's one-mark-per-host rule is scoped to a
/// single document, which an index across documents cannot express. The
/// guard clause on the cast update enforces it instead.
pub async fn init_votable_table(db: &Surreal<Any>, table: &str) -> Result<()> {
    if !is_safe_table_name(table) {
        return Err(StateError::SchemaSetup(format!(
            "invalid table name: {table}"
        )));
    }
    debug!(table, "initializing vote fields");

    let sql = format!(
        r#"
        DEFINE TABLE IF NOT EXISTS {t} SCHEMALESS;

        DEFINE FIELD IF NOT EXISTS vote_count ON TABLE {t} TYPE int DEFAULT 0;
        DEFINE FIELD IF NOT EXISTS vote_value ON TABLE {t} TYPE option<float>;
        DEFINE FIELD IF NOT EXISTS votes ON TABLE {t} TYPE array DEFAULT [];

        -- Serves the value scopes and highest_voted ordering
        DEFINE INDEX IF NOT EXISTS idx_vote_value ON TABLE {t} COLUMNS vote_value;

        -- Serves voted/not_voted partitioning
        DEFINE INDEX IF NOT EXISTS idx_vote_count ON TABLE {t} COLUMNS vote_count;
        "#,
        t = table
    );

    db.query(sql).await?.check()?;
    info!("✓ vote fields initialized on {table}");
    Ok(())
}
