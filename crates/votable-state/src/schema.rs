//! Persisted shapes for votable host documents
//!
//! A votable host carries three vote fields beside whatever else the
//! application stores on it:
//! - `vote_count`: number of marks currently embedded
//! - `vote_value`: mean of the embedded mark values (absent while unvoted)
//! - `votes`: the embedded audit list of individual marks

use chrono::{DateTime, Utc};

/// Module for serializing chrono DateTime to SurrealDB datetime format
mod surreal_datetime {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};
    use surrealdb::sql::Datetime as SurrealDatetime;

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let sd = SurrealDatetime::from(*date);
        serde::Serialize::serialize(&sd, serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let sd = SurrealDatetime::deserialize(deserializer)?;
        Ok(DateTime::from(sd))
    }
}

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an embedded vote mark
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarkId(pub String);

impl MarkId {
    /// Generate a new random MarkId
    pub fn new() -> Self {
        MarkId(Uuid::new_v4().to_string())
    }
}

impl Default for MarkId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MarkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single vote embedded in a host document.
///
/// Fields are private so a cast mark stays immutable; readers go through
/// the accessors. Construction fills every field, including a fresh id and
/// the casting timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteMark {
    /// Unique mark id (UUID string)
    id: MarkId,
    /// Numeric vote value
    value: f64,
    /// Identifier of the voter that cast this mark
    voted_by_id: String,
    /// Entity kind of the voter (voters may be of mixed kinds)
    voter_type: String,
    /// Timestamp of casting
    #[serde(with = "surreal_datetime")]
    created_at: DateTime<Utc>,
}

impl VoteMark {
    /// Create a new mark with a fresh id and the current timestamp
    pub fn new(value: f64, voted_by_id: &str, voter_type: &str) -> Self {
        VoteMark {
            id: MarkId::new(),
            value,
            voted_by_id: voted_by_id.to_string(),
            voter_type: voter_type.to_string(),
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &MarkId {
        &self.id
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn voted_by_id(&self) -> &str {
        &self.voted_by_id
    }

    pub fn voter_type(&self) -> &str {
        &self.voter_type
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// The vote fields of a host document.
///
/// `vote_count` mirrors `votes.len()` and `vote_value` is the mean of the
/// embedded mark values, absent while the host has no votes. Every field
/// defaults so documents created before the vote fields existed read back
/// as unvoted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VoteState {
    /// Number of marks currently embedded
    #[serde(default)]
    pub vote_count: u64,
    /// Mean of the embedded mark values, absent while unvoted
    #[serde(default)]
    pub vote_value: Option<f64>,
    /// Embedded audit list, insertion-ordered
    #[serde(default)]
    pub votes: Vec<VoteMark>,
}

/// Address of a host document: table name plus record id.
///
/// Record ids are plain strings by convention; the application chooses them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HostRef {
    /// Table the host lives in
    pub table: String,
    /// Record id within the table
    pub id: String,
}

impl HostRef {
    pub fn new(table: &str, id: &str) -> Self {
        HostRef {
            table: table.to_string(),
            id: id.to_string(),
        }
    }
}

impl std::fmt::Display for HostRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.table, self.id)
    }
}
