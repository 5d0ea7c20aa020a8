//! In-memory fake for the vote store (testing only)
//!
//! Provides `MemoryVoteStore`, which satisfies the `VoteStore` contract
//! with the same guard semantics as the SurrealDB implementation, so the
//! aggregate layer behaves identically against either.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::schema::{HostRef, MarkId, VoteMark, VoteState};
use crate::storage_traits::{StoreResult, VoteStore};

/// In-memory vote store backed by a `HashMap<(table, id), VoteState>`.
#[derive(Debug, Default)]
pub struct MemoryVoteStore {
    hosts: Mutex<HashMap<(String, String), VoteState>>,
}

impl MemoryVoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an unvoted host document.
    pub fn insert_host(&self, host: &HostRef) {
        let mut hosts = self.hosts.lock().unwrap();
        hosts.insert(host_key(host), VoteState::default());
    }

    /// Seed a host document with existing vote state.
    pub fn insert_host_with(&self, host: &HostRef, state: VoteState) {
        let mut hosts = self.hosts.lock().unwrap();
        hosts.insert(host_key(host), state);
    }

    /// Drop a host document (simulates deletion by another writer).
    pub fn remove_host(&self, host: &HostRef) {
        let mut hosts = self.hosts.lock().unwrap();
        hosts.remove(&host_key(host));
    }
}

fn host_key(host: &HostRef) -> (String, String) {
    (host.table.clone(), host.id.clone())
}

#[async_trait]
impl VoteStore for MemoryVoteStore {
    async fn apply_vote(
        &self,
        host: &HostRef,
        mark: &VoteMark,
        new_value: f64,
    ) -> StoreResult<bool> {
        let mut hosts = self.hosts.lock().unwrap();
        let state = match hosts.get_mut(&host_key(host)) {
            Some(state) => state,
            None => return Ok(false),
        };

        let duplicate = state.votes.iter().any(|m| {
            m.voted_by_id() == mark.voted_by_id() && m.voter_type() == mark.voter_type()
        });
        if duplicate {
            return Ok(false);
        }

        state.vote_count += 1;
        state.vote_value = Some(new_value);
        state.votes.push(mark.clone());
        Ok(true)
    }

    async fn apply_retract(
        &self,
        host: &HostRef,
        mark_id: &MarkId,
        new_value: Option<f64>,
    ) -> StoreResult<bool> {
        let mut hosts = self.hosts.lock().unwrap();
        let state = match hosts.get_mut(&host_key(host)) {
            Some(state) => state,
            None => return Ok(false),
        };

        let pos = match state.votes.iter().position(|m| m.id() == mark_id) {
            Some(pos) => pos,
            None => return Ok(false),
        };

        state.votes.remove(pos);
        state.vote_count = state.vote_count.saturating_sub(1);
        state.vote_value = new_value;
        Ok(true)
    }

    async fn load_vote_state(&self, host: &HostRef) -> StoreResult<Option<VoteState>> {
        let hosts = self.hosts.lock().unwrap();
        Ok(hosts.get(&host_key(host)).cloned())
    }

    async fn not_voted(&self, table: &str) -> StoreResult<Vec<HostRef>> {
        let hosts = self.hosts.lock().unwrap();
        Ok(hosts
            .iter()
            .filter(|((t, _), state)| t == table && state.vote_value.is_none())
            .map(|((t, id), _)| HostRef::new(t, id))
            .collect())
    }

    async fn voted(&self, table: &str) -> StoreResult<Vec<HostRef>> {
        let hosts = self.hosts.lock().unwrap();
        Ok(hosts
            .iter()
            .filter(|((t, _), state)| t == table && state.vote_value.is_some())
            .map(|((t, id), _)| HostRef::new(t, id))
            .collect())
    }

    async fn voted_by(
        &self,
        table: &str,
        voter_id: &str,
        voter_type: &str,
    ) -> StoreResult<Vec<HostRef>> {
        let hosts = self.hosts.lock().unwrap();
        Ok(hosts
            .iter()
            .filter(|((t, _), state)| {
                t == table
                    && state
                        .votes
                        .iter()
                        .any(|m| m.voted_by_id() == voter_id && m.voter_type() == voter_type)
            })
            .map(|((t, id), _)| HostRef::new(t, id))
            .collect())
    }

    async fn vote_value_in(&self, table: &str, min: f64, max: f64) -> StoreResult<Vec<HostRef>> {
        let hosts = self.hosts.lock().unwrap();
        Ok(hosts
            .iter()
            .filter(|((t, _), state)| {
                t == table
                    && state
                        .vote_value
                        .map(|v| min <= v && v <= max)
                        .unwrap_or(false)
            })
            .map(|((t, id), _)| HostRef::new(t, id))
            .collect())
    }

    async fn highest_voted(&self, table: &str, limit: usize) -> StoreResult<Vec<HostRef>> {
        let hosts = self.hosts.lock().unwrap();
        let mut voted: Vec<(f64, HostRef)> = hosts
            .iter()
            .filter(|((t, _), _)| t == table)
            .filter_map(|((t, id), state)| state.vote_value.map(|v| (v, HostRef::new(t, id))))
            .collect();
        voted.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        voted.truncate(limit);
        Ok(voted.into_iter().map(|(_, host)| host).collect())
    }
}
