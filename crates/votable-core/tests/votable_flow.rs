//! End-to-end tests for the voting aggregate.
//!
//! These drive `Votable` against the in-memory fake first, then against the
//! SurrealDB store, covering the cast/retract flows, the duplicate and
//! host-vanished guards, validation, and the divergence contract.

use std::sync::Arc;

use votable_core::fakes::MemoryVoteStore;
use votable_core::{
    FieldViolation, HostRef, MarkField, ViolationKind, Votable, VoteError, VoteState, VoteStore,
    VoteValidator, Voter,
};

struct TestVoter {
    id: String,
    kind: String,
}

impl TestVoter {
    fn user(id: &str) -> Self {
        TestVoter {
            id: id.to_string(),
            kind: "user".to_string(),
        }
    }

    fn moderator(id: &str) -> Self {
        TestVoter {
            id: id.to_string(),
            kind: "moderator".to_string(),
        }
    }
}

impl Voter for TestVoter {
    fn voter_id(&self) -> &str {
        &self.id
    }

    fn voter_type(&self) -> &str {
        &self.kind
    }
}

fn host(id: &str) -> HostRef {
    HostRef::new("articles", id)
}

fn memory_fixture(id: &str) -> (Arc<MemoryVoteStore>, Votable<MemoryVoteStore>) {
    memory_fixture_with(id, VoteValidator::unconstrained())
}

fn memory_fixture_with(
    id: &str,
    validator: VoteValidator,
) -> (Arc<MemoryVoteStore>, Votable<MemoryVoteStore>) {
    let store = Arc::new(MemoryVoteStore::new());
    store.insert_host(&host(id));
    let votable = Votable::attach(Arc::clone(&store), host(id), VoteState::default(), validator);
    (store, votable)
}

// ===========================================================================
// Flow tests against the in-memory fake
// ===========================================================================

#[tokio::test]
async fn cast_accumulates_count_and_mean() {
    let (_store, mut votable) = memory_fixture("a1");

    votable.vote(4.0, &TestVoter::user("alice")).await.unwrap();
    votable.vote(8.0, &TestVoter::user("bob")).await.unwrap();

    assert_eq!(votable.vote_count(), 2);
    assert_eq!(votable.vote_value(), Some(6.0));
    assert_eq!(votable.votes().len(), 2);
    assert_eq!(votable.votes()[0].voted_by_id(), "alice");
    assert_eq!(votable.votes()[1].value(), 8.0);
}

#[tokio::test]
async fn cast_persists_through_the_store() {
    let (store, mut votable) = memory_fixture("a1");

    votable.vote(4.0, &TestVoter::user("alice")).await.unwrap();
    votable.vote(8.0, &TestVoter::user("bob")).await.unwrap();

    let rehydrated = Votable::hydrate(store, host("a1"), VoteValidator::unconstrained())
        .await
        .unwrap();
    assert_eq!(rehydrated.vote_count(), 2);
    assert_eq!(rehydrated.vote_value(), Some(6.0));
    assert_eq!(rehydrated.votes().len(), 2);
}

#[tokio::test]
async fn retract_recomputes_mean_and_unsets_at_zero() {
    let (store, mut votable) = memory_fixture("a1");
    votable.vote(4.0, &TestVoter::user("alice")).await.unwrap();
    votable.vote(8.0, &TestVoter::user("bob")).await.unwrap();

    votable.retract(&TestVoter::user("alice")).await.unwrap();
    assert_eq!(votable.vote_count(), 1);
    assert_eq!(votable.vote_value(), Some(8.0));

    votable.retract(&TestVoter::user("bob")).await.unwrap();
    assert_eq!(votable.vote_count(), 0);
    assert_eq!(votable.vote_value(), None);

    let state = store.load_vote_state(&host("a1")).await.unwrap().unwrap();
    assert_eq!(state.vote_count, 0);
    assert!(state.vote_value.is_none());
    assert!(state.votes.is_empty());
}

#[tokio::test]
async fn retract_without_mark_errors_and_preserves_state() {
    let (store, mut votable) = memory_fixture("a1");
    votable.vote(4.0, &TestVoter::user("alice")).await.unwrap();

    let err = votable.retract(&TestVoter::user("nobody")).await.unwrap_err();
    assert!(matches!(err, VoteError::NotVoted { .. }));

    assert_eq!(votable.vote_count(), 1);
    assert_eq!(votable.vote_value(), Some(4.0));
    let state = store.load_vote_state(&host("a1")).await.unwrap().unwrap();
    assert_eq!(state.vote_count, 1);
}

#[tokio::test]
async fn duplicate_voter_rejected_in_memory() {
    let (store, mut votable) = memory_fixture("a1");
    votable.vote(4.0, &TestVoter::user("alice")).await.unwrap();

    let err = votable.vote(5.0, &TestVoter::user("alice")).await.unwrap_err();
    assert!(matches!(err, VoteError::AlreadyVoted { .. }));

    // Rejected before any storage call
    assert_eq!(votable.vote_count(), 1);
    let state = store.load_vote_state(&host("a1")).await.unwrap().unwrap();
    assert_eq!(state.vote_count, 1);
    assert_eq!(state.vote_value, Some(4.0));
}

#[tokio::test]
async fn duplicate_voter_blocked_by_store_guard() {
    let (store, mut first) = memory_fixture("a1");
    // Attached before the cast, so its in-memory duplicate check is stale
    let mut second = Votable::attach(
        Arc::clone(&store),
        host("a1"),
        VoteState::default(),
        VoteValidator::unconstrained(),
    );

    first.vote(4.0, &TestVoter::user("alice")).await.unwrap();

    let err = second.vote(5.0, &TestVoter::user("alice")).await.unwrap_err();
    assert!(matches!(err, VoteError::NotApplied { .. }));

    // The store kept the first mark only
    let state = store.load_vote_state(&host("a1")).await.unwrap().unwrap();
    assert_eq!(state.vote_count, 1);
    assert_eq!(state.vote_value, Some(4.0));
}

#[tokio::test]
async fn range_rejects_out_of_bounds_value() {
    let (store, mut votable) = memory_fixture_with("a1", VoteValidator::with_range(2.0..=5.0));

    let err = votable.vote(6.0, &TestVoter::user("alice")).await.unwrap_err();
    let rejection = match err {
        VoteError::Rejected(rejection) => rejection,
        other => panic!("expected Rejected, got {other}"),
    };
    assert_eq!(
        rejection.violations,
        vec![FieldViolation {
            field: MarkField::Value,
            kind: ViolationKind::OutOfRange { min: 2.0, max: 5.0 },
        }]
    );

    // Nothing changed anywhere
    assert_eq!(votable.vote_count(), 0);
    assert_eq!(votable.vote_value(), None);
    let state = store.load_vote_state(&host("a1")).await.unwrap().unwrap();
    assert_eq!(state.vote_count, 0);
}

#[tokio::test]
async fn range_allows_in_bounds_value() {
    let (_store, mut votable) = memory_fixture_with("a1", VoteValidator::with_range(2.0..=5.0));

    votable.vote(5.0, &TestVoter::user("alice")).await.unwrap();

    assert_eq!(votable.vote_count(), 1);
    assert_eq!(votable.vote_value(), Some(5.0));
    assert_eq!(votable.vote_range().map(|r| r.max()), Some(5.0));
}

#[tokio::test]
async fn has_votes_tracks_count() {
    let (_store, mut votable) = memory_fixture("a1");
    assert!(!votable.has_votes());

    votable.vote(3.0, &TestVoter::user("alice")).await.unwrap();
    assert!(votable.has_votes());

    votable.retract(&TestVoter::user("alice")).await.unwrap();
    assert!(!votable.has_votes());
}

#[tokio::test]
async fn voted_by_matches_id_and_type() {
    let (_store, mut votable) = memory_fixture("a1");
    votable.vote(4.0, &TestVoter::user("casey")).await.unwrap();

    assert!(votable.voted_by(&TestVoter::user("casey")));
    assert!(!votable.voted_by(&TestVoter::moderator("casey")));
    assert!(!votable.voted_by(&TestVoter::user("riley")));
}

#[tokio::test]
async fn same_id_different_type_both_land() {
    let (_store, mut votable) = memory_fixture("a1");

    votable.vote(4.0, &TestVoter::user("casey")).await.unwrap();
    votable
        .vote(8.0, &TestVoter::moderator("casey"))
        .await
        .unwrap();

    assert_eq!(votable.vote_count(), 2);
    assert_eq!(votable.vote_value(), Some(6.0));
}

#[tokio::test]
async fn retract_matches_voter_id_across_types() {
    let (_store, mut votable) = memory_fixture("a1");
    votable.vote(4.0, &TestVoter::user("casey")).await.unwrap();

    // Retract targets are located by id alone
    votable
        .retract(&TestVoter::moderator("casey"))
        .await
        .unwrap();

    assert_eq!(votable.vote_count(), 0);
}

#[tokio::test]
async fn host_vanishing_surfaces_not_applied() {
    let (store, mut votable) = memory_fixture("a1");
    store.remove_host(&host("a1"));

    let err = votable.vote(4.0, &TestVoter::user("alice")).await.unwrap_err();
    assert!(matches!(err, VoteError::NotApplied { .. }));

    // The in-memory aggregate is one step ahead of storage, as documented
    assert_eq!(votable.vote_count(), 1);
    assert!(store.load_vote_state(&host("a1")).await.unwrap().is_none());
}

#[tokio::test]
async fn hydrate_missing_host_errors() {
    let store = Arc::new(MemoryVoteStore::new());

    let err = Votable::hydrate(store, host("ghost"), VoteValidator::unconstrained())
        .await
        .unwrap_err();
    assert!(matches!(err, VoteError::HostNotFound { .. }));
}

#[tokio::test]
async fn concurrent_casts_from_distinct_voters_all_land() {
    let store = Arc::new(MemoryVoteStore::new());
    store.insert_host(&host("busy"));

    let mut handles = Vec::new();
    for i in 0..8 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            let mut votable = Votable::attach(
                store,
                host("busy"),
                VoteState::default(),
                VoteValidator::unconstrained(),
            );
            votable
                .vote(5.0, &TestVoter::user(&format!("voter-{i}")))
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let state = store.load_vote_state(&host("busy")).await.unwrap().unwrap();
    assert_eq!(state.vote_count, 8);
    assert_eq!(state.votes.len(), 8);
    assert_eq!(state.vote_value, Some(5.0));
}

// ===========================================================================
// Flow tests against SurrealDB (in-memory engine)
// ===========================================================================

mod surreal_flow {
    use super::*;
    use votable_core::{migrations, SurrealVoteStore};

    async fn seeded_store(ids: &[&str]) -> Arc<SurrealVoteStore> {
        let store = SurrealVoteStore::in_memory()
            .await
            .expect("in_memory() failed");
        migrations::init_votable_table(store.client(), "articles")
            .await
            .expect("schema init failed");

        for id in ids {
            store
                .client()
                .query("CREATE type::thing($tb, $id) SET title = $title")
                .bind(("tb", "articles".to_string()))
                .bind(("id", id.to_string()))
                .bind(("title", format!("article {id}")))
                .await
                .expect("seed query failed")
                .check()
                .expect("seed failed");
        }
        Arc::new(store)
    }

    async fn hydrated(store: &Arc<SurrealVoteStore>, id: &str) -> Votable<SurrealVoteStore> {
        Votable::hydrate(Arc::clone(store), host(id), VoteValidator::unconstrained())
            .await
            .expect("hydrate failed")
    }

    #[tokio::test]
    async fn cast_accumulates_count_and_mean() {
        let store = seeded_store(&["a1"]).await;
        let mut votable = hydrated(&store, "a1").await;

        votable.vote(4.0, &TestVoter::user("alice")).await.unwrap();
        votable.vote(8.0, &TestVoter::user("bob")).await.unwrap();

        assert_eq!(votable.vote_count(), 2);
        assert_eq!(votable.vote_value(), Some(6.0));

        let state = store.load_vote_state(&host("a1")).await.unwrap().unwrap();
        assert_eq!(state.vote_count, 2);
        assert_eq!(state.vote_value, Some(6.0));
        assert_eq!(state.votes.len(), 2);
    }

    #[tokio::test]
    async fn retract_recomputes_mean_and_unsets_at_zero() {
        let store = seeded_store(&["a1"]).await;
        let mut votable = hydrated(&store, "a1").await;
        votable.vote(4.0, &TestVoter::user("alice")).await.unwrap();
        votable.vote(8.0, &TestVoter::user("bob")).await.unwrap();

        votable.retract(&TestVoter::user("alice")).await.unwrap();
        assert_eq!(votable.vote_count(), 1);
        assert_eq!(votable.vote_value(), Some(8.0));

        votable.retract(&TestVoter::user("bob")).await.unwrap();
        assert_eq!(votable.vote_count(), 0);
        assert_eq!(votable.vote_value(), None);

        let state = store.load_vote_state(&host("a1")).await.unwrap().unwrap();
        assert_eq!(state.vote_count, 0);
        assert!(state.vote_value.is_none());
        assert!(state.votes.is_empty());
    }

    #[tokio::test]
    async fn rehydration_reads_back_the_stored_aggregate() {
        let store = seeded_store(&["a1"]).await;
        let mut votable = hydrated(&store, "a1").await;
        votable.vote(4.0, &TestVoter::user("alice")).await.unwrap();
        votable.vote(8.0, &TestVoter::user("bob")).await.unwrap();

        let rehydrated = hydrated(&store, "a1").await;
        assert_eq!(rehydrated.vote_count(), 2);
        assert_eq!(rehydrated.vote_value(), Some(6.0));
        assert!(rehydrated.voted_by(&TestVoter::user("alice")));
    }

    #[tokio::test]
    async fn duplicate_voter_blocked_by_store_guard() {
        let store = seeded_store(&["a1"]).await;
        let mut first = hydrated(&store, "a1").await;
        let mut second = hydrated(&store, "a1").await;

        first.vote(4.0, &TestVoter::user("alice")).await.unwrap();

        let err = second.vote(5.0, &TestVoter::user("alice")).await.unwrap_err();
        assert!(matches!(err, VoteError::NotApplied { .. }));

        let state = store.load_vote_state(&host("a1")).await.unwrap().unwrap();
        assert_eq!(state.vote_count, 1);
        assert_eq!(state.vote_value, Some(4.0));
    }

    #[tokio::test]
    async fn range_rejects_out_of_bounds_value() {
        let store = seeded_store(&["a1"]).await;
        let mut votable = Votable::hydrate(
            Arc::clone(&store),
            host("a1"),
            VoteValidator::with_range(2.0..=5.0),
        )
        .await
        .unwrap();

        let err = votable.vote(6.0, &TestVoter::user("alice")).await.unwrap_err();
        assert!(matches!(err, VoteError::Rejected(_)));

        assert_eq!(votable.vote_count(), 0);
        let state = store.load_vote_state(&host("a1")).await.unwrap().unwrap();
        assert_eq!(state.vote_count, 0);
    }

    #[tokio::test]
    async fn host_deleted_mid_flight_surfaces_not_applied() {
        let store = seeded_store(&["a1"]).await;
        let mut votable = hydrated(&store, "a1").await;

        store
            .client()
            .query("DELETE type::thing($tb, $id)")
            .bind(("tb", "articles".to_string()))
            .bind(("id", "a1".to_string()))
            .await
            .expect("delete query failed")
            .check()
            .expect("delete failed");

        let err = votable.vote(4.0, &TestVoter::user("alice")).await.unwrap_err();
        assert!(matches!(err, VoteError::NotApplied { .. }));
        assert_eq!(votable.vote_count(), 1);
    }

    #[tokio::test]
    async fn hydrate_missing_host_errors() {
        let store = seeded_store(&[]).await;

        let err = Votable::hydrate(store, host("ghost"), VoteValidator::unconstrained())
            .await
            .unwrap_err();
        assert!(matches!(err, VoteError::HostNotFound { .. }));
    }
}
