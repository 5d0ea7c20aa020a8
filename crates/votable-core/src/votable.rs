//! The voting aggregate
//!
//! [`Votable`] pairs one host document with a store handle. It keeps the
//! host's vote fields in memory and routes every cast and retract through a
//! guarded compound update, so concurrent voters on the same host never lose
//! each other's marks.
//!
//! Failure contract: when the guarded update matches no document (the host
//! vanished, or another process got there first), the call returns
//! [`VoteError::NotApplied`] and the in-memory aggregate is left mutated,
//! one step ahead of storage. Callers that need the two to agree re-hydrate.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use votable_state::{HostRef, VoteMark, VoteState, VoteStore};

use crate::error::{Result, VoteError};
use crate::range::VoteRange;
use crate::tally;
use crate::validate::{MarkDraft, VoteValidator};

/// Identity of an acting voter.
///
/// Voters are polymorphic: a `user` and a `moderator` may share the same id
/// without colliding, since the uniqueness key is the `(id, type)` pair.
pub trait Voter {
    /// Stable identifier, unique within the voter's kind.
    fn voter_id(&self) -> &str;

    /// Entity-kind discriminator.
    fn voter_type(&self) -> &str;
}

/// Voting facade over one host document.
pub struct Votable<S: VoteStore> {
    store: Arc<S>,
    host: HostRef,
    state: VoteState,
    validator: VoteValidator,
}

impl<S: VoteStore> Votable<S> {
    /// Attach to a host whose vote fields the caller already holds
    /// (typically from loading the host document itself). No storage call.
    pub fn attach(
        store: Arc<S>,
        host: HostRef,
        state: VoteState,
        validator: VoteValidator,
    ) -> Self {
        Votable {
            store,
            host,
            state,
            validator,
        }
    }

    /// Load the host's vote fields from the store and attach.
    ///
    /// Fails with [`VoteError::HostNotFound`] when no document exists at
    /// `host`.
    pub async fn hydrate(store: Arc<S>, host: HostRef, validator: VoteValidator) -> Result<Self> {
        let state = match store.load_vote_state(&host).await? {
            Some(state) => state,
            None => return Err(VoteError::HostNotFound { host }),
        };

        Ok(Votable {
            store,
            host,
            state,
            validator,
        })
    }

    /// Cast a vote of `value` on behalf of `voter`.
    ///
    /// Validates the candidate mark, rejects a voter that already holds one
    /// here, then applies ONE guarded compound update: append the mark,
    /// increment the stored count, set the stored mean. The mean each caller
    /// stores derives from its own snapshot; under contention the last
    /// writer wins on the mean while count and marks still commute.
    #[instrument(skip(self, voter), fields(host = %self.host, voter_id = voter.voter_id()))]
    pub async fn vote(&mut self, value: f64, voter: &impl Voter) -> Result<()> {
        let draft = MarkDraft {
            value: Some(value),
            voted_by_id: Some(voter.voter_id().to_string()),
            voter_type: Some(voter.voter_type().to_string()),
        };
        self.validator.validate(&draft)?;

        if self.voted_by(voter) {
            return Err(VoteError::AlreadyVoted {
                voter_id: voter.voter_id().to_string(),
                voter_type: voter.voter_type().to_string(),
            });
        }

        let mark = VoteMark::new(value, voter.voter_id(), voter.voter_type());
        let (count, mean) = tally::apply_add(self.state.vote_count, self.state.vote_value, value);

        self.state.votes.push(mark.clone());
        self.state.vote_count = count;
        self.state.vote_value = Some(mean);

        let applied = self.store.apply_vote(&self.host, &mark, mean).await?;
        if !applied {
            warn!("guarded cast matched no document; in-memory aggregate is ahead of storage");
            return Err(VoteError::NotApplied {
                host: self.host.clone(),
            });
        }

        debug!(vote_count = count, vote_value = mean, "vote cast");
        Ok(())
    }

    /// Retract `voter`'s mark from this host.
    ///
    /// The retract target is located by voter id alone; the first matching
    /// mark goes, whatever its voter type. Applies ONE guarded compound
    /// update: remove the mark by id, decrement the stored count, set the
    /// stored mean (unset at zero).
    #[instrument(skip(self, voter), fields(host = %self.host, voter_id = voter.voter_id()))]
    pub async fn retract(&mut self, voter: &impl Voter) -> Result<()> {
        let position = self
            .state
            .votes
            .iter()
            .position(|mark| mark.voted_by_id() == voter.voter_id());
        let position = match position {
            Some(position) => position,
            None => {
                return Err(VoteError::NotVoted {
                    voter_id: voter.voter_id().to_string(),
                })
            }
        };

        let mark = self.state.votes.remove(position);
        let (count, mean) =
            tally::apply_remove(self.state.vote_count, self.state.vote_value, mark.value());

        self.state.vote_count = count;
        self.state.vote_value = mean;

        let applied = self.store.apply_retract(&self.host, mark.id(), mean).await?;
        if !applied {
            warn!("guarded retract matched no document; in-memory aggregate is ahead of storage");
            return Err(VoteError::NotApplied {
                host: self.host.clone(),
            });
        }

        debug!(vote_count = count, "vote retracted");
        Ok(())
    }

    /// True once the host carries at least one mark.
    pub fn has_votes(&self) -> bool {
        self.state.vote_count > 0
    }

    /// True if some mark here matches `voter` on BOTH id and type.
    ///
    /// An unvoted host simply answers `false`.
    pub fn voted_by(&self, voter: &impl Voter) -> bool {
        self.state.votes.iter().any(|mark| {
            mark.voted_by_id() == voter.voter_id() && mark.voter_type() == voter.voter_type()
        })
    }

    /// Number of marks on this host.
    pub fn vote_count(&self) -> u64 {
        self.state.vote_count
    }

    /// Mean of the mark values, absent while unvoted.
    pub fn vote_value(&self) -> Option<f64> {
        self.state.vote_value
    }

    /// The embedded marks, insertion-ordered.
    pub fn votes(&self) -> &[VoteMark] {
        &self.state.votes
    }

    /// Address of the host document.
    pub fn host(&self) -> &HostRef {
        &self.host
    }

    /// The value range this host's validator enforces, if any.
    pub fn vote_range(&self) -> Option<VoteRange> {
        self.validator.range()
    }
}
