/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! A [`VoteSet`] that can be shared between threads.
//!
//! [`SharedVoteSet`] serializes mutations behind a write lock and lets queries run concurrently with
//! each other behind a read lock, so every query observes a consistent snapshot.
//!
//! Verifying signatures dominates the cost of adding a vote, and needs no access to the vote set. So
//! [`SharedVoteSet::add_votes`] verifies a batch on scoped worker threads *before* taking the write lock,
//! and holds the lock only to insert the already-verified votes, in their original order.

use std::{
    num::NonZeroUsize,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
    thread,
};

use crate::types::data_types::CryptoHash;

use super::{
    certificates::QuorumCertificate,
    messages::Vote,
    vote_set::{AddVoteError, AddVoteOutcome, Equivocation, VoteSet},
};

/// Cheaply clonable, thread-safe handle to a [`VoteSet`].
#[derive(Clone)]
pub struct SharedVoteSet(Arc<RwLock<VoteSet>>);

impl SharedVoteSet {
    pub fn new(vote_set: VoteSet) -> SharedVoteSet {
        SharedVoteSet(Arc::new(RwLock::new(vote_set)))
    }

    /// Acquire shared read access to the underlying vote set.
    ///
    /// A panic in another thread cannot leave the vote set half-updated, since each mutation is a
    /// single bucket insertion. So a poisoned lock is recovered rather than propagated.
    pub fn read(&self) -> RwLockReadGuard<'_, VoteSet> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, VoteSet> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// See [`VoteSet::add_vote`].
    pub fn add_vote(&self, vote: Vote) -> bool {
        self.try_add_vote(vote).is_ok()
    }

    /// See [`VoteSet::try_add_vote`]. The signature is verified before the write lock is taken.
    pub fn try_add_vote(&self, vote: Vote) -> Result<AddVoteOutcome, AddVoteError> {
        let valid = vote.validate();
        self.write().add_checked(vote, valid)
    }

    /// See [`VoteSet::add_votes`]. Signatures are verified in parallel, then all votes are inserted in
    /// order under a single write lock.
    pub fn add_votes(&self, votes: Vec<Vote>) -> usize {
        let checked = validate_in_parallel(votes);
        let mut vote_set = self.write();
        checked
            .into_iter()
            .map(|(vote, valid)| vote_set.add_checked(vote, valid))
            .filter(Result::is_ok)
            .count()
    }

    pub fn get_approvals(&self, block_hash: &CryptoHash) -> Vec<Vote> {
        self.read().get_approvals(block_hash)
    }

    pub fn get_rejections(&self) -> Vec<Vote> {
        self.read().get_rejections()
    }

    pub fn size(&self) -> usize {
        self.read().size()
    }

    pub fn clear(&self) {
        self.write().clear()
    }

    pub fn any_approved(&self) -> Option<CryptoHash> {
        self.read().any_approved()
    }

    pub fn is_approved(&self, block_hash: &CryptoHash) -> bool {
        self.read().is_approved(block_hash)
    }

    pub fn is_rejected(&self) -> bool {
        self.read().is_rejected()
    }

    pub fn voter_count(&self) -> usize {
        self.read().voter_count()
    }

    pub fn certificate(&self, block_hash: &CryptoHash) -> Option<QuorumCertificate> {
        self.read().certificate(block_hash)
    }

    pub fn rejection_certificate(&self) -> Option<QuorumCertificate> {
        self.read().rejection_certificate()
    }

    /// Copy out the recorded equivocations. Use [`read`](Self::read) to inspect them in place.
    pub fn equivocations(&self) -> Vec<Equivocation> {
        self.read().equivocations().to_vec()
    }
}

impl From<VoteSet> for SharedVoteSet {
    fn from(vote_set: VoteSet) -> Self {
        SharedVoteSet::new(vote_set)
    }
}

/// Pair every vote with the result of [`Vote::validate`], splitting the work across the available cores.
/// The output keeps the order of `votes`.
fn validate_in_parallel(votes: Vec<Vote>) -> Vec<(Vote, bool)> {
    let workers = thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1);
    if workers <= 1 || votes.len() <= 1 {
        return votes
            .into_iter()
            .map(|vote| {
                let valid = vote.validate();
                (vote, valid)
            })
            .collect();
    }

    let chunk_size = (votes.len() + workers - 1) / workers;
    let validity: Vec<bool> = thread::scope(|scope| {
        let handles: Vec<_> = votes
            .chunks(chunk_size)
            .map(|chunk| scope.spawn(move || chunk.iter().map(Vote::validate).collect::<Vec<_>>()))
            .collect();
        handles
            .into_iter()
            .flat_map(|handle| match handle.join() {
                Ok(validity) => validity,
                // A chunk whose worker panicked counts as invalid votes.
                Err(_) => vec![false; chunk_size],
            })
            .collect()
    });

    votes.into_iter().zip(validity).collect()
}
