/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The [`VoteSet`], which collects the votes cast for one (phase, height, view) tuple and decides whether
//! any outcome has reached a supermajority.
//!
//! ## Buckets
//!
//! Counted votes are kept in buckets: one approval bucket per block hash, plus a single rejection
//! bucket. Within a bucket, votes are deduplicated by signer, so each validator counts at most once
//! towards any one outcome. An outcome is decided once its bucket holds at least
//! [`quorum`](ValidatorSet::quorum) votes.
//!
//! ## Equivocation
//!
//! A validator whose second vote lands in a different bucket than its first is equivocating. The vote
//! set records the first such conflict of each validator as an [`Equivocation`]. Whether the second vote is also counted depends on
//! the configured [`EquivocationPolicy`].
//!
//! ## Decisions are derived
//!
//! A `VoteSet` does not store whether it has decided. [`any_approved`](VoteSet::any_approved) and
//! [`is_approved`](VoteSet::is_approved) compute it from the buckets on every call, and the caller
//! decides when to stop feeding a vote set and build one for the next view.

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    fmt::{self, Display, Formatter},
    time::SystemTime,
};

use crate::{
    config::{EquivocationPolicy, VoteSetConfig},
    events::*,
    logging::Logger,
    types::{
        data_types::{Address, BlockHeight, CryptoHash, ViewNumber},
        validators::{ValidatorSet, ValidatorSetError},
    },
};

use super::{
    certificates::{CertificateSignature, QuorumCertificate},
    messages::{Vote, VotePhase, VALUE_APPROVE, VALUE_REJECT},
};

/// Counted votes of one outcome, keyed by the signer's position in the validator set.
type Bucket = BTreeMap<usize, Vote>;

/// Identifies the bucket a vote is counted in.
#[derive(Clone, Copy, PartialEq, Eq)]
enum BucketKey {
    Approve(CryptoHash),
    Reject,
}

impl BucketKey {
    fn of(vote: &Vote) -> BucketKey {
        if vote.is_approve() {
            BucketKey::Approve(vote.block_hash())
        } else {
            BucketKey::Reject
        }
    }
}

/// Collects votes for one (phase, height, view) tuple from one fixed [`ValidatorSet`].
///
/// # Usage
///
/// Create a `VoteSet` for the tuple the caller is currently collecting votes for, feed it votes with
/// [`add_vote`](Self::add_vote) or [`add_votes`](Self::add_votes), and poll
/// [`any_approved`](Self::any_approved) after each insertion. When the view changes, discard the
/// `VoteSet` and create a new one.
///
/// `VoteSet` requires `&mut self` to mutate. Callers that share one between threads should wrap it in a
/// [`SharedVoteSet`](super::shared::SharedVoteSet).
#[derive(Clone)]
pub struct VoteSet {
    phase: VotePhase,
    height: BlockHeight,
    view: ViewNumber,
    validators: ValidatorSet,
    config: VoteSetConfig,

    /// Approval buckets, in the order their block hash was first seen.
    approvals: Vec<(CryptoHash, Bucket)>,
    approval_index: HashMap<CryptoHash, usize>,
    rejections: Bucket,

    /// The first counted vote of each validator, keyed by position. Used to detect equivocation.
    first_votes: HashMap<usize, Vote>,

    /// At most one record per validator, in the order the validators were caught.
    equivocations: Vec<Equivocation>,
    equivocators: HashSet<usize>,
}

impl VoteSet {
    /// Create an empty `VoteSet` that accepts votes for `phase`, `height`, and `view` signed by one of
    /// `validators`, using the [default configuration](VoteSetConfig::default).
    ///
    /// Fails if `validators` is empty or contains duplicates.
    pub fn new(
        phase: VotePhase,
        height: BlockHeight,
        view: ViewNumber,
        validators: Vec<Address>,
    ) -> Result<VoteSet, VoteSetError> {
        Ok(Self::with_config(
            phase,
            height,
            view,
            ValidatorSet::new(validators)?,
            VoteSetConfig::default(),
        ))
    }

    /// Create an empty `VoteSet` over an already-built `validators` set, with an explicit `config`.
    pub fn with_config(
        phase: VotePhase,
        height: BlockHeight,
        view: ViewNumber,
        validators: ValidatorSet,
        config: VoteSetConfig,
    ) -> VoteSet {
        Self {
            phase,
            height,
            view,
            validators,
            config,
            approvals: Vec::new(),
            approval_index: HashMap::new(),
            rejections: Bucket::new(),
            first_votes: HashMap::new(),
            equivocations: Vec::new(),
            equivocators: HashSet::new(),
        }
    }

    /// Add `vote` to the set, returning whether it is now counted.
    ///
    /// Returns `false`, leaving the set unchanged, if the vote is not [valid](Vote::validate), is for a
    /// different phase, height, or view, or is signed by a key outside the validator set. Re-adding a
    /// vote that is already counted returns `true` and changes nothing.
    pub fn add_vote(&mut self, vote: Vote) -> bool {
        self.try_add_vote(vote).is_ok()
    }

    /// Like [`add_vote`](Self::add_vote), but reports why a vote was not counted.
    pub fn try_add_vote(&mut self, vote: Vote) -> Result<AddVoteOutcome, AddVoteError> {
        self.add(vote, None)
    }

    /// Add each of `votes` in order, returning how many calls to [`add_vote`](Self::add_vote) returned
    /// `true`. A vote that is not counted does not stop the votes after it.
    pub fn add_votes(&mut self, votes: impl IntoIterator<Item = Vote>) -> usize {
        votes
            .into_iter()
            .map(|vote| self.add_vote(vote))
            .filter(|counted| *counted)
            .count()
    }

    /// Add a vote whose [validity](Vote::validate) has already been computed as `valid`.
    pub(crate) fn add_checked(
        &mut self,
        vote: Vote,
        valid: bool,
    ) -> Result<AddVoteOutcome, AddVoteError> {
        self.add(vote, Some(valid))
    }

    fn add(
        &mut self,
        vote: Vote,
        valid: Option<bool>,
    ) -> Result<AddVoteOutcome, AddVoteError> {
        let result = self.check_and_insert(&vote, valid);
        match &result {
            Ok(AddVoteOutcome::Inserted) => self.on_inserted(vote),
            Ok(AddVoteOutcome::AlreadyCounted) => (),
            Err(reason) => self.emit(RejectVoteEvent {
                timestamp: SystemTime::now(),
                vote,
                reason: reason.clone(),
            }),
        }
        result
    }

    fn check_and_insert(
        &mut self,
        vote: &Vote,
        valid: Option<bool>,
    ) -> Result<AddVoteOutcome, AddVoteError> {
        // Cheap checks first: the signature is only verified for votes that could be counted.
        if vote.phase() != self.phase {
            return Err(AddVoteError::WrongPhase {
                expected: self.phase,
                actual: vote.phase(),
            });
        }
        if vote.height() != self.height {
            return Err(AddVoteError::WrongHeight {
                expected: self.height,
                actual: vote.height(),
            });
        }
        if vote.view() != self.view {
            return Err(AddVoteError::WrongView {
                expected: self.view,
                actual: vote.view(),
            });
        }

        let signer = vote.signer().ok_or(AddVoteError::InvalidVote)?;
        let position = self
            .validators
            .position(&signer)
            .ok_or(AddVoteError::UnknownSigner { signer })?;

        let valid = valid.unwrap_or_else(|| vote.validate());
        if !valid {
            return Err(AddVoteError::InvalidVote);
        }

        let key = BucketKey::of(vote);
        if self
            .bucket(key)
            .map_or(false, |bucket| bucket.contains_key(&position))
        {
            return Ok(AddVoteOutcome::AlreadyCounted);
        }

        if let Some(existing) = self.first_votes.get(&position) {
            let equivocation = Equivocation {
                signer,
                existing: existing.clone(),
                conflicting: vote.clone(),
            };
            self.record_equivocation(position, &equivocation);
            if self.config.equivocation_policy == EquivocationPolicy::Strict {
                return Err(AddVoteError::Equivocation(equivocation));
            }
        } else {
            self.first_votes.insert(position, vote.clone());
        }

        self.bucket_mut(key).insert(position, vote.clone());
        Ok(AddVoteOutcome::Inserted)
    }

    fn on_inserted(&mut self, vote: Vote) {
        let key = BucketKey::of(&vote);
        let votes = self.bucket(key).map_or(0, Bucket::len);
        let (value, block_hash) = match key {
            BucketKey::Approve(hash) => (VALUE_APPROVE, hash),
            BucketKey::Reject => (VALUE_REJECT, CryptoHash::EMPTY),
        };

        self.emit(AcceptVoteEvent {
            timestamp: SystemTime::now(),
            vote,
        });

        if votes == self.validators.quorum() {
            self.emit(ReachQuorumEvent {
                timestamp: SystemTime::now(),
                phase: self.phase,
                height: self.height,
                view: self.view,
                value,
                block_hash,
                votes,
            });
        }
    }

    /// Keep `equivocation` as evidence against the validator at `position`, unless it was already
    /// caught. One record proves the fault, so later conflicts are neither stored nor logged.
    fn record_equivocation(&mut self, position: usize, equivocation: &Equivocation) {
        if !self.equivocators.insert(position) {
            return;
        }
        self.equivocations.push(equivocation.clone());
        self.emit(EquivocationEvent {
            timestamp: SystemTime::now(),
            equivocation: equivocation.clone(),
        });
    }

    fn emit<E: Logger>(&self, event: E) {
        if self.config.log_events {
            (E::get_logger())(&event)
        }
    }

    fn bucket(&self, key: BucketKey) -> Option<&Bucket> {
        match key {
            BucketKey::Approve(hash) => self
                .approval_index
                .get(&hash)
                .map(|index| &self.approvals[*index].1),
            BucketKey::Reject => Some(&self.rejections),
        }
    }

    fn bucket_mut(&mut self, key: BucketKey) -> &mut Bucket {
        match key {
            BucketKey::Approve(hash) => {
                let index = match self.approval_index.get(&hash) {
                    Some(index) => *index,
                    None => {
                        self.approvals.push((hash, Bucket::new()));
                        self.approval_index.insert(hash, self.approvals.len() - 1);
                        self.approvals.len() - 1
                    }
                };
                &mut self.approvals[index].1
            }
            BucketKey::Reject => &mut self.rejections,
        }
    }

    /// Get the counted approvals for `block_hash`, in validator-set order. Empty if there are none.
    pub fn get_approvals(&self, block_hash: &CryptoHash) -> Vec<Vote> {
        self.bucket(BucketKey::Approve(*block_hash))
            .map(|bucket| bucket.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Get the counted rejections, in validator-set order.
    pub fn get_rejections(&self) -> Vec<Vote> {
        self.rejections.values().cloned().collect()
    }

    /// Get the total number of counted votes, across all approval buckets and the rejection bucket.
    pub fn size(&self) -> usize {
        self.approvals
            .iter()
            .map(|(_, bucket)| bucket.len())
            .sum::<usize>()
            + self.rejections.len()
    }

    /// Get the number of distinct validators with at least one counted vote.
    pub fn voter_count(&self) -> usize {
        self.first_votes.len()
    }

    /// Discard every counted vote and all recorded equivocations. The phase, height, view, and
    /// validator set are kept.
    pub fn clear(&mut self) {
        let discarded = self.size();
        self.approvals.clear();
        self.approval_index.clear();
        self.rejections.clear();
        self.first_votes.clear();
        self.equivocations.clear();
        self.equivocators.clear();

        self.emit(ClearVoteSetEvent {
            timestamp: SystemTime::now(),
            phase: self.phase,
            height: self.height,
            view: self.view,
            discarded,
        });
    }

    /// Get the first block hash, in order of first appearance, whose approvals have reached a quorum.
    pub fn any_approved(&self) -> Option<CryptoHash> {
        let quorum = self.validators.quorum();
        self.approvals
            .iter()
            .find(|(_, bucket)| bucket.len() >= quorum)
            .map(|(hash, _)| *hash)
    }

    /// Check whether the approvals for `block_hash` have reached a quorum.
    pub fn is_approved(&self, block_hash: &CryptoHash) -> bool {
        self.bucket(BucketKey::Approve(*block_hash))
            .map_or(false, |bucket| bucket.len() >= self.validators.quorum())
    }

    /// Check whether the rejections have reached a quorum.
    pub fn is_rejected(&self) -> bool {
        self.rejections.len() >= self.validators.quorum()
    }

    /// Bundle the approvals for `block_hash` into a [`QuorumCertificate`], if they have reached a quorum.
    pub fn certificate(&self, block_hash: &CryptoHash) -> Option<QuorumCertificate> {
        if !self.is_approved(block_hash) {
            return None;
        }
        self.bucket(BucketKey::Approve(*block_hash))
            .map(|bucket| self.certify(VALUE_APPROVE, *block_hash, bucket))
    }

    /// Bundle the rejections into a [`QuorumCertificate`], if they have reached a quorum.
    pub fn rejection_certificate(&self) -> Option<QuorumCertificate> {
        if !self.is_rejected() {
            return None;
        }
        Some(self.certify(VALUE_REJECT, CryptoHash::EMPTY, &self.rejections))
    }

    fn certify(&self, value: bool, block_hash: CryptoHash, bucket: &Bucket) -> QuorumCertificate {
        QuorumCertificate {
            phase: self.phase,
            height: self.height,
            view: self.view,
            value,
            block_hash,
            signatures: bucket
                .values()
                .filter_map(|vote| vote.signature().map(CertificateSignature::from))
                .collect(),
        }
    }

    /// Get the first equivocation of each validator caught since the set was created or last
    /// [cleared](Self::clear).
    pub fn equivocations(&self) -> &[Equivocation] {
        &self.equivocations
    }

    pub fn phase(&self) -> VotePhase {
        self.phase
    }

    pub fn height(&self) -> BlockHeight {
        self.height
    }

    pub fn view(&self) -> ViewNumber {
        self.view
    }

    pub fn validators(&self) -> &ValidatorSet {
        &self.validators
    }

    pub fn config(&self) -> &VoteSetConfig {
        &self.config
    }
}

impl Display for VoteSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "VoteSet [{}, height={}, view={}, validators={}, votes={}]",
            self.phase,
            self.height,
            self.view,
            self.validators.len(),
            self.size()
        )
    }
}

/// How a successful [`VoteSet::try_add_vote`] call affected the set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddVoteOutcome {
    /// The vote was not counted before and now is.
    Inserted,

    /// An identical vote from the same signer was already counted in the same bucket. Nothing changed.
    AlreadyCounted,
}

/// Two votes from the same validator, for the same phase, height, and view, that land in different
/// buckets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Equivocation {
    pub signer: Address,

    /// The validator's first counted vote.
    pub existing: Vote,

    pub conflicting: Vote,
}

/// Enumerates the reasons a [`VoteSet`] refuses to count a vote.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AddVoteError {
    /// The vote is unsigned, malformed, or its signature does not verify.
    InvalidVote,

    WrongPhase {
        expected: VotePhase,
        actual: VotePhase,
    },

    WrongHeight {
        expected: BlockHeight,
        actual: BlockHeight,
    },

    WrongView {
        expected: ViewNumber,
        actual: ViewNumber,
    },

    /// The vote is signed by a key whose address is not in the validator set.
    UnknownSigner { signer: Address },

    /// The signer already has a counted vote in a different bucket, and the vote set is configured with
    /// [`EquivocationPolicy::Strict`].
    Equivocation(Equivocation),
}

impl Display for AddVoteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AddVoteError::InvalidVote => write!(f, "invalid vote"),
            AddVoteError::WrongPhase { expected, actual } => {
                write!(f, "wrong phase: expected {} but got {}", expected, actual)
            }
            AddVoteError::WrongHeight { expected, actual } => {
                write!(f, "wrong height: expected {} but got {}", expected, actual)
            }
            AddVoteError::WrongView { expected, actual } => {
                write!(f, "wrong view: expected {} but got {}", expected, actual)
            }
            AddVoteError::UnknownSigner { signer } => write!(f, "unknown signer {}", signer),
            AddVoteError::Equivocation(equivocation) => {
                write!(f, "equivocation by {}", equivocation.signer)
            }
        }
    }
}

impl std::error::Error for AddVoteError {}

/// Enumerates the ways creating a [`VoteSet`] can fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteSetError {
    /// See: [`ValidatorSetError`].
    ValidatorSetError(ValidatorSetError),
}

impl From<ValidatorSetError> for VoteSetError {
    fn from(value: ValidatorSetError) -> Self {
        VoteSetError::ValidatorSetError(value)
    }
}

impl Display for VoteSetError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            VoteSetError::ValidatorSetError(err) => write!(f, "invalid validator set: {}", err),
        }
    }
}

impl std::error::Error for VoteSetError {}
