/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Definitions of the events a [`VoteSet`](crate::voting::vote_set::VoteSet) emits.
//!
//! Note: an event for a given action indicates that the action has been completed.

use std::time::SystemTime;

use crate::types::data_types::{BlockHeight, CryptoHash, ViewNumber};
use crate::voting::{
    messages::{Vote, VotePhase},
    vote_set::{AddVoteError, Equivocation},
};

/// A vote was counted.
pub struct AcceptVoteEvent {
    pub timestamp: SystemTime,
    pub vote: Vote,
}

/// A vote was refused, for `reason`.
pub struct RejectVoteEvent {
    pub timestamp: SystemTime,
    pub vote: Vote,
    pub reason: AddVoteError,
}

/// A bucket just reached a quorum. Emitted once per bucket, on the vote that completes it.
pub struct ReachQuorumEvent {
    pub timestamp: SystemTime,
    pub phase: VotePhase,
    pub height: BlockHeight,
    pub view: ViewNumber,
    pub value: bool,
    pub block_hash: CryptoHash,
    pub votes: usize,
}

/// A validator cast two votes that land in different buckets.
pub struct EquivocationEvent {
    pub timestamp: SystemTime,
    pub equivocation: Equivocation,
}

/// All counted votes were discarded.
pub struct ClearVoteSetEvent {
    pub timestamp: SystemTime,
    pub phase: VotePhase,
    pub height: BlockHeight,
    pub view: ViewNumber,
    pub discarded: usize,
}
