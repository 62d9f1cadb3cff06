/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Votes, the sets that collect them, and the certificates those sets produce.
//!
//! The typical flow for a vote received from the network is:
//! 1. [`Vote::decode_from_wire`](messages::Vote::decode_from_wire) the bytes handed over by the transport.
//! 2. Pick the [`VoteSet`](vote_set::VoteSet) for the vote's phase, height, and view.
//! 3. [`add_vote`](vote_set::VoteSet::add_vote) it, then check
//!    [`any_approved`](vote_set::VoteSet::any_approved).
//!
//! Votes cast locally are created with [`Vote::new_approve`](messages::Vote::new_approve) or
//! [`Vote::new_reject`](messages::Vote::new_reject), [signed](messages::Vote::sign), added to the local
//! vote set, and [framed](messages::Vote::encode_for_wire) for broadcast.

pub mod certificates;

pub mod messages;

pub mod shared;

pub mod vote_set;
