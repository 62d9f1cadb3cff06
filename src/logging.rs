/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Functions that log out events.
//!
//! The logs defined in this module are printed if the user enabled them via the vote set's
//! [config](crate::config::VoteSetConfig).
//!
//! quorum_rs logs using the [log](https://docs.rs/log/latest/log/) crate. To get these messages
//! printed onto a terminal or to a file, set up a
//! [logging implementation](https://docs.rs/log/latest/log/#available-logging-implementations).
//!
//! ## Log message format
//!
//! Log messages are CSVs (Comma Separated Values) with at least two values. The first two values are
//! always:
//! 1. The name of the [event](crate::events) in PascalCase (defined in this module as constants).
//! 2. The time the event was emitted (as number of seconds since the Unix Epoch).
//!
//! The rest of the values differ depending on the kind of event. For example, the following snippet
//! is how an [AcceptVote](crate::events::AcceptVoteEvent) is printed:
//!
//! ```text
//! AcceptVote, 1701329264, 3q2+7w8, VALIDATE, 12, 0, approve, fNGCJyk
//! ```
//!
//! In the snippet:
//! - The third value is the first seven characters of the Base64 encoding of the address of the signer.
//! - The fourth, fifth, and sixth values are the phase, height, and view of the vote.
//! - The seventh value is the vote's value.
//! - The eighth value is the first seven characters of the Base64 encoding of the block hash.

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use std::time::SystemTime;

use crate::events::*;
use crate::voting::messages::Vote;

// Names of each event in PascalCase for printing:
pub const ACCEPT_VOTE: &str = "AcceptVote";
pub const REJECT_VOTE: &str = "RejectVote";
pub const REACH_QUORUM: &str = "ReachQuorum";
pub const EQUIVOCATION: &str = "Equivocation";
pub const CLEAR_VOTE_SET: &str = "ClearVoteSet";

/// Implemented by event types. Used to get a closure that logs the event.
pub(crate) trait Logger {
    /// Returns a pointer to the default logging handler for a given event type.
    fn get_logger() -> Box<dyn Fn(&Self) + Send>;
}

impl Logger for AcceptVoteEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |accept_vote_event: &AcceptVoteEvent| {
            let vote = &accept_vote_event.vote;
            log::debug!(
                "{}, {}, {}, {}, {}, {}, {}, {}",
                ACCEPT_VOTE,
                secs_since_unix_epoch(accept_vote_event.timestamp),
                signer_chars(vote),
                vote.phase(),
                vote.height(),
                vote.view(),
                value_str(vote.value()),
                first_seven_base64_chars(&vote.block_hash().bytes())
            )
        };
        Box::new(logger)
    }
}

impl Logger for RejectVoteEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |reject_vote_event: &RejectVoteEvent| {
            let vote = &reject_vote_event.vote;
            log::debug!(
                "{}, {}, {}, {}, {}, {}, {}",
                REJECT_VOTE,
                secs_since_unix_epoch(reject_vote_event.timestamp),
                signer_chars(vote),
                vote.phase(),
                vote.height(),
                vote.view(),
                reject_vote_event.reason
            )
        };
        Box::new(logger)
    }
}

impl Logger for ReachQuorumEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |reach_quorum_event: &ReachQuorumEvent| {
            log::info!(
                "{}, {}, {}, {}, {}, {}, {}, {}",
                REACH_QUORUM,
                secs_since_unix_epoch(reach_quorum_event.timestamp),
                reach_quorum_event.phase,
                reach_quorum_event.height,
                reach_quorum_event.view,
                value_str(reach_quorum_event.value),
                first_seven_base64_chars(&reach_quorum_event.block_hash.bytes()),
                reach_quorum_event.votes
            )
        };
        Box::new(logger)
    }
}

impl Logger for EquivocationEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |equivocation_event: &EquivocationEvent| {
            let equivocation = &equivocation_event.equivocation;
            log::warn!(
                "{}, {}, {}, {}, {}, {}, {}",
                EQUIVOCATION,
                secs_since_unix_epoch(equivocation_event.timestamp),
                first_seven_base64_chars(&equivocation.signer.bytes()),
                equivocation.existing.height(),
                equivocation.existing.view(),
                first_seven_base64_chars(&equivocation.existing.block_hash().bytes()),
                first_seven_base64_chars(&equivocation.conflicting.block_hash().bytes())
            )
        };
        Box::new(logger)
    }
}

impl Logger for ClearVoteSetEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |clear_vote_set_event: &ClearVoteSetEvent| {
            log::info!(
                "{}, {}, {}, {}, {}, {}",
                CLEAR_VOTE_SET,
                secs_since_unix_epoch(clear_vote_set_event.timestamp),
                clear_vote_set_event.phase,
                clear_vote_set_event.height,
                clear_vote_set_event.view,
                clear_vote_set_event.discarded
            )
        };
        Box::new(logger)
    }
}

/// Get a more readable representation of a bytesequence by base64-encoding it and taking the first 7
/// characters.
pub(crate) fn first_seven_base64_chars(bytes: &[u8]) -> String {
    let encoded = STANDARD_NO_PAD.encode(bytes);
    if encoded.len() > 7 {
        encoded[0..7].to_string()
    } else {
        encoded
    }
}

/// Seconds since the Unix Epoch. Timestamps from before the epoch are printed as 0.
pub(crate) fn secs_since_unix_epoch(timestamp: SystemTime) -> u64 {
    timestamp
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|duration| duration.as_secs())
        .unwrap_or(0)
}

fn signer_chars(vote: &Vote) -> String {
    match vote.signer() {
        Some(signer) => first_seven_base64_chars(&signer.bytes()),
        None => String::from("unsigned"),
    }
}

fn value_str(value: bool) -> &'static str {
    if value {
        "approve"
    } else {
        "reject"
    }
}
