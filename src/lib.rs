/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Vote aggregation and supermajority decisions for BFT consensus.
//!
//! quorum_rs collects signed votes from a fixed validator set and reduces them to a single fact: has
//! this (phase, height, view) reached agreement, and on what value? It is the part of a consensus
//! engine that sits between the network, which delivers serialized votes, and the round driver, which
//! proposes blocks, handles timeouts, and decides when to move to the next height or view. Neither of
//! those lives in this crate.
//!
//! ## Fault tolerance
//!
//! A set of `n = 3f + 1` validators tolerates `f` Byzantine validators. An outcome is decided once
//! `floor(2n/3) + 1` (that is, `2f + 1`) distinct validators voted for it. See
//! [`ValidatorSet::quorum`](types::validators::ValidatorSet::quorum).
//!
//! ## Modules
//!
//! - [`types`]: hashes, heights, views, addresses, signatures, validator sets, and the byte codec.
//! - [`voting`]: [votes](voting::messages::Vote), [vote sets](voting::vote_set::VoteSet), and
//!   [quorum certificates](voting::certificates::QuorumCertificate).
//! - [`config`]: [configuration](config::VoteSetConfig) of a vote set.
//! - [`events`] and [`logging`]: what a vote set reports, and how it is logged.

pub mod config;

pub mod events;

pub mod logging;

pub mod types;

pub mod voting;
