/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Tests for [`SharedVoteSet`] used from several threads at once.

mod common;

use std::thread;

use common::keys::{addresses, block_hash, keypairs};
use log::LevelFilter;
use quorum_rs::{
    config::{EquivocationPolicy, VoteSetConfig},
    types::{
        data_types::{BlockHeight, ViewNumber},
        validators::ValidatorSet,
    },
    voting::{
        messages::{Vote, VotePhase},
        shared::SharedVoteSet,
        vote_set::{AddVoteOutcome, VoteSet},
    },
};

const PHASE: VotePhase = VotePhase::Commit;
const HEIGHT: BlockHeight = BlockHeight::new(7);
const VIEW: ViewNumber = ViewNumber::new(0);

#[test]
fn concurrent_add_vote_test() {
    let validators = keypairs(10);
    let shared: SharedVoteSet = VoteSet::new(PHASE, HEIGHT, VIEW, addresses(&validators))
        .unwrap()
        .into();
    let hash = block_hash(b"block");

    thread::scope(|scope| {
        for keypair in &validators {
            let shared = shared.clone();
            scope.spawn(move || {
                let vote = Vote::new_approve(PHASE, HEIGHT, VIEW, hash).sign(keypair);
                // Every thread adds its vote twice; the second add must not count again.
                assert!(shared.add_vote(vote.clone()));
                assert!(shared.add_vote(vote));
            });
        }
    });

    assert_eq!(shared.size(), 10);
    assert_eq!(shared.get_approvals(&hash).len(), 10);
    assert_eq!(shared.any_approved(), Some(hash));
    assert!(shared.is_approved(&hash));
    assert!(shared
        .certificate(&hash)
        .unwrap()
        .is_correct(shared.read().validators()));
}

#[test]
fn readers_see_consistent_snapshots_test() {
    let validators = keypairs(4);
    let shared = SharedVoteSet::new(VoteSet::new(PHASE, HEIGHT, VIEW, addresses(&validators)).unwrap());
    let hash = block_hash(b"block");

    thread::scope(|scope| {
        let writer = shared.clone();
        let validators = &validators;
        scope.spawn(move || {
            for keypair in validators {
                writer.add_vote(Vote::new_approve(PHASE, HEIGHT, VIEW, hash).sign(keypair));
            }
        });

        let reader = shared.clone();
        scope.spawn(move || {
            for _ in 0..100 {
                let vote_set = reader.read();
                // Approval is derived from the same snapshot the count comes from.
                assert_eq!(
                    vote_set.is_approved(&hash),
                    vote_set.get_approvals(&hash).len() >= 3
                );
            }
        });
    });

    assert_eq!(shared.size(), 4);
}

#[test]
fn batch_add_mixes_valid_and_invalid_votes_test() {
    common::logging::setup_logger(LevelFilter::Trace);

    let validators = keypairs(7);
    let outsider = &keypairs(1)[0];
    let validator_set = ValidatorSet::new(addresses(&validators)).unwrap();
    let config = VoteSetConfig::builder()
        .equivocation_policy(EquivocationPolicy::Strict)
        .log_events(true)
        .build();
    let shared = SharedVoteSet::new(VoteSet::with_config(
        PHASE,
        HEIGHT,
        VIEW,
        validator_set,
        config,
    ));
    let hash = block_hash(b"block");

    let mut votes = Vec::new();
    for keypair in &validators {
        votes.push(Vote::new_approve(PHASE, HEIGHT, VIEW, hash).sign(keypair));
    }
    // Counted: none of these.
    votes.push(Vote::new_approve(PHASE, HEIGHT, VIEW, hash));
    votes.push(Vote::new_approve(PHASE, HEIGHT, VIEW, hash).sign(outsider));
    votes.push(Vote::new_approve(PHASE, BlockHeight::new(8), VIEW, hash).sign(&validators[0]));
    // Strict policy: a rejection after the same validator's approval is refused.
    votes.push(Vote::new_reject(PHASE, HEIGHT, VIEW).sign(&validators[0]));

    assert_eq!(shared.add_votes(votes), 7);
    assert_eq!(shared.size(), 7);
    assert!(shared.get_rejections().is_empty());
    assert_eq!(shared.equivocations().len(), 1);
    assert_eq!(shared.any_approved(), Some(hash));

    // Votes are inserted in batch order, so a rejection that comes first wins under the strict policy.
    shared.clear();
    assert_eq!(shared.size(), 0);
    let batch = vec![
        Vote::new_reject(PHASE, HEIGHT, VIEW).sign(&validators[0]),
        Vote::new_approve(PHASE, HEIGHT, VIEW, hash).sign(&validators[0]),
    ];
    assert_eq!(shared.add_votes(batch), 1);
    assert_eq!(shared.get_rejections().len(), 1);
    assert!(shared.get_approvals(&hash).is_empty());
}

#[test]
fn try_add_vote_test() {
    let validators = keypairs(4);
    let shared = SharedVoteSet::new(VoteSet::new(PHASE, HEIGHT, VIEW, addresses(&validators)).unwrap());
    let vote = Vote::new_approve(PHASE, HEIGHT, VIEW, block_hash(b"block")).sign(&validators[3]);

    assert_eq!(shared.try_add_vote(vote.clone()), Ok(AddVoteOutcome::Inserted));
    assert_eq!(shared.try_add_vote(vote), Ok(AddVoteOutcome::AlreadyCounted));
    assert!(shared.try_add_vote(Vote::new_reject(PHASE, HEIGHT, VIEW)).is_err());
}

#[test]
fn rejection_queries_test() {
    let validators = keypairs(4);
    let shared = SharedVoteSet::new(VoteSet::new(PHASE, HEIGHT, VIEW, addresses(&validators)).unwrap());
    let hash = block_hash(b"block");

    assert!(shared.add_vote(Vote::new_approve(PHASE, HEIGHT, VIEW, hash).sign(&validators[0])));
    assert_eq!(
        shared.add_votes(
            validators
                .iter()
                .map(|keypair| Vote::new_reject(PHASE, HEIGHT, VIEW).sign(keypair))
                .collect()
        ),
        4
    );

    assert!(shared.is_rejected());
    assert_eq!(shared.voter_count(), 4);
    let qc = shared.rejection_certificate().unwrap();
    assert!(!qc.value);
    assert!(qc.is_correct(shared.read().validators()));

    let equivocations = shared.equivocations();
    assert_eq!(equivocations.len(), 1);
    assert_eq!(equivocations[0].signer, validators[0].address());
}
