/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Tests for [`QuorumCertificate`]s produced by a [`VoteSet`].

mod common;

use borsh::{BorshDeserialize, BorshSerialize};
use common::keys::{addresses, block_hash, keypairs};
use quorum_rs::{
    types::{
        crypto_primitives::Keypair,
        data_types::{BlockHeight, CryptoHash, SignatureBytes, ViewNumber},
        validators::ValidatorSet,
    },
    voting::{
        certificates::{CertificateError, QuorumCertificate},
        messages::{Vote, VotePhase},
        vote_set::VoteSet,
    },
};

const PHASE: VotePhase = VotePhase::PreCommit;
const HEIGHT: BlockHeight = BlockHeight::new(10);
const VIEW: ViewNumber = ViewNumber::new(3);

fn approve(hash: CryptoHash, keypair: &Keypair) -> Vote {
    Vote::new_approve(PHASE, HEIGHT, VIEW, hash).sign(keypair)
}

/// Build a certificate for `hash` signed by the first three of four validators.
fn certified() -> (Vec<Keypair>, ValidatorSet, QuorumCertificate) {
    let validators = keypairs(4);
    let mut vs = VoteSet::new(PHASE, HEIGHT, VIEW, addresses(&validators)).unwrap();
    let hash = block_hash(b"block");
    for keypair in &validators[..3] {
        assert!(vs.add_vote(approve(hash, keypair)));
    }
    let qc = vs.certificate(&hash).unwrap();
    (validators, vs.validators().clone(), qc)
}

#[test]
fn certificate_needs_quorum_test() {
    let validators = keypairs(4);
    let mut vs = VoteSet::new(PHASE, HEIGHT, VIEW, addresses(&validators)).unwrap();
    let hash = block_hash(b"block");

    for keypair in &validators[..2] {
        assert!(vs.add_vote(approve(hash, keypair)));
    }
    assert!(vs.certificate(&hash).is_none());
    assert!(vs.certificate(&block_hash(b"never voted for")).is_none());

    assert!(vs.add_vote(approve(hash, &validators[2])));
    let qc = vs.certificate(&hash).unwrap();
    assert_eq!(qc.phase, PHASE);
    assert_eq!(qc.height, HEIGHT);
    assert_eq!(qc.view, VIEW);
    assert!(qc.value);
    assert_eq!(qc.block_hash, hash);
    assert_eq!(qc.signatures.len(), 3);
    assert!(qc.is_correct(vs.validators()));
}

#[test]
fn message_bytes_match_vote_encoding_test() {
    let (validators, _, qc) = certified();
    let vote = approve(qc.block_hash, &validators[0]);
    assert_eq!(qc.message_bytes(), vote.encoded());
}

#[test]
fn certificate_borsh_test() {
    let (_, validator_set, qc) = certified();

    let bytes = qc.try_to_vec().unwrap();
    let decoded = QuorumCertificate::try_from_slice(&bytes).unwrap();
    assert_eq!(decoded, qc);
    assert!(decoded.is_correct(&validator_set));
}

#[test]
fn tampered_signature_test() {
    let (validators, validator_set, mut qc) = certified();

    let mut signature = qc.signatures[1].signature.bytes();
    signature[0] ^= 0x01;
    qc.signatures[1].signature = SignatureBytes::new(signature);

    assert_eq!(
        qc.verify(&validator_set),
        Err(CertificateError::IncorrectSignature {
            signer: validators[1].address()
        })
    );
    assert!(!qc.is_correct(&validator_set));
}

#[test]
fn certificate_for_other_view_test() {
    let (_, validator_set, mut qc) = certified();
    qc.view = ViewNumber::new(4);
    assert!(matches!(
        qc.verify(&validator_set),
        Err(CertificateError::IncorrectSignature { .. })
    ));
}

#[test]
fn too_few_signers_test() {
    let (_, validator_set, mut qc) = certified();
    qc.signatures.pop();
    assert_eq!(
        qc.verify(&validator_set),
        Err(CertificateError::NoQuorum {
            signers: 2,
            quorum: 3
        })
    );
}

#[test]
fn duplicate_signer_test() {
    let (validators, validator_set, mut qc) = certified();
    qc.signatures[2] = qc.signatures[0].clone();
    assert_eq!(
        qc.verify(&validator_set),
        Err(CertificateError::DuplicateSigner {
            signer: validators[0].address()
        })
    );
}

#[test]
fn unknown_signer_test() {
    let (_, _, qc) = certified();
    let other_validators = ValidatorSet::new(addresses(&keypairs(4))).unwrap();
    assert!(matches!(
        qc.verify(&other_validators),
        Err(CertificateError::UnknownSigner { .. })
    ));
}

#[test]
fn zero_height_test() {
    let (_, validator_set, mut qc) = certified();
    qc.height = BlockHeight::new(0);
    assert_eq!(qc.verify(&validator_set), Err(CertificateError::ZeroHeight));
}

#[test]
fn rejection_certificate_test() {
    let validators = keypairs(4);
    let mut vs = VoteSet::new(PHASE, HEIGHT, VIEW, addresses(&validators)).unwrap();
    assert!(vs.rejection_certificate().is_none());

    for keypair in &validators {
        assert!(vs.add_vote(Vote::new_reject(PHASE, HEIGHT, VIEW).sign(keypair)));
    }

    let qc = vs.rejection_certificate().unwrap();
    assert!(!qc.value);
    assert_eq!(qc.block_hash, CryptoHash::EMPTY);
    assert_eq!(qc.signatures.len(), 4);
    assert!(qc.is_correct(vs.validators()));
}
