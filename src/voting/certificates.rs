/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Proof that a quorum of validators cast the same vote.
//!
//! A [`QuorumCertificate`] is produced by [`VoteSet::certificate`](super::vote_set::VoteSet::certificate)
//! or [`VoteSet::rejection_certificate`](super::vote_set::VoteSet::rejection_certificate) once a bucket
//! reaches a quorum. It carries only the logical fields of the vote and one signature per signer, since
//! the canonical encoding every signature is over can be rebuilt from those fields.
//!
//! Certificates implement the Borsh traits, so callers can persist them or pass them to peers.

use std::{
    collections::HashSet,
    fmt::{self, Display, Formatter},
};

use borsh::{BorshDeserialize, BorshSerialize};

use crate::types::{
    crypto_primitives::{address_of, Signature, VerifyingKey, VoteSignature},
    data_types::{Address, BlockHeight, CryptoHash, SignatureBytes, VerifyingKeyBytes, ViewNumber},
    validators::ValidatorSet,
};

use super::messages::{canonical_encoding, VotePhase};

/// One signer's contribution to a [`QuorumCertificate`].
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct CertificateSignature {
    pub verifying_key: VerifyingKeyBytes,
    pub signature: SignatureBytes,
}

impl From<&VoteSignature> for CertificateSignature {
    fn from(value: &VoteSignature) -> Self {
        CertificateSignature {
            verifying_key: value.verifying_key().to_bytes(),
            signature: value.signature(),
        }
    }
}

/// Proof that at least a quorum of a validator set cast the same vote for a given phase, height, and view.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct QuorumCertificate {
    pub phase: VotePhase,
    pub height: BlockHeight,
    pub view: ViewNumber,
    pub value: bool,
    pub block_hash: CryptoHash,
    pub signatures: Vec<CertificateSignature>,
}

impl QuorumCertificate {
    /// Get the canonical encoding of the vote every signature in this certificate is over.
    pub fn message_bytes(&self) -> Vec<u8> {
        canonical_encoding(
            self.phase,
            self.value,
            self.height,
            self.view,
            &self.block_hash,
        )
    }

    /// Check that every signature is correct and made by a distinct member of `validators`, and that
    /// there are at least a quorum of them.
    pub fn verify(&self, validators: &ValidatorSet) -> Result<(), CertificateError> {
        if self.height.int() == 0 {
            return Err(CertificateError::ZeroHeight);
        }

        let message = self.message_bytes();
        let mut signers: HashSet<Address> = HashSet::with_capacity(self.signatures.len());
        for certificate_signature in &self.signatures {
            let verifying_key = VerifyingKey::from_bytes(&certificate_signature.verifying_key)
                .map_err(|_| CertificateError::MalformedVerifyingKey)?;
            let signer = address_of(&verifying_key);

            if !validators.contains(&signer) {
                return Err(CertificateError::UnknownSigner { signer });
            }
            if !signers.insert(signer) {
                return Err(CertificateError::DuplicateSigner { signer });
            }

            let signature = Signature::from_bytes(&certificate_signature.signature.bytes());
            if verifying_key.verify_strict(&message, &signature).is_err() {
                return Err(CertificateError::IncorrectSignature { signer });
            }
        }

        if signers.len() < validators.quorum() {
            return Err(CertificateError::NoQuorum {
                signers: signers.len(),
                quorum: validators.quorum(),
            });
        }
        Ok(())
    }

    /// Same as [`verify`](Self::verify), but only reports whether the certificate is correct.
    pub fn is_correct(&self, validators: &ValidatorSet) -> bool {
        self.verify(validators).is_ok()
    }
}

/// Enumerates the reasons a [`QuorumCertificate`] can fail [verification](QuorumCertificate::verify).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertificateError {
    /// Votes about height 0 are never valid.
    ZeroHeight,

    /// A verifying key in the certificate is not a valid Ed25519 point.
    MalformedVerifyingKey,

    UnknownSigner { signer: Address },

    DuplicateSigner { signer: Address },

    IncorrectSignature { signer: Address },

    /// Fewer distinct signers than the validator set's quorum.
    NoQuorum { signers: usize, quorum: usize },
}

impl Display for CertificateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            CertificateError::ZeroHeight => write!(f, "certificate is for height 0"),
            CertificateError::MalformedVerifyingKey => write!(f, "malformed verifying key"),
            CertificateError::UnknownSigner { signer } => write!(f, "unknown signer {}", signer),
            CertificateError::DuplicateSigner { signer } => {
                write!(f, "signer {} appears more than once", signer)
            }
            CertificateError::IncorrectSignature { signer } => {
                write!(f, "incorrect signature from {}", signer)
            }
            CertificateError::NoQuorum { signers, quorum } => {
                write!(f, "{} signers, quorum is {}", signers, quorum)
            }
        }
    }
}

impl std::error::Error for CertificateError {}
