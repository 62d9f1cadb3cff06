/*
    Copyright © 2024, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Cryptographic primitives.
//!
//! The definitions and re-exports in this module provide two categories of cryptographic primitives:
//! 1. **Cryptographic Hashes**: provided by the [`sha2`] crate, used to derive validator [`Address`]es.
//! 2. **Digital Signatures**: provided by the [`ed25519_dalek`] crate.
//!
//! ## Signature format
//!
//! A [`VoteSignature`] carries the signer's verifying key next to the 64 signature bytes, so the
//! signer of a vote can be recovered from the vote alone. On the wire it takes 96 bytes: the signature
//! first, then the verifying key.

use std::fmt::{self, Debug, Formatter};

use super::data_types::{Address, SignatureBytes, VerifyingKeyBytes};

// re-exports below.
pub use sha2::Digest;
pub use sha2::Sha256 as CryptoHasher;

pub use ed25519_dalek::{Signature, SignatureError, Signer, SigningKey, VerifyingKey};

/// Length in bytes of a serialized [`VoteSignature`].
pub const VOTE_SIGNATURE_LEN: usize = 96;

/// Derive the [`Address`] of the validator owning `verifying_key`: the first 20 bytes of the SHA256
/// hash of the key.
pub fn address_of(verifying_key: &VerifyingKey) -> Address {
    let digest = CryptoHasher::digest(verifying_key.as_bytes());
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&digest[..20]);
    Address::new(bytes)
}

/// A facade around [`SigningKey`] that implements a method for [`sign`](Self::sign)-ing messages as
/// well as getters for the [`public`](Self::public) key and [`address`](Self::address) associated with
/// the signing key.
#[derive(Clone)]
pub struct Keypair(SigningKey);

impl Keypair {
    /// Create a `Keypair` that wraps over `signing_key`.
    pub fn new(signing_key: SigningKey) -> Keypair {
        Keypair(signing_key)
    }

    /// Sign an arbitrary `message` with the `Keypair`.
    pub fn sign(&self, message: &[u8]) -> VoteSignature {
        VoteSignature {
            signature: SignatureBytes::new(self.0.sign(message).to_bytes()),
            verifying_key: self.0.verifying_key(),
        }
    }

    /// Get the `VerifyingKey` of this `Keypair`.
    pub fn public(&self) -> VerifyingKey {
        self.0.verifying_key()
    }

    /// Get the `Address` of this `Keypair`.
    pub fn address(&self) -> Address {
        address_of(&self.public())
    }
}

impl From<SigningKey> for Keypair {
    fn from(signing_key: SigningKey) -> Self {
        Keypair::new(signing_key)
    }
}

/// Detached Ed25519 signature together with the verifying key of its signer.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct VoteSignature {
    signature: SignatureBytes,
    verifying_key: VerifyingKey,
}

impl VoteSignature {
    /// Get the raw signature bytes.
    pub fn signature(&self) -> SignatureBytes {
        self.signature
    }

    /// Get the verifying key of the signer.
    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }

    /// Get the [`Address`] of the signer.
    pub fn signer(&self) -> Address {
        address_of(&self.verifying_key)
    }

    /// Check that this is a signature over `message` created by the key it carries.
    ///
    /// Uses strict verification, which rejects weak keys and non-canonical signature encodings.
    pub fn verify(&self, message: &[u8]) -> bool {
        let signature = Signature::from_bytes(&self.signature.bytes());
        self.verifying_key
            .verify_strict(message, &signature)
            .is_ok()
    }

    /// Serialize into `signature || verifying_key`.
    pub fn to_bytes(&self) -> [u8; VOTE_SIGNATURE_LEN] {
        let mut bytes = [0u8; VOTE_SIGNATURE_LEN];
        bytes[..64].copy_from_slice(&self.signature.bytes());
        bytes[64..].copy_from_slice(self.verifying_key.as_bytes());
        bytes
    }

    /// Deserialize from `signature || verifying_key`.
    ///
    /// Fails if `bytes` is not exactly [`VOTE_SIGNATURE_LEN`] long or does not contain a valid
    /// verifying key. The signature itself is not checked here.
    pub fn from_bytes(bytes: &[u8]) -> Result<VoteSignature, SignatureError> {
        if bytes.len() != VOTE_SIGNATURE_LEN {
            return Err(SignatureError::new());
        }

        let mut signature = [0u8; 64];
        signature.copy_from_slice(&bytes[..64]);
        let mut verifying_key: VerifyingKeyBytes = [0u8; 32];
        verifying_key.copy_from_slice(&bytes[64..]);

        Ok(VoteSignature {
            signature: SignatureBytes::new(signature),
            verifying_key: VerifyingKey::from_bytes(&verifying_key)?,
        })
    }
}

impl Debug for VoteSignature {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("VoteSignature")
            .field("signer", &self.signer())
            .field("signature", &self.signature)
            .finish()
    }
}
