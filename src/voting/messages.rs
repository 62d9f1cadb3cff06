/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The [`Vote`] message and the [`VotePhase`]s it can be cast in.
//!
//! ## Canonical encoding
//!
//! Every `Vote` caches the canonical encoding of its logical fields, computed once when the vote is
//! created or decoded. This exact byte string is what gets signed and verified:
//!
//! ```text
//! [1 byte phase][1 byte value: 0x00 | 0x01][8 bytes height, big-endian][4 bytes view, big-endian][varint length][block hash]
//! ```
//!
//! ## Wire format
//!
//! On the wire, a signed vote is its canonical encoding followed by its [signature](VoteSignature), each
//! preceded by a varint length:
//!
//! ```text
//! [varint length][canonical encoding][varint length][signature]
//! ```
//!
//! [`Vote::decode_from_wire`] does **not** verify the signature. Call [`Vote::validate`] for that.

use std::fmt::{self, Display, Formatter};

use borsh::{BorshDeserialize, BorshSerialize};

use crate::types::{
    codec::{DecodeError, Decoder, EncodeError, Encoder},
    crypto_primitives::{Keypair, VoteSignature},
    data_types::{Address, BlockHeight, CryptoHash, ViewNumber},
};

/// Value of an APPROVE vote.
pub const VALUE_APPROVE: bool = true;

/// Value of a REJECT vote.
pub const VALUE_REJECT: bool = false;

/// The step of a consensus round that a vote belongs to.
///
/// Encoded as a single byte: `0` for `Validate`, `1` for `PreCommit`, `2` for `Commit`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, BorshSerialize, BorshDeserialize)]
pub enum VotePhase {
    Validate,
    PreCommit,
    Commit,
}

impl VotePhase {
    /// Get the byte this phase is encoded as.
    pub const fn to_byte(self) -> u8 {
        match self {
            VotePhase::Validate => 0,
            VotePhase::PreCommit => 1,
            VotePhase::Commit => 2,
        }
    }

    /// Get the phase encoded as `byte`, failing if no phase is.
    pub fn from_byte(byte: u8) -> Result<VotePhase, DecodeError> {
        match byte {
            0 => Ok(VotePhase::Validate),
            1 => Ok(VotePhase::PreCommit),
            2 => Ok(VotePhase::Commit),
            _ => Err(DecodeError::UnknownPhase { byte }),
        }
    }
}

impl Display for VotePhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            VotePhase::Validate => write!(f, "VALIDATE"),
            VotePhase::PreCommit => write!(f, "PRECOMMIT"),
            VotePhase::Commit => write!(f, "COMMIT"),
        }
    }
}

/// One validator's statement that it approves (or rejects) a block at a specific phase, height, and view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Vote {
    phase: VotePhase,
    value: bool,
    height: BlockHeight,
    view: ViewNumber,
    block_hash: CryptoHash,
    encoded: Vec<u8>,
    signature: Option<VoteSignature>,
}

impl Vote {
    fn new(
        phase: VotePhase,
        value: bool,
        height: BlockHeight,
        view: ViewNumber,
        block_hash: CryptoHash,
    ) -> Vote {
        let encoded = canonical_encoding(phase, value, height, view, &block_hash);
        Vote {
            phase,
            value,
            height,
            view,
            block_hash,
            encoded,
            signature: None,
        }
    }

    /// Create an unsigned vote approving `block_hash`.
    pub fn new_approve(
        phase: VotePhase,
        height: BlockHeight,
        view: ViewNumber,
        block_hash: CryptoHash,
    ) -> Vote {
        Self::new(phase, VALUE_APPROVE, height, view, block_hash)
    }

    /// Create an unsigned vote rejecting whatever was proposed at `height` and `view`. Rejections carry
    /// [`CryptoHash::EMPTY`] instead of a block hash.
    pub fn new_reject(phase: VotePhase, height: BlockHeight, view: ViewNumber) -> Vote {
        Self::new(phase, VALUE_REJECT, height, view, CryptoHash::EMPTY)
    }

    /// Sign the canonical encoding of this vote with `keypair`, replacing any previous signature.
    pub fn sign(self, keypair: &Keypair) -> Vote {
        let signature = keypair.sign(&self.encoded);
        Vote {
            signature: Some(signature),
            ..self
        }
    }

    /// Check that the vote is well-formed and that its signature verifies against its canonical
    /// encoding.
    ///
    /// A REJECT vote must carry [`CryptoHash::EMPTY`]. Never panics. Phase and block hash length are
    /// enforced by their types.
    pub fn validate(&self) -> bool {
        self.is_well_formed() && self.has_valid_signature()
    }

    /// The checks in [`validate`](Self::validate) that do not involve the signature.
    pub(crate) fn is_well_formed(&self) -> bool {
        self.height.int() > 0
            && !self.encoded.is_empty()
            && (self.value == VALUE_APPROVE || self.block_hash.is_empty())
    }

    pub(crate) fn has_valid_signature(&self) -> bool {
        match &self.signature {
            Some(signature) => signature.verify(&self.encoded),
            None => false,
        }
    }

    /// Frame this vote for the wire.
    ///
    /// Fails with [`EncodeError::Unsigned`] if the vote has not been signed.
    pub fn encode_for_wire(&self) -> Result<Vec<u8>, EncodeError> {
        let signature = self.signature.as_ref().ok_or(EncodeError::Unsigned)?;

        let mut enc = Encoder::new();
        enc.write_bytes(&self.encoded)?;
        enc.write_bytes(&signature.to_bytes())?;
        Ok(enc.into_bytes())
    }

    /// Read a vote framed by [`encode_for_wire`](Self::encode_for_wire).
    ///
    /// The canonical encoding is decoded first and kept byte-for-byte, then the signature is attached.
    /// The signature is parsed but not verified.
    pub fn decode_from_wire(bytes: &[u8]) -> Result<Vote, DecodeError> {
        let mut dec = Decoder::new(bytes);
        let encoded = dec.read_bytes()?;
        let signature = dec.read_bytes()?;
        dec.finish()?;

        let mut vote = Self::decode_canonical(encoded)?;
        vote.signature =
            Some(VoteSignature::from_bytes(signature).map_err(|_| DecodeError::InvalidSignature)?);
        Ok(vote)
    }

    /// Rebuild an unsigned vote from its canonical encoding.
    pub fn decode_canonical(encoded: &[u8]) -> Result<Vote, DecodeError> {
        let mut dec = Decoder::new(encoded);
        let phase = VotePhase::from_byte(dec.read_u8()?)?;
        let value = dec.read_bool()?;
        let height = BlockHeight::new(dec.read_u64()?);
        let view = ViewNumber::new(dec.read_u32()?);
        let block_hash = dec.read_bytes()?;
        dec.finish()?;

        let block_hash: [u8; 32] =
            block_hash
                .try_into()
                .map_err(|_| DecodeError::InvalidHashLength {
                    length: block_hash.len(),
                })?;

        Ok(Vote {
            phase,
            value,
            height,
            view,
            block_hash: CryptoHash::new(block_hash),
            encoded: encoded.to_vec(),
            signature: None,
        })
    }

    pub fn phase(&self) -> VotePhase {
        self.phase
    }

    /// `true` for APPROVE, `false` for REJECT.
    pub fn value(&self) -> bool {
        self.value
    }

    pub fn is_approve(&self) -> bool {
        self.value == VALUE_APPROVE
    }

    pub fn height(&self) -> BlockHeight {
        self.height
    }

    pub fn view(&self) -> ViewNumber {
        self.view
    }

    pub fn block_hash(&self) -> CryptoHash {
        self.block_hash
    }

    /// Get the cached canonical encoding, the bytes the signature is over.
    pub fn encoded(&self) -> &[u8] {
        &self.encoded
    }

    pub fn signature(&self) -> Option<&VoteSignature> {
        self.signature.as_ref()
    }

    /// Get the address of the key that signed this vote. The signature is not verified.
    pub fn signer(&self) -> Option<Address> {
        self.signature.as_ref().map(VoteSignature::signer)
    }
}

impl Display for Vote {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Vote [{}, {}, height={}, view={}]",
            self.phase,
            if self.value { "approve" } else { "reject" },
            self.height,
            self.view
        )
    }
}

pub(crate) fn canonical_encoding(
    phase: VotePhase,
    value: bool,
    height: BlockHeight,
    view: ViewNumber,
    block_hash: &CryptoHash,
) -> Vec<u8> {
    let mut enc = Encoder::new();
    enc.write_u8(phase.to_byte());
    enc.write_bool(value);
    enc.write_u64(height.int());
    enc.write_u32(view.int());
    enc.write_hash(&block_hash.bytes());
    enc.into_bytes()
}
