/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Minimal, platform-independent byte codec used for the canonical encoding of votes and for their
//! wire framing.
//!
//! ## Format
//!
//! - Fixed-width integers are written big-endian.
//! - Booleans are a single byte, `0x00` or `0x01`. Any other byte fails to decode.
//! - Byte strings are prefixed by their length as a varint: 7-bit groups, most significant group first,
//!   with the continuation bit `0x80` set on every byte except the last. Lengths take at most
//!   [`MAX_VARINT_LEN`] bytes, so they are strictly smaller than 2^28.

use std::fmt::{self, Display, Formatter};

/// Maximum number of bytes a length prefix may take.
pub const MAX_VARINT_LEN: usize = 4;

/// Largest length that fits in a [`MAX_VARINT_LEN`]-byte varint.
pub const MAX_LENGTH: usize = (1 << (7 * MAX_VARINT_LEN)) - 1;

/// Appends values to a growable byte buffer.
#[derive(Default)]
pub(crate) struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    pub(crate) fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub(crate) fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub(crate) fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub(crate) fn write_bool(&mut self, value: bool) {
        self.buf.push(value as u8);
    }

    pub(crate) fn write_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub(crate) fn write_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Write `bytes` preceded by its varint length.
    pub(crate) fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), EncodeError> {
        self.write_size(bytes.len())?;
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    /// Write a 32-byte hash preceded by its length. 32 fits in a single varint byte.
    pub(crate) fn write_hash(&mut self, hash: &[u8; 32]) {
        self.buf.push(32);
        self.buf.extend_from_slice(hash);
    }

    fn write_size(&mut self, size: usize) -> Result<(), EncodeError> {
        if size > MAX_LENGTH {
            return Err(EncodeError::LengthTooLarge { length: size });
        }

        let mut groups = [0u8; MAX_VARINT_LEN];
        let mut start = MAX_VARINT_LEN;
        let mut rest = size;
        loop {
            start -= 1;
            groups[start] = (rest & 0x7f) as u8;
            rest >>= 7;
            if rest == 0 {
                break;
            }
        }

        for (i, group) in groups.iter().enumerate().skip(start) {
            if i == MAX_VARINT_LEN - 1 {
                self.buf.push(*group);
            } else {
                self.buf.push(*group | 0x80);
            }
        }
        Ok(())
    }
}

/// Reads values off a borrowed byte slice, front to back.
pub(crate) struct Decoder<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        let remaining = self.data.len() - self.pos;
        if n > remaining {
            return Err(DecodeError::UnexpectedEof {
                needed: n,
                remaining,
            });
        }
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    pub(crate) fn read_bool(&mut self) -> Result<bool, DecodeError> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            byte => Err(DecodeError::InvalidBool { byte }),
        }
    }

    pub(crate) fn read_u32(&mut self) -> Result<u32, DecodeError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub(crate) fn read_u64(&mut self) -> Result<u64, DecodeError> {
        let b = self.take(8)?;
        Ok(u64::from_be_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    /// Read a varint-length-prefixed byte string.
    pub(crate) fn read_bytes(&mut self) -> Result<&'a [u8], DecodeError> {
        let size = self.read_size()?;
        self.take(size)
    }

    fn read_size(&mut self) -> Result<usize, DecodeError> {
        let mut size = 0usize;
        for i in 0..MAX_VARINT_LEN {
            let byte = self.read_u8()?;
            // A leading zero group makes the same length encodable in more than one way.
            if i == 0 && byte == 0x80 {
                return Err(DecodeError::InvalidLengthPrefix);
            }
            size = (size << 7) | (byte & 0x7f) as usize;
            if byte & 0x80 == 0 {
                return Ok(size);
            }
        }
        Err(DecodeError::InvalidLengthPrefix)
    }

    /// Fail if any input is left unread.
    pub(crate) fn finish(self) -> Result<(), DecodeError> {
        let remaining = self.data.len() - self.pos;
        if remaining != 0 {
            return Err(DecodeError::TrailingBytes { remaining });
        }
        Ok(())
    }
}

/// Enumerates the ways decoding a vote from bytes can fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The buffer ended before a value could be read in full.
    UnexpectedEof { needed: usize, remaining: usize },

    /// A length prefix was not minimal, or did not terminate within [`MAX_VARINT_LEN`] bytes.
    InvalidLengthPrefix,

    /// A boolean field held a byte other than `0x00` or `0x01`.
    InvalidBool { byte: u8 },

    /// The phase byte does not name any [`VotePhase`](crate::voting::messages::VotePhase).
    UnknownPhase { byte: u8 },

    /// The block hash field was not exactly 32 bytes long.
    InvalidHashLength { length: usize },

    /// The signature field was not a well-formed [`VoteSignature`](super::crypto_primitives::VoteSignature).
    InvalidSignature,

    /// Input was left over after the last field.
    TrailingBytes { remaining: usize },
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::UnexpectedEof { needed, remaining } => write!(
                f,
                "unexpected end of input: needed {} bytes, {} remaining",
                needed, remaining
            ),
            DecodeError::InvalidLengthPrefix => write!(f, "malformed length prefix"),
            DecodeError::InvalidBool { byte } => write!(f, "invalid boolean byte {:#04x}", byte),
            DecodeError::UnknownPhase { byte } => write!(f, "unknown vote phase {:#04x}", byte),
            DecodeError::InvalidHashLength { length } => {
                write!(f, "block hash must be 32 bytes, got {}", length)
            }
            DecodeError::InvalidSignature => write!(f, "malformed vote signature"),
            DecodeError::TrailingBytes { remaining } => {
                write!(f, "{} trailing bytes after vote", remaining)
            }
        }
    }
}

impl std::error::Error for DecodeError {}

/// Enumerates the ways encoding a vote into bytes can fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// A byte string is too long for its length prefix.
    LengthTooLarge { length: usize },

    /// Only signed votes can be framed for the wire.
    Unsigned,
}

impl Display for EncodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::LengthTooLarge { length } => {
                write!(f, "byte string of length {} exceeds {}", length, MAX_LENGTH)
            }
            EncodeError::Unsigned => write!(f, "vote is not signed"),
        }
    }
}

impl std::error::Error for EncodeError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded_size(size: usize) -> Vec<u8> {
        let mut enc = Encoder::new();
        enc.write_size(size).unwrap();
        enc.into_bytes()
    }

    #[test]
    fn varint_boundaries() {
        assert_eq!(encoded_size(0), vec![0x00]);
        assert_eq!(encoded_size(32), vec![0x20]);
        assert_eq!(encoded_size(127), vec![0x7f]);
        assert_eq!(encoded_size(128), vec![0x81, 0x00]);
        assert_eq!(encoded_size(300), vec![0x82, 0x2c]);
        assert_eq!(encoded_size(MAX_LENGTH), vec![0xff, 0xff, 0xff, 0x7f]);
    }

    #[test]
    fn varint_rejects_oversized_lengths() {
        let mut enc = Encoder::new();
        assert_eq!(
            enc.write_size(MAX_LENGTH + 1),
            Err(EncodeError::LengthTooLarge {
                length: MAX_LENGTH + 1
            })
        );
    }

    #[test]
    fn read_size_reverses_write_size() {
        for size in [0, 1, 127, 128, 16_383, 16_384, 2_097_151, 2_097_152, MAX_LENGTH] {
            let bytes = encoded_size(size);
            let mut dec = Decoder::new(&bytes);
            assert_eq!(dec.read_size().unwrap(), size);
            dec.finish().unwrap();
        }
    }

    #[test]
    fn unterminated_length_prefix() {
        let bytes = [0x81, 0x80, 0x80, 0x80, 0x01];
        assert_eq!(
            Decoder::new(&bytes).read_bytes(),
            Err(DecodeError::InvalidLengthPrefix)
        );
    }

    #[test]
    fn non_minimal_length_prefix() {
        let bytes = [0x80, 0x20];
        assert_eq!(
            Decoder::new(&bytes).read_bytes(),
            Err(DecodeError::InvalidLengthPrefix)
        );
    }

    #[test]
    fn hash_prefix_matches_generic_prefix() {
        let hash = [7u8; 32];
        let mut generic = Encoder::new();
        generic.write_bytes(&hash).unwrap();
        let mut fixed = Encoder::new();
        fixed.write_hash(&hash);
        assert_eq!(generic.into_bytes(), fixed.into_bytes());
    }

    #[test]
    fn truncated_byte_string() {
        let bytes = [0x05, 0x01, 0x02];
        assert_eq!(
            Decoder::new(&bytes).read_bytes(),
            Err(DecodeError::UnexpectedEof {
                needed: 5,
                remaining: 2
            })
        );
    }

    #[test]
    fn booleans_are_strict() {
        assert_eq!(Decoder::new(&[0x00]).read_bool(), Ok(false));
        assert_eq!(Decoder::new(&[0x01]).read_bool(), Ok(true));
        assert_eq!(
            Decoder::new(&[0x02]).read_bool(),
            Err(DecodeError::InvalidBool { byte: 0x02 })
        );
    }

    #[test]
    fn integers_are_big_endian() {
        let mut enc = Encoder::new();
        enc.write_u64(1);
        enc.write_u32(0x0102_0304);
        let bytes = enc.into_bytes();
        assert_eq!(bytes, vec![0, 0, 0, 0, 0, 0, 0, 1, 1, 2, 3, 4]);

        let mut dec = Decoder::new(&bytes);
        assert_eq!(dec.read_u64().unwrap(), 1);
        assert_eq!(dec.read_u32().unwrap(), 0x0102_0304);
        dec.finish().unwrap();
    }
}
