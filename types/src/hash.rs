//! Cryptographic hash types for transactions and Merkle commitments.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A 32-byte transaction content hash.
///
/// Also used for Merkle roots, which are built from transaction hashes.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TxHash([u8; 32]);

impl Default for TxHash {
    fn default() -> Self {
        Self::ZERO
    }
}

impl TxHash {
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Parse a 64-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, HashParseError> {
        hex::decode_32(s).map(Self)
    }
}

impl FromStr for TxHash {
    type Err = HashParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

/// Error returned when a hex string is not a valid 32-byte hash.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HashParseError {
    #[error("expected 64 hex characters, got {0}")]
    InvalidLength(usize),

    #[error("invalid hex character at position {0}")]
    InvalidCharacter(usize),
}

// Inline hex encoding to avoid adding the `hex` crate as a dependency of types.
pub(crate) mod hex {
    use super::HashParseError;

    pub const ALPHABET: &[u8; 16] = b"0123456789abcdef";

    pub fn encode(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }

    fn nibble(c: u8, pos: usize) -> Result<u8, HashParseError> {
        match c {
            b'0'..=b'9' => Ok(c - b'0'),
            b'a'..=b'f' => Ok(c - b'a' + 10),
            b'A'..=b'F' => Ok(c - b'A' + 10),
            _ => Err(HashParseError::InvalidCharacter(pos)),
        }
    }

    pub fn decode_32(s: &str) -> Result<[u8; 32], HashParseError> {
        let raw = s.as_bytes();
        if raw.len() != 64 {
            return Err(HashParseError::InvalidLength(raw.len()));
        }
        let mut out = [0u8; 32];
        for (i, byte) in out.iter_mut().enumerate() {
            let hi = nibble(raw[2 * i], 2 * i)?;
            let lo = nibble(raw[2 * i + 1], 2 * i + 1)?;
            *byte = (hi << 4) | lo;
        }
        Ok(out)
    }

    /// Number of leading characters of the lowercase hex form of `bytes`
    /// that equal `prefix`, without allocating the hex string.
    pub fn matching_prefix_len(bytes: &[u8; 32], prefix: &[u8]) -> usize {
        let mut matched = 0;
        for (i, &want) in prefix.iter().take(64).enumerate() {
            let byte = bytes[i / 2];
            let nib = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };
            if ALPHABET[nib as usize] != want {
                break;
            }
            matched += 1;
        }
        matched
    }
}
