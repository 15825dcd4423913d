//! Difficulty expressed as a required hex prefix of the block hash.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::WorkError;

/// A lowercase hex string the block hash must start with.
///
/// Each additional character makes the target 16 times harder. The empty
/// prefix is met by every hash.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DifficultyPrefix(String);

impl DifficultyPrefix {
    /// Maximum length: a SHA-256 hash has 64 hex characters.
    pub const MAX_LEN: usize = 64;

    /// Parse and normalise to lowercase.
    pub fn parse(s: &str) -> Result<Self, WorkError> {
        if s.len() > Self::MAX_LEN {
            return Err(WorkError::PrefixTooLong { len: s.len() });
        }
        if let Some((position, ch)) = s.char_indices().find(|(_, c)| !c.is_ascii_hexdigit()) {
            return Err(WorkError::InvalidPrefixCharacter { ch, position });
        }
        Ok(Self(s.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Expected number of hashes to meet this prefix (16^len), saturating.
    pub fn expected_attempts(&self) -> u64 {
        16u64.checked_pow(self.0.len() as u32).unwrap_or(u64::MAX)
    }
}

impl FromStr for DifficultyPrefix {
    type Err = WorkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DifficultyPrefix {
    type Error = WorkError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<DifficultyPrefix> for String {
    fn from(p: DifficultyPrefix) -> Self {
        p.0
    }
}

impl fmt::Display for DifficultyPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
