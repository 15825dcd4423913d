use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkError {
    #[error("difficulty prefix has {len} characters, maximum is 64")]
    PrefixTooLong { len: usize },

    #[error("difficulty prefix contains non-hex character {ch:?} at {position}")]
    InvalidPrefixCharacter { ch: char, position: usize },
}
