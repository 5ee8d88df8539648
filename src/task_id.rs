use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Session-stable record identifier: 16 lowercase hexadecimal characters.
///
/// Ids are assigned whenever a record enters the store — including records
/// re-created from a snapshot at load — and are never persisted; the snapshot
/// format carries no identity. Their job is to keep references valid across
/// re-sorting and re-rendering within a single session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(String);

#[derive(Debug, Error)]
#[error("id generation failed: {0}")]
pub struct IdGenerationError(getrandom::Error);

#[derive(Debug, Error)]
pub enum TaskIdParseError {
    #[error("task id cannot be empty")]
    Empty,
    #[error("task id must be {expected} hex characters, got {got}")]
    InvalidLength { expected: usize, got: usize },
    #[error("task id may only contain hexadecimal characters")]
    InvalidCharacter,
}

impl TaskId {
    pub const HEX_LEN: usize = 16;

    /// Generate a fresh id from OS-backed entropy.
    pub fn generate() -> Result<Self, IdGenerationError> {
        Self::generate_with(|bytes| getrandom::fill(bytes).map_err(IdGenerationError))
    }

    /// Test hook: inject deterministic random bytes when needed.
    pub(crate) fn generate_with<F>(mut fill_random: F) -> Result<Self, IdGenerationError>
    where
        F: FnMut(&mut [u8]) -> Result<(), IdGenerationError>,
    {
        let mut bytes = [0_u8; std::mem::size_of::<u64>()];
        fill_random(&mut bytes)?;
        Ok(Self::from(u64::from_be_bytes(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading hex characters, for compact display.
    pub fn short(&self) -> &str {
        &self.0[..6]
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = TaskIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(TaskIdParseError::Empty);
        }
        if trimmed.len() != Self::HEX_LEN {
            return Err(TaskIdParseError::InvalidLength {
                expected: Self::HEX_LEN,
                got: trimmed.len(),
            });
        }
        if !trimmed.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(TaskIdParseError::InvalidCharacter);
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }
}

impl AsRef<str> for TaskId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl From<u64> for TaskId {
    fn from(value: u64) -> Self {
        Self(format!("{value:016x}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_canonical_hex() {
        let id = TaskId::generate().unwrap();
        assert_eq!(id.as_str().len(), TaskId::HEX_LEN);
        assert!(id.as_str().bytes().all(|b| b.is_ascii_hexdigit()));
        assert_eq!(id.as_str(), id.as_str().to_ascii_lowercase());
    }

    #[test]
    fn generate_with_uses_injected_bytes() {
        let id = TaskId::generate_with(|bytes| {
            bytes.copy_from_slice(&0xdead_beef_cafe_feed_u64.to_be_bytes());
            Ok(())
        })
        .unwrap();
        assert_eq!(id.as_str(), "deadbeefcafefeed");
    }

    #[test]
    fn parse_normalizes_case() {
        let id: TaskId = "DEADBEEFCAFEFEED".parse().unwrap();
        assert_eq!(id.as_str(), "deadbeefcafefeed");
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert!(matches!("".parse::<TaskId>(), Err(TaskIdParseError::Empty)));
        assert!(matches!(
            "abc".parse::<TaskId>(),
            Err(TaskIdParseError::InvalidLength { .. })
        ));
        assert!(matches!(
            "zzzzzzzzzzzzzzzz".parse::<TaskId>(),
            Err(TaskIdParseError::InvalidCharacter)
        ));
    }

    #[test]
    fn short_form_is_a_prefix() {
        let id = TaskId::from(42_u64);
        assert!(id.as_str().starts_with(id.short()));
        assert_eq!(id.short().len(), 6);
    }
}
