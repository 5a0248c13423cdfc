//! Replica identifiers.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Number of bytes in an [`ActorId`].
pub const ACTOR_ID_LEN: usize = 12;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ActorIdError {
    #[error("actor id must be {expected} hex characters, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("actor id is not valid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

/// Globally unique replica identifier.
///
/// Rendered as 24 lowercase hex characters. Byte order and string order
/// agree, so the derived `Ord` is the lexicographic tie-break used by
/// [`Ticket`](super::Ticket) comparison.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId([u8; ACTOR_ID_LEN]);

impl ActorId {
    /// The smallest actor id. Owns the root element and the RGA head.
    pub const INITIAL: ActorId = ActorId([0x00; ACTOR_ID_LEN]);
    /// The greatest actor id.
    pub const MAX: ActorId = ActorId([0xff; ACTOR_ID_LEN]);

    pub const fn from_bytes(bytes: [u8; ACTOR_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Generate a fresh random actor id.
    pub fn random() -> Self {
        Self(rand::random())
    }

    pub fn as_bytes(&self) -> &[u8; ACTOR_ID_LEN] {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActorId({})", hex::encode(self.0))
    }
}

impl FromStr for ActorId {
    type Err = ActorIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != ACTOR_ID_LEN * 2 {
            return Err(ActorIdError::InvalidLength {
                expected: ACTOR_ID_LEN * 2,
                actual: s.len(),
            });
        }
        let mut bytes = [0u8; ACTOR_ID_LEN];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(bytes))
    }
}
