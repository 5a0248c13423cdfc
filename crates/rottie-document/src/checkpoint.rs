//! Synchronization watermarks.

use std::fmt;

use crate::error::{ClockRegressionError, SeqField};

/// How far an actor has synchronized: the last server sequence it has seen
/// and the last of its own client sequences the coordinator acknowledged.
///
/// Both fields only move forward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Checkpoint {
    server_seq: u64,
    client_seq: u64,
}

impl Checkpoint {
    pub const INITIAL: Checkpoint = Checkpoint::new(0, 0);

    pub const fn new(server_seq: u64, client_seq: u64) -> Self {
        Self {
            server_seq,
            client_seq,
        }
    }

    pub const fn server_seq(&self) -> u64 {
        self.server_seq
    }

    pub const fn client_seq(&self) -> u64 {
        self.client_seq
    }

    /// Raise the given fields. Proposing a lower value than the current one
    /// is an error; `None` keeps a field as is.
    pub fn advance(
        &self,
        server_seq: Option<u64>,
        client_seq: Option<u64>,
    ) -> Result<Checkpoint, ClockRegressionError> {
        let check = |field, current: u64, proposed: Option<u64>| match proposed {
            Some(p) if p < current => Err(ClockRegressionError {
                field,
                current,
                proposed: p,
            }),
            Some(p) => Ok(p),
            None => Ok(current),
        };
        Ok(Checkpoint {
            server_seq: check(SeqField::ServerSeq, self.server_seq, server_seq)?,
            client_seq: check(SeqField::ClientSeq, self.client_seq, client_seq)?,
        })
    }

    /// Fieldwise maximum.
    pub fn forward(&self, other: Checkpoint) -> Checkpoint {
        Checkpoint {
            server_seq: self.server_seq.max(other.server_seq),
            client_seq: self.client_seq.max(other.client_seq),
        }
    }

    pub fn increase_client_seq(&self, n: u64) -> Checkpoint {
        Checkpoint {
            server_seq: self.server_seq,
            client_seq: self.client_seq.saturating_add(n),
        }
    }

    /// `true` if server sequence `seq` has not been seen yet.
    pub fn has_pending_server(&self, seq: u64) -> bool {
        seq > self.server_seq
    }

    /// `true` if client sequence `seq` has not been acknowledged yet.
    pub fn has_pending_client(&self, seq: u64) -> bool {
        seq > self.client_seq
    }
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "serverSeq={}, clientSeq={}", self.server_seq, self.client_seq)
    }
}
