//! Changes: atomic, attributed groups of operations.
//!
//! A [`Change`] is the unit of replication. It is produced by one actor's
//! edit session (see [`ChangeContext`]) and applied everywhere else as a
//! whole or not at all.

pub mod context;
pub mod log;
pub mod pack;

use std::fmt;

use crate::operation::Operation;
use crate::time::ActorId;

pub use context::ChangeContext;
pub use log::ChangeLog;
pub use pack::ChangePack;

// ── ChangeId ──────────────────────────────────────────────────────────────

/// Identity of a change: the actor's sequence number for it, the lamport
/// value all of its tickets share, and the actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChangeId {
    client_seq: u64,
    lamport: u64,
    actor_id: ActorId,
}

impl ChangeId {
    pub const fn new(client_seq: u64, lamport: u64, actor_id: ActorId) -> Self {
        Self {
            client_seq,
            lamport,
            actor_id,
        }
    }

    pub const fn client_seq(&self) -> u64 {
        self.client_seq
    }

    pub const fn lamport(&self) -> u64 {
        self.lamport
    }

    pub const fn actor_id(&self) -> ActorId {
        self.actor_id
    }

    /// `Some(true)` if `self` was issued before `other` by the same actor.
    /// Changes of different actors are not ordered.
    pub fn precedes(&self, other: &ChangeId) -> Option<bool> {
        (self.actor_id == other.actor_id).then_some(self.client_seq < other.client_seq)
    }
}

impl fmt::Display for ChangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}@{}", self.actor_id, self.client_seq, self.lamport)
    }
}

// ── Change ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    id: ChangeId,
    operations: Vec<Operation>,
    message: Option<String>,
}

impl Change {
    pub fn new(id: ChangeId, operations: Vec<Operation>, message: Option<String>) -> Self {
        Self {
            id,
            operations,
            message,
        }
    }

    pub fn id(&self) -> ChangeId {
        self.id
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}
