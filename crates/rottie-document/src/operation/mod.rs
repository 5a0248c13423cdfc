//! Operations: the typed mutations recorded in a change.
//!
//! Each operation targets exactly one container, addressed by the ticket
//! that created it, and carries the ticket at which it was executed. The
//! `executed_at` ticket is unique per operation and is how replays are
//! detected.

use std::fmt;

use crate::json::Element;
use crate::time::Ticket;

#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Write `value` under `key` in an object.
    Set {
        parent_created_at: Ticket,
        key: String,
        value: Element,
        executed_at: Ticket,
    },
    /// Insert `value` into an array right after `prev_created_at`
    /// ([`Ticket::INITIAL`] for the head).
    Add {
        parent_created_at: Ticket,
        prev_created_at: Ticket,
        value: Element,
        executed_at: Ticket,
    },
    /// Tombstone the child `created_at` of an object or array.
    Remove {
        parent_created_at: Ticket,
        created_at: Ticket,
        executed_at: Ticket,
    },
}

impl Operation {
    pub fn executed_at(&self) -> Ticket {
        match self {
            Operation::Set { executed_at, .. }
            | Operation::Add { executed_at, .. }
            | Operation::Remove { executed_at, .. } => *executed_at,
        }
    }

    pub fn parent_created_at(&self) -> Ticket {
        match self {
            Operation::Set {
                parent_created_at, ..
            }
            | Operation::Add {
                parent_created_at, ..
            }
            | Operation::Remove {
                parent_created_at, ..
            } => *parent_created_at,
        }
    }

    /// The element this operation attaches, if any.
    pub fn value(&self) -> Option<&Element> {
        match self {
            Operation::Set { value, .. } | Operation::Add { value, .. } => Some(value),
            Operation::Remove { .. } => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::Set { .. } => "set",
            Operation::Add { .. } => "add",
            Operation::Remove { .. } => "remove",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Set {
                parent_created_at,
                key,
                value,
                executed_at,
            } => write!(
                f,
                "set {} {:?}={} @{}",
                parent_created_at,
                key,
                value.created_at(),
                executed_at
            ),
            Operation::Add {
                parent_created_at,
                prev_created_at,
                value,
                executed_at,
            } => write!(
                f,
                "add {} after {} {} @{}",
                parent_created_at,
                prev_created_at,
                value.created_at(),
                executed_at
            ),
            Operation::Remove {
                parent_created_at,
                created_at,
                executed_at,
            } => write!(f, "remove {} {} @{}", parent_created_at, created_at, executed_at),
        }
    }
}
