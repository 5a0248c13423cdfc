//! Error taxonomy for the document core.
//!
//! Structural errors reject a single change, sequence gaps and clock
//! regressions reject a whole pack. Duplicate delivery is not an error at
//! all; it surfaces as [`Applied::Duplicate`](crate::json::Applied).

use std::fmt;

use thiserror::Error;

use crate::json::ElementKind;
use crate::key::KeyError;
use crate::time::Ticket;

/// An operation references something the tree cannot resolve.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralError {
    #[error("operation {executed_at}: parent {parent} not found")]
    ParentNotFound { parent: Ticket, executed_at: Ticket },

    #[error("operation {executed_at}: parent {parent} is {found}, expected {expected}")]
    ParentTypeMismatch {
        parent: Ticket,
        executed_at: Ticket,
        expected: ElementKind,
        found: ElementKind,
    },

    #[error("operation {executed_at}: predecessor {prev} not found in array {parent}")]
    PrevNotFound {
        parent: Ticket,
        prev: Ticket,
        executed_at: Ticket,
    },

    #[error("operation {executed_at}: element {created_at} is not a child of {parent}")]
    ChildNotFound {
        parent: Ticket,
        created_at: Ticket,
        executed_at: Ticket,
    },

    #[error("operation {executed_at}: element {created_at} already exists")]
    DuplicateElement { created_at: Ticket, executed_at: Ticket },
}

/// Which watermark a sequence or clock check was made against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeqField {
    ServerSeq,
    ClientSeq,
    Lamport,
}

impl fmt::Display for SeqField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SeqField::ServerSeq => "serverSeq",
            SeqField::ClientSeq => "clientSeq",
            SeqField::Lamport => "lamport",
        })
    }
}

/// A discontinuity at a push/pull boundary. The caller resynchronizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{field} gap: expected {expected}, got {actual}")]
pub struct SequenceGapError {
    pub field: SeqField,
    pub expected: u64,
    pub actual: u64,
}

/// A monotonic value was asked to move backward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{field} would move backward from {current} to {proposed}")]
pub struct ClockRegressionError {
    pub field: SeqField,
    pub current: u64,
    pub proposed: u64,
}

/// The clock cannot move past `lamport` without leaving the encodable range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("lamport {lamport} exhausts the clock (limit {limit})")]
pub struct ClockOverflowError {
    pub lamport: u64,
    pub limit: u64,
}

/// Errors surfaced by the document core and the client edit session.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DocumentError {
    #[error(transparent)]
    Structural(#[from] StructuralError),
    #[error(transparent)]
    SequenceGap(#[from] SequenceGapError),
    #[error(transparent)]
    ClockRegression(#[from] ClockRegressionError),
    #[error(transparent)]
    ClockOverflow(#[from] ClockOverflowError),
    #[error(transparent)]
    Key(#[from] KeyError),
    #[error("key {0:?} not found")]
    KeyNotFound(String),
    #[error("index {index} out of bounds for array of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },
    #[error("element {created_at} is {found}, expected {expected}")]
    UnexpectedKind {
        created_at: Ticket,
        expected: ElementKind,
        found: ElementKind,
    },
    #[error("change pack for {found} applied to document {expected}")]
    KeyMismatch { expected: String, found: String },
}

pub type Result<T, E = DocumentError> = std::result::Result<T, E>;
