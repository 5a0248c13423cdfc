//! Reasons a pushed pack is rejected.
//!
//! A rejected pack changes nothing on the coordinator. The actor keeps its
//! changes and may resynchronize and push again.

use rottie_document::{
    ActorId, ChangeId, ClockOverflowError, ClockRegressionError, SequenceGapError,
    StructuralError,
};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SyncError {
    #[error(transparent)]
    SequenceGap(#[from] SequenceGapError),

    #[error("change {change}: {source}")]
    ClockRegression {
        change: ChangeId,
        #[source]
        source: ClockRegressionError,
    },

    #[error("change {change}: {source}")]
    ClockOverflow {
        change: ChangeId,
        #[source]
        source: ClockOverflowError,
    },

    #[error("change {change} rejected: {source}")]
    Rejected {
        change: ChangeId,
        #[source]
        source: StructuralError,
    },

    #[error("pack carries {count} changes, limit is {limit}")]
    PackTooLarge { count: usize, limit: usize },

    #[error("change {change} was pushed by actor {actor}")]
    ForeignChange { change: ChangeId, actor: ActorId },
}
