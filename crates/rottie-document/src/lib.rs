//! Replicated JSON document model.
//!
//! Every replica holds an [`ElementTree`] and mutates it through typed
//! [`Operation`]s grouped into [`Change`]s. Changes carry [`Ticket`]s from a
//! per-actor [`LogicalClock`], and those tickets alone decide how concurrent
//! edits merge, so every replica that applies the same set of changes ends
//! up with an equal tree regardless of arrival order.
//!
//! The client side of synchronization is [`Document`]: it records local
//! edits, bundles them into a [`ChangePack`] stamped with its
//! [`Checkpoint`], and merges the coordinator's response.

pub mod change;
pub mod checkpoint;
pub mod document;
pub mod error;
pub mod json;
pub mod key;
pub mod operation;
pub mod time;

pub use change::{Change, ChangeContext, ChangeId, ChangeLog, ChangePack};
pub use checkpoint::Checkpoint;
pub use document::{ArrayProxy, Document, ObjectProxy, SyncState};
pub use error::{
    ClockOverflowError, ClockRegressionError, DocumentError, Result, SeqField, SequenceGapError,
    StructuralError,
};
pub use json::{Applied, Element, ElementKind, ElementTree, PrimitiveValue, ValueType};
pub use key::{DocumentKey, KeyError};
pub use operation::Operation;
pub use time::{ActorId, LogicalClock, Ticket};

/// Returns the crate version at compile time.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
