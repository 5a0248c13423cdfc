//! Server-sequenced change history.
//!
//! # Overview
//!
//! A [`ChangeLog`] records every change a coordinator accepted for one
//! document, keyed by the server sequence number assigned on receipt.
//! Sequence numbers start at 1 and have no gaps.
//!
//! The log supports pulling a suffix via [`ChangeLog::since`] and rebuilding
//! the document via [`ChangeLog::replay`] and [`ChangeLog::replay_to`].

use std::collections::BTreeMap;
use std::ops::Bound;

use crate::change::Change;
use crate::error::StructuralError;
use crate::json::ElementTree;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeLog {
    changes: BTreeMap<u64, Change>,
}

impl ChangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Highest assigned server sequence, `0` for an empty log.
    pub fn last_server_seq(&self) -> u64 {
        self.changes.keys().next_back().copied().unwrap_or(0)
    }

    /// Record `change` and return the server sequence assigned to it.
    pub fn append(&mut self, change: Change) -> u64 {
        let seq = self.last_server_seq() + 1;
        self.changes.insert(seq, change);
        seq
    }

    pub fn get(&self, server_seq: u64) -> Option<&Change> {
        self.changes.get(&server_seq)
    }

    /// Changes with a server sequence strictly greater than `server_seq`,
    /// in server order.
    pub fn since(&self, server_seq: u64) -> impl Iterator<Item = (u64, &Change)> {
        self.changes
            .range((Bound::Excluded(server_seq), Bound::Unbounded))
            .map(|(seq, change)| (*seq, change))
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Rebuild the document by applying every logged change to a fresh tree.
    pub fn replay(&self) -> Result<ElementTree, StructuralError> {
        self.replay_to(u64::MAX)
    }

    /// Rebuild the document as of `server_seq`, inclusive.
    pub fn replay_to(&self, server_seq: u64) -> Result<ElementTree, StructuralError> {
        let mut tree = ElementTree::new();
        for change in self.changes.range(..=server_seq).map(|(_, c)| c) {
            tree.apply_change(change)?;
        }
        Ok(tree)
    }
}
