//! The push/pull message exchanged between an actor and the coordinator.

use crate::change::Change;
use crate::checkpoint::Checkpoint;
use crate::key::DocumentKey;

/// Changes for one document, stamped with the sender's checkpoint.
///
/// Pushed by an actor, the checkpoint says what the actor has already seen.
/// Returned by the coordinator, it says what the actor has now seen and which
/// of its own changes were acknowledged.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangePack {
    document_key: DocumentKey,
    checkpoint: Checkpoint,
    changes: Vec<Change>,
}

impl ChangePack {
    pub fn new(document_key: DocumentKey, checkpoint: Checkpoint, changes: Vec<Change>) -> Self {
        Self {
            document_key,
            checkpoint,
            changes,
        }
    }

    pub fn document_key(&self) -> &DocumentKey {
        &self.document_key
    }

    pub fn checkpoint(&self) -> Checkpoint {
        self.checkpoint
    }

    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    pub fn into_changes(self) -> Vec<Change> {
        self.changes
    }

    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}
