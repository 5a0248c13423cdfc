//! Edit session state while a change is being built.

use crate::change::{Change, ChangeId};
use crate::error::{ClockOverflowError, StructuralError};
use crate::json::ElementTree;
use crate::operation::Operation;
use crate::time::{LogicalClock, Ticket};

/// Collects operations for one change, applying each to `tree` as it is
/// recorded so later edits in the same session observe earlier ones.
///
/// Every ticket issued here shares the change's lamport and carries an
/// increasing delimiter.
pub struct ChangeContext<'a> {
    id: ChangeId,
    clock: &'a mut LogicalClock,
    tree: &'a mut ElementTree,
    operations: Vec<Operation>,
}

impl<'a> ChangeContext<'a> {
    pub fn new(id: ChangeId, clock: &'a mut LogicalClock, tree: &'a mut ElementTree) -> Self {
        Self {
            id,
            clock,
            tree,
            operations: Vec::new(),
        }
    }

    pub fn id(&self) -> ChangeId {
        self.id
    }

    pub fn tree(&self) -> &ElementTree {
        self.tree
    }

    pub fn issue_ticket(&mut self) -> Result<Ticket, ClockOverflowError> {
        self.clock.new_ticket()
    }

    /// Apply `op` to the session tree and record it.
    pub fn push(&mut self, op: Operation) -> Result<(), StructuralError> {
        self.tree.apply(&op)?;
        self.operations.push(op);
        Ok(())
    }

    pub fn has_operations(&self) -> bool {
        !self.operations.is_empty()
    }

    /// Seal the session. An empty session yields no change.
    pub fn into_change(self, message: Option<String>) -> Option<Change> {
        if self.operations.is_empty() {
            return None;
        }
        Some(Change::new(self.id, self.operations, message))
    }
}
