//! Replicated Growable Array ordering.
//!
//! A plain `Vec` of element tickets kept in logical order. Each insertion is
//! addressed by the ticket of its predecessor; [`Ticket::INITIAL`] is the
//! head. Linear scans make every operation O(n), which is fine for the
//! document sizes this crate targets.

use crate::time::Ticket;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rga {
    nodes: Vec<Ticket>,
}

impl Rga {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Physical position of `id`, or `None`.
    pub fn position_of(&self, id: Ticket) -> Option<usize> {
        self.nodes.iter().position(|n| *n == id)
    }

    pub fn contains(&self, id: Ticket) -> bool {
        id == Ticket::INITIAL || self.position_of(id).is_some()
    }

    /// Insert `id` right after `prev`, returning its physical position.
    ///
    /// Concurrent inserts after the same predecessor are ordered by ticket:
    /// the greater ticket lands closer to the predecessor. Any element that
    /// was inserted after one of those skipped siblings carries an even
    /// greater ticket, so whole subtrees are skipped together.
    ///
    /// An unknown `prev` appends at the tail; callers validate beforehand.
    pub fn insert_after(&mut self, prev: Ticket, id: Ticket) -> usize {
        let start = if prev == Ticket::INITIAL {
            0
        } else {
            match self.position_of(prev) {
                Some(idx) => idx + 1,
                None => self.nodes.len(),
            }
        };

        let mut pos = start;
        while pos < self.nodes.len() && self.nodes[pos] > id {
            pos += 1;
        }
        self.nodes.insert(pos, id);
        pos
    }

    /// The physically last node, tombstoned or not.
    pub fn last(&self) -> Ticket {
        self.nodes.last().copied().unwrap_or(Ticket::INITIAL)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Ticket> + '_ {
        self.nodes.iter().copied()
    }
}
