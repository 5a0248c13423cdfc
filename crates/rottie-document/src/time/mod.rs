//! Logical time for the document model.
//!
//! A [`Ticket`] is both the ordering key that resolves concurrent edits and
//! the permanent identity of every element it creates. Tickets are issued by
//! a [`LogicalClock`], one per actor session.

pub mod actor;

use std::cmp::Ordering;
use std::fmt;

pub use actor::{ActorId, ActorIdError, ACTOR_ID_LEN};

use crate::error::ClockOverflowError;

/// Largest lamport a clock will issue or observe. Lamports travel on the wire
/// as signed 64-bit integers.
pub const MAX_LAMPORT: u64 = i64::MAX as u64;

// ── Ticket ────────────────────────────────────────────────────────────────

/// An immutable logical timestamp: `(lamport, delimiter, actor_id)`.
///
/// Ordered by lamport, then delimiter, then actor id. Two tickets are equal
/// only when all three fields are equal, so tickets issued by different
/// actors never collide.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket {
    lamport: u64,
    delimiter: u32,
    actor_id: ActorId,
}

impl Ticket {
    /// Bottom of the ticket lattice. Identity of the document root and the
    /// head sentinel of every array.
    pub const INITIAL: Ticket = Ticket::new(0, 0, ActorId::INITIAL);
    /// Top of the ticket lattice.
    pub const MAX: Ticket = Ticket::new(u64::MAX, u32::MAX, ActorId::MAX);

    pub const fn new(lamport: u64, delimiter: u32, actor_id: ActorId) -> Self {
        Self {
            lamport,
            delimiter,
            actor_id,
        }
    }

    pub const fn lamport(&self) -> u64 {
        self.lamport
    }

    pub const fn delimiter(&self) -> u32 {
        self.delimiter
    }

    pub const fn actor_id(&self) -> ActorId {
        self.actor_id
    }

    /// Returns `true` if `self` is ordered strictly after `other`.
    #[inline]
    pub fn after(&self, other: &Ticket) -> bool {
        self > other
    }
}

/// Compare two tickets under the total order.
#[inline]
pub fn compare(a: &Ticket, b: &Ticket) -> Ordering {
    a.cmp(b)
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let actor = self.actor_id.to_string();
        write!(f, "{}:{}:{}", self.lamport, self.delimiter, &actor[actor.len() - 4..])
    }
}

impl fmt::Debug for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ticket({}:{}:{})", self.lamport, self.delimiter, self.actor_id)
    }
}

// ── LogicalClock ──────────────────────────────────────────────────────────

/// A Lamport clock owned by exactly one actor session.
///
/// `tick` opens a new lamport value (one per change); `new_ticket` hands out
/// tickets inside it by bumping the delimiter. Every ticket returned is
/// strictly greater than every ticket returned before it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalClock {
    actor_id: ActorId,
    lamport: u64,
    delimiter: u32,
}

impl LogicalClock {
    pub fn new(actor_id: ActorId) -> Self {
        Self {
            actor_id,
            lamport: 0,
            delimiter: 0,
        }
    }

    pub fn actor_id(&self) -> ActorId {
        self.actor_id
    }

    pub fn lamport(&self) -> u64 {
        self.lamport
    }

    /// Advance to the next lamport value and return it.
    pub fn tick(&mut self) -> Result<u64, ClockOverflowError> {
        self.lamport = next_lamport(self.lamport)?;
        self.delimiter = 0;
        Ok(self.lamport)
    }

    /// Issue a ticket strictly greater than any previously issued one.
    pub fn new_ticket(&mut self) -> Result<Ticket, ClockOverflowError> {
        if self.delimiter == u32::MAX {
            self.tick()?;
        }
        self.delimiter += 1;
        Ok(Ticket::new(self.lamport, self.delimiter, self.actor_id))
    }

    /// Observe a remote lamport value.
    ///
    /// Afterwards the local lamport is strictly greater than `observed`, so
    /// every ticket issued from here on sorts after the observed event.
    /// Idempotent: observing an old value leaves the clock untouched. The
    /// clock is unchanged on error.
    pub fn advance(&mut self, observed: u64) -> Result<(), ClockOverflowError> {
        if observed >= self.lamport {
            self.lamport = next_lamport(observed)?;
            self.delimiter = 0;
        }
        Ok(())
    }
}

fn next_lamport(lamport: u64) -> Result<u64, ClockOverflowError> {
    lamport
        .checked_add(1)
        .filter(|next| *next <= MAX_LAMPORT)
        .ok_or(ClockOverflowError {
            lamport,
            limit: MAX_LAMPORT,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(last: u8) -> ActorId {
        let mut bytes = [0u8; ACTOR_ID_LEN];
        bytes[ACTOR_ID_LEN - 1] = last;
        ActorId::from_bytes(bytes)
    }

    #[test]
    fn compare_lamport_first() {
        let a = Ticket::new(1, 9, actor(9));
        let b = Ticket::new(2, 0, actor(0));
        assert_eq!(compare(&a, &b), Ordering::Less);
        assert!(b.after(&a));
    }

    #[test]
    fn compare_delimiter_then_actor() {
        let a = Ticket::new(5, 1, actor(2));
        let b = Ticket::new(5, 2, actor(1));
        assert!(b.after(&a));
        let c = Ticket::new(5, 2, actor(3));
        assert!(c.after(&b));
        assert_eq!(compare(&c, &c), Ordering::Equal);
    }

    #[test]
    fn initial_and_max_bound_everything() {
        let t = Ticket::new(7, 3, actor(4));
        assert!(Ticket::INITIAL < t);
        assert!(t < Ticket::MAX);
    }

    #[test]
    fn clock_issues_increasing_tickets() {
        let mut clock = LogicalClock::new(actor(1));
        clock.tick().unwrap();
        let t1 = clock.new_ticket().unwrap();
        let t2 = clock.new_ticket().unwrap();
        assert_eq!(t1, Ticket::new(1, 1, actor(1)));
        assert!(t2.after(&t1));
        clock.tick().unwrap();
        let t3 = clock.new_ticket().unwrap();
        assert_eq!(t3, Ticket::new(2, 1, actor(1)));
        assert!(t3.after(&t2));
    }

    #[test]
    fn delimiter_overflow_rolls_lamport() {
        let mut clock = LogicalClock::new(actor(1));
        clock.delimiter = u32::MAX;
        let t = clock.new_ticket().unwrap();
        assert_eq!(t, Ticket::new(1, 1, actor(1)));
    }

    #[test]
    fn advance_moves_past_observed() {
        let mut clock = LogicalClock::new(actor(1));
        clock.advance(10).unwrap();
        assert_eq!(clock.lamport(), 11);
        let t = clock.new_ticket().unwrap();
        assert!(t.after(&Ticket::new(10, u32::MAX, ActorId::MAX)));
        clock.advance(3).unwrap();
        assert_eq!(clock.lamport(), 11);
        clock.advance(11).unwrap();
        assert_eq!(clock.lamport(), 12);
    }

    #[test]
    fn advance_past_the_limit_fails_and_leaves_clock() {
        let mut clock = LogicalClock::new(actor(1));
        clock.advance(41).unwrap();
        let err = clock.advance(u64::MAX).unwrap_err();
        assert_eq!(
            err,
            ClockOverflowError {
                lamport: u64::MAX,
                limit: MAX_LAMPORT,
            }
        );
        assert!(clock.advance(MAX_LAMPORT).is_err());
        assert_eq!(clock.lamport(), 42);

        clock.advance(MAX_LAMPORT - 1).unwrap();
        assert_eq!(clock.lamport(), MAX_LAMPORT);
    }

    #[test]
    fn tick_at_the_limit_fails() {
        let mut clock = LogicalClock::new(actor(1));
        clock.advance(MAX_LAMPORT - 1).unwrap();
        assert!(clock.tick().is_err());
        assert_eq!(clock.lamport(), MAX_LAMPORT);
        clock.delimiter = u32::MAX;
        assert!(clock.new_ticket().is_err());
    }

    #[test]
    fn display_is_compact() {
        let t = Ticket::new(3, 1, actor(0xab));
        assert_eq!(t.to_string(), "3:1:00ab");
    }
}
