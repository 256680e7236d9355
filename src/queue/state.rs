//! Packed queue state word
//!
//! All admission decisions read and update a single `AtomicU64`, so the
//! capacity check, the flushed check and the counter updates happen in
//! one CAS:
//!
//! ```text
//!  63      62 ........ 32   31 ........ 0
//! [flushed][   pending   ][   in flight  ]
//! ```
//!
//! - in flight: enqueued and not yet released (the queue depth)
//! - pending: enqueued and not yet dequeued
//!
//! pending <= in flight <= capacity always holds.

use std::fmt;

/// Largest supported capacity (31-bit pending field).
pub const MAX_CAPACITY: usize = (1 << 31) - 1;

pub(super) const IN_FLIGHT_ONE: u64 = 1;
pub(super) const PENDING_ONE: u64 = 1 << 32;
pub(super) const FLUSHED: u64 = 1 << 63;

const IN_FLIGHT_MASK: u64 = (1 << 32) - 1;
const PENDING_MASK: u64 = ((1 << 31) - 1) << 32;

/// Decoded view of the state word.
#[derive(Clone, Copy, PartialEq, Eq)]
pub(super) struct StateWord(pub(super) u64);

impl StateWord {
    pub(super) fn in_flight(self) -> usize {
        (self.0 & IN_FLIGHT_MASK) as usize
    }

    pub(super) fn pending(self) -> usize {
        ((self.0 & PENDING_MASK) >> 32) as usize
    }

    pub(super) fn is_flushed(self) -> bool {
        self.0 & FLUSHED != 0
    }

    /// Flushed and nothing left for the consumer to dequeue.
    pub(super) fn is_exhausted(self) -> bool {
        self.is_flushed() && self.pending() == 0
    }
}

impl fmt::Debug for StateWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateWord")
            .field("in_flight", &self.in_flight())
            .field("pending", &self.pending())
            .field("flushed", &self.is_flushed())
            .finish()
    }
}

/// Lifecycle phase of a queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueuePhase {
    /// Accepting enqueues
    Open,
    /// Flushed; entries still in flight
    Flushing,
    /// Flushed and depth is zero; safe to destroy
    Drained,
    /// Consumer destroyed the queue
    Destroyed,
}

impl QueuePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueuePhase::Open => "open",
            QueuePhase::Flushing => "flushing",
            QueuePhase::Drained => "drained",
            QueuePhase::Destroyed => "destroyed",
        }
    }
}

impl fmt::Display for QueuePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
