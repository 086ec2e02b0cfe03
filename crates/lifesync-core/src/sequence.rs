//! Shared monotonic counter for dispatch and edit sequence numbers.
//!
//! The counter is an [`AtomicU64`] behind an [`Arc`] so the sync client
//! (which tags dispatches) and the sync state (which tags local edits) can
//! draw from the same sequence without sharing a lock.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use lifesync_types::Seq;

/// Cloneable handle to one monotonic sequence.
#[derive(Debug, Clone, Default)]
pub struct Sequencer {
    counter: Arc<AtomicU64>,
}

impl Sequencer {
    /// Create a counter whose first allocation is `#1`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next sequence number.
    pub fn next(&self) -> Seq {
        let previous = self.counter.fetch_add(1, Ordering::AcqRel);
        Seq(previous.saturating_add(1))
    }

    /// The most recently allocated sequence number ([`Seq::ZERO`] if none).
    pub fn current(&self) -> Seq {
        Seq(self.counter.load(Ordering::Acquire))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocations_increase() {
        let sequencer = Sequencer::new();
        assert_eq!(sequencer.current(), Seq::ZERO);
        let a = sequencer.next();
        let b = sequencer.next();
        assert_eq!(a, Seq(1));
        assert!(b > a);
        assert_eq!(sequencer.current(), b);
    }

    #[test]
    fn clones_share_the_counter() {
        let edits = Sequencer::new();
        let dispatches = edits.clone();
        let first = edits.next();
        let second = dispatches.next();
        let third = edits.next();
        assert!(first < second && second < third);
    }
}
