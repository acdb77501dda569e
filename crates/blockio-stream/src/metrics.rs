use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Shared monotonic counter of bytes delivered to stream consumers.
///
/// Cloning is cheap and all clones observe the same total, so one counter
/// can be handed to many transports to aggregate a client's read volume.
/// Purely observational — nothing in the stream state machine depends on
/// it, and recording never fails.
#[derive(Clone, Debug, Default)]
pub struct BytesReadCounter {
    total: Arc<AtomicU64>,
}

impl BytesReadCounter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `n` bytes to the running total.
    pub fn add(&self, n: u64) {
        // Relaxed: the counter is a statistic, not a synchronization point.
        self.total.fetch_add(n, Ordering::Relaxed);
    }

    /// Total bytes recorded so far, across all clones.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_accumulate() {
        let counter = BytesReadCounter::new();
        counter.add(3);
        counter.add(4);
        assert_eq!(counter.total(), 7);
    }

    #[test]
    fn clones_share_one_total() {
        let counter = BytesReadCounter::new();
        let clone = counter.clone();
        counter.add(10);
        clone.add(5);
        assert_eq!(counter.total(), 15);
        assert_eq!(clone.total(), 15);
    }
}
