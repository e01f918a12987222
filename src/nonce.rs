//! Per-sender nonce sequencing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use alloy_primitives::Address;

/// Per-address monotonically increasing nonce counters.
///
/// Seeded once from the chain before a run; afterwards [`next`] is the sole
/// source of truth for the next nonce to use. Issued values are never
/// recycled: a submission that fails still consumed its nonce.
///
/// [`next`]: NonceTracker::next
#[derive(Debug, Default)]
pub struct NonceTracker {
    counters: HashMap<Address, AtomicU64>,
}

impl NonceTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds `address` with its current on-chain transaction count.
    pub fn seed(&mut self, address: Address, initial: u64) {
        self.counters.insert(address, AtomicU64::new(initial));
    }

    /// Issues the next nonce for `address`.
    ///
    /// A pure fetch-and-increment on the address's own counter: safe under
    /// concurrent callers for the same address, never issuing a value twice
    /// and never skipping one. Different addresses do not serialize against
    /// each other. Returns `None` for an address that was never seeded.
    pub fn next(&self, address: &Address) -> Option<u64> {
        self.counters.get(address).map(|counter| counter.fetch_add(1, Ordering::SeqCst))
    }

    /// Number of seeded senders.
    pub fn len(&self) -> usize {
        self.counters.len()
    }

    /// Whether no sender has been seeded yet.
    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn sequential_issue_has_no_gaps() {
        let mut tracker = NonceTracker::new();
        let address = Address::repeat_byte(1);
        tracker.seed(address, 7);

        for expected in 7..17 {
            assert_eq!(tracker.next(&address), Some(expected));
        }
    }

    #[test]
    fn unseeded_address_yields_nothing() {
        let tracker = NonceTracker::new();
        assert_eq!(tracker.next(&Address::repeat_byte(9)), None);
    }

    #[test]
    fn concurrent_issue_is_strictly_increasing_without_duplicates() {
        let address = Address::repeat_byte(2);
        let mut tracker = NonceTracker::new();
        tracker.seed(address, 100);
        let tracker = Arc::new(tracker);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let tracker = tracker.clone();
                std::thread::spawn(move || {
                    (0..1000).map(|_| tracker.next(&address).unwrap()).collect::<Vec<u64>>()
                })
            })
            .collect();

        let mut issued: Vec<u64> =
            handles.into_iter().flat_map(|handle| handle.join().unwrap()).collect();
        issued.sort_unstable();

        let expected: Vec<u64> = (100..100 + 8000).collect();
        assert_eq!(issued, expected);
    }

    #[test]
    fn addresses_are_independent() {
        let a = Address::repeat_byte(3);
        let b = Address::repeat_byte(4);
        let mut tracker = NonceTracker::new();
        tracker.seed(a, 0);
        tracker.seed(b, 50);

        assert_eq!(tracker.next(&a), Some(0));
        assert_eq!(tracker.next(&b), Some(50));
        assert_eq!(tracker.next(&a), Some(1));
        assert_eq!(tracker.next(&b), Some(51));
    }
}
