use parking_lot::Mutex;
use std::collections::HashMap;

/// Shared per-file request counter.
///
/// One table, one lock. Handlers increment the count for a served file's
/// root-relative path; the listing generator takes a snapshot once per
/// render and threads it through the recursion, so a listing is internally
/// consistent even while counts keep moving underneath it.
///
/// The table is small and requests are I/O-bound, so a single mutex domain
/// is the whole synchronization story: an increment is one read-modify-write
/// under the lock, and a snapshot is a copy taken under the same lock. No
/// reader can observe a half-applied increment.
#[derive(Default)]
pub struct AccessCounter {
    counts: Mutex<HashMap<String, u64>>,
}

impl AccessCounter {
    /// Create an empty counter table
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one request for the given root-relative file path
    pub fn increment(&self, path: &str) {
        let mut counts = self.counts.lock();
        *counts.entry(path.to_string()).or_insert(0) += 1;
    }

    /// Get the current count for a single path
    pub fn get(&self, path: &str) -> u64 {
        self.counts.lock().get(path).copied().unwrap_or(0)
    }

    /// Take a point-in-time copy of the whole table
    pub fn snapshot(&self) -> HashMap<String, u64> {
        self.counts.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_unknown_paths_count_zero() {
        let counter = AccessCounter::new();
        assert_eq!(counter.get("a.pdf"), 0);
        assert!(counter.snapshot().is_empty());
    }

    #[test]
    fn test_increment_and_snapshot() {
        let counter = AccessCounter::new();
        counter.increment("a.pdf");
        counter.increment("a.pdf");
        counter.increment("sub/b.png");

        let snapshot = counter.snapshot();
        assert_eq!(snapshot.get("a.pdf"), Some(&2));
        assert_eq!(snapshot.get("sub/b.png"), Some(&1));

        // The snapshot is a copy, not a view
        counter.increment("a.pdf");
        assert_eq!(snapshot.get("a.pdf"), Some(&2));
        assert_eq!(counter.get("a.pdf"), 3);
    }

    #[test]
    fn test_no_lost_updates_under_contention() {
        let counter = Arc::new(AccessCounter::new());

        // 10 threads x 10 increments on one key must land exactly 100
        let handles: Vec<_> = (0..10)
            .map(|_| {
                let counter = counter.clone();
                thread::spawn(move || {
                    for _ in 0..10 {
                        counter.increment("contended.pdf");
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(counter.get("contended.pdf"), 100);
    }

    #[test]
    fn test_concurrent_increments_across_keys() {
        let counter = Arc::new(AccessCounter::new());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let counter = counter.clone();
                thread::spawn(move || {
                    let key = format!("file-{}.png", i % 2);
                    for _ in 0..50 {
                        counter.increment(&key);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = counter.snapshot();
        assert_eq!(snapshot.get("file-0.png"), Some(&200));
        assert_eq!(snapshot.get("file-1.png"), Some(&200));
    }
}
