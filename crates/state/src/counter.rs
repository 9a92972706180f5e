//! In-memory counter state

use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counter used by rate-based rules.
///
/// `increment` is called from the rule's process loop, `window` from its
/// window callback; both are lock-free.
#[derive(Debug, Default)]
pub struct Counter {
    count: AtomicU64,
}

impl Counter {
    pub const fn new() -> Self {
        Self {
            count: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn increment(&self) {
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    /// Current value without resetting
    #[inline]
    pub fn value(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Atomically read and reset to zero
    #[inline]
    pub fn window(&self) -> u64 {
        self.count.swap(0, Ordering::Relaxed)
    }

    pub fn close(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_increment_and_window() {
        let counter = Counter::new();
        counter.increment();
        counter.increment();
        counter.increment();
        assert_eq!(counter.value(), 3);
        assert_eq!(counter.window(), 3);
        assert_eq!(counter.value(), 0);
        assert_eq!(counter.window(), 0);
    }

    #[test]
    fn test_concurrent_increments() {
        let counter = Arc::new(Counter::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let counter = Arc::clone(&counter);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        counter.increment();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(counter.window(), 8000);
    }
}
