use crossbeam_channel::{bounded, Receiver, Sender};
use std::num::NonZeroUsize;

/// Counting semaphore capping how many files are scanned at once.
///
/// Permits are tokens in a bounded channel: acquiring sends a token and blocks
/// while the channel is full, releasing takes one back out.
#[derive(Debug, Clone)]
pub struct ScanLimiter {
    tokens: Sender<()>,
    returns: Receiver<()>,
    capacity: usize,
}

/// Held for the duration of one file scan
#[derive(Debug)]
pub struct Permit {
    returns: Receiver<()>,
}

impl ScanLimiter {
    pub fn new(capacity: NonZeroUsize) -> Self {
        let (tokens, returns) = bounded(capacity.get());
        Self {
            tokens,
            returns,
            capacity: capacity.get(),
        }
    }

    /// Blocks until a permit is available
    pub fn acquire(&self) -> Permit {
        // Cannot fail: self keeps the receiving side alive
        let _ = self.tokens.send(());
        Permit {
            returns: self.returns.clone(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Permits currently held
    pub fn in_use(&self) -> usize {
        self.tokens.len()
    }
}

impl Drop for Permit {
    fn drop(&mut self) {
        let _ = self.returns.try_recv();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_permits_are_returned() {
        let limiter = ScanLimiter::new(NonZeroUsize::new(2).unwrap());
        let a = limiter.acquire();
        let b = limiter.acquire();
        assert_eq!(limiter.in_use(), 2);
        drop(a);
        assert_eq!(limiter.in_use(), 1);
        drop(b);
        assert_eq!(limiter.in_use(), 0);
        assert_eq!(limiter.capacity(), 2);
    }

    #[test]
    fn test_concurrency_never_exceeds_capacity() {
        let limiter = ScanLimiter::new(NonZeroUsize::new(3).unwrap());
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..12)
            .map(|_| {
                let permit = limiter.acquire();
                let active = Arc::clone(&active);
                let peak = Arc::clone(&peak);
                thread::spawn(move || {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(5));
                    active.fetch_sub(1, Ordering::SeqCst);
                    drop(permit);
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }
}
