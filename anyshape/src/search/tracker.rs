use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Wait-group over the units of work flowing through the pipeline.
///
/// Every unit is registered before it is handed to another stage and is
/// released when its [`Ticket`] is dropped. Work items carry a ticket, every
/// record emitted for an item carries a clone of it, and the writer drops a
/// record's ticket once the record has been consumed. When [`wait`] returns,
/// every dispatched item has been scanned and every resulting record handled.
///
/// Completion is signalled through channel disconnection: each ticket owns a
/// clone of a sender that never sends, and the waiter's `recv` fails once the
/// last clone is gone.
///
/// [`wait`]: CompletionTracker::wait
#[derive(Debug)]
pub struct CompletionTracker {
    guard: Sender<()>,
    done: Receiver<()>,
    outstanding: Arc<AtomicUsize>,
}

/// One outstanding unit of work
#[derive(Debug)]
pub struct Ticket {
    _guard: Sender<()>,
    outstanding: Arc<AtomicUsize>,
}

impl CompletionTracker {
    pub fn new() -> Self {
        let (guard, done) = bounded(0);
        Self {
            guard,
            done,
            outstanding: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Registers a unit of work that must finish before [`wait`](Self::wait) returns
    pub fn register(&self) -> Ticket {
        self.outstanding.fetch_add(1, Ordering::AcqRel);
        Ticket {
            _guard: self.guard.clone(),
            outstanding: Arc::clone(&self.outstanding),
        }
    }

    /// Units registered and not yet released
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }

    /// Blocks until every ticket has been dropped
    pub fn wait(self) {
        let Self { guard, done, .. } = self;
        drop(guard);
        // Only ever returns Err(RecvError): nothing is sent on this channel
        let _ = done.recv();
    }
}

impl Default for CompletionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Ticket {
    fn clone(&self) -> Self {
        self.outstanding.fetch_add(1, Ordering::AcqRel);
        Self {
            _guard: self._guard.clone(),
            outstanding: Arc::clone(&self.outstanding),
        }
    }
}

impl Drop for Ticket {
    fn drop(&mut self) {
        self.outstanding.fetch_sub(1, Ordering::AcqRel);
    }
}
