//! Completion tracking
//!
//! The producer registers a [`CompletionTicket`] for every job before it is
//! queued. The ticket signals exactly once, when it is completed or dropped,
//! so the outstanding count reaches zero even if a job is lost with a
//! panicking worker or a torn-down queue.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Inner {
    outstanding: AtomicUsize,
    registered: AtomicU64,
    signalled: AtomicU64,
    notify: Notify,
}

/// Counts outstanding jobs and lets a caller wait until none are left
#[derive(Debug, Clone, Default)]
pub struct CompletionTracker {
    inner: Arc<Inner>,
}

impl CompletionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more outstanding job
    pub fn register(&self) -> CompletionTicket {
        self.inner.registered.fetch_add(1, Ordering::SeqCst);
        self.inner.outstanding.fetch_add(1, Ordering::SeqCst);
        CompletionTicket {
            inner: Arc::clone(&self.inner),
        }
    }

    pub fn outstanding(&self) -> usize {
        self.inner.outstanding.load(Ordering::SeqCst)
    }

    /// Total tickets handed out
    pub fn registered(&self) -> u64 {
        self.inner.registered.load(Ordering::SeqCst)
    }

    /// Total tickets that have signalled
    pub fn signalled(&self) -> u64 {
        self.inner.signalled.load(Ordering::SeqCst)
    }

    /// Wait until every registered ticket has signalled
    pub async fn wait(&self) {
        loop {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.outstanding() == 0 {
                return;
            }

            notified.await;
        }
    }
}

/// One outstanding job. Signals its tracker once, on completion or drop.
#[derive(Debug)]
#[must_use = "dropping a ticket signals completion immediately"]
pub struct CompletionTicket {
    inner: Arc<Inner>,
}

impl CompletionTicket {
    pub fn complete(self) {}
}

impl Drop for CompletionTicket {
    fn drop(&mut self) {
        self.inner.signalled.fetch_add(1, Ordering::SeqCst);
        if self.inner.outstanding.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.inner.notify.notify_waiters();
        }
    }
}
