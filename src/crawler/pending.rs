//! In-flight work accounting used to detect the end of a crawl
//!
//! Every URL submitted to the fetcher and every link handed to the tracker
//! carries a [`WorkTicket`]. Dropping the ticket marks that unit of work as
//! done. A stage always takes the tickets for the messages it emits before
//! releasing the ticket of the message it is processing, so the count only
//! reaches zero once nothing is queued, in hand, or about to be submitted.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Inner {
    count: AtomicUsize,
    idle: Notify,
}

/// Shared counter of outstanding work
#[derive(Debug, Clone, Default)]
pub struct Pending {
    inner: Arc<Inner>,
}

impl Pending {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one unit of work; it stays outstanding until the ticket drops
    pub fn acquire(&self) -> WorkTicket {
        self.inner.count.fetch_add(1, Ordering::AcqRel);
        WorkTicket {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Number of tickets currently alive
    pub fn outstanding(&self) -> usize {
        self.inner.count.load(Ordering::Acquire)
    }

    pub fn is_idle(&self) -> bool {
        self.outstanding() == 0
    }

    /// Resolves once no ticket is alive
    ///
    /// Returns immediately if the count is already zero, so callers must have
    /// submitted their first unit of work beforehand.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            // Register before checking so a release between the check and the
            // await is not lost
            notified.as_mut().enable();

            if self.is_idle() {
                return;
            }
            notified.await;
        }
    }
}

/// One unit of in-flight work; released on drop
#[derive(Debug)]
#[must_use = "dropping a ticket immediately marks its work as finished"]
pub struct WorkTicket {
    inner: Arc<Inner>,
}

impl Drop for WorkTicket {
    fn drop(&mut self) {
        if self.inner.count.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.inner.idle.notify_waiters();
        }
    }
}
