//! Grid-backed delivery queue for one (group view, partition) pair.

use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Notify;

/// FIFO of encoded envelopes pending delivery to one group view.
///
/// A popped item is gone for every member of the view (at-most-once per
/// view); other views hold their own copies. [`GridQueue::poll`] waits a
/// bounded time so listener loops can re-check cancellation.
#[derive(Debug, Default)]
pub struct GridQueue {
    items: Mutex<VecDeque<Bytes>>,
    notify: Notify,
    enqueued: AtomicU64,
    dequeued: AtomicU64,
}

impl GridQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an item; wakes one waiting consumer.
    pub fn push(&self, item: Bytes) {
        self.items.lock().push_back(item);
        self.enqueued.fetch_add(1, Ordering::Relaxed);
        self.notify.notify_one();
    }

    /// Remove and return the head item, if any.
    pub fn try_pop(&self) -> Option<Bytes> {
        let item = self.items.lock().pop_front();
        if item.is_some() {
            self.dequeued.fetch_add(1, Ordering::Relaxed);
        }
        item
    }

    /// Remove and return the head item, waiting up to `wait` for one to
    /// arrive. Returns `None` when the wait elapses with the queue empty.
    pub async fn poll(&self, wait: Duration) -> Option<Bytes> {
        let deadline = Instant::now() + wait;
        loop {
            if let Some(item) = self.try_pop() {
                return Some(item);
            }

            let now = Instant::now();
            if now >= deadline {
                return None;
            }

            // A push between try_pop and notified() leaves a stored permit,
            // so the wakeup is not lost.
            let notified = self.notify.notified();
            if tokio::time::timeout(deadline - now, notified).await.is_err() {
                return self.try_pop();
            }
        }
    }

    /// Current queue depth.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// Whether the queue is currently empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Total items enqueued since creation.
    #[must_use]
    pub fn enqueued(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }

    /// Total items dequeued since creation.
    #[must_use]
    pub fn dequeued(&self) -> u64 {
        self.dequeued.load(Ordering::Relaxed)
    }
}
