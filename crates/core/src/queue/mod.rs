//! The single shared, capacity-bounded FIFO connecting every stage.
//!
//! Capacity is tracked with two semaphores: `free` counts empty slots and
//! `filled` counts queued items. A publisher takes a free slot before it
//! touches the buffer and a consumer takes a filled slot before it pops,
//! so the buffer can never hold more than `capacity` items. Both waits
//! race against the line's [`CancellationSignal`], which always wins.

use crate::signal::CancellationSignal;
use async_stream::stream;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::Semaphore;
use tokio_stream::Stream;

/// What happened to an item handed to [`BoundedQueue::publish`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The item was appended to the queue.
    Enqueued,

    /// The cancellation signal was observed first; the item was dropped.
    Cancelled,

    /// The queue was closed; the item was dropped.
    Closed,
}

/// Fixed-capacity FIFO shared by all producers and consumers.
///
/// The queue never looks at its items. Ordering is preserved per
/// publisher; items from different publishers interleave in whatever
/// order their publishes were serialized.
pub struct BoundedQueue<T> {
    buffer: Mutex<VecDeque<T>>,
    capacity: usize,
    free: Semaphore,
    filled: Semaphore,
    closed: AtomicBool,
    high_water: AtomicUsize,
}

impl<T> BoundedQueue<T> {
    /// Create a queue holding at most `capacity` items.
    ///
    /// Capacities outside `1..=Semaphore::MAX_PERMITS` are rejected by
    /// `config::validate`; here they are clamped into that range so the
    /// queue stays usable.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, Semaphore::MAX_PERMITS);
        Self {
            buffer: Mutex::new(VecDeque::new()),
            capacity,
            free: Semaphore::new(capacity),
            filled: Semaphore::new(0),
            closed: AtomicBool::new(false),
            high_water: AtomicUsize::new(0),
        }
    }

    /// Append `item`, waiting while the queue is full.
    ///
    /// Returns [`PublishOutcome::Cancelled`] without enqueuing if `signal`
    /// is set before a slot frees up, including when it is already set.
    pub async fn publish(&self, item: T, signal: &CancellationSignal) -> PublishOutcome {
        let slot = tokio::select! {
            biased;
            _ = signal.cancelled() => return PublishOutcome::Cancelled,
            slot = self.free.acquire() => slot,
        };

        match slot {
            Ok(permit) => permit.forget(),
            Err(_) => return PublishOutcome::Closed,
        }

        {
            let mut buffer = self.lock();
            buffer.push_back(item);
            self.high_water.fetch_max(buffer.len(), Ordering::Relaxed);
        }
        self.filled.add_permits(1);

        PublishOutcome::Enqueued
    }

    /// Take the oldest item, waiting while the queue is empty.
    ///
    /// Returns `None` once `signal` is set, even if items remain, or once
    /// the queue is closed and drained.
    pub async fn next(&self, signal: &CancellationSignal) -> Option<T> {
        let item = tokio::select! {
            biased;
            _ = signal.cancelled() => return None,
            item = self.filled.acquire() => item,
        };

        match item {
            Ok(permit) => {
                permit.forget();
                let item = self.lock().pop_front();
                self.free.add_permits(1);
                item
            }
            // Closed: hand out whatever is left without waiting.
            Err(_) => self.lock().pop_front(),
        }
    }

    /// Lazily consume the queue until [`next`](Self::next) returns `None`.
    ///
    /// Each call starts a fresh stream over the same queue.
    pub fn stream<'a>(&'a self, signal: &'a CancellationSignal) -> impl Stream<Item = T> + 'a {
        stream! {
            while let Some(item) = self.next(signal).await {
                yield item;
            }
        }
    }

    /// Stop accepting items and wake every waiter.
    ///
    /// Pending and future publishes return [`PublishOutcome::Closed`];
    /// consumers drain what is left and then see the end of the stream.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.free.close();
        self.filled.close();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Number of items currently queued.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Largest length the queue has reached so far.
    pub fn high_water_mark(&self) -> usize {
        self.high_water.load(Ordering::Relaxed)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<T>> {
        // Pushes and pops cannot leave the deque half-updated.
        self.buffer.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<T> std::fmt::Debug for BoundedQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedQueue")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_stream::StreamExt;

    #[tokio::test]
    async fn test_publish_and_next_preserve_fifo_order() {
        let queue = BoundedQueue::new(4);
        let signal = CancellationSignal::new();

        for i in 0..4 {
            assert_eq!(queue.publish(i, &signal).await, PublishOutcome::Enqueued);
        }
        assert_eq!(queue.len(), 4);

        for i in 0..4 {
            assert_eq!(queue.next(&signal).await, Some(i));
        }
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_publish_blocks_while_full() {
        let queue = BoundedQueue::new(2);
        let signal = CancellationSignal::new();

        queue.publish(1, &signal).await;
        queue.publish(2, &signal).await;

        let blocked =
            tokio::time::timeout(Duration::from_millis(50), queue.publish(3, &signal)).await;
        assert!(blocked.is_err(), "publish into a full queue should wait");
        assert_eq!(queue.len(), 2);
    }

    #[tokio::test]
    async fn test_blocked_publish_resumes_when_slot_frees() {
        let queue = Arc::new(BoundedQueue::new(1));
        let signal = CancellationSignal::new();
        queue.publish(1, &signal).await;

        let publisher = {
            let queue = Arc::clone(&queue);
            let signal = signal.clone();
            tokio::spawn(async move { queue.publish(2, &signal).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(queue.next(&signal).await, Some(1));

        let outcome = tokio::time::timeout(Duration::from_millis(200), publisher)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(outcome, PublishOutcome::Enqueued);
        assert_eq!(queue.next(&signal).await, Some(2));
    }

    #[tokio::test]
    async fn test_cancel_unblocks_pending_publish_without_enqueuing() {
        let queue = Arc::new(BoundedQueue::new(1));
        let signal = CancellationSignal::new();
        queue.publish(1, &signal).await;

        let publisher = {
            let queue = Arc::clone(&queue);
            let signal = signal.clone();
            tokio::spawn(async move { queue.publish(2, &signal).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        signal.cancel();

        let outcome = tokio::time::timeout(Duration::from_millis(200), publisher)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(outcome, PublishOutcome::Cancelled);
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test]
    async fn test_publish_after_cancel_does_not_enqueue() {
        let queue = BoundedQueue::new(4);
        let signal = CancellationSignal::new();
        signal.cancel();

        assert_eq!(queue.publish(1, &signal).await, PublishOutcome::Cancelled);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_cancel_ends_waiting_consumer() {
        let queue: Arc<BoundedQueue<u32>> = Arc::new(BoundedQueue::new(2));
        let signal = CancellationSignal::new();

        let consumer = {
            let queue = Arc::clone(&queue);
            let signal = signal.clone();
            tokio::spawn(async move { queue.next(&signal).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        signal.cancel();

        let item = tokio::time::timeout(Duration::from_millis(200), consumer)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(item, None);
    }

    #[tokio::test]
    async fn test_close_drains_then_ends_stream() {
        let queue = BoundedQueue::new(3);
        let signal = CancellationSignal::new();
        queue.publish("a", &signal).await;
        queue.publish("b", &signal).await;
        queue.close();

        assert_eq!(queue.publish("c", &signal).await, PublishOutcome::Closed);

        let drained: Vec<&str> = queue.stream(&signal).collect().await;
        assert_eq!(drained, vec!["a", "b"]);
        assert!(queue.is_closed());
    }

    #[tokio::test]
    async fn test_close_wakes_blocked_publisher() {
        let queue = Arc::new(BoundedQueue::new(1));
        let signal = CancellationSignal::new();
        queue.publish(1, &signal).await;

        let publisher = {
            let queue = Arc::clone(&queue);
            let signal = signal.clone();
            tokio::spawn(async move { queue.publish(2, &signal).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        queue.close();

        let outcome = tokio::time::timeout(Duration::from_millis(200), publisher)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(outcome, PublishOutcome::Closed);
    }

    #[tokio::test]
    async fn test_stream_is_restartable() {
        let queue = BoundedQueue::new(4);
        let signal = CancellationSignal::new();
        for i in 0..4 {
            queue.publish(i, &signal).await;
        }

        let first: Vec<i32> = queue.stream(&signal).take(2).collect().await;
        let second: Vec<i32> = queue.stream(&signal).take(2).collect().await;
        assert_eq!(first, vec![0, 1]);
        assert_eq!(second, vec![2, 3]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_length_never_exceeds_capacity_under_contention() {
        let queue = Arc::new(BoundedQueue::new(3));
        let signal = CancellationSignal::new();
        let mut handles = Vec::new();

        for p in 0..4u32 {
            let queue = Arc::clone(&queue);
            let signal = signal.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..50u32 {
                    queue.publish(p * 100 + i, &signal).await;
                    assert!(queue.len() <= queue.capacity());
                }
            }));
        }

        let consumer = {
            let queue = Arc::clone(&queue);
            let signal = signal.clone();
            tokio::spawn(async move {
                let mut seen = Vec::new();
                while seen.len() < 200 {
                    if let Some(item) = queue.next(&signal).await {
                        seen.push(item);
                    }
                }
                seen
            })
        };

        for handle in handles {
            handle.await.unwrap();
        }
        let seen = consumer.await.unwrap();

        assert_eq!(seen.len(), 200);
        assert!(queue.high_water_mark() <= 3);

        // Per-publisher order is preserved.
        for p in 0..4u32 {
            let mine: Vec<u32> = seen.iter().copied().filter(|v| v / 100 == p).collect();
            let expected: Vec<u32> = (0..50).map(|i| p * 100 + i).collect();
            assert_eq!(mine, expected);
        }
    }

    #[test]
    fn test_zero_capacity_is_bumped_to_one() {
        let queue: BoundedQueue<u8> = BoundedQueue::new(0);
        assert_eq!(queue.capacity(), 1);
    }

    #[tokio::test]
    async fn test_huge_capacity_does_not_preallocate() {
        let queue = BoundedQueue::new(usize::MAX);
        assert_eq!(queue.capacity(), Semaphore::MAX_PERMITS);

        let signal = CancellationSignal::new();
        assert_eq!(queue.publish(7u8, &signal).await, PublishOutcome::Enqueued);
        assert_eq!(queue.next(&signal).await, Some(7));
    }
}
