use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::Notify;

/// Bounded FIFO that drops the *oldest* entry on overflow rather than rejecting the newest
/// (spec.md §4.4: "On overflow, drops the oldest entry... to preserve freshness"). Accessed by
/// exactly one producer and one consumer (spec.md §5), so a plain `Mutex` guarding the deque is
/// sufficient — no fairness/ordering machinery is required beyond FIFO.
pub struct BoundedDropOldestQueue<T> {
    inner: Mutex<VecDeque<T>>,
    capacity: usize,
    notify: Notify,
}

impl<T> BoundedDropOldestQueue<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity: capacity.max(1),
            notify: Notify::new(),
        }
    }

    /// Push an item, dropping the oldest queued item first if the queue is already full.
    pub fn push(&self, item: T) {
        {
            let mut guard = self.inner.lock().expect("queue mutex poisoned");
            if guard.len() >= self.capacity {
                guard.pop_front();
            }
            guard.push_back(item);
        }
        self.notify.notify_one();
    }

    /// Wait for and remove the oldest item.
    pub async fn pop(&self) -> T {
        loop {
            {
                let mut guard = self.inner.lock().expect("queue mutex poisoned");
                if let Some(item) = guard.pop_front() {
                    return item;
                }
            }
            self.notify.notified().await;
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("queue mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn pop_returns_items_in_fifo_order() {
        let queue = BoundedDropOldestQueue::new(4);
        queue.push(1);
        queue.push(2);
        assert_eq!(queue.pop().await, 1);
        assert_eq!(queue.pop().await, 2);
    }

    #[tokio::test]
    async fn overflow_drops_oldest_not_newest() {
        let queue = BoundedDropOldestQueue::new(2);
        queue.push(1);
        queue.push(2);
        queue.push(3);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pop().await, 2);
        assert_eq!(queue.pop().await, 3);
    }

    #[tokio::test]
    async fn pop_waits_for_a_push() {
        let queue = std::sync::Arc::new(BoundedDropOldestQueue::new(4));
        let consumer = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.pop().await })
        };
        tokio::task::yield_now().await;
        queue.push(42);
        assert_eq!(consumer.await.unwrap(), 42);
    }
}
