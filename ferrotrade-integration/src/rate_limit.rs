use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{oneshot, Mutex};

/// Priority levels for rate limited vendor requests (spec.md §4.1).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub enum Priority {
    High,
    Normal,
    Low,
}

struct Waiter {
    tx: oneshot::Sender<()>,
}

struct Inner {
    capacity: usize,
    tokens: usize,
    interval: Duration,
    last_refill: Instant,
    base_interval: Duration,
    max_interval: Duration,
    high: VecDeque<Waiter>,
    normal: VecDeque<Waiter>,
    low: VecDeque<Waiter>,
}

impl Inner {
    fn refill(&mut self) {
        let now = Instant::now();
        if now.duration_since(self.last_refill) >= self.interval {
            let periods =
                now.duration_since(self.last_refill).as_millis() / self.interval.as_millis();
            let add_tokens = (periods as usize + 1) * self.capacity;
            self.last_refill = now;
            self.tokens = usize::min(self.tokens + add_tokens, self.capacity);
            while self.tokens > 0 {
                if let Some(waiter) = self
                    .high
                    .pop_front()
                    .or_else(|| self.normal.pop_front())
                    .or_else(|| self.low.pop_front())
                {
                    self.tokens -= 1;
                    let _ = waiter.tx.send(());
                } else {
                    break;
                }
            }
        }
    }
}

/// Token bucket rate limiter with priority queues and adaptive backoff, used to
/// throttle outgoing vendor requests per `HTTP_RETRIES`/`HTTP_BACKOFF` policy
/// (spec.md §4.1).
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Mutex<Inner>>,
}

impl RateLimiter {
    /// Construct a new [`RateLimiter`] allowing `capacity` operations every `interval`.
    pub fn new(capacity: usize, interval: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                capacity,
                tokens: capacity,
                interval,
                last_refill: Instant::now(),
                base_interval: interval,
                max_interval: interval * 16,
                high: VecDeque::new(),
                normal: VecDeque::new(),
                low: VecDeque::new(),
            })),
        }
    }

    /// Acquire a permit according to the provided priority, waiting if the bucket is empty.
    pub async fn acquire(&self, priority: Priority) {
        let (mut rx, interval) = {
            let mut inner = self.inner.lock().await;
            inner.refill();
            if inner.tokens > 0 {
                inner.tokens -= 1;
                return;
            }
            let (tx, rx) = oneshot::channel();
            let waiter = Waiter { tx };
            match priority {
                Priority::High => inner.high.push_back(waiter),
                Priority::Normal => inner.normal.push_back(waiter),
                Priority::Low => inner.low.push_back(waiter),
            }
            (rx, inner.interval)
        };

        // Registered exactly once above; `refill()` pops us off the queue and fires `rx` once
        // a token becomes available. We only need to re-call `refill()` ourselves when nothing
        // else is concurrently acquiring, so wake up at least once per interval to do that.
        loop {
            tokio::select! {
                granted = &mut rx => {
                    if granted.is_ok() {
                        return;
                    }
                }
                _ = tokio::time::sleep(interval) => {
                    self.inner.lock().await.refill();
                }
            }
        }
    }

    /// Report a rate limit violation (e.g. HTTP 429) to double the refill interval, up to
    /// a ceiling of 16x the base interval.
    pub async fn report_violation(&self) {
        let mut inner = self.inner.lock().await;
        let next = inner.interval * 2;
        inner.interval = std::cmp::min(next, inner.max_interval);
    }

    /// Reset the backoff interval back to its configured base.
    pub async fn reset_backoff(&self) {
        let mut inner = self.inner.lock().await;
        inner.interval = inner.base_interval;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{sleep, Duration, Instant};

    #[tokio::test]
    async fn acquire_blocks_once_bucket_is_empty() {
        let rl = RateLimiter::new(2, Duration::from_millis(50));
        rl.acquire(Priority::Normal).await;
        rl.acquire(Priority::Normal).await;
        let start = Instant::now();
        rl.acquire(Priority::Normal).await;
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn high_priority_waiter_is_served_before_low() {
        let rl = RateLimiter::new(1, Duration::from_millis(40));
        rl.acquire(Priority::Normal).await;
        let rl1 = rl.clone();
        let t1 = tokio::spawn(async move {
            rl1.acquire(Priority::Low).await;
            Instant::now()
        });
        sleep(Duration::from_millis(10)).await;
        let rl2 = rl.clone();
        let t2 = tokio::spawn(async move {
            rl2.acquire(Priority::High).await;
            Instant::now()
        });
        let time_high = t2.await.unwrap();
        let time_low = t1.await.unwrap();
        assert!(time_high <= time_low);
    }

    #[tokio::test]
    async fn violation_doubles_the_refill_interval() {
        let rl = RateLimiter::new(1, Duration::from_millis(30));
        rl.acquire(Priority::Normal).await;
        rl.report_violation().await;
        let start = Instant::now();
        rl.acquire(Priority::Normal).await;
        assert!(start.elapsed() >= Duration::from_millis(60));
    }
}
