use crate::queue::BoundedDropOldestQueue;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use ferrotrade_core::{FetchRequest, Interval, ProbabilisticStreamFrame, Symbol, VendorId};
use ferrotrade_filters::{BarObservation, FilterBank, FilterBankConfig, RegimeClassifier};
use ferrotrade_vendor::{RawEventStream, RawTick};
use futures::StreamExt;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Default bounded-queue capacity (spec.md §4.4).
pub const DEFAULT_MAX_QUEUE: usize = 1024;

/// Gap-detection multiplier applied to the interval length (spec.md §4.4:
/// `gap_threshold = 3 * interval_seconds`).
const GAP_MULTIPLIER: i64 = 3;

/// Lazily supplies raw backfill records for a gap, ordered ascending by timestamp (spec.md
/// §4.4 step 1).
pub type BackfillFn = Box<dyn Fn(FetchRequest) -> Vec<RawTick> + Send + Sync>;

enum QueueEvent {
    Tick(RawTick),
    EndOfStream,
}

struct SymbolState {
    filter_bank: FilterBank,
    classifier: RegimeClassifier,
    buffer: VecDeque<ferrotrade_core::SignalFrame>,
    buffer_cap: usize,
    last_seen: Option<DateTime<Utc>>,
}

impl SymbolState {
    fn new(filter_bank_config: FilterBankConfig, classifier: RegimeClassifier, window: usize) -> Self {
        Self {
            filter_bank: FilterBank::new(filter_bank_config),
            classifier,
            buffer: VecDeque::new(),
            buffer_cap: (3 * window).max(64),
            last_seen: None,
        }
    }

    /// Route one tick through the filter bank + regime classifier, returning the resulting
    /// stream frame (the regime label reflects the last `buffer_cap` frames, spec.md §4.4
    /// step 2).
    fn route(&mut self, tick: &RawTick, vendor: VendorId) -> ProbabilisticStreamFrame {
        let signal = self.filter_bank.step(BarObservation {
            symbol: tick.symbol.clone(),
            vendor,
            timestamp: tick.timestamp,
            price: tick.price,
            volume: tick.volume,
        });

        self.buffer.push_back(signal.clone());
        while self.buffer.len() > self.buffer_cap {
            self.buffer.pop_front();
        }

        let window_frames: Vec<_> = self.buffer.iter().cloned().collect();
        let regime = self
            .classifier
            .classify(&window_frames)
            .pop()
            .expect("buffer is non-empty after push");

        self.last_seen = Some(tick.timestamp);
        ProbabilisticStreamFrame { signal, regime }
    }
}

/// Configuration for a [`StreamingManager`] (spec.md §4.4).
pub struct StreamingManagerConfig {
    pub max_queue: usize,
    pub interval: Interval,
    pub filter_bank: FilterBankConfig,
    pub regime_window: usize,
}

impl StreamingManagerConfig {
    pub fn new(interval: Interval) -> Self {
        Self {
            max_queue: DEFAULT_MAX_QUEUE,
            interval,
            filter_bank: FilterBankConfig::default(),
            regime_window: 20,
        }
    }
}

/// Owns the bounded queue and per-symbol filter/regime/gap-detection state for one live
/// stream session (spec.md §4.4).
pub struct StreamingManager {
    queue: Arc<BoundedDropOldestQueue<QueueEvent>>,
    vendor: VendorId,
    config: StreamingManagerConfig,
    backfill: BackfillFn,
    symbols: HashMap<Symbol, SymbolState>,
}

impl StreamingManager {
    pub fn new(vendor: VendorId, config: StreamingManagerConfig, backfill: BackfillFn) -> Self {
        let queue = Arc::new(BoundedDropOldestQueue::new(config.max_queue));
        Self {
            queue,
            vendor,
            config,
            backfill,
            symbols: HashMap::new(),
        }
    }

    /// Spawn the producer task: pulls ticks from `source` and pushes them into the bounded
    /// queue, dropping the oldest entry under overflow (spec.md §4.4). Pushes a sentinel when
    /// `source` ends; the returned handle may be aborted to cancel the producer.
    pub fn spawn_producer(&self, mut source: RawEventStream) -> JoinHandle<()> {
        let queue = self.queue.clone();
        tokio::spawn(async move {
            while let Some(tick) = source.next().await {
                queue.push(QueueEvent::Tick(tick));
            }
            queue.push(QueueEvent::EndOfStream);
        })
    }

    /// Push one tick directly, bypassing a spawned producer. Used by tests and by callers that
    /// already own a tick source driven from elsewhere.
    pub fn push_tick(&self, tick: RawTick) {
        self.queue.push(QueueEvent::Tick(tick));
    }

    pub fn push_end_of_stream(&self) {
        self.queue.push(QueueEvent::EndOfStream);
    }

    /// Dequeue and process the next item, returning `None` once the end-of-stream sentinel is
    /// reached (spec.md §4.4: "Sentinel end-of-stream marker terminates the iteration").
    ///
    /// A gap longer than `3 * interval_seconds` since the symbol was last seen triggers a
    /// synchronous backfill; the returned frames carry the backfill frames first, then the
    /// live frame that triggered them (spec.md §4.4 step 1, §5 ordering guarantees).
    pub async fn next_frames(&mut self) -> Option<Vec<ProbabilisticStreamFrame>> {
        match self.queue.pop().await {
            QueueEvent::EndOfStream => None,
            QueueEvent::Tick(tick) => Some(self.process_tick(tick)),
        }
    }

    fn process_tick(&mut self, tick: RawTick) -> Vec<ProbabilisticStreamFrame> {
        let gap_threshold = ChronoDuration::seconds(GAP_MULTIPLIER * self.config.interval.seconds());
        let mut frames = Vec::new();

        let needs_backfill = self
            .symbols
            .get(&tick.symbol)
            .and_then(|s| s.last_seen)
            .map(|last_seen| tick.timestamp - last_seen > gap_threshold)
            .unwrap_or(false);

        if needs_backfill {
            let last_seen = self.symbols[&tick.symbol].last_seen.expect("checked above");
            let request = FetchRequest::new(tick.symbol.clone(), self.config.interval)
                .with_range(last_seen - gap_threshold, tick.timestamp);
            let mut backfill_ticks = (self.backfill)(request);
            backfill_ticks.sort_by_key(|t| t.timestamp);
            for backfill_tick in backfill_ticks {
                frames.push(self.route(&backfill_tick));
            }
        }

        frames.push(self.route(&tick));
        frames
    }

    fn route(&mut self, tick: &RawTick) -> ProbabilisticStreamFrame {
        let vendor = self.vendor;
        let config = &self.config;
        let state = self.symbols.entry(tick.symbol.clone()).or_insert_with(|| {
            SymbolState::new(config.filter_bank, RegimeClassifier::new(config.regime_window), config.regime_window)
        });
        state.route(tick, vendor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tick(symbol: &str, secs_offset: i64, price: f64) -> RawTick {
        RawTick {
            symbol: Symbol::new(symbol),
            timestamp: DateTime::from_timestamp(1_700_000_000 + secs_offset, 0).unwrap(),
            price,
            volume: 100.0,
        }
    }

    fn manager_with_no_backfill(interval: Interval) -> StreamingManager {
        StreamingManager::new(
            VendorId::Alpaca,
            StreamingManagerConfig::new(interval),
            Box::new(|_| Vec::new()),
        )
    }

    #[tokio::test]
    async fn yields_one_frame_per_tick_with_no_gap() {
        let mut manager = manager_with_no_backfill(Interval::Min1);
        manager.push_tick(tick("AAPL", 0, 100.0));
        manager.push_tick(tick("AAPL", 60, 100.5));
        manager.push_end_of_stream();

        let first = manager.next_frames().await.unwrap();
        assert_eq!(first.len(), 1);
        let second = manager.next_frames().await.unwrap();
        assert_eq!(second.len(), 1);
        assert!(manager.next_frames().await.is_none());
    }

    #[tokio::test]
    async fn gap_beyond_threshold_triggers_backfill_ordered_before_live_event() {
        let backfill_calls = Arc::new(std::sync::Mutex::new(Vec::new()));
        let recorded = backfill_calls.clone();
        let mut manager = StreamingManager::new(
            VendorId::Alpaca,
            StreamingManagerConfig::new(Interval::Min1),
            Box::new(move |request: FetchRequest| {
                recorded.lock().unwrap().push(request.clone());
                vec![
                    tick("AAPL", 120, 101.0),
                    tick("AAPL", 180, 102.0),
                ]
            }),
        );

        manager.push_tick(tick("AAPL", 0, 100.0));
        manager.push_tick(tick("AAPL", 10_000, 110.0));
        manager.push_end_of_stream();

        let _first = manager.next_frames().await.unwrap();
        let second = manager.next_frames().await.unwrap();

        assert_eq!(second.len(), 3);
        assert_eq!(second[0].signal.price, 101.0);
        assert_eq!(second[1].signal.price, 102.0);
        assert_eq!(second[2].signal.price, 110.0);
        assert_eq!(backfill_calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn end_of_stream_terminates_iteration() {
        let mut manager = manager_with_no_backfill(Interval::Min1);
        manager.push_end_of_stream();
        assert!(manager.next_frames().await.is_none());
    }
}
