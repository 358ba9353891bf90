use crate::error::DalError;
use crate::persistence::{persist_batch, persist_metadata_best_effort, MetadataStore, PriceSnapshotRow};
use crate::stream::{BackfillFn, StreamingManager, StreamingManagerConfig};
use crate::telemetry;
use ferrotrade_core::{FetchRequest, Interval, ProbabilisticBatch, Symbol};
use ferrotrade_filters::{FilterBank, FilterBankConfig, RegimeClassifier};
use ferrotrade_vendor::VendorClient;
use std::path::Path;

/// Façade over the vendor, filter-bank and streaming layers (spec.md §4.5). One instance is
/// shared across fetches for a given filter/regime configuration; it holds no per-fetch state.
pub struct MarketDataDal {
    filter_bank: FilterBankConfig,
    regime_window: usize,
}

impl Default for MarketDataDal {
    fn default() -> Self {
        Self {
            filter_bank: FilterBankConfig::default(),
            regime_window: 20,
        }
    }
}

impl MarketDataDal {
    pub fn new(filter_bank: FilterBankConfig, regime_window: usize) -> Self {
        Self {
            filter_bank,
            regime_window,
        }
    }

    /// `FetchBars` (spec.md §4.5): fetch, filter, classify, persist, and emit telemetry.
    ///
    /// AlphaVantage's daily remap (vendor=alphavantage, interval=1Day → the
    /// `TIME_SERIES_DAILY` function rather than an intraday one) happens inside
    /// [`ferrotrade_vendor::AlphaVantageClient`] itself, so no client switch is needed here.
    pub async fn fetch_bars(
        &self,
        vendor: &dyn VendorClient,
        request: FetchRequest,
        persist_dir: &Path,
        metadata: &mut dyn MetadataStore,
    ) -> Result<ProbabilisticBatch, DalError> {
        let interval = request.interval;
        let bars = vendor.fetch_bars(request).await?;

        telemetry::bars_snapshot(
            &bars.symbol,
            bars.vendor,
            interval,
            bars.len(),
            bars.first().map(|b| b.timestamp),
            bars.last().map(|b| b.timestamp),
        );

        let mut bank = FilterBank::new(self.filter_bank);
        let signals = bank.run(&bars);

        let classifier = RegimeClassifier::new(self.regime_window);
        let regimes = classifier.classify(&signals);

        telemetry::signals_snapshot(&bars.symbol, bars.vendor, signals.len());
        telemetry::regimes_snapshot(&bars.symbol, bars.vendor, regimes.len());

        let last_price = bars.last().map(|b| b.close).unwrap_or(0.0);
        let symbol = bars.symbol.clone();
        let vendor_id = bars.vendor;
        let bar_count = bars.len();

        let mut batch = ProbabilisticBatch::new(bars, signals, regimes);
        batch.cache_paths = persist_batch(persist_dir, &batch)?;

        persist_metadata_best_effort(
            metadata,
            PriceSnapshotRow {
                symbol,
                vendor: vendor_id,
                last_price,
                bar_count,
            },
        );

        Ok(batch)
    }

    /// `StreamBars` (spec.md §4.5): requires `vendor.supports_streaming() == true`.
    pub fn stream_bars(
        &self,
        vendor: &dyn VendorClient,
        symbols: &[Symbol],
        interval: Interval,
        backfill: BackfillFn,
    ) -> Result<StreamingManager, DalError> {
        if !vendor.supports_streaming() {
            return Err(DalError::StreamingUnsupported {
                vendor: vendor.vendor_id(),
            });
        }

        let raw_stream = vendor.open_stream(symbols, interval)?;
        let mut config = StreamingManagerConfig::new(interval);
        config.filter_bank = self.filter_bank;
        config.regime_window = self.regime_window;

        let manager = StreamingManager::new(vendor.vendor_id(), config, backfill);
        manager.spawn_producer(raw_stream);
        Ok(manager)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::InMemoryMetadataStore;
    use async_trait::async_trait;
    use ferrotrade_core::{Bar, Bars, VendorId};
    use ferrotrade_vendor::VendorError;

    struct StaticVendor(Bars);

    #[async_trait]
    impl VendorClient for StaticVendor {
        fn vendor_id(&self) -> VendorId {
            VendorId::Alpaca
        }

        async fn fetch_bars(&self, _request: FetchRequest) -> Result<Bars, VendorError> {
            Ok(self.0.clone())
        }
    }

    fn ts(i: i64) -> chrono::DateTime<chrono::Utc> {
        chrono::DateTime::from_timestamp(1_700_000_000 + i * 60, 0).unwrap()
    }

    #[tokio::test]
    async fn fetch_bars_produces_a_coherent_batch_and_persists_artifacts() {
        let mut bars = Bars::new(Symbol::new("AAPL"), VendorId::Alpaca, "test");
        for i in 0..5 {
            bars.push(Bar::new(ts(i), 100.0, 101.0, 99.0, 100.0 + i as f64, 1_000.0));
        }
        let vendor = StaticVendor(bars);
        let dal = MarketDataDal::default();
        let mut metadata = InMemoryMetadataStore::new();
        let dir = std::env::temp_dir().join(format!("ferrotrade-dal-facade-test-{}", std::process::id()));

        let batch = dal
            .fetch_bars(
                &vendor,
                FetchRequest::new(Symbol::new("AAPL"), Interval::Min1),
                &dir,
                &mut metadata,
            )
            .await
            .unwrap();

        assert!(batch.is_coherent());
        assert_eq!(batch.cache_paths.len(), 3);
        assert!(metadata.get(&Symbol::new("AAPL"), VendorId::Alpaca).is_some());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn stream_bars_fails_fast_for_a_non_streaming_vendor() {
        let vendor = StaticVendor(Bars::new(Symbol::new("AAPL"), VendorId::Alpaca, "test"));
        let dal = MarketDataDal::default();
        let result = dal.stream_bars(&vendor, &[Symbol::new("AAPL")], Interval::Min1, Box::new(|_| Vec::new()));
        assert!(matches!(result, Err(DalError::StreamingUnsupported { .. })));
    }
}
