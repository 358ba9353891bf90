use crate::error::DalError;
use ferrotrade_core::{ProbabilisticBatch, Symbol, VendorId};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Writes `{bars, signals, regimes}` as newline-delimited JSON under `dir`, one file per
/// artifact keyed `{symbol}_{vendor}.jsonl` (spec.md §4.5 step 5).
///
/// The spec names a parquet-equivalent columnar artifact; this build has no parquet crate in
/// its dependency stack, so JSON Lines stands in as the columnar-by-row persistence format —
/// see DESIGN.md for the open-question resolution.
pub fn persist_batch(dir: &Path, batch: &ProbabilisticBatch) -> Result<HashMap<String, PathBuf>, DalError> {
    std::fs::create_dir_all(dir).map_err(|source| DalError::Persist {
        symbol: batch.bars.symbol.clone(),
        source,
    })?;

    let stem = format!("{}_{}", batch.bars.symbol.as_str(), batch.bars.vendor.as_str());
    let mut paths = HashMap::new();

    let bars_path = dir.join(format!("{stem}_bars.jsonl"));
    write_jsonl(&bars_path, batch.bars.data(), &batch.bars.symbol)?;
    paths.insert("bars".to_string(), bars_path);

    let signals_path = dir.join(format!("{stem}_signals.jsonl"));
    write_jsonl(&signals_path, batch.signals.iter(), &batch.bars.symbol)?;
    paths.insert("signals".to_string(), signals_path);

    let regimes_path = dir.join(format!("{stem}_regimes.jsonl"));
    write_jsonl(&regimes_path, batch.regimes.iter(), &batch.bars.symbol)?;
    paths.insert("regimes".to_string(), regimes_path);

    Ok(paths)
}

fn write_jsonl<'a, T, I>(path: &Path, rows: I, symbol: &Symbol) -> Result<(), DalError>
where
    T: serde::Serialize + 'a,
    I: Iterator<Item = &'a T>,
{
    let file = File::create(path).map_err(|source| DalError::Persist {
        symbol: symbol.clone(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    for row in rows {
        let line = serde_json::to_string(row).map_err(|source| DalError::Serialise {
            symbol: symbol.clone(),
            source,
        })?;
        writer
            .write_all(line.as_bytes())
            .and_then(|_| writer.write_all(b"\n"))
            .map_err(|source| DalError::Persist {
                symbol: symbol.clone(),
                source,
            })?;
    }
    Ok(())
}

/// A symbol-upsert + price-snapshot row pair persisted alongside the columnar artifacts
/// (spec.md §4.5 step 6).
#[derive(Debug, Clone)]
pub struct PriceSnapshotRow {
    pub symbol: Symbol,
    pub vendor: VendorId,
    pub last_price: f64,
    pub bar_count: usize,
}

/// Relational-equivalent metadata store. Persisting here is best-effort (spec.md §4.5 step 6:
/// "Failures here are non-fatal; they roll back and log"); callers should swallow errors from
/// [`MetadataStore::upsert_snapshot`] rather than aborting the fetch.
pub trait MetadataStore: Send + Sync {
    fn upsert_snapshot(&mut self, row: PriceSnapshotRow) -> Result<(), DalError>;
}

/// In-process metadata store, keyed by `(symbol, vendor)`. Stands in for a real relational
/// store (e.g. a Postgres symbols/snapshots table pair) absent from this build's dependency
/// stack — see DESIGN.md.
#[derive(Debug, Default)]
pub struct InMemoryMetadataStore {
    rows: HashMap<(Symbol, VendorId), PriceSnapshotRow>,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, symbol: &Symbol, vendor: VendorId) -> Option<&PriceSnapshotRow> {
        self.rows.get(&(symbol.clone(), vendor))
    }
}

impl MetadataStore for InMemoryMetadataStore {
    fn upsert_snapshot(&mut self, row: PriceSnapshotRow) -> Result<(), DalError> {
        self.rows.insert((row.symbol.clone(), row.vendor), row);
        Ok(())
    }
}

/// Persist `row`, logging and discarding any failure rather than propagating it (spec.md §4.5
/// step 6 non-fatal persistence semantics).
pub fn persist_metadata_best_effort(store: &mut dyn MetadataStore, row: PriceSnapshotRow) {
    let symbol = row.symbol.clone();
    if let Err(error) = store.upsert_snapshot(row) {
        warn!(%symbol, %error, "metadata snapshot persistence failed, continuing");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrotrade_core::{Bar, Bars};

    fn ts(i: i64) -> chrono::DateTime<chrono::Utc> {
        chrono::DateTime::from_timestamp(1_700_000_000 + i * 60, 0).unwrap()
    }

    #[test]
    fn persist_batch_writes_three_files() {
        let mut bars = Bars::new(Symbol::new("AAPL"), VendorId::Alpaca, "test");
        bars.push(Bar::new(ts(0), 1.0, 1.0, 1.0, 1.0, 1.0));
        let mut bank = ferrotrade_filters::FilterBank::new(ferrotrade_filters::FilterBankConfig::default());
        let signals = bank.run(&bars);
        let regimes = ferrotrade_filters::RegimeClassifier::default().classify(&signals);
        let batch = ProbabilisticBatch::new(bars, signals, regimes);
        let dir = std::env::temp_dir().join(format!("ferrotrade-dal-test-{}", std::process::id()));
        let paths = persist_batch(&dir, &batch).unwrap();
        assert_eq!(paths.len(), 3);
        for path in paths.values() {
            assert!(path.exists());
        }
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn metadata_store_upsert_is_idempotent_per_key() {
        let mut store = InMemoryMetadataStore::new();
        let symbol = Symbol::new("AAPL");
        persist_metadata_best_effort(
            &mut store,
            PriceSnapshotRow {
                symbol: symbol.clone(),
                vendor: VendorId::Alpaca,
                last_price: 100.0,
                bar_count: 1,
            },
        );
        persist_metadata_best_effort(
            &mut store,
            PriceSnapshotRow {
                symbol: symbol.clone(),
                vendor: VendorId::Alpaca,
                last_price: 105.0,
                bar_count: 2,
            },
        );
        assert_eq!(store.get(&symbol, VendorId::Alpaca).unwrap().last_price, 105.0);
    }
}
