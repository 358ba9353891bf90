use crate::symbol::Symbol;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Lifecycle of a queued parameter-sweep job (spec.md §3, §4.8).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepStatus {
    Queued,
    Dispatched,
    Running,
    Completed,
    Failed,
}

/// One row of the sweep job manifest (spec.md §3, §4.8). Appended to on
/// every status transition; never rewritten in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepJobRecord {
    pub job_id: String,
    pub status: SweepStatus,
    pub ts: DateTime<Utc>,
    pub strategy: String,
    pub symbol: Symbol,
    pub sweep_dir: PathBuf,
    pub summary_path: Option<PathBuf>,
    pub results_count: Option<usize>,
    pub duration_ms: Option<u64>,
}
