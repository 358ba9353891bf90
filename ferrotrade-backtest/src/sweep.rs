use crate::metrics::Metrics;
use serde_json::Value;
use std::collections::{BTreeMap, VecDeque};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;

/// A sweep's parameter grid: each key maps to the list of values to try (spec.md §4.8).
pub type ParamGrid = BTreeMap<String, Vec<Value>>;
/// One fully-resolved combination drawn from a [`ParamGrid`].
pub type ParamCombo = BTreeMap<String, Value>;

/// Expands a [`ParamGrid`] into the Cartesian product of its value lists (spec.md §4.8 step 1).
/// An empty grid expands to a single empty combo, matching a sweep with no varying parameters.
pub fn expand_param_grid(grid: &ParamGrid) -> Vec<ParamCombo> {
    if grid.is_empty() {
        return vec![ParamCombo::new()];
    }
    let keys: Vec<&String> = grid.keys().collect();
    let mut combos = vec![ParamCombo::new()];
    for key in &keys {
        let values = &grid[*key];
        let mut next = Vec::with_capacity(combos.len() * values.len());
        for combo in &combos {
            for value in values {
                let mut extended = combo.clone();
                extended.insert((*key).clone(), value.clone());
                next.push(extended);
            }
        }
        combos = next;
    }
    combos
}

/// Outcome of one sweep job (spec.md §4.8 step 4 `summary.json`).
#[derive(Debug, Clone)]
pub struct JobResult {
    pub job_id: usize,
    pub params: ParamCombo,
    pub metrics: Metrics,
}

/// Runs `job` once per combo in `grid`, across a bounded worker pool (spec.md §4.8 step 4;
/// default pool size `min(4, len(combos))`). Writes `job_NNNN/summary.json` per job under
/// `sweep_dir` and an aggregate `summary.jsonl`, in completion order (spec.md §4.8 steps 4-5).
pub fn run_sweep<F>(sweep_dir: &Path, grid: &ParamGrid, max_workers: Option<usize>, job: F) -> std::io::Result<Vec<JobResult>>
where
    F: Fn(usize, &ParamCombo) -> Metrics + Sync,
{
    let combos = expand_param_grid(grid);
    fs::create_dir_all(sweep_dir)?;

    let worker_count = max_workers.unwrap_or_else(|| combos.len().min(4)).max(1);
    info!(jobs = combos.len(), workers = worker_count, "sweep starting");

    let queue: Mutex<VecDeque<(usize, ParamCombo)>> =
        Mutex::new(combos.into_iter().enumerate().collect());
    let results: Mutex<Vec<JobResult>> = Mutex::new(Vec::new());
    let io_error: Mutex<Option<std::io::Error>> = Mutex::new(None);

    std::thread::scope(|scope| {
        for _ in 0..worker_count {
            scope.spawn(|| loop {
                let next = queue.lock().unwrap().pop_front();
                let Some((job_id, params)) = next else {
                    break;
                };
                let metrics = job(job_id, &params);
                let job_dir = sweep_dir.join(format!("job_{job_id:04}"));
                if let Err(error) = write_job_summary(&job_dir, job_id, &params, &metrics) {
                    *io_error.lock().unwrap() = Some(error);
                    continue;
                }
                info!(job_id, sharpe = metrics.sharpe, "sweep job completed");
                results.lock().unwrap().push(JobResult { job_id, params, metrics });
            });
        }
    });

    if let Some(error) = io_error.into_inner().unwrap() {
        return Err(error);
    }

    let results = results.into_inner().unwrap();
    write_aggregate_summary(sweep_dir, &results)?;
    info!(results = results.len(), "sweep completed");
    Ok(results)
}

fn write_job_summary(job_dir: &Path, job_id: usize, params: &ParamCombo, metrics: &Metrics) -> std::io::Result<PathBuf> {
    fs::create_dir_all(job_dir)?;
    let path = job_dir.join("summary.json");
    let payload = serde_json::json!({
        "job_id": job_id,
        "params": params,
        "metrics": {
            "total_return": metrics.total_return,
            "cagr": metrics.cagr,
            "max_drawdown": metrics.max_drawdown,
            "sharpe": metrics.sharpe,
            "sortino": metrics.sortino,
        },
    });
    fs::write(&path, serde_json::to_vec_pretty(&payload)?)?;
    Ok(path)
}

fn write_aggregate_summary(sweep_dir: &Path, results: &[JobResult]) -> std::io::Result<()> {
    let path = sweep_dir.join("summary.jsonl");
    let mut writer = BufWriter::new(File::create(path)?);
    for result in results {
        let payload = serde_json::json!({
            "job_id": result.job_id,
            "params": result.params,
            "metrics": {
                "total_return": result.metrics.total_return,
                "cagr": result.metrics.cagr,
                "max_drawdown": result.metrics.max_drawdown,
                "sharpe": result.metrics.sharpe,
                "sortino": result.metrics.sortino,
            },
        });
        writer.write_all(serde_json::to_string(&payload)?.as_bytes())?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn expand_param_grid_produces_the_cartesian_product() {
        let mut grid = ParamGrid::new();
        grid.insert("lookback".to_string(), vec![Value::from(10), Value::from(20)]);
        grid.insert("atr_mult".to_string(), vec![Value::from(1.5), Value::from(2.0), Value::from(2.5)]);
        let combos = expand_param_grid(&grid);
        assert_eq!(combos.len(), 6);
    }

    #[test]
    fn empty_grid_yields_a_single_empty_combo() {
        let combos = expand_param_grid(&ParamGrid::new());
        assert_eq!(combos, vec![ParamCombo::new()]);
    }

    #[test]
    fn run_sweep_executes_every_combo_and_writes_summaries() {
        let mut grid = ParamGrid::new();
        grid.insert("x".to_string(), vec![Value::from(1), Value::from(2), Value::from(3)]);
        let dir = std::env::temp_dir().join(format!("ferrotrade-sweep-test-{}", std::process::id()));
        let counter = AtomicUsize::new(0);
        let results = run_sweep(&dir, &grid, Some(2), |_job_id, _params| {
            counter.fetch_add(1, Ordering::SeqCst);
            Metrics {
                total_return: 0.1,
                cagr: 0.1,
                max_drawdown: 0.0,
                sharpe: 1.0,
                sortino: 1.0,
            }
        })
        .unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(results.len(), 3);
        assert!(dir.join("summary.jsonl").exists());
        let _ = fs::remove_dir_all(&dir);
    }
}
