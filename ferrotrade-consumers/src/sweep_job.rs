use crate::error::ConsumerError;
use ferrotrade_core::{Symbol, SweepJobRecord, SweepStatus};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{info, warn};

/// Starts a dispatched sweep-sweep job with the given environment (spec.md §4.10
/// `ContainerAppJobClient`). Kept behind a trait so the consumer doesn't need a hard
/// dependency on whatever job-runner backend a deployment uses.
pub trait JobDispatcher: Send + Sync {
    fn start(&self, job_id: &str, env: &[(String, String)]) -> Result<(), ConsumerError>;
}

/// Dispatches by logging only. Stands in for a real container-job API client (e.g. one that
/// calls a cloud jobs-management endpoint) absent from this build's dependency stack — see
/// DESIGN.md.
#[derive(Debug, Default)]
pub struct LoggingJobDispatcher;

impl JobDispatcher for LoggingJobDispatcher {
    fn start(&self, job_id: &str, env: &[(String, String)]) -> Result<(), ConsumerError> {
        info!(event = "sweep_job_dispatch", %job_id, vars = env.len(), "dispatching sweep job");
        Ok(())
    }
}

/// Tracks the lifecycle of dispatched sweep jobs (spec.md §4.8, §4.10). Stands in for a real
/// relational sweep-job table absent from this build's dependency stack.
pub trait JobRegistry: Send + Sync {
    fn record(&mut self, record: SweepJobRecord);
    fn get(&self, job_id: &str) -> Option<&SweepJobRecord>;
}

#[derive(Debug, Default)]
pub struct InMemoryJobRegistry {
    records: HashMap<String, SweepJobRecord>,
}

impl InMemoryJobRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl JobRegistry for InMemoryJobRegistry {
    fn record(&mut self, record: SweepJobRecord) {
        self.records.insert(record.job_id.clone(), record);
    }

    fn get(&self, job_id: &str) -> Option<&SweepJobRecord> {
        self.records.get(job_id)
    }
}

/// Builds the environment variables a dispatched sweep-job container is started with
/// (spec.md §4.10 `_build_env`). Blob-backed configs get a resolved local download path
/// alongside the original blob URI; anything else passes `config_path` straight through.
fn build_env(job_id: &str, payload: &serde_json::Value) -> Vec<(String, String)> {
    let config_path = payload
        .get("config_path")
        .or_else(|| payload.get("config"))
        .and_then(|v| v.as_str())
        .unwrap_or_default();

    let mut env = vec![("SWEEP_JOB_ID".to_string(), job_id.to_string())];
    if let Some(blob) = config_path.strip_prefix("blob://") {
        env.push(("SWEEP_CONFIG_BLOB".to_string(), format!("blob://{blob}")));
        env.push(("SWEEP_CONFIG_PATH".to_string(), format!("/workspace/configs/{job_id}.yaml")));
    } else {
        env.push(("SWEEP_CONFIG_PATH".to_string(), config_path.to_string()));
    }

    for key in ["strategy", "symbol", "mode"] {
        if let Some(value) = payload.get(key).and_then(|v| v.as_str()) {
            env.push((format!("SWEEP_META_{}", key.to_uppercase()), value.to_string()));
        }
    }
    env
}

/// Dispatches container jobs in response to sweep-request events and tracks their lifecycle
/// in `registry` (spec.md §4.10 `SweepJobEventConsumer`).
pub struct SweepJobEventConsumer<D, R> {
    dispatcher: D,
    registry: R,
}

impl<D: JobDispatcher, R: JobRegistry> SweepJobEventConsumer<D, R> {
    pub fn new(dispatcher: D, registry: R) -> Self {
        Self { dispatcher, registry }
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Decodes one sweep-job request, dispatches it, and records `Dispatched`/`Failed` in
    /// the registry (spec.md §4.10). Malformed payloads are logged and skipped.
    pub fn handle_payload(&mut self, now: chrono::DateTime<chrono::Utc>, payload: &str) {
        let value: serde_json::Value = match serde_json::from_str(payload) {
            Ok(value) => value,
            Err(error) => {
                warn!(%error, "sweep job consumer: invalid payload");
                return;
            }
        };

        let job_id = value
            .get("job_id")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| format!("event-{}", now.timestamp()));
        let env = build_env(&job_id, &value);
        let strategy = value.get("strategy").and_then(|v| v.as_str()).unwrap_or("unknown").to_string();
        let symbol = value.get("symbol").and_then(|v| v.as_str()).map(Symbol::new).unwrap_or_else(|| Symbol::new("UNKNOWN"));

        match self.dispatcher.start(&job_id, &env) {
            Ok(()) => {
                info!(event = "sweep_job_started", %job_id);
                self.registry.record(SweepJobRecord {
                    job_id,
                    status: SweepStatus::Dispatched,
                    ts: now,
                    strategy,
                    symbol,
                    sweep_dir: PathBuf::new(),
                    summary_path: None,
                    results_count: None,
                    duration_ms: None,
                });
            }
            Err(error) => {
                warn!(%error, %job_id, "sweep job consumer: failed starting job");
                self.registry.record(SweepJobRecord {
                    job_id,
                    status: SweepStatus::Failed,
                    ts: now,
                    strategy,
                    symbol,
                    sweep_dir: PathBuf::new(),
                    summary_path: None,
                    results_count: None,
                    duration_ms: None,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    struct FailingDispatcher;
    impl JobDispatcher for FailingDispatcher {
        fn start(&self, job_id: &str, _env: &[(String, String)]) -> Result<(), ConsumerError> {
            Err(ConsumerError::Dispatch { job_id: job_id.to_string(), reason: "simulated failure".to_string() })
        }
    }

    fn now() -> chrono::DateTime<chrono::Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn a_blob_config_path_resolves_to_a_local_download_path() {
        let env = build_env("job-1", &serde_json::json!({"config_path": "blob://cfg/job-1.yaml"}));
        assert!(env.contains(&("SWEEP_CONFIG_PATH".to_string(), "/workspace/configs/job-1.yaml".to_string())));
        assert!(env.contains(&("SWEEP_CONFIG_BLOB".to_string(), "blob://cfg/job-1.yaml".to_string())));
    }

    #[test]
    fn a_successful_dispatch_is_recorded_as_dispatched() {
        let mut consumer = SweepJobEventConsumer::new(LoggingJobDispatcher, InMemoryJobRegistry::new());
        consumer.handle_payload(now(), &serde_json::json!({"job_id": "job-1", "config_path": "/cfg.yaml"}).to_string());
        assert_eq!(consumer.registry().get("job-1").unwrap().status, SweepStatus::Dispatched);
    }

    #[test]
    fn a_failed_dispatch_is_recorded_as_failed() {
        let mut consumer = SweepJobEventConsumer::new(FailingDispatcher, InMemoryJobRegistry::new());
        consumer.handle_payload(now(), &serde_json::json!({"job_id": "job-1", "config_path": "/cfg.yaml"}).to_string());
        assert_eq!(consumer.registry().get("job-1").unwrap().status, SweepStatus::Failed);
    }

    #[test]
    fn a_missing_job_id_falls_back_to_a_timestamp_derived_id() {
        let mut consumer = SweepJobEventConsumer::new(LoggingJobDispatcher, InMemoryJobRegistry::new());
        consumer.handle_payload(now(), &serde_json::json!({"config_path": "/cfg.yaml"}).to_string());
        assert!(consumer.registry().get("event-1700000000").is_some());
    }
}
