use thiserror::Error;

/// Errors the order-intent and sweep-job consumers may raise (spec.md §4.10).
#[derive(Debug, Error)]
pub enum ConsumerError {
    #[error("payload is not valid json: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    #[error("failed to persist order {run_id}: {reason}")]
    Persist { run_id: String, reason: String },

    #[error("failed to dispatch sweep job {job_id}: {reason}")]
    Dispatch { job_id: String, reason: String },
}
