use std::collections::HashMap;

/// Tracks the last successfully-processed offset per partition so a restarted consumer
/// resumes rather than replays (spec.md §4.10). Stands in for a real durable checkpoint
/// store (e.g. a blob-backed one) absent from this build's dependency stack — see
/// DESIGN.md.
pub trait Checkpoint: Send + Sync {
    fn update(&mut self, partition: &str, offset: u64);
    fn last_offset(&self, partition: &str) -> Option<u64>;
}

/// In-process checkpoint store, keyed by partition id.
#[derive(Debug, Default)]
pub struct InMemoryCheckpoint {
    offsets: HashMap<String, u64>,
}

impl InMemoryCheckpoint {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Checkpoint for InMemoryCheckpoint {
    fn update(&mut self, partition: &str, offset: u64) {
        self.offsets
            .entry(partition.to_string())
            .and_modify(|current| *current = (*current).max(offset))
            .or_insert(offset);
    }

    fn last_offset(&self, partition: &str) -> Option<u64> {
        self.offsets.get(partition).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_only_ever_advances_the_offset() {
        let mut checkpoint = InMemoryCheckpoint::new();
        checkpoint.update("p0", 5);
        checkpoint.update("p0", 3);
        assert_eq!(checkpoint.last_offset("p0"), Some(5));
    }

    #[test]
    fn an_unseen_partition_has_no_checkpoint() {
        let checkpoint = InMemoryCheckpoint::new();
        assert_eq!(checkpoint.last_offset("p0"), None);
    }
}
