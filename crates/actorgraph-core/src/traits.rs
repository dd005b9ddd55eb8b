use crate::{ActorRecord, RelationRecord, Result, TimeWindow};
use async_trait::async_trait;

/// Source of per-actor intelligence records for a network + window.
#[async_trait]
pub trait ActorProvider: Send + Sync {
    async fn actors(&self, network: &str, window: TimeWindow) -> Result<Vec<ActorRecord>>;
}

/// Source of directed flow relations for a network + window.
#[async_trait]
pub trait RelationProvider: Send + Sync {
    async fn relations(&self, network: &str, window: TimeWindow) -> Result<Vec<RelationRecord>>;
}

/// Address-to-infrastructure lookup. Implementations must match
/// case-insensitively; callers pass addresses as received.
pub trait InfraRegistry: Send + Sync {
    fn lookup(&self, address: &str) -> Option<String>;
}
