// ABOUTME: DashMap-backed providers that serve seeded fixtures from memory.
// ABOUTME: Used by tests and by embedders that already hold their data locally.

use std::sync::Arc;

use actorgraph_core::{
    ActorProvider, ActorRecord, RelationProvider, RelationRecord, Result, TimeWindow,
};
use async_trait::async_trait;
use dashmap::DashMap;

type Partition = (String, TimeWindow);

/// In-memory [`ActorProvider`] keyed by `(network, window)`.
///
/// Unknown partitions resolve to an empty record set rather than an error,
/// matching how a live backend reports a network it has no coverage for.
pub struct MemoryActorProvider {
    records: DashMap<Partition, Arc<Vec<ActorRecord>>>,
}

impl MemoryActorProvider {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    /// Replaces the record set for one partition.
    pub fn insert(&self, network: &str, window: TimeWindow, records: Vec<ActorRecord>) {
        self.records
            .insert((network.to_string(), window), Arc::new(records));
    }

    pub fn partition_count(&self) -> usize {
        self.records.len()
    }
}

impl Default for MemoryActorProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ActorProvider for MemoryActorProvider {
    async fn actors(&self, network: &str, window: TimeWindow) -> Result<Vec<ActorRecord>> {
        let key = (network.to_string(), window);
        Ok(self
            .records
            .get(&key)
            .map(|entry| entry.value().as_ref().clone())
            .unwrap_or_default())
    }
}

/// In-memory [`RelationProvider`] keyed by `(network, window)`.
pub struct MemoryRelationProvider {
    records: DashMap<Partition, Arc<Vec<RelationRecord>>>,
}

impl MemoryRelationProvider {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    /// Replaces the relation set for one partition.
    pub fn insert(&self, network: &str, window: TimeWindow, records: Vec<RelationRecord>) {
        self.records
            .insert((network.to_string(), window), Arc::new(records));
    }

    pub fn partition_count(&self) -> usize {
        self.records.len()
    }
}

impl Default for MemoryRelationProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RelationProvider for MemoryRelationProvider {
    async fn relations(&self, network: &str, window: TimeWindow) -> Result<Vec<RelationRecord>> {
        let key = (network.to_string(), window);
        Ok(self
            .records
            .get(&key)
            .map(|entry| entry.value().as_ref().clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_partition_yields_empty_set() {
        let provider = MemoryActorProvider::new();
        let records = provider.actors("solana", TimeWindow::H24).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn partitions_are_isolated_by_network_and_window() {
        let whale = |id: &str| {
            ActorRecord::new(
                id,
                actorgraph_core::ActorType::Whale,
                actorgraph_core::SourceTier::Verified,
            )
        };
        let provider = MemoryActorProvider::new();
        provider.insert("solana", TimeWindow::H24, vec![whale("whale-1")]);
        provider.insert(
            "solana",
            TimeWindow::D7,
            vec![whale("whale-1"), whale("whale-2")],
        );

        assert_eq!(
            provider.actors("solana", TimeWindow::H24).await.unwrap().len(),
            1
        );
        assert_eq!(
            provider.actors("solana", TimeWindow::D7).await.unwrap().len(),
            2
        );
        assert!(provider
            .actors("ethereum", TimeWindow::H24)
            .await
            .unwrap()
            .is_empty());
        assert_eq!(provider.partition_count(), 2);
    }

    #[tokio::test]
    async fn reinsert_replaces_the_partition() {
        let provider = MemoryRelationProvider::new();
        provider.insert(
            "solana",
            TimeWindow::H24,
            vec![RelationRecord::new("a", "b").with_volume(10.0)],
        );
        provider.insert("solana", TimeWindow::H24, Vec::new());
        assert!(provider
            .relations("solana", TimeWindow::H24)
            .await
            .unwrap()
            .is_empty());
    }
}
