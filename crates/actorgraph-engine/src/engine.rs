use std::sync::Arc;

use actorgraph_cluster::{build_clusters, confirm_clusters, Cluster, ConfirmationResult};
use actorgraph_core::{
    ActorProvider, ActorRecord, InfraRegistry, RelationProvider, Result, Settings, TimeWindow,
};
use actorgraph_graph::{
    ActorGraph, ActorTopologyService, GraphBuilder, MarketTopologyRow, MarketTopologyService,
    TopologyRow,
};
use chrono::{DateTime, Utc};
use futures::try_join;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Combined view over one network partition, assembled from a single
/// pair of provider fetches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkOverview {
    pub graph: ActorGraph,
    pub topology: Vec<TopologyRow>,
    pub market: MarketTopologyRow,
}

/// Facade wiring data providers into the graph, topology, and
/// confirmation services.
///
/// The engine owns no data itself. Every operation fetches the
/// partition it needs from the injected providers, so callers can back
/// it with live infrastructure or with the in-memory fixtures from
/// [`crate::memory`].
pub struct IntelEngine {
    settings: Settings,
    actors: Arc<dyn ActorProvider>,
    relations: Arc<dyn RelationProvider>,
    registry: Arc<dyn InfraRegistry>,
    builder: GraphBuilder,
    topology: ActorTopologyService,
    market: MarketTopologyService,
}

impl IntelEngine {
    pub fn new(
        settings: Settings,
        actors: Arc<dyn ActorProvider>,
        relations: Arc<dyn RelationProvider>,
        registry: Arc<dyn InfraRegistry>,
    ) -> Self {
        let builder = GraphBuilder::new(settings.graph.clone());
        let topology = ActorTopologyService::new(settings.topology.clone());
        let market = MarketTopologyService::new(settings.topology.clone());
        Self {
            settings,
            actors,
            relations,
            registry,
            builder,
            topology,
            market,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Builds the evidence-weighted actor graph for one partition.
    pub async fn build_graph(&self, network: &str, window: TimeWindow) -> Result<ActorGraph> {
        info!("Building actor graph for {} over {}", network, window);
        let actors = self.actors.actors(network, window).await?;
        debug!("Fetched {} actors for {}", actors.len(), network);
        self.builder.build(network, window, &actors)
    }

    /// Per-actor flow topology rows, ranked by hub score.
    pub async fn actor_topology(
        &self,
        network: &str,
        window: TimeWindow,
    ) -> Result<Vec<TopologyRow>> {
        let relations = self.relations.relations(network, window).await?;
        debug!(
            "Fetched {} relations for {} over {}",
            relations.len(),
            network,
            window
        );
        Ok(self.topology.compute(&relations))
    }

    /// Market-wide concentration summary for one partition.
    pub async fn market_topology(
        &self,
        network: &str,
        window: TimeWindow,
        as_of: DateTime<Utc>,
    ) -> Result<MarketTopologyRow> {
        let relations = self.relations.relations(network, window).await?;
        Ok(self.market.compute(network, window, as_of, &relations))
    }

    /// Resolves the requested actors into clusters and runs the
    /// confirmation rules over them, with the resolution trace attached
    /// to the result. Requested ids the provider does not know are
    /// skipped.
    pub async fn confirm_actor_group(
        &self,
        network: &str,
        window: TimeWindow,
        actor_ids: &[String],
    ) -> Result<(Vec<Cluster>, ConfirmationResult)> {
        info!(
            "Confirming group of {} actors on {} over {}",
            actor_ids.len(),
            network,
            window
        );
        let records = self.actors.actors(network, window).await?;
        let wanted: FxHashSet<&str> = actor_ids.iter().map(String::as_str).collect();
        let selected: Vec<ActorRecord> = records
            .into_iter()
            .filter(|actor| wanted.contains(actor.actor_id.as_str()))
            .collect();
        if selected.len() < wanted.len() {
            debug!(
                "Confirmation request matched {} of {} actor ids on {}",
                selected.len(),
                wanted.len(),
                network
            );
        }
        let (clusters, trace) = build_clusters(&selected, self.registry.as_ref());
        let result = confirm_clusters(&clusters, &self.settings.confirmation).with_trace(trace);
        Ok((clusters, result))
    }

    /// Fetches actors and relations concurrently, then assembles the
    /// graph snapshot, per-actor topology, and market summary from that
    /// one pair of fetches. The graph is stamped with `as_of`.
    pub async fn network_overview(
        &self,
        network: &str,
        window: TimeWindow,
        as_of: DateTime<Utc>,
    ) -> Result<NetworkOverview> {
        info!("Assembling network overview for {} over {}", network, window);
        let (actors, relations) = try_join!(
            self.actors.actors(network, window),
            self.relations.relations(network, window),
        )?;
        debug!(
            "Overview fetch for {}: {} actors, {} relations",
            network,
            actors.len(),
            relations.len()
        );
        let graph = self.builder.build_at(network, window, &actors, as_of)?;
        let topology = self.topology.compute(&relations);
        let market = self.market.compute(network, window, as_of, &relations);
        Ok(NetworkOverview {
            graph,
            topology,
            market,
        })
    }
}
