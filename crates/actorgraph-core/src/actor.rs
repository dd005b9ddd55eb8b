use crate::{ActorId, ActorType, SourceTier};
use serde::{Deserialize, Serialize};

/// Per-actor intelligence for one network and time window. Records are
/// never rejected for missing fields; serde defaults keep partial payloads
/// usable and downstream code treats the defaults as degenerate values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActorRecord {
    pub actor_id: ActorId,
    pub network: String,
    pub actor_type: ActorType,
    pub source_tier: SourceTier,
    pub score: f64,
    pub weight: f64,
    pub inflow_usd: f64,
    pub outflow_usd: f64,
    pub volume_usd: f64,
    pub tx_count: u64,
    pub coverage: f64,
    pub tokens: Vec<String>,
    pub addresses: Vec<String>,
    pub entity_id: Option<String>,
    pub owner_id: Option<String>,
    pub community_id: Option<String>,
    pub funding_source: Option<String>,
    pub hub_id: Option<String>,
    pub dominant_counterparty: Option<String>,
    pub infra_id: Option<String>,
    pub source_group: Option<String>,
    pub label: Option<String>,
}

impl Default for ActorRecord {
    fn default() -> Self {
        Self {
            actor_id: String::new(),
            network: String::new(),
            actor_type: ActorType::default(),
            source_tier: SourceTier::default(),
            score: 0.0,
            weight: 1.0,
            inflow_usd: 0.0,
            outflow_usd: 0.0,
            volume_usd: 0.0,
            tx_count: 0,
            coverage: 0.0,
            tokens: Vec::new(),
            addresses: Vec::new(),
            entity_id: None,
            owner_id: None,
            community_id: None,
            funding_source: None,
            hub_id: None,
            dominant_counterparty: None,
            infra_id: None,
            source_group: None,
            label: None,
        }
    }
}

impl ActorRecord {
    pub fn new(
        actor_id: impl Into<ActorId>,
        actor_type: ActorType,
        source_tier: SourceTier,
    ) -> Self {
        Self {
            actor_id: actor_id.into(),
            actor_type,
            source_tier,
            ..Self::default()
        }
    }

    pub fn with_network(mut self, network: impl Into<String>) -> Self {
        self.network = network.into();
        self
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = score;
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Sets inflow and outflow, keeping `volume_usd` as their sum.
    pub fn with_flows(mut self, inflow_usd: f64, outflow_usd: f64) -> Self {
        self.inflow_usd = inflow_usd;
        self.outflow_usd = outflow_usd;
        self.volume_usd = inflow_usd + outflow_usd;
        self
    }

    pub fn with_volume(mut self, volume_usd: f64) -> Self {
        self.volume_usd = volume_usd;
        self
    }

    pub fn with_tx_count(mut self, tx_count: u64) -> Self {
        self.tx_count = tx_count;
        self
    }

    pub fn with_coverage(mut self, coverage: f64) -> Self {
        self.coverage = coverage;
        self
    }

    pub fn with_tokens(mut self, tokens: Vec<String>) -> Self {
        self.tokens = tokens;
        self
    }

    pub fn with_addresses(mut self, addresses: Vec<String>) -> Self {
        self.addresses = addresses;
        self
    }

    pub fn with_entity(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }

    pub fn with_owner(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = Some(owner_id.into());
        self
    }

    pub fn with_community(mut self, community_id: impl Into<String>) -> Self {
        self.community_id = Some(community_id.into());
        self
    }

    pub fn with_funding_source(mut self, funding_source: impl Into<String>) -> Self {
        self.funding_source = Some(funding_source.into());
        self
    }

    pub fn with_hub(mut self, hub_id: impl Into<String>) -> Self {
        self.hub_id = Some(hub_id.into());
        self
    }

    pub fn with_dominant_counterparty(mut self, counterparty: impl Into<String>) -> Self {
        self.dominant_counterparty = Some(counterparty.into());
        self
    }

    pub fn with_infra(mut self, infra_id: impl Into<String>) -> Self {
        self.infra_id = Some(infra_id.into());
        self
    }

    pub fn with_source_group(mut self, source_group: impl Into<String>) -> Self {
        self.source_group = Some(source_group.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Normalized token set for overlap comparison. An actor with no
    /// observed tokens falls back to a weight-1 pseudo-token derived from
    /// its type, so unknown actors only overlap with their own kind.
    pub fn effective_tokens(&self) -> Vec<String> {
        let mut tokens: Vec<String> = self
            .tokens
            .iter()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        tokens.sort();
        tokens.dedup();
        if tokens.is_empty() {
            tokens.push(self.actor_type.to_string());
        }
        tokens
    }
}

/// Directed flow relation between two actors, the input of the topology
/// services. The provider-assigned `weight` scales `volume_usd` during
/// flow accumulation (unit weight leaves volumes untouched).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RelationRecord {
    pub from: ActorId,
    pub to: ActorId,
    pub volume_usd: f64,
    pub weight: f64,
}

impl Default for RelationRecord {
    fn default() -> Self {
        Self {
            from: String::new(),
            to: String::new(),
            volume_usd: 0.0,
            weight: 1.0,
        }
    }
}

impl RelationRecord {
    pub fn new(from: impl Into<ActorId>, to: impl Into<ActorId>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            ..Self::default()
        }
    }

    pub fn with_volume(mut self, volume_usd: f64) -> Self {
        self.volume_usd = volume_usd;
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }
}
