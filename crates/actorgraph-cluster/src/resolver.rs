use actorgraph_core::{ActorRecord, InfraRegistry};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterKind {
    Entity,
    Owner,
    Community,
    Infra,
    Actor,
}

impl fmt::Display for ClusterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ClusterKind::Entity => "entity",
            ClusterKind::Owner => "owner",
            ClusterKind::Community => "community",
            ClusterKind::Infra => "infra",
            ClusterKind::Actor => "actor",
        };
        write!(f, "{}", s)
    }
}

/// Which resolution rule produced an assignment; recorded per actor in
/// the confirmation trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionRule {
    EntityBinding,
    OwnerBinding,
    CommunityBinding,
    InfraMatch,
    ActorFallback,
}

impl fmt::Display for ResolutionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResolutionRule::EntityBinding => "entity_binding",
            ResolutionRule::OwnerBinding => "owner_binding",
            ResolutionRule::CommunityBinding => "community_binding",
            ResolutionRule::InfraMatch => "infra_match",
            ResolutionRule::ActorFallback => "actor_fallback",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterAssignment {
    pub cluster_id: String,
    pub kind: ClusterKind,
    pub rule: ResolutionRule,
}

pub(crate) fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// First non-blank of `community_id`, `funding_source`, `hub_id`,
/// `dominant_counterparty`.
pub fn derive_community_id(actor: &ActorRecord) -> Option<String> {
    non_blank(&actor.community_id)
        .or_else(|| non_blank(&actor.funding_source))
        .or_else(|| non_blank(&actor.hub_id))
        .or_else(|| non_blank(&actor.dominant_counterparty))
        .map(str::to_string)
}

/// Assigns an actor to its canonical cluster. Strict priority: entity
/// binding, then owner, then derived community, then known-infrastructure
/// membership (explicit infra id, else a registry hit on any address), and
/// finally a per-actor singleton id.
pub fn resolve_cluster(actor: &ActorRecord, registry: &dyn InfraRegistry) -> ClusterAssignment {
    if let Some(entity) = non_blank(&actor.entity_id) {
        return ClusterAssignment {
            cluster_id: format!("entity:{}", entity),
            kind: ClusterKind::Entity,
            rule: ResolutionRule::EntityBinding,
        };
    }
    if let Some(owner) = non_blank(&actor.owner_id) {
        return ClusterAssignment {
            cluster_id: format!("owner:{}", owner),
            kind: ClusterKind::Owner,
            rule: ResolutionRule::OwnerBinding,
        };
    }
    if let Some(community) = derive_community_id(actor) {
        return ClusterAssignment {
            cluster_id: format!("community:{}", community),
            kind: ClusterKind::Community,
            rule: ResolutionRule::CommunityBinding,
        };
    }
    if let Some(infra) = non_blank(&actor.infra_id) {
        return ClusterAssignment {
            cluster_id: format!("infra:{}", infra),
            kind: ClusterKind::Infra,
            rule: ResolutionRule::InfraMatch,
        };
    }
    for address in &actor.addresses {
        if let Some(infra_id) = registry.lookup(address) {
            return ClusterAssignment {
                cluster_id: format!("infra:{}", infra_id),
                kind: ClusterKind::Infra,
                rule: ResolutionRule::InfraMatch,
            };
        }
    }
    ClusterAssignment {
        cluster_id: format!("actor:{}", actor.actor_id),
        kind: ClusterKind::Actor,
        rule: ResolutionRule::ActorFallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::StaticInfraRegistry;
    use actorgraph_core::{ActorType, SourceTier};

    fn actor(id: &str) -> ActorRecord {
        ActorRecord::new(id, ActorType::Whale, SourceTier::Attributed)
    }

    #[test]
    fn entity_binding_outranks_owner() {
        let registry = StaticInfraRegistry::new();
        let record = actor("a").with_entity("acme").with_owner("treasury");
        let assignment = resolve_cluster(&record, &registry);
        assert_eq!(assignment.cluster_id, "entity:acme");
        assert_eq!(assignment.kind, ClusterKind::Entity);
        assert_eq!(assignment.rule, ResolutionRule::EntityBinding);
    }

    #[test]
    fn blank_entity_falls_through_to_owner() {
        let registry = StaticInfraRegistry::new();
        let record = actor("a").with_entity("   ").with_owner("treasury");
        let assignment = resolve_cluster(&record, &registry);
        assert_eq!(assignment.cluster_id, "owner:treasury");
    }

    #[test]
    fn community_uses_first_non_blank_binding() {
        let registry = StaticInfraRegistry::new();
        let record = actor("a")
            .with_funding_source("fund-7")
            .with_dominant_counterparty("mm-1");
        let assignment = resolve_cluster(&record, &registry);
        assert_eq!(assignment.cluster_id, "community:fund-7");
        assert_eq!(assignment.rule, ResolutionRule::CommunityBinding);

        let hub_only = actor("b").with_hub("hub-3");
        assert_eq!(derive_community_id(&hub_only).as_deref(), Some("hub-3"));
    }

    #[test]
    fn infra_address_matches_registry() {
        let registry = StaticInfraRegistry::new();
        let record = actor("a").with_addresses(vec![
            "0xUnknownAddr".to_string(),
            "0x2910543AF39ABA0CD09DBB2D50200B3E800A63D2".to_string(),
        ]);
        let assignment = resolve_cluster(&record, &registry);
        assert_eq!(assignment.cluster_id, "infra:kraken_hot");
        assert_eq!(assignment.kind, ClusterKind::Infra);
    }

    #[test]
    fn explicit_infra_id_needs_no_registry_hit() {
        let registry = StaticInfraRegistry::new();
        let record = actor("mm-desk")
            .with_addresses(vec!["0xNotInTheTable".to_string()])
            .with_infra("wintermute_mm");
        let assignment = resolve_cluster(&record, &registry);
        assert_eq!(assignment.cluster_id, "infra:wintermute_mm");
        assert_eq!(assignment.kind, ClusterKind::Infra);
        assert_eq!(assignment.rule, ResolutionRule::InfraMatch);

        // community still outranks infra membership
        let bound = actor("x").with_hub("hub-1").with_infra("wintermute_mm");
        assert_eq!(
            resolve_cluster(&bound, &registry).cluster_id,
            "community:hub-1"
        );
    }

    #[test]
    fn bare_actor_gets_singleton_cluster() {
        let registry = StaticInfraRegistry::new();
        let assignment = resolve_cluster(&actor("lone-wolf"), &registry);
        assert_eq!(assignment.cluster_id, "actor:lone-wolf");
        assert_eq!(assignment.kind, ClusterKind::Actor);
        assert_eq!(assignment.rule, ResolutionRule::ActorFallback);
    }
}
