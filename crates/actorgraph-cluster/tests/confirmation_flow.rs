use actorgraph_cluster::{
    apply_penalties, build_clusters, confirm_clusters, ClusterKind, PenaltyTag,
    StaticInfraRegistry,
};
use actorgraph_core::{ActorRecord, ActorType, ConfirmationConfig, SourceTier};
use approx::assert_relative_eq;

#[test]
fn single_entity_cohort_fails_minimum_count_with_trace() {
    let registry = StaticInfraRegistry::new();
    let actors = vec![
        ActorRecord::new("a", ActorType::Whale, SourceTier::Verified)
            .with_entity("acme")
            .with_weight(1.0)
            .with_source_group("nansen"),
        ActorRecord::new("b", ActorType::Fund, SourceTier::Verified)
            .with_entity("acme")
            .with_weight(0.8)
            .with_source_group("arkham"),
        ActorRecord::new("c", ActorType::Whale, SourceTier::Attributed)
            .with_entity("acme")
            .with_weight(0.6)
            .with_source_group("nansen"),
    ];

    let (clusters, trace) = build_clusters(&actors, &registry);
    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].actor_ids.len(), 3);
    assert_relative_eq!(clusters[0].total_weight, 2.4);

    let result = confirm_clusters(&clusters, &ConfirmationConfig::default()).with_trace(trace);
    assert!(!result.passed);
    assert_eq!(result.reason.as_deref(), Some("below minimum cluster count"));
    assert_eq!(result.source_groups, ["arkham", "nansen"]);
    assert_eq!(result.trace.len(), 3);
    assert!(result
        .trace
        .iter()
        .all(|entry| entry.cluster_id == "entity:acme"));
}

#[test]
fn diversified_cohort_confirms_without_penalty() {
    let registry = StaticInfraRegistry::new();
    let actors = vec![
        ActorRecord::new("a", ActorType::Whale, SourceTier::Verified)
            .with_entity("acme")
            .with_weight(0.7)
            .with_source_group("nansen"),
        ActorRecord::new("b", ActorType::Exchange, SourceTier::Verified)
            .with_entity("acme")
            .with_weight(0.3)
            .with_source_group("nansen"),
        ActorRecord::new("c", ActorType::Whale, SourceTier::Verified)
            .with_owner("zen-capital")
            .with_weight(0.6)
            .with_source_group("arkham"),
        ActorRecord::new("d", ActorType::Fund, SourceTier::Verified)
            .with_owner("zen-capital")
            .with_weight(0.4)
            .with_source_group("arkham"),
    ];

    let (clusters, _) = build_clusters(&actors, &registry);
    assert_eq!(clusters.len(), 2);

    let config = ConfirmationConfig::default();
    let result = confirm_clusters(&clusters, &config);
    assert!(result.passed);
    assert_relative_eq!(result.dominance, 0.5);
    assert!(result.penalties.is_empty());

    let adjustment = apply_penalties(&result, 90.0, &config);
    assert_relative_eq!(adjustment.adjusted, 90.0);
    assert!(adjustment.steps.is_empty());
    assert!(!adjustment.capped);
}

#[test]
fn infra_address_flows_through_to_the_informational_tag() {
    let registry = StaticInfraRegistry::new();
    let actors = vec![
        ActorRecord::new("router", ActorType::Bot, SourceTier::Behavioral)
            .with_addresses(vec![
                "0x722122dF12D4e14e13Ac3b6895a86e84145b6967".to_string(),
            ])
            .with_weight(1.0)
            .with_source_group("chain-heuristics"),
        ActorRecord::new("whale", ActorType::Whale, SourceTier::Verified)
            .with_entity("acme")
            .with_weight(1.0)
            .with_source_group("nansen"),
    ];

    let (clusters, _) = build_clusters(&actors, &registry);
    assert_eq!(clusters.len(), 2);
    assert!(clusters
        .iter()
        .any(|c| c.kind == ClusterKind::Infra && c.cluster_id == "infra:tornado_cash_router"));

    let result = confirm_clusters(&clusters, &ConfirmationConfig::default());
    assert!(result.penalties.contains(&PenaltyTag::InfraClusterDetected));
}

#[test]
fn explicit_infra_id_fires_the_tag_without_an_address_hit() {
    let registry = StaticInfraRegistry::new();
    let actors = vec![
        ActorRecord::new("desk", ActorType::MarketMaker, SourceTier::Attributed)
            .with_addresses(vec!["0xFreshDepositAddr".to_string()])
            .with_infra("wintermute_mm")
            .with_weight(1.0)
            .with_source_group("chain-heuristics"),
        ActorRecord::new("whale", ActorType::Whale, SourceTier::Verified)
            .with_entity("acme")
            .with_weight(1.0)
            .with_source_group("nansen"),
    ];

    let (clusters, _) = build_clusters(&actors, &registry);
    assert!(clusters
        .iter()
        .any(|c| c.kind == ClusterKind::Infra && c.cluster_id == "infra:wintermute_mm"));

    let result = confirm_clusters(&clusters, &ConfirmationConfig::default());
    assert!(result.penalties.contains(&PenaltyTag::InfraClusterDetected));
}

#[test]
fn result_serializes_with_wire_names() {
    let registry = StaticInfraRegistry::new();
    let actors = vec![ActorRecord::new("a", ActorType::Whale, SourceTier::Verified)
        .with_entity("acme")
        .with_source_group("nansen")];
    let (clusters, trace) = build_clusters(&actors, &registry);
    let result = confirm_clusters(&clusters, &ConfirmationConfig::default()).with_trace(trace);

    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["passed"], false);
    assert!(value.get("clusterCount").is_some());
    assert!(value.get("meanTypeDiversity").is_some());
    assert!(value.get("sourceDiversity").is_some());
    assert_eq!(value["sourceGroups"][0], "nansen");
    assert_eq!(value["trace"][0]["clusterId"], "entity:acme");
    assert_eq!(value["trace"][0]["rule"], "entity_binding");
    let tags: Vec<&str> = value["penalties"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert!(tags.contains(&"CLUSTER_DOMINANCE_HIGH"));
    assert!(tags.contains(&"LOW_TYPE_DIVERSITY"));
}
