//! Tests for builder modules

use std::collections::HashMap;

use ab_pool_resolver::builders::{build_resolver, ResolverBuilder};
use ab_pool_resolver::config::{LayerRuleConfig, PoolConfig, ResolverConfig};
use ab_pool_resolver::core::{ConfigurationWarning, LayerChangeRule, ResolverOptions};
use ab_pool_resolver::util::PlayerId;

fn players(ids: &[i64]) -> Vec<PlayerId> {
    ids.iter().copied().map(PlayerId::Number).collect()
}

#[test]
fn test_build_from_config() {
    let mut pools = HashMap::new();
    pools.insert("clip".to_string(), PoolConfig { players: players(&[1, 2]) });
    let mut layer_rules = HashMap::new();
    layer_rules.insert(
        "clip_pending".to_string(),
        LayerRuleConfig {
            accepted_pool_names: vec!["clip".to_string()],
            new_layer_template: "player_{player}".to_string(),
            allows_lookahead: false,
            device_type: None,
        },
    );
    let cfg = ResolverConfig {
        pools,
        layer_rules,
        known_device_types: Vec::new(),
        ideal_gap_before_ms: 500,
        now_window_ms: 3000,
    };

    let resolver = build_resolver(&cfg).unwrap();
    assert_eq!(resolver.pools().len(), 1);
    assert_eq!(resolver.rules().len(), 1);
    assert_eq!(resolver.options().ideal_gap_before.as_millis(), 500);
    assert_eq!(resolver.options().now_window.as_millis(), 3000);
    assert!(resolver.config_warnings().is_empty());
}

#[test]
fn test_build_requires_pool() {
    assert!(ResolverBuilder::new(ResolverOptions::default()).build().is_err());
}

#[test]
fn test_build_rejects_duplicate_players() {
    let result = ResolverBuilder::new(ResolverOptions::default())
        .with_pool("clip", players(&[1, 1]))
        .build();
    assert!(result.is_err());
}

#[test]
fn test_rule_with_unknown_pool_is_trimmed() {
    let resolver = ResolverBuilder::new(ResolverOptions::default())
        .with_pool("clip", players(&[1]))
        .with_layer_rule("mixed", LayerChangeRule::template(["clip", "nope"], "p_{player}"))
        .with_layer_rule("orphan", LayerChangeRule::template(["nope"], "p_{player}"))
        .build()
        .unwrap();

    assert_eq!(resolver.rules().keys().collect::<Vec<_>>(), vec!["mixed"]);
    assert_eq!(resolver.rules()["mixed"].accepted_pool_names.len(), 1);
    assert_eq!(resolver.config_warnings().len(), 2);
}

#[test]
fn test_rule_with_unknown_device_type_is_skipped() {
    let resolver = ResolverBuilder::new(ResolverOptions::default())
        .with_pool("clip", players(&[1]))
        .with_device_type("casparcg")
        .with_layer_rule(
            "known",
            LayerChangeRule::template(["clip"], "p_{player}").for_device_type("casparcg"),
        )
        .with_layer_rule(
            "unknown",
            LayerChangeRule::template(["clip"], "p_{player}").for_device_type("quantel"),
        )
        .build()
        .unwrap();

    assert!(resolver.rules().contains_key("known"));
    assert!(!resolver.rules().contains_key("unknown"));
    assert_eq!(
        resolver.config_warnings(),
        &[ConfigurationWarning::RuleUnknownDeviceType {
            layer: "unknown".to_string(),
            device_type: "quantel".to_string(),
        }]
    );
}

#[test]
fn test_build_rejects_zero_now_window() {
    let options = ResolverOptions {
        now_window: std::time::Duration::ZERO,
        ..ResolverOptions::default()
    };
    let result = ResolverBuilder::new(options).with_pool("clip", players(&[1])).build();
    assert!(result.is_err());
}
