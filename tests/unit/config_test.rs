//! Tests for configuration validation

use std::collections::HashMap;

use ab_pool_resolver::config::{LayerRuleConfig, PoolConfig, ResolverConfig};
use ab_pool_resolver::core::ResolverError;
use ab_pool_resolver::util::PlayerId;

fn pool(players: &[i64]) -> PoolConfig {
    PoolConfig {
        players: players.iter().copied().map(PlayerId::Number).collect(),
    }
}

fn config() -> ResolverConfig {
    let mut pools = HashMap::new();
    pools.insert("clip".to_string(), pool(&[1, 2]));
    ResolverConfig {
        pools,
        layer_rules: HashMap::new(),
        known_device_types: Vec::new(),
        ideal_gap_before_ms: 1000,
        now_window_ms: 2000,
    }
}

#[test]
fn test_pool_config_validation() {
    assert!(pool(&[1, 2]).validate().is_ok());
}

#[test]
fn test_pool_config_empty_players() {
    assert!(pool(&[]).validate().is_err());
}

#[test]
fn test_pool_config_duplicate_players() {
    let err = pool(&[1, 1]).validate().unwrap_err();
    assert!(err.contains("listed twice"));
}

#[test]
fn test_layer_rule_requires_placeholder() {
    let rule = LayerRuleConfig {
        accepted_pool_names: vec!["clip".to_string()],
        new_layer_template: "casparcg_player".to_string(),
        allows_lookahead: false,
        device_type: None,
    };
    assert!(rule.validate().is_err());
}

#[test]
fn test_resolver_config_validation() {
    assert!(config().validate().is_ok());
}

#[test]
fn test_resolver_config_empty_pools() {
    let mut cfg = config();
    cfg.pools.clear();
    assert!(cfg.validate().is_err());
}

#[test]
fn test_resolver_config_zero_now_window() {
    let mut cfg = config();
    cfg.now_window_ms = 0;
    assert!(cfg.validate().is_err());
}

#[test]
fn test_resolver_config_from_json() {
    let json = r#"{
        "pools": {
            "clip": { "players": [1, 2] },
            "gpi": { "players": ["gpi_a", "gpi_b"] }
        },
        "layer_rules": {
            "clip_pending": {
                "accepted_pool_names": ["clip"],
                "new_layer_template": "casparcg_player_clip_{player}",
                "allows_lookahead": true
            }
        }
    }"#;

    let cfg = ResolverConfig::from_json_str(json).unwrap();
    assert_eq!(cfg.pools["gpi"].players[0], PlayerId::Name("gpi_a".to_string()));
    assert!(cfg.layer_rules["clip_pending"].allows_lookahead);
    assert_eq!(cfg.ideal_gap_before_ms, 1000);
    assert_eq!(cfg.now_window_ms, 2000);
}

#[test]
fn test_resolver_config_from_json_invalid() {
    let err = ResolverConfig::from_json_str(r#"{ "pools": { "clip": { "players": [] } } }"#).unwrap_err();
    assert!(matches!(err, ResolverError::InvalidConfig(_)));

    let err = ResolverConfig::from_json_str("{").unwrap_err();
    assert!(matches!(err, ResolverError::Parse(_)));
}

#[test]
fn test_resolver_config_from_path() {
    let path = std::env::temp_dir().join(format!("ab_resolver_cfg_{}.json", std::process::id()));
    std::fs::write(&path, r#"{ "pools": { "clip": { "players": [1] } } }"#).unwrap();

    let cfg = ResolverConfig::from_path(&path).unwrap();
    assert_eq!(cfg.pools.len(), 1);

    std::fs::remove_file(&path).unwrap();
    assert!(ResolverConfig::from_path(&path).is_err());
}
