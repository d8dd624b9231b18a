//! Tests for the studio handle and API models

use std::collections::HashMap;

use ab_pool_resolver::builders::ResolverBuilder;
use ab_pool_resolver::config::{PoolConfig, ResolverConfig};
use ab_pool_resolver::core::{LayerChangeRule, ResolveMode, ResolverOptions, SessionId, SessionName, TimelineObject};
use ab_pool_resolver::runtime::{handle_resolve, health, list_pools, ResolveRequest, StudioResolver};
use ab_pool_resolver::util::{PlayerId, TimeWindow};

fn studio() -> StudioResolver {
    let resolver = ResolverBuilder::new(ResolverOptions::default())
        .with_pool("clip", vec![PlayerId::Number(1), PlayerId::Number(2)])
        .with_layer_rule("clip_pending", LayerChangeRule::template(["clip"], "player_{player}"))
        .build()
        .unwrap();
    StudioResolver::new(resolver)
}

fn clip(name: &str, start: u64) -> TimelineObject {
    TimelineObject::new(name, "clip_pending", TimeWindow::open(start)).with_session(
        "clip",
        SessionName::Named(name.to_string()),
        false,
    )
}

#[test]
fn test_studio_commit_and_preview() {
    let studio = studio();
    studio.commit(vec![clip("a", 0)], 0);
    let committed = studio.state();

    let preview = studio.preview(vec![clip("a", 0), clip("b", 100)], 100);
    assert_eq!(preview.objects[1].layer, "player_2");
    assert_eq!(studio.state(), committed);
    assert_eq!(studio.assignments()["clip"].len(), 1);
}

#[test]
fn test_studio_reset() {
    let studio = studio();
    studio.commit(vec![clip("a", 0)], 0);
    studio.reset();
    assert_eq!(studio.state().passes(), 0);
    assert!(studio.assignments()["clip"].is_empty());
}

#[test]
fn test_handle_resolve_modes() {
    let studio = studio();
    let req = ResolveRequest {
        objects: vec![clip("a", 0)],
        now: 0,
        mode: ResolveMode::Preview,
    };
    let res = handle_resolve(&studio, req);
    assert_eq!(res.mode, ResolveMode::Preview);
    assert_eq!(res.assignments[0].player_for(&SessionId::from("a")), Some(&PlayerId::Number(1)));
    assert_eq!(studio.state().passes(), 0);

    let req: ResolveRequest = serde_json::from_value(serde_json::json!({
        "objects": [{
            "id": "a",
            "layer": "clip_pending",
            "enable": { "start": 0 },
            "ab_sessions": [{ "pool_name": "clip", "session": { "named": "a" } }]
        }],
        "now": 0,
        "mode": "commit"
    }))
    .unwrap();
    let res = handle_resolve(&studio, req);
    assert_eq!(res.objects[0].layer, "player_1");
    assert_eq!(studio.state().passes(), 1);

    let json = serde_json::to_value(&res).unwrap();
    assert_eq!(json["assignments"][0]["assignments"][0]["player"], 1);
    assert_eq!(json["objects"][0]["ab_player"], 1);
}

#[test]
fn test_list_pools_and_health() {
    let mut pools = HashMap::new();
    pools.insert("vt".to_string(), PoolConfig { players: vec![PlayerId::Number(1)] });
    pools.insert("clip".to_string(), PoolConfig { players: vec![PlayerId::Number(2)] });
    let cfg = ResolverConfig {
        pools,
        layer_rules: HashMap::new(),
        known_device_types: Vec::new(),
        ideal_gap_before_ms: 0,
        now_window_ms: 1000,
    };
    let listed = list_pools(&cfg);
    assert_eq!(listed[0].name, "clip");
    assert_eq!(listed[1].name, "vt");
    assert!(health().ok);
}
