//! Tests for error and warning types

use ab_pool_resolver::core::{ConfigurationWarning, ResolverError, ResolverWarning, SessionId};
use ab_pool_resolver::util::PlayerId;

#[test]
fn test_invalid_config_error() {
    let err = ResolverError::InvalidConfig("no pools".to_string());
    assert_eq!(format!("{}", err), "invalid configuration: no pools");
}

#[test]
fn test_parse_error() {
    let err = ResolverError::Parse("eof".to_string());
    assert_eq!(format!("{}", err), "parse error: eof");
}

#[test]
fn test_unknown_pool_warning() {
    let warning = ConfigurationWarning::UnknownPool {
        pool: "gfx".to_string(),
        object_id: "obj1".to_string(),
    };
    assert_eq!(format!("{}", warning), "object `obj1` references unknown pool `gfx`");
}

#[test]
fn test_configuration_warning_wraps() {
    let warning: ResolverWarning = ConfigurationWarning::RuleUnknownDeviceType {
        layer: "clip_pending".to_string(),
        device_type: "quantel".to_string(),
    }
    .into();
    assert_eq!(
        format!("{}", warning),
        "configuration: layer rule `clip_pending` targets unknown device type `quantel`"
    );
}

#[test]
fn test_unassignable_warning() {
    let warning = ResolverWarning::Unassignable {
        pool: "clip".to_string(),
        session_id: SessionId::from("vt1"),
    };
    assert_eq!(format!("{}", warning), "no free player in pool `clip` for session `vt1`");
}

#[test]
fn test_invariant_violation_warning() {
    let warning = ResolverWarning::InvariantViolation {
        pool: "clip".to_string(),
        player: PlayerId::Number(2),
        session_id: SessionId::from("vt2"),
    };
    assert_eq!(
        format!("{}", warning),
        "player 2 in pool `clip` double-booked; dropped session `vt2`"
    );
}

#[test]
fn test_warning_serializes_with_category() {
    let warning = ResolverWarning::Unassignable {
        pool: "clip".to_string(),
        session_id: SessionId::from("vt1"),
    };
    let json = serde_json::to_value(&warning).unwrap();
    assert_eq!(json["category"], "unassignable");
    assert_eq!(json["detail"]["pool"], "clip");
}
