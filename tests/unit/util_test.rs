//! Tests for utility types

use ab_pool_resolver::util::{duration_to_ms, init_tracing, PieceInstanceRef, PlayerId, TimeWindow};
use std::time::Duration;

#[test]
fn test_player_id_ordering() {
    assert!(PlayerId::Number(2) < PlayerId::Number(10));
    assert!(PlayerId::Number(99) < PlayerId::Name("a".to_string()));
}

#[test]
fn test_player_id_untagged_json() {
    let players: Vec<PlayerId> = serde_json::from_str(r#"[1, "gpi_a"]"#).unwrap();
    assert_eq!(players, vec![PlayerId::Number(1), PlayerId::Name("gpi_a".to_string())]);
    assert_eq!(players[1].to_string(), "gpi_a");
}

#[test]
fn test_half_open_overlap() {
    let a = TimeWindow::new(0, 10);
    assert!(a.overlaps(&TimeWindow::new(9, 20)));
    assert!(!a.overlaps(&TimeWindow::new(10, 20)));
    assert!(a.overlaps(&TimeWindow::open(5)));
    assert!(!a.overlaps(&TimeWindow::new(5, 5)));
}

#[test]
fn test_window_hull_and_contains() {
    let hull = TimeWindow::new(5, 10).hull(&TimeWindow::new(0, 7));
    assert_eq!(hull, TimeWindow::new(0, 10));
    assert_eq!(TimeWindow::new(5, 10).hull(&TimeWindow::open(8)), TimeWindow::open(5));
    assert!(hull.contains(0));
    assert!(!hull.contains(10));
}

#[test]
fn test_window_display() {
    assert_eq!(TimeWindow::new(1, 2).to_string(), "[1, 2)");
    assert_eq!(TimeWindow::open(1).to_string(), "[1, inf)");
}

#[test]
fn test_duration_to_ms_saturates() {
    assert_eq!(duration_to_ms(Duration::from_millis(1500)), 1500);
    assert_eq!(duration_to_ms(Duration::MAX), u64::MAX);
}

#[test]
fn test_piece_instance_ref_transparent() {
    let owner: PieceInstanceRef = serde_json::from_str(r#""pi_1""#).unwrap();
    assert_eq!(owner, PieceInstanceRef::from("pi_1"));
}

#[test]
fn test_init_tracing_twice() {
    init_tracing();
    init_tracing();
    tracing::info!("tracing initialized");
}
