//! Tests for audit sink

use ab_pool_resolver::core::{build_audit_event, AssignmentChange, AuditSink, InMemoryAuditSink, SessionId};
use ab_pool_resolver::util::PlayerId;
use uuid::Uuid;

fn assign(session: &str, player: i64) -> AssignmentChange {
    AssignmentChange::Assign {
        session_id: SessionId::from(session),
        player: PlayerId::Number(player),
    }
}

#[test]
fn test_in_memory_audit_sink() {
    let mut sink = InMemoryAuditSink::new(10);
    let pass_id = Uuid::new_v4();

    sink.record(build_audit_event(pass_id, "clip", &assign("vt1", 1), 500));
    assert_eq!(sink.events().len(), 1);

    let events = sink.events();
    assert_eq!(events[0].pass_id, pass_id);
    assert_eq!(events[0].session_id, "vt1");
    assert_eq!(events[0].action, "assign");
    assert_eq!(events[0].resolved_at, 500);
}

#[test]
fn test_audit_sink_overflow() {
    let mut sink = InMemoryAuditSink::new(2);
    let pass_id = Uuid::new_v4();

    sink.record(build_audit_event(pass_id, "clip", &assign("vt1", 1), 0));
    sink.record(build_audit_event(pass_id, "clip", &assign("vt2", 2), 0));
    sink.record(build_audit_event(pass_id, "clip", &assign("vt3", 1), 0));

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].session_id, "vt2"); // First one popped
    assert_eq!(events[1].session_id, "vt3");
}

#[test]
fn test_build_audit_event_reassign() {
    let pass_id = Uuid::new_v4();
    let change = AssignmentChange::Reassign {
        session_id: SessionId::from("vt1"),
        from: PlayerId::Number(1),
        to: PlayerId::Number(2),
    };
    let event = build_audit_event(pass_id, "clip", &change, 42);

    assert_eq!(event.pool, "clip");
    assert_eq!(event.action, "reassign");
    assert_eq!(event.payload, Some("from=1 to=2".to_string()));
    assert_eq!(event.event_id, format!("{pass_id}-reassign-vt1"));
    assert!(event.created_at_ms > 0);
}
