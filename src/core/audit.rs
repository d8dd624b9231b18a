//! Audit sink implementations.
//!
//! Committed passes record one event per assignment change so operators can
//! reconstruct why a player switched. Preview passes never record.

use std::collections::VecDeque;

use uuid::Uuid;

use crate::core::state::AssignmentChange;
use crate::util::clock::now_ms;
use crate::util::serde::TimeMs;

/// Audit event structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// Event identifier.
    pub event_id: String,
    /// Resolve pass that produced the event.
    pub pass_id: Uuid,
    /// Pool identifier.
    pub pool: String,
    /// Session identifier.
    pub session_id: String,
    /// Action taken (assign, reassign, release, unassigned).
    pub action: String,
    /// Timeline time of the pass.
    pub resolved_at: TimeMs,
    /// Wall-clock timestamp in milliseconds.
    pub created_at_ms: TimeMs,
    /// Additional context.
    pub payload: Option<String>,
}

/// Audit sink abstraction.
pub trait AuditSink: Send {
    /// Record an audit event.
    fn record(&mut self, event: AuditEvent);
}

/// In-memory audit sink for testing and dev.
pub struct InMemoryAuditSink {
    events: VecDeque<AuditEvent>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Create a new in-memory sink with a bounded buffer.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_events),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.iter().cloned().collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&mut self, event: AuditEvent) {
        if self.max_events == 0 {
            return;
        }
        if self.events.len() >= self.max_events {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }
}

/// Build the audit event describing one assignment change.
#[must_use]
pub fn build_audit_event(
    pass_id: Uuid,
    pool: impl Into<String>,
    change: &AssignmentChange,
    resolved_at: TimeMs,
) -> AuditEvent {
    let session_id = change.session_id().to_string();
    let payload = match change {
        AssignmentChange::Assign { player, .. }
        | AssignmentChange::Release { player, .. }
        | AssignmentChange::Unassign { player, .. } => format!("player={player}"),
        AssignmentChange::Reassign { from, to, .. } => format!("from={from} to={to}"),
    };
    AuditEvent {
        event_id: format!("{pass_id}-{}-{session_id}", change.action()),
        pass_id,
        pool: pool.into(),
        session_id,
        action: change.action().to_string(),
        resolved_at,
        created_at_ms: now_ms(),
        payload: Some(payload),
    }
}
