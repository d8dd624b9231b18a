//! Carried-forward resolver state.
//!
//! Owned by the caller and handed to the resolver by reference: a commit pass
//! takes `&mut ResolverState`, a preview pass works on a clone. Nothing here is
//! global, so two studios simply hold two states.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::core::session::SessionId;
use crate::util::serde::{PlayerId, TimeMs, TimeWindow};

/// A session's claim on one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assignment {
    /// Assigned player.
    pub player: PlayerId,
    /// Window the claim covers.
    pub window: TimeWindow,
    /// Whether the session was best-effort.
    pub optional: bool,
    /// When this player was first given to the session.
    pub assigned_at: TimeMs,
}

/// How a session's assignment moved between two passes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AssignmentChange {
    /// Session received a player for the first time.
    Assign {
        /// Session.
        session_id: SessionId,
        /// New player.
        player: PlayerId,
    },
    /// Session moved to another player.
    Reassign {
        /// Session.
        session_id: SessionId,
        /// Previous player.
        from: PlayerId,
        /// New player.
        to: PlayerId,
    },
    /// Session is no longer requested and gave its player back.
    Release {
        /// Session.
        session_id: SessionId,
        /// Released player.
        player: PlayerId,
    },
    /// Session is still requested but lost its player.
    Unassign {
        /// Session.
        session_id: SessionId,
        /// Lost player.
        player: PlayerId,
    },
}

impl AssignmentChange {
    /// Session the change concerns.
    #[must_use]
    pub const fn session_id(&self) -> &SessionId {
        match self {
            Self::Assign { session_id, .. }
            | Self::Reassign { session_id, .. }
            | Self::Release { session_id, .. }
            | Self::Unassign { session_id, .. } => session_id,
        }
    }

    /// Short action name used in audit records.
    #[must_use]
    pub const fn action(&self) -> &'static str {
        match self {
            Self::Assign { .. } => "assign",
            Self::Reassign { .. } => "reassign",
            Self::Release { .. } => "release",
            Self::Unassign { .. } => "unassigned",
        }
    }
}

/// Per-pool bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolState {
    assignments: BTreeMap<SessionId, Assignment>,
    last_player_for_session: BTreeMap<SessionId, PlayerId>,
    absent_passes: BTreeMap<SessionId, u32>,
    player_released_at: BTreeMap<PlayerId, TimeMs>,
}

impl PoolState {
    /// Live assignments from the last committed pass.
    #[must_use]
    pub const fn assignments(&self) -> &BTreeMap<SessionId, Assignment> {
        &self.assignments
    }

    /// Player a session last held, if it is still remembered.
    #[must_use]
    pub fn last_player_for(&self, session_id: &SessionId) -> Option<&PlayerId> {
        self.last_player_for_session.get(session_id)
    }

    /// When `player` was last given back.
    #[must_use]
    pub fn released_at(&self, player: &PlayerId) -> Option<TimeMs> {
        self.player_released_at.get(player).copied()
    }

    /// Whether any map still mentions the session.
    #[must_use]
    pub fn remembers(&self, session_id: &SessionId) -> bool {
        self.assignments.contains_key(session_id)
            || self.last_player_for_session.contains_key(session_id)
            || self.absent_passes.contains_key(session_id)
    }

    /// Replace the live assignments with `placed` and age everything else.
    ///
    /// Remembered players survive one absent pass and are forgotten on the second.
    pub(crate) fn apply(
        &mut self,
        placed: BTreeMap<SessionId, Assignment>,
        requested: &BTreeSet<SessionId>,
        players: &[PlayerId],
        now: TimeMs,
    ) -> Vec<AssignmentChange> {
        let mut changes = Vec::new();

        for (session_id, old) in &self.assignments {
            match placed.get(session_id) {
                Some(new) if new.player == old.player => continue,
                Some(new) => changes.push(AssignmentChange::Reassign {
                    session_id: session_id.clone(),
                    from: old.player.clone(),
                    to: new.player.clone(),
                }),
                None if requested.contains(session_id) => changes.push(AssignmentChange::Unassign {
                    session_id: session_id.clone(),
                    player: old.player.clone(),
                }),
                None => changes.push(AssignmentChange::Release {
                    session_id: session_id.clone(),
                    player: old.player.clone(),
                }),
            }
            let released = old.window.end_bound().min(now);
            let entry = self.player_released_at.entry(old.player.clone()).or_insert(released);
            *entry = (*entry).max(released);
        }
        for (session_id, new) in &placed {
            if !self.assignments.contains_key(session_id) {
                changes.push(AssignmentChange::Assign {
                    session_id: session_id.clone(),
                    player: new.player.clone(),
                });
            }
        }

        for (session_id, assignment) in &placed {
            self.last_player_for_session
                .insert(session_id.clone(), assignment.player.clone());
        }
        self.absent_passes.retain(|sid, _| !requested.contains(sid));

        let absent: Vec<SessionId> = self
            .last_player_for_session
            .keys()
            .filter(|sid| !requested.contains(*sid))
            .cloned()
            .collect();
        for session_id in absent {
            let passes = self.absent_passes.entry(session_id.clone()).or_insert(0);
            *passes += 1;
            if *passes >= 2 {
                self.absent_passes.remove(&session_id);
                self.last_player_for_session.remove(&session_id);
            }
        }

        self.player_released_at.retain(|player, _| players.contains(player));
        self.assignments = placed;
        changes
    }
}

/// State carried between resolve passes, one entry per pool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolverState {
    pools: BTreeMap<String, PoolState>,
    passes: u64,
    last_resolved_at: Option<TimeMs>,
}

impl ResolverState {
    /// Empty state, as after studio activation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// State of one pool, if it has ever been resolved.
    #[must_use]
    pub fn pool(&self, name: &str) -> Option<&PoolState> {
        self.pools.get(name)
    }

    pub(crate) fn pool_mut(&mut self, name: &str) -> &mut PoolState {
        self.pools.entry(name.to_owned()).or_default()
    }

    /// Names of pools with state.
    pub fn pool_names(&self) -> impl Iterator<Item = &str> {
        self.pools.keys().map(String::as_str)
    }

    /// Committed passes since the last reset.
    #[must_use]
    pub const fn passes(&self) -> u64 {
        self.passes
    }

    /// `now` of the last committed pass.
    #[must_use]
    pub const fn last_resolved_at(&self) -> Option<TimeMs> {
        self.last_resolved_at
    }

    /// Whether `session_id` is mentioned anywhere in `pool`.
    #[must_use]
    pub fn contains_session(&self, pool: &str, session_id: &SessionId) -> bool {
        self.pools.get(pool).is_some_and(|p| p.remembers(session_id))
    }

    /// Player currently assigned to a session.
    #[must_use]
    pub fn player_for(&self, pool: &str, session_id: &SessionId) -> Option<&PlayerId> {
        self.pools
            .get(pool)
            .and_then(|p| p.assignments.get(session_id))
            .map(|a| &a.player)
    }

    /// Forget everything. Only called on explicit reset.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn retain_pools<'a>(&mut self, configured: impl IntoIterator<Item = &'a str>) {
        let configured: BTreeSet<&str> = configured.into_iter().collect();
        self.pools.retain(|name, _| configured.contains(name.as_str()));
    }

    pub(crate) fn record_pass(&mut self, now: TimeMs) {
        self.passes += 1;
        self.last_resolved_at = Some(now);
    }
}
