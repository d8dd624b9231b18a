//! API-facing request/response models.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ResolverConfig;
use crate::core::{PoolAssignment, ResolveMode, ResolveOutcome, ResolverWarning, SessionRequest, TimelineObject};
use crate::runtime::studio::StudioResolver;
use crate::util::serde::{PlayerId, TimeMs};

/// Resolve request from the timeline pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveRequest {
    /// Candidate timeline objects.
    pub objects: Vec<TimelineObject>,
    /// Timeline time of the pass.
    pub now: TimeMs,
    /// Commit or preview.
    pub mode: ResolveMode,
}

/// Resolve response returned to the timeline pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct ResolveResponse {
    /// Pass identifier.
    pub pass_id: Uuid,
    /// Commit or preview.
    pub mode: ResolveMode,
    /// Rewritten objects.
    pub objects: Vec<TimelineObject>,
    /// Per-pool assignment snapshot.
    pub assignments: Vec<PoolAssignment>,
    /// Non-optional sessions without a player.
    pub unassigned: Vec<SessionRequest>,
    /// Non-fatal diagnostics.
    pub warnings: Vec<ResolverWarning>,
}

impl From<ResolveOutcome> for ResolveResponse {
    fn from(outcome: ResolveOutcome) -> Self {
        Self {
            pass_id: outcome.pass_id,
            mode: outcome.mode,
            objects: outcome.objects,
            assignments: outcome.assignments.into_values().collect(),
            unassigned: outcome.unassigned,
            warnings: outcome.warnings,
        }
    }
}

/// Pool snapshot data for listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolSnapshot {
    /// Pool identifier.
    pub name: String,
    /// Players in preference order.
    pub players: Vec<PlayerId>,
}

/// Health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    /// Healthy flag.
    pub ok: bool,
}

/// Run one pass for a request.
pub fn handle_resolve(studio: &StudioResolver, req: ResolveRequest) -> ResolveResponse {
    let outcome = match req.mode {
        ResolveMode::Commit => studio.commit(req.objects, req.now),
        ResolveMode::Preview => studio.preview(req.objects, req.now),
    };
    outcome.into()
}

/// Build pool listings from config, ordered by name.
#[must_use]
pub fn list_pools(cfg: &ResolverConfig) -> Vec<PoolSnapshot> {
    let mut pools: Vec<PoolSnapshot> = cfg
        .pools
        .iter()
        .map(|(name, pool)| PoolSnapshot {
            name: name.clone(),
            players: pool.players.clone(),
        })
        .collect();
    pools.sort_by(|a, b| a.name.cmp(&b.name));
    pools
}

/// Return a health payload.
#[must_use]
pub const fn health() -> Health {
    Health { ok: true }
}
