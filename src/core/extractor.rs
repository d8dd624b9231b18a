//! Session extraction from candidate timeline objects.

use std::collections::BTreeMap;

use crate::core::error::ConfigurationWarning;
use crate::core::resolver::{PoolTable, ResolverOptions};
use crate::core::session::{SessionId, SessionRequest, TimelineObject};
use crate::util::clock::duration_to_ms;
use crate::util::serde::{TimeMs, TimeWindow};

/// Requests found in one pass plus configuration problems met on the way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Merged requests, ordered by pool then session.
    pub requests: Vec<SessionRequest>,
    /// Skipped declarations.
    pub warnings: Vec<ConfigurationWarning>,
}

impl Extraction {
    /// Requests belonging to `pool`.
    pub fn for_pool<'a>(&'a self, pool: &'a str) -> impl Iterator<Item = &'a SessionRequest> + 'a {
        self.requests.iter().filter(move |r| r.pool_name == pool)
    }
}

/// Whether an object takes part in the pass at `now`.
///
/// Anything already playing counts, as does anything starting before the
/// horizon. Zero-length objects count only while they still lie ahead.
#[must_use]
pub fn in_resolve_window(window: &TimeWindow, now: TimeMs, horizon: TimeMs) -> bool {
    if window.start > horizon {
        return false;
    }
    if window.is_empty() {
        return window.start >= now;
    }
    !window.has_ended(now)
}

/// Walk the candidate objects and produce one request per `(pool, session)`.
///
/// Declarations sharing a session merge into the hull of their windows; the
/// merged request is optional only if every declaration is. Lookahead objects
/// always declare optionally.
pub fn extract(
    objects: &[TimelineObject],
    pools: &PoolTable,
    options: &ResolverOptions,
    now: TimeMs,
) -> Extraction {
    let horizon = now.saturating_add(duration_to_ms(options.now_window));
    let mut merged: BTreeMap<(String, SessionId), SessionRequest> = BTreeMap::new();
    let mut warnings = Vec::new();

    for obj in objects {
        if obj.ab_sessions.is_empty() || !in_resolve_window(&obj.enable, now, horizon) {
            continue;
        }
        for decl in &obj.ab_sessions {
            if !pools.contains_key(&decl.pool_name) {
                tracing::warn!("object {} references unknown pool {}", obj.id, decl.pool_name);
                warnings.push(ConfigurationWarning::UnknownPool {
                    pool: decl.pool_name.clone(),
                    object_id: obj.id.clone(),
                });
                continue;
            }
            let Some(session_id) = decl.session.resolve(obj.piece_instance_id.as_ref()) else {
                tracing::warn!("object {} has an auto session without piece instance", obj.id);
                warnings.push(ConfigurationWarning::AutoSessionWithoutPieceInstance {
                    pool: decl.pool_name.clone(),
                    object_id: obj.id.clone(),
                });
                continue;
            };
            let optional = decl.optional || obj.is_lookahead;

            merged
                .entry((decl.pool_name.clone(), session_id.clone()))
                .and_modify(|req| {
                    req.window = req.window.hull(&obj.enable);
                    req.optional &= optional;
                })
                .or_insert_with(|| SessionRequest {
                    pool_name: decl.pool_name.clone(),
                    session_id,
                    window: obj.enable,
                    optional,
                });
        }
    }

    tracing::debug!("extracted {} session requests at {}", merged.len(), now);
    Extraction {
        requests: merged.into_values().collect(),
        warnings,
    }
}
