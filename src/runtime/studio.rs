//! Host-facing handle that owns one studio's committed state.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::{AbResolver, PoolAssignment, ResolveOutcome, ResolverState, TimelineObject};
use crate::util::serde::TimeMs;

/// One studio's resolver plus its committed state.
///
/// Passes for the same studio are serialized on the state lock. Previews
/// clone the state under the lock and resolve after releasing it.
#[derive(Debug)]
pub struct StudioResolver {
    resolver: Arc<AbResolver>,
    state: Mutex<ResolverState>,
}

impl StudioResolver {
    /// Wrap a resolver with fresh state.
    #[must_use]
    pub fn new(resolver: AbResolver) -> Self {
        Self::from_shared(Arc::new(resolver))
    }

    /// Wrap a shared resolver with fresh state.
    #[must_use]
    pub fn from_shared(resolver: Arc<AbResolver>) -> Self {
        Self {
            resolver,
            state: Mutex::new(ResolverState::new()),
        }
    }

    /// The configured resolver.
    #[must_use]
    pub fn resolver(&self) -> &AbResolver {
        &self.resolver
    }

    /// Resolve and commit.
    pub fn commit(&self, objects: Vec<TimelineObject>, now: TimeMs) -> ResolveOutcome {
        let mut state = self.state.lock();
        self.resolver.commit(&mut state, objects, now)
    }

    /// Resolve against a snapshot of the committed state.
    pub fn preview(&self, objects: Vec<TimelineObject>, now: TimeMs) -> ResolveOutcome {
        let snapshot = self.state.lock().clone();
        let (_, outcome) = self.resolver.preview(&snapshot, objects, now);
        outcome
    }

    /// Drop all carried state, e.g. on studio reactivation.
    pub fn reset(&self) {
        self.state.lock().reset();
        tracing::info!("resolver state reset");
    }

    /// Copy of the committed state.
    #[must_use]
    pub fn state(&self) -> ResolverState {
        self.state.lock().clone()
    }

    /// Committed assignments per configured pool.
    #[must_use]
    pub fn assignments(&self) -> BTreeMap<String, PoolAssignment> {
        let state = self.state.lock();
        self.resolver
            .pools()
            .keys()
            .map(|name| {
                let assignments = state
                    .pool(name)
                    .map(|p| p.assignments().clone())
                    .unwrap_or_default();
                (
                    name.clone(),
                    PoolAssignment {
                        pool: name.clone(),
                        assignments,
                    },
                )
            })
            .collect()
    }
}
