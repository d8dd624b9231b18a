//! One resolve pass: extract, resolve every pool, rewrite layers.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::audit::{build_audit_event, AuditSink};
use crate::core::error::{ConfigurationWarning, ResolverWarning};
use crate::core::extractor::extract;
use crate::core::resolver::{resolve, PoolAssignment, PoolTable, ResolverOptions};
use crate::core::rewriter::{apply_assignment, CustomHook, LayerRuleTable};
use crate::core::session::{SessionRequest, TimelineObject};
use crate::core::state::{AssignmentChange, ResolverState};
use crate::util::serde::TimeMs;

/// Whether a pass persists its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveMode {
    /// Result becomes the committed state.
    Commit,
    /// Result is computed against a clone and thrown away.
    Preview,
}

/// Everything a pass hands back to the timeline pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolveOutcome {
    /// Identifier of this pass.
    pub pass_id: Uuid,
    /// Commit or preview.
    pub mode: ResolveMode,
    /// Timeline time the pass ran at.
    pub now: TimeMs,
    /// Input objects with layers rewritten.
    pub objects: Vec<TimelineObject>,
    /// Assignment snapshot per pool.
    pub assignments: BTreeMap<String, PoolAssignment>,
    /// Non-optional requests left without a player.
    pub unassigned: Vec<SessionRequest>,
    /// Non-fatal diagnostics.
    pub warnings: Vec<ResolverWarning>,
}

/// Configured resolver for one studio. Holds no per-pass state.
pub struct AbResolver {
    pools: PoolTable,
    rules: LayerRuleTable,
    options: ResolverOptions,
    hook: Option<CustomHook>,
    audit: Option<Arc<Mutex<Box<dyn AuditSink>>>>,
    config_warnings: Vec<ConfigurationWarning>,
}

impl std::fmt::Debug for AbResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AbResolver")
            .field("pools", &self.pools)
            .field("rules", &self.rules)
            .field("options", &self.options)
            .field("hook", &self.hook.is_some())
            .field("audit", &self.audit.is_some())
            .finish_non_exhaustive()
    }
}

impl AbResolver {
    pub(crate) fn from_parts(
        pools: PoolTable,
        rules: LayerRuleTable,
        options: ResolverOptions,
        hook: Option<CustomHook>,
        audit: Option<Box<dyn AuditSink>>,
        config_warnings: Vec<ConfigurationWarning>,
    ) -> Self {
        Self {
            pools,
            rules,
            options,
            hook,
            audit: audit.map(|sink| Arc::new(Mutex::new(sink))),
            config_warnings,
        }
    }

    /// Configured pools.
    #[must_use]
    pub const fn pools(&self) -> &PoolTable {
        &self.pools
    }

    /// Layer rules that survived validation.
    #[must_use]
    pub const fn rules(&self) -> &LayerRuleTable {
        &self.rules
    }

    /// Tuning constants.
    #[must_use]
    pub const fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// Problems found while building, repeated in every outcome.
    #[must_use]
    pub fn config_warnings(&self) -> &[ConfigurationWarning] {
        &self.config_warnings
    }

    /// Resolve and persist into `state`.
    pub fn commit(&self, state: &mut ResolverState, objects: Vec<TimelineObject>, now: TimeMs) -> ResolveOutcome {
        self.run(state, objects, now, ResolveMode::Commit)
    }

    /// Resolve against a clone of `state`; the committed state is untouched.
    ///
    /// Returns the state the pass would have committed alongside the outcome.
    #[must_use]
    pub fn preview(
        &self,
        state: &ResolverState,
        objects: Vec<TimelineObject>,
        now: TimeMs,
    ) -> (ResolverState, ResolveOutcome) {
        let mut scratch = state.clone();
        let outcome = self.run(&mut scratch, objects, now, ResolveMode::Preview);
        (scratch, outcome)
    }

    fn run(
        &self,
        state: &mut ResolverState,
        objects: Vec<TimelineObject>,
        now: TimeMs,
        mode: ResolveMode,
    ) -> ResolveOutcome {
        let pass_id = Uuid::new_v4();
        let extraction = extract(&objects, &self.pools, &self.options, now);

        let mut warnings: Vec<ResolverWarning> = self
            .config_warnings
            .iter()
            .cloned()
            .chain(extraction.warnings.iter().cloned())
            .map(ResolverWarning::from)
            .collect();
        let mut assignments = BTreeMap::new();
        let mut unassigned = Vec::new();

        state.retain_pools(self.pools.keys().map(String::as_str));
        for (name, pool) in &self.pools {
            let requests: Vec<SessionRequest> = extraction.for_pool(name).cloned().collect();
            let resolution = resolve(pool, &requests, state, &self.options, now);
            if mode == ResolveMode::Commit {
                self.record_changes(pass_id, name, &resolution.changes, now);
            }
            warnings.extend(resolution.warnings);
            unassigned.extend(resolution.unassigned);
            assignments.insert(name.clone(), resolution.assignment);
        }
        state.record_pass(now);

        let objects = apply_assignment(objects, &assignments, &self.rules, self.hook.as_ref());

        tracing::info!(
            "{:?} pass {} at {}: {} sessions placed, {} unassigned, {} warnings",
            mode,
            pass_id,
            now,
            assignments.values().map(PoolAssignment::len).sum::<usize>(),
            unassigned.len(),
            warnings.len()
        );

        ResolveOutcome {
            pass_id,
            mode,
            now,
            objects,
            assignments,
            unassigned,
            warnings,
        }
    }

    fn record_changes(&self, pass_id: Uuid, pool: &str, changes: &[AssignmentChange], now: TimeMs) {
        let Some(audit) = &self.audit else {
            return;
        };
        let mut sink = audit.lock();
        for change in changes {
            sink.record(build_audit_event(pass_id, pool, change, now));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::resolver::PoolDefinition;
    use crate::core::rewriter::LayerChangeRule;
    use crate::core::session::{SessionId, SessionName};
    use crate::util::serde::{PlayerId, TimeWindow};

    fn resolver() -> AbResolver {
        let pools = PoolTable::from([(
            "clip".to_string(),
            PoolDefinition::new("clip", vec![PlayerId::Number(1), PlayerId::Number(2)]),
        )]);
        let rules = LayerRuleTable::from([(
            "clip_pending".to_string(),
            LayerChangeRule::template(["clip"], "player_{player}"),
        )]);
        AbResolver::from_parts(pools, rules, ResolverOptions::default(), None, None, Vec::new())
    }

    fn clip(id: &str, start: TimeMs) -> TimelineObject {
        TimelineObject::new(id, "clip_pending", TimeWindow::open(start)).with_session(
            "clip",
            SessionName::Named(id.into()),
            false,
        )
    }

    #[test]
    fn test_commit_rewrites_and_persists() {
        let resolver = resolver();
        let mut state = ResolverState::new();
        let out = resolver.commit(&mut state, vec![clip("a", 0)], 0);
        assert_eq!(out.objects[0].layer, "player_1");
        assert_eq!(state.player_for("clip", &SessionId::from("a")), Some(&PlayerId::Number(1)));
        assert_eq!(state.passes(), 1);
    }

    #[test]
    fn test_preview_leaves_state_alone() {
        let resolver = resolver();
        let mut state = ResolverState::new();
        resolver.commit(&mut state, vec![clip("a", 0)], 0);
        let before = state.clone();

        let (scratch, out) = resolver.preview(&state, vec![clip("a", 0), clip("b", 10)], 10);
        assert_eq!(state, before);
        assert_eq!(out.mode, ResolveMode::Preview);
        assert!(scratch.player_for("clip", &SessionId::from("b")).is_some());
    }
}
