//! Applying resolved assignments back onto timeline objects.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use crate::core::resolver::PoolAssignment;
use crate::core::session::{AbSessionRef, SessionId, TimelineObject};
use crate::util::serde::PlayerId;

/// Placeholder replaced by the player id in layer templates.
pub const PLAYER_PLACEHOLDER: &str = "{player}";

/// How a rule names the output layer for a player.
#[derive(Clone)]
pub enum LayerNameStrategy {
    /// Replace every `{player}` in the template.
    Template(String),
    /// Arbitrary mapping supplied in code.
    Custom(Arc<dyn Fn(&PlayerId) -> String + Send + Sync>),
}

impl LayerNameStrategy {
    /// Output layer for `player`.
    #[must_use]
    pub fn layer_for(&self, player: &PlayerId) -> String {
        match self {
            Self::Template(template) => template.replace(PLAYER_PLACEHOLDER, &player.to_string()),
            Self::Custom(f) => f(player),
        }
    }
}

impl fmt::Debug for LayerNameStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Template(template) => f.debug_tuple("Template").field(template).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Layer rewrite for objects whose originating layer keys this rule.
#[derive(Debug, Clone)]
pub struct LayerChangeRule {
    /// Pools whose sessions this rule resolves.
    pub accepted_pool_names: BTreeSet<String>,
    /// Output layer per player.
    pub new_layer_name: LayerNameStrategy,
    /// Whether lookahead objects may be rewritten.
    pub allows_lookahead: bool,
    /// Restrict the rule to objects of this device type.
    pub device_type: Option<String>,
}

impl LayerChangeRule {
    /// Rule accepting `pools` and naming layers from `template`.
    pub fn template<I, S>(pools: I, template: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            accepted_pool_names: pools.into_iter().map(Into::into).collect(),
            new_layer_name: LayerNameStrategy::Template(template.into()),
            allows_lookahead: false,
            device_type: None,
        }
    }

    /// Allow or forbid lookahead rewriting.
    #[must_use]
    pub const fn with_lookahead(mut self, allows_lookahead: bool) -> Self {
        self.allows_lookahead = allows_lookahead;
        self
    }

    /// Restrict to a device type.
    #[must_use]
    pub fn for_device_type(mut self, device_type: impl Into<String>) -> Self {
        self.device_type = Some(device_type.into());
        self
    }

    fn matches_device(&self, obj: &TimelineObject) -> bool {
        self.device_type
            .as_ref()
            .is_none_or(|wanted| obj.device_type.as_ref() == Some(wanted))
    }
}

/// Rules keyed by originating layer name.
pub type LayerRuleTable = BTreeMap<String, LayerChangeRule>;

/// What the custom hook did with an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookOutcome {
    /// The hook owns the object; skip the default finishing step.
    Handled,
    /// Finish the object as if no hook ran.
    Default,
}

/// What the hook is told about an object's session.
#[derive(Debug, Clone, Copy)]
pub struct HookContext<'a> {
    /// Pool of the session being applied.
    pub pool_name: &'a str,
    /// Session being applied.
    pub session_id: &'a SessionId,
    /// Player the session received, if any.
    pub player: Option<&'a PlayerId>,
    /// Whether a layer rule already rewrote the object.
    pub rule_applied: bool,
}

/// Per-object callback run after the rule table.
pub type CustomHook = Arc<dyn Fn(&mut TimelineObject, &HookContext<'_>) -> HookOutcome + Send + Sync>;

enum Rewrite<'a> {
    Rule(&'a LayerChangeRule),
    HookOnly,
}

fn strategy_for<'a>(
    obj: &TimelineObject,
    rules: &'a LayerRuleTable,
    hook: Option<&CustomHook>,
) -> Option<Rewrite<'a>> {
    let accepts_any = |rule: &LayerChangeRule| {
        obj.ab_sessions
            .iter()
            .any(|s| rule.accepted_pool_names.contains(&s.pool_name))
    };
    match rules
        .get(&obj.layer)
        .filter(|rule| rule.matches_device(obj) && accepts_any(*rule))
    {
        Some(rule) => Some(Rewrite::Rule(rule)),
        None if hook.is_some() => Some(Rewrite::HookOnly),
        None => None,
    }
}

fn pick_session<'o>(obj: &'o TimelineObject, strategy: &Rewrite<'_>) -> Option<&'o AbSessionRef> {
    match strategy {
        Rewrite::Rule(rule) => obj
            .ab_sessions
            .iter()
            .find(|s| rule.accepted_pool_names.contains(&s.pool_name)),
        Rewrite::HookOnly => obj.ab_sessions.first(),
    }
}

/// Move objects onto the layers of their assigned players.
///
/// A rule matches when its device type fits and it accepts one of the
/// object's pools; otherwise the hook alone handles the object.
/// Objects with no matching rule and no hook pass through untouched, as do
/// objects whose session went unassigned. Lookahead objects under a rule
/// that forbids lookahead are skipped entirely.
pub fn apply_assignment(
    objects: Vec<TimelineObject>,
    assignments: &BTreeMap<String, PoolAssignment>,
    rules: &LayerRuleTable,
    hook: Option<&CustomHook>,
) -> Vec<TimelineObject> {
    objects
        .into_iter()
        .map(|mut obj| {
            if obj.ab_sessions.is_empty() {
                return obj;
            }
            let Some(strategy) = strategy_for(&obj, rules, hook) else {
                return obj;
            };
            if let Rewrite::Rule(rule) = &strategy {
                if obj.is_lookahead && !rule.allows_lookahead {
                    tracing::debug!("lookahead object {} left unresolved", obj.id);
                    return obj;
                }
            }
            let Some(decl) = pick_session(&obj, &strategy) else {
                return obj;
            };
            let Some(session_id) = decl.session.resolve(obj.piece_instance_id.as_ref()) else {
                return obj;
            };
            let pool_name = decl.pool_name.clone();
            let player = assignments
                .get(&pool_name)
                .and_then(|a| a.player_for(&session_id))
                .cloned();

            let target = match (&strategy, &player) {
                (Rewrite::Rule(rule), Some(player)) => Some(rule.new_layer_name.layer_for(player)),
                _ => None,
            };
            if let Some(layer) = &target {
                obj.layer.clone_from(layer);
            }

            let outcome = hook.map_or(HookOutcome::Default, |hook| {
                let ctx = HookContext {
                    pool_name: &pool_name,
                    session_id: &session_id,
                    player: player.as_ref(),
                    rule_applied: target.is_some(),
                };
                hook(&mut obj, &ctx)
            });

            if outcome == HookOutcome::Default {
                if let Some(layer) = target {
                    obj.layer = layer;
                }
                if player.is_some() {
                    obj.ab_player = player;
                }
            }
            obj
        })
        .collect()
}
