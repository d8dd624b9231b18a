//! Builders to construct a resolver from configuration.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{LayerRuleConfig, ResolverConfig};
use crate::core::{
    AbResolver, AuditSink, ConfigurationWarning, CustomHook, HookContext, HookOutcome,
    LayerChangeRule, LayerNameStrategy, LayerRuleTable, PoolDefinition, PoolTable, ResolverError,
    ResolverOptions, TimelineObject,
};
use crate::util::serde::PlayerId;

/// Incrementally assembles an [`AbResolver`].
#[derive(Default)]
pub struct ResolverBuilder {
    pools: PoolTable,
    rules: LayerRuleTable,
    known_device_types: BTreeSet<String>,
    options: ResolverOptions,
    hook: Option<CustomHook>,
    audit: Option<Box<dyn AuditSink>>,
}

impl ResolverBuilder {
    /// Empty builder with the given options.
    #[must_use]
    pub fn new(options: ResolverOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Builder seeded from validated configuration.
    pub fn from_config(cfg: &ResolverConfig) -> Result<Self, ResolverError> {
        cfg.validate().map_err(ResolverError::InvalidConfig)?;

        let mut builder = Self::new(ResolverOptions {
            ideal_gap_before: Duration::from_millis(cfg.ideal_gap_before_ms),
            now_window: Duration::from_millis(cfg.now_window_ms),
        });
        for (name, pool) in &cfg.pools {
            builder = builder.with_pool(name.clone(), pool.players.clone());
        }
        for device_type in &cfg.known_device_types {
            builder = builder.with_device_type(device_type.clone());
        }
        for (layer, rule) in &cfg.layer_rules {
            builder = builder.with_layer_rule(layer.clone(), rule_from_config(rule));
        }
        Ok(builder)
    }

    /// Add or replace a pool.
    #[must_use]
    pub fn with_pool(mut self, name: impl Into<String>, players: Vec<PlayerId>) -> Self {
        let name = name.into();
        self.pools
            .insert(name.clone(), PoolDefinition::new(name, players));
        self
    }

    /// Add or replace the rule for an originating layer.
    #[must_use]
    pub fn with_layer_rule(mut self, layer: impl Into<String>, rule: LayerChangeRule) -> Self {
        self.rules.insert(layer.into(), rule);
        self
    }

    /// Declare a device type the studio maps.
    #[must_use]
    pub fn with_device_type(mut self, device_type: impl Into<String>) -> Self {
        self.known_device_types.insert(device_type.into());
        self
    }

    /// Install the per-object hook.
    #[must_use]
    pub fn with_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut TimelineObject, &HookContext<'_>) -> HookOutcome + Send + Sync + 'static,
    {
        self.hook = Some(Arc::new(hook));
        self
    }

    /// Attach an audit sink.
    #[must_use]
    pub fn with_audit(mut self, audit: Box<dyn AuditSink>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Validate pools, filter rules, and produce the resolver.
    ///
    /// Rules naming an unknown pool lose that pool; rules left with no pool or
    /// targeting an unknown device type are dropped. Both are warnings.
    pub fn build(self) -> Result<AbResolver, ResolverError> {
        if self.pools.is_empty() {
            return Err(ResolverError::InvalidConfig("at least one pool must be defined".into()));
        }
        if self.options.now_window.is_zero() {
            return Err(ResolverError::InvalidConfig("now_window must be greater than 0".into()));
        }
        for pool in self.pools.values() {
            let unique: BTreeSet<&PlayerId> = pool.players.iter().collect();
            if pool.players.is_empty() || unique.len() != pool.players.len() {
                return Err(ResolverError::InvalidConfig(format!(
                    "pool `{}` needs a non-empty list of distinct players",
                    pool.name
                )));
            }
        }

        let mut warnings = Vec::new();
        let mut rules = LayerRuleTable::new();
        for (layer, mut rule) in self.rules {
            if let Some(device_type) = &rule.device_type {
                if !self.known_device_types.contains(device_type) {
                    warnings.push(ConfigurationWarning::RuleUnknownDeviceType {
                        layer: layer.clone(),
                        device_type: device_type.clone(),
                    });
                    continue;
                }
            }
            let unknown: Vec<String> = rule
                .accepted_pool_names
                .iter()
                .filter(|pool| !self.pools.contains_key(*pool))
                .cloned()
                .collect();
            for pool in unknown {
                rule.accepted_pool_names.remove(&pool);
                warnings.push(ConfigurationWarning::RuleUnknownPool {
                    layer: layer.clone(),
                    pool,
                });
            }
            if !rule.accepted_pool_names.is_empty() {
                rules.insert(layer, rule);
            }
        }
        for warning in &warnings {
            tracing::warn!("{warning}");
        }

        tracing::info!(
            "built resolver with {} pools and {} layer rules",
            self.pools.len(),
            rules.len()
        );
        Ok(AbResolver::from_parts(
            self.pools,
            rules,
            self.options,
            self.hook,
            self.audit,
            warnings,
        ))
    }
}

fn rule_from_config(cfg: &LayerRuleConfig) -> LayerChangeRule {
    LayerChangeRule {
        accepted_pool_names: cfg.accepted_pool_names.iter().cloned().collect(),
        new_layer_name: LayerNameStrategy::Template(cfg.new_layer_template.clone()),
        allows_lookahead: cfg.allows_lookahead,
        device_type: cfg.device_type.clone(),
    }
}

/// Build a resolver straight from configuration.
pub fn build_resolver(cfg: &ResolverConfig) -> Result<AbResolver, ResolverError> {
    ResolverBuilder::from_config(cfg)?.build()
}
