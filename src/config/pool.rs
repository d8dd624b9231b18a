//! Pool, layer-rule and resolver configuration structures.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::core::error::{AppResult, ResolverError};
use crate::core::rewriter::PLAYER_PLACEHOLDER;
use crate::util::serde::PlayerId;

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "AB_RESOLVER_CONFIG";

const fn default_ideal_gap_before_ms() -> u64 {
    1000
}

const fn default_now_window_ms() -> u64 {
    2000
}

/// Pool configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Players in preference order.
    pub players: Vec<PlayerId>,
}

/// Declarative layer-change rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerRuleConfig {
    /// Pools the rule resolves.
    pub accepted_pool_names: Vec<String>,
    /// Output layer template containing `{player}`.
    pub new_layer_template: String,
    /// Whether lookahead objects may be rewritten.
    #[serde(default)]
    pub allows_lookahead: bool,
    /// Restrict the rule to one device type.
    #[serde(default)]
    pub device_type: Option<String>,
}

/// Root resolver configuration, supplied once per studio activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Map of pool name to configuration.
    pub pools: HashMap<String, PoolConfig>,
    /// Map of originating layer to rule.
    #[serde(default)]
    pub layer_rules: HashMap<String, LayerRuleConfig>,
    /// Device types mapped in the studio.
    #[serde(default)]
    pub known_device_types: Vec<String>,
    /// Preferred slack before reusing a player, in milliseconds.
    #[serde(default = "default_ideal_gap_before_ms")]
    pub ideal_gap_before_ms: u64,
    /// Lead time resolved ahead of now, in milliseconds.
    #[serde(default = "default_now_window_ms")]
    pub now_window_ms: u64,
}

impl PoolConfig {
    /// Validate pool configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.players.is_empty() {
            return Err("at least one player must be defined".into());
        }
        let mut seen = BTreeSet::new();
        for player in &self.players {
            if !seen.insert(player) {
                return Err(format!("player `{player}` listed twice"));
            }
        }
        Ok(())
    }
}

impl LayerRuleConfig {
    /// Validate rule values. Unknown pools and device types are only warnings.
    pub fn validate(&self) -> Result<(), String> {
        if self.accepted_pool_names.is_empty() {
            return Err("accepted_pool_names must not be empty".into());
        }
        if !self.new_layer_template.contains(PLAYER_PLACEHOLDER) {
            return Err(format!(
                "new_layer_template `{}` lacks {PLAYER_PLACEHOLDER}",
                self.new_layer_template
            ));
        }
        Ok(())
    }
}

impl ResolverConfig {
    /// Validate all pools and rules and ensure at least one pool exists.
    pub fn validate(&self) -> Result<(), String> {
        if self.pools.is_empty() {
            return Err("at least one pool must be defined".into());
        }
        if self.now_window_ms == 0 {
            return Err("now_window_ms must be greater than 0".into());
        }
        let mut pools: Vec<_> = self.pools.iter().collect();
        pools.sort_by(|a, b| a.0.cmp(b.0));
        for (name, pool) in pools {
            pool.validate()
                .map_err(|e| format!("pool `{name}` invalid: {e}"))?;
        }
        let mut rules: Vec<_> = self.layer_rules.iter().collect();
        rules.sort_by(|a, b| a.0.cmp(b.0));
        for (layer, rule) in rules {
            rule.validate()
                .map_err(|e| format!("layer rule `{layer}` invalid: {e}"))?;
        }
        Ok(())
    }

    /// Parse resolver configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, ResolverError> {
        let cfg: Self =
            serde_json::from_str(input).map_err(|e| ResolverError::Parse(e.to_string()))?;
        cfg.validate().map_err(ResolverError::InvalidConfig)?;
        Ok(cfg)
    }

    /// Read and validate a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading resolver config {}", path.display()))?;
        Self::from_json_str(&raw)
            .with_context(|| format!("loading resolver config {}", path.display()))
    }

    /// Load the file named by `AB_RESOLVER_CONFIG`, after reading any `.env`.
    pub fn from_env() -> AppResult<Self> {
        let _ = dotenvy::dotenv();
        let path = std::env::var(CONFIG_PATH_ENV)
            .with_context(|| format!("{CONFIG_PATH_ENV} is not set"))?;
        Self::from_path(path)
    }
}
