//! Error and warning types for resolver operations.

use serde::Serialize;
use thiserror::Error;

use crate::core::session::SessionId;
use crate::util::serde::PlayerId;

/// Hard errors. Only configuration loading can fail; a resolve pass never does.
#[derive(Debug, Error)]
pub enum ResolverError {
    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Configuration could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),
}

/// Recoverable configuration problems. The offending session or rule is skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConfigurationWarning {
    /// A timeline object requested a session in a pool that is not configured.
    #[error("object `{object_id}` references unknown pool `{pool}`")]
    UnknownPool {
        /// Requested pool.
        pool: String,
        /// Object carrying the request.
        object_id: String,
    },
    /// An auto-named session was declared on an object without a piece instance.
    #[error("object `{object_id}` uses an auto session in pool `{pool}` without a piece instance")]
    AutoSessionWithoutPieceInstance {
        /// Requested pool.
        pool: String,
        /// Object carrying the request.
        object_id: String,
    },
    /// A layer-change rule accepts a pool that is not configured.
    #[error("layer rule `{layer}` accepts unknown pool `{pool}`")]
    RuleUnknownPool {
        /// Originating layer keyed by the rule.
        layer: String,
        /// Unknown pool.
        pool: String,
    },
    /// A layer-change rule targets a device type the studio does not map.
    #[error("layer rule `{layer}` targets unknown device type `{device_type}`")]
    RuleUnknownDeviceType {
        /// Originating layer keyed by the rule.
        layer: String,
        /// Unknown device type.
        device_type: String,
    },
}

/// Non-fatal diagnostics attached to a resolve pass.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "category", content = "detail", rename_all = "snake_case")]
pub enum ResolverWarning {
    /// See [`ConfigurationWarning`].
    #[error("configuration: {0}")]
    Configuration(#[from] ConfigurationWarning),
    /// A non-optional session found no free player.
    #[error("no free player in pool `{pool}` for session `{session_id}`")]
    Unassignable {
        /// Pool name.
        pool: String,
        /// Session left without a player.
        session_id: SessionId,
    },
    /// A double booking was detected after placement and the later session dropped.
    #[error("player {player} in pool `{pool}` double-booked; dropped session `{session_id}`")]
    InvariantViolation {
        /// Pool name.
        pool: String,
        /// Player that was double-booked.
        player: PlayerId,
        /// Session whose assignment was dropped.
        session_id: SessionId,
    },
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
