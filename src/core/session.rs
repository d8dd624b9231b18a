//! Session identities, timeline objects and session requests.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::util::serde::{PieceInstanceRef, PlayerId, TimeWindow};

/// Session name as declared on a timeline object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionName {
    /// Derive the session from the owning piece instance.
    Auto,
    /// Explicit, caller-chosen name shared by every object that uses it.
    Named(String),
}

impl SessionName {
    /// Resolve the declared name against the owning piece instance.
    ///
    /// Returns `None` for [`SessionName::Auto`] when there is no owner.
    #[must_use]
    pub fn resolve(&self, owner: Option<&PieceInstanceRef>) -> Option<SessionId> {
        match self {
            Self::Auto => owner.cloned().map(SessionId::Auto),
            Self::Named(name) => Some(SessionId::Named(name.clone())),
        }
    }
}

/// Resolved session identity, unique per pool within one pass.
///
/// The derived order is the final tie-break between otherwise equal sessions.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionId {
    /// Session owned by a single piece instance.
    Auto(PieceInstanceRef),
    /// Explicitly named session.
    Named(String),
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto(owner) => write!(f, "auto:{owner}"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self::Named(value.to_owned())
    }
}

/// A session declaration carried by a timeline object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbSessionRef {
    /// Pool the session draws a player from.
    pub pool_name: String,
    /// Declared session name.
    pub session: SessionName,
    /// Best-effort request that may be dropped under contention.
    #[serde(default)]
    pub optional: bool,
}

/// The slice of a timeline object the resolver reads and rewrites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineObject {
    /// Object identifier.
    pub id: String,
    /// Output layer. Before resolution this is the originating layer.
    pub layer: String,
    /// When the object plays.
    pub enable: TimeWindow,
    /// Owning piece instance, if any.
    #[serde(default)]
    pub piece_instance_id: Option<PieceInstanceRef>,
    /// Speculative copy of a future piece.
    #[serde(default)]
    pub is_lookahead: bool,
    /// Playout device type the object targets.
    #[serde(default)]
    pub device_type: Option<String>,
    /// Sessions requested by this object.
    #[serde(default)]
    pub ab_sessions: Vec<AbSessionRef>,
    /// Opaque device content, passed through untouched by the rule table.
    #[serde(default)]
    pub content: serde_json::Value,
    /// Player stamped by the rewriter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ab_player: Option<PlayerId>,
}

impl TimelineObject {
    /// Object on `layer` enabled over `enable`, with no sessions.
    pub fn new(id: impl Into<String>, layer: impl Into<String>, enable: TimeWindow) -> Self {
        Self {
            id: id.into(),
            layer: layer.into(),
            enable,
            piece_instance_id: None,
            is_lookahead: false,
            device_type: None,
            ab_sessions: Vec::new(),
            content: serde_json::Value::Null,
            ab_player: None,
        }
    }

    /// Set the owning piece instance.
    #[must_use]
    pub fn with_piece_instance(mut self, owner: impl Into<String>) -> Self {
        self.piece_instance_id = Some(PieceInstanceRef(owner.into()));
        self
    }

    /// Set the targeted device type.
    #[must_use]
    pub fn with_device_type(mut self, device_type: impl Into<String>) -> Self {
        self.device_type = Some(device_type.into());
        self
    }

    /// Mark as a lookahead object.
    #[must_use]
    pub const fn as_lookahead(mut self) -> Self {
        self.is_lookahead = true;
        self
    }

    /// Request a session in `pool`.
    #[must_use]
    pub fn with_session(mut self, pool: impl Into<String>, session: SessionName, optional: bool) -> Self {
        self.ab_sessions.push(AbSessionRef {
            pool_name: pool.into(),
            session,
            optional,
        });
        self
    }
}

/// One logical request for exclusive use of a player, produced by the extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionRequest {
    /// Pool name.
    pub pool_name: String,
    /// Resolved session identity.
    pub session_id: SessionId,
    /// Time extent of the request.
    pub window: TimeWindow,
    /// Best-effort request.
    pub optional: bool,
}
