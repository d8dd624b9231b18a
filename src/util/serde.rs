//! Shared serializable identifier and time types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Absolute timeline time in milliseconds.
pub type TimeMs = u64;

/// Opaque identifier of a physical player, as supplied by configuration.
///
/// Numbers order before names so sorting a mixed pool is total.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlayerId {
    /// Numeric player (e.g. a video-server channel number).
    Number(i64),
    /// Named player (e.g. a GPI output name).
    Name(String),
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

impl From<i64> for PlayerId {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for PlayerId {
    fn from(value: &str) -> Self {
        Self::Name(value.to_owned())
    }
}

impl From<String> for PlayerId {
    fn from(value: String) -> Self {
        Self::Name(value)
    }
}

/// Reference to the piece instance that owns a timeline object.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PieceInstanceRef(pub String);

impl fmt::Display for PieceInstanceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PieceInstanceRef {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// Half-open time window `[start, end)`. `end == None` is open-ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Inclusive start.
    pub start: TimeMs,
    /// Exclusive end, or `None` for infinite.
    #[serde(default)]
    pub end: Option<TimeMs>,
}

impl TimeWindow {
    /// Bounded window.
    #[must_use]
    pub const fn new(start: TimeMs, end: TimeMs) -> Self {
        Self {
            start,
            end: Some(end),
        }
    }

    /// Window that never ends.
    #[must_use]
    pub const fn open(start: TimeMs) -> Self {
        Self { start, end: None }
    }

    /// End as a comparable bound (`u64::MAX` for infinite).
    #[must_use]
    pub fn end_bound(&self) -> TimeMs {
        self.end.unwrap_or(TimeMs::MAX)
    }

    /// A window with `start >= end` covers no instant.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.end.is_some_and(|end| end <= self.start)
    }

    /// Whether `at` lies inside the window.
    #[must_use]
    pub fn contains(&self, at: TimeMs) -> bool {
        self.start <= at && at < self.end_bound()
    }

    /// Whether the window has finished by `now`.
    #[must_use]
    pub fn has_ended(&self, now: TimeMs) -> bool {
        self.end.is_some_and(|end| end <= now)
    }

    /// Half-open overlap test. Empty windows never overlap anything.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.start < other.end_bound() && other.start < self.end_bound()
    }

    /// Smallest window covering both.
    #[must_use]
    pub fn hull(&self, other: &Self) -> Self {
        let end = match (self.end, other.end) {
            (Some(a), Some(b)) => Some(a.max(b)),
            _ => None,
        };
        Self {
            start: self.start.min(other.start),
            end,
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            Some(end) => write!(f, "[{}, {end})", self.start),
            None => write!(f, "[{}, inf)", self.start),
        }
    }
}
