//! Per-pool player assignment.
//!
//! Placement walks the overlap components of a pool's requests in start
//! order. Inside a component sessions are placed greedily: non-optional
//! first, then sessions already holding a player (earliest claim first),
//! then earlier start, then session id. A session holding a player keeps it
//! while it is still free. Everything else picks the best free player by score.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::core::error::ResolverWarning;
use crate::core::session::{SessionId, SessionRequest};
use crate::core::state::{Assignment, AssignmentChange, PoolState, ResolverState};
use crate::util::clock::duration_to_ms;
use crate::util::serde::{PlayerId, TimeMs, TimeWindow};

/// Tuning constants for a resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverOptions {
    /// Slack a player should have between its last use and a new session.
    pub ideal_gap_before: Duration,
    /// Lead time ahead of `now` within which requests are resolved.
    pub now_window: Duration,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            ideal_gap_before: Duration::from_millis(1000),
            now_window: Duration::from_millis(2000),
        }
    }
}

/// A named pool and its players in configured order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolDefinition {
    /// Pool name.
    pub name: String,
    /// Interchangeable players. Order breaks final ties.
    pub players: Vec<PlayerId>,
}

impl PoolDefinition {
    /// Pool with the given players.
    pub fn new(name: impl Into<String>, players: Vec<PlayerId>) -> Self {
        Self {
            name: name.into(),
            players,
        }
    }
}

/// All pools by name.
pub type PoolTable = BTreeMap<String, PoolDefinition>;

/// Session to player mapping for one pool after a pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PoolAssignment {
    /// Pool name.
    pub pool: String,
    /// Assignments by session.
    #[serde(serialize_with = "serialize_assignments")]
    pub assignments: BTreeMap<SessionId, Assignment>,
}

impl PoolAssignment {
    /// Player assigned to `session_id`.
    #[must_use]
    pub fn player_for(&self, session_id: &SessionId) -> Option<&PlayerId> {
        self.assignments.get(session_id).map(|a| &a.player)
    }

    /// Number of assigned sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    /// Whether nothing was assigned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

#[derive(Serialize)]
struct AssignmentEntry<'a> {
    session_id: &'a SessionId,
    #[serde(flatten)]
    assignment: &'a Assignment,
}

fn serialize_assignments<S: Serializer>(
    assignments: &BTreeMap<SessionId, Assignment>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(
        assignments
            .iter()
            .map(|(session_id, assignment)| AssignmentEntry {
                session_id,
                assignment,
            }),
    )
}

/// Result of placing one pool, before it is committed to state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolPlan {
    /// Sessions that received a player.
    pub placed: BTreeMap<SessionId, Assignment>,
    /// Non-optional requests left without a player.
    pub unassigned: Vec<SessionRequest>,
    /// Optional requests dropped under contention.
    pub dropped_optional: Vec<SessionId>,
    /// Corrected double bookings. Empty unless placement is broken.
    pub violations: Vec<ResolverWarning>,
}

/// Result of resolving one pool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolResolution {
    /// The new assignment.
    pub assignment: PoolAssignment,
    /// Non-optional requests left without a player.
    pub unassigned: Vec<SessionRequest>,
    /// Optional requests dropped under contention.
    pub dropped_optional: Vec<SessionId>,
    /// Warnings raised for this pool.
    pub warnings: Vec<ResolverWarning>,
    /// Differences against the previous pass.
    pub changes: Vec<AssignmentChange>,
}

struct Candidate<'a> {
    request: &'a SessionRequest,
    /// Index of the player held from the previous pass, if still valid.
    carried: Option<usize>,
    carried_since: Option<TimeMs>,
}

impl Candidate<'_> {
    fn priority(&self) -> (bool, bool, Option<TimeMs>, TimeMs, &SessionId) {
        (
            self.request.optional,
            self.carried.is_none(),
            self.carried_since,
            self.request.window.start,
            &self.request.session_id,
        )
    }
}

/// Ranking of a player for a fresh placement. Smaller is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct PlayerScore {
    reserved: bool,
    short_gap: bool,
    gap: Reverse<TimeMs>,
    other_source: bool,
    index: usize,
}

struct Bookings<'a> {
    players: &'a [PlayerId],
    windows: Vec<Vec<TimeWindow>>,
    previous: &'a PoolState,
}

impl<'a> Bookings<'a> {
    fn new(players: &'a [PlayerId], previous: &'a PoolState) -> Self {
        Self {
            players,
            windows: vec![Vec::new(); players.len()],
            previous,
        }
    }

    fn is_free(&self, index: usize, window: &TimeWindow) -> bool {
        self.windows[index].iter().all(|w| !w.overlaps(window))
    }

    fn book(&mut self, index: usize, window: TimeWindow) {
        self.windows[index].push(window);
    }

    /// Latest moment the player was given back before `start`.
    ///
    /// Counts carriers still waiting in `pending` as if already booked.
    fn last_release(&self, index: usize, start: TimeMs, pending: &[&Candidate<'_>]) -> Option<TimeMs> {
        let ended_before = |w: &TimeWindow| !w.is_empty() && w.end_bound() <= start;
        let booked = self.windows[index]
            .iter()
            .filter(|w| ended_before(*w))
            .map(TimeWindow::end_bound)
            .max();
        let carried = pending
            .iter()
            .filter(|c| c.carried == Some(index) && ended_before(&c.request.window))
            .map(|c| c.request.window.end_bound())
            .max();
        let remembered = self.previous.released_at(&self.players[index]);
        booked.max(carried).max(remembered)
    }
}

fn player_index(players: &[PlayerId], player: &PlayerId) -> Option<usize> {
    players.iter().position(|p| p == player)
}

/// Split start-ordered, non-empty candidates into overlap components.
fn components<'a, 'b>(mut timed: Vec<&'b Candidate<'a>>) -> Vec<Vec<&'b Candidate<'a>>> {
    timed.sort_by(|a, b| {
        a.request
            .window
            .start
            .cmp(&b.request.window.start)
            .then_with(|| a.priority().cmp(&b.priority()))
    });
    let mut out: Vec<Vec<&Candidate>> = Vec::new();
    let mut reach: TimeMs = 0;
    for candidate in timed {
        let window = candidate.request.window;
        match out.last_mut() {
            Some(current) if window.start < reach => {
                current.push(candidate);
                reach = reach.max(window.end_bound());
            }
            _ => {
                out.push(vec![candidate]);
                reach = window.end_bound();
            }
        }
    }
    out
}

/// Compute a placement for `pool` without touching state.
#[must_use]
pub fn plan(
    pool: &PoolDefinition,
    requests: &[SessionRequest],
    previous: &PoolState,
    options: &ResolverOptions,
    now: TimeMs,
) -> PoolPlan {
    let ideal_gap = duration_to_ms(options.ideal_gap_before);
    let candidates: Vec<Candidate> = requests
        .iter()
        .filter(|r| r.pool_name == pool.name)
        .map(|request| {
            let live = previous
                .assignments()
                .get(&request.session_id)
                .filter(|_| !request.window.has_ended(now));
            let carried = live.and_then(|a| player_index(&pool.players, &a.player));
            Candidate {
                request,
                carried,
                carried_since: live.filter(|_| carried.is_some()).map(|a| a.assigned_at),
            }
        })
        .collect();

    let (empty, timed): (Vec<&Candidate>, Vec<&Candidate>) =
        candidates.iter().partition(|c| c.request.window.is_empty());
    let mut groups = components(timed);
    let mut tail = empty;
    tail.sort_by(|a, b| a.priority().cmp(&b.priority()));
    groups.push(tail);

    let mut bookings = Bookings::new(&pool.players, previous);
    let mut out = PoolPlan::default();

    for mut group in groups {
        group.sort_by(|a, b| a.priority().cmp(&b.priority()));
        for (pos, candidate) in group.iter().enumerate() {
            let request = candidate.request;
            let window = request.window;

            if let Some(held) = candidate.carried.filter(|&i| bookings.is_free(i, &window)) {
                bookings.book(held, window);
                tracing::debug!(
                    "pool {}: {} keeps player {}",
                    pool.name,
                    request.session_id,
                    pool.players[held]
                );
                out.placed.insert(
                    request.session_id.clone(),
                    Assignment {
                        player: pool.players[held].clone(),
                        window,
                        optional: request.optional,
                        assigned_at: candidate.carried_since.unwrap_or(now),
                    },
                );
                continue;
            }

            let later = &group[pos + 1..];
            let same_source = previous.last_player_for(&request.session_id);
            let best = (0..pool.players.len())
                .filter(|&i| bookings.is_free(i, &window))
                .map(|i| {
                    let reserved = later
                        .iter()
                        .any(|c| c.carried == Some(i) && c.request.window.overlaps(&window));
                    let gap = bookings
                        .last_release(i, window.start, later)
                        .map(|released| window.start.saturating_sub(released));
                    PlayerScore {
                        reserved,
                        short_gap: gap.is_some_and(|g| g < ideal_gap),
                        gap: Reverse(gap.map_or(ideal_gap, |g| g.min(ideal_gap))),
                        other_source: same_source != Some(&pool.players[i]),
                        index: i,
                    }
                })
                .min();

            match best {
                Some(score) => {
                    bookings.book(score.index, window);
                    tracing::debug!(
                        "pool {}: {} assigned player {}",
                        pool.name,
                        request.session_id,
                        pool.players[score.index]
                    );
                    out.placed.insert(
                        request.session_id.clone(),
                        Assignment {
                            player: pool.players[score.index].clone(),
                            window,
                            optional: request.optional,
                            assigned_at: now,
                        },
                    );
                }
                None if request.optional => {
                    tracing::debug!("pool {}: dropped optional {}", pool.name, request.session_id);
                    out.dropped_optional.push(request.session_id.clone());
                }
                None => {
                    tracing::warn!("pool {}: no free player for {}", pool.name, request.session_id);
                    out.unassigned.push(request.clone());
                }
            }
        }
    }

    let dropped = drop_double_bookings(&pool.name, &mut out);
    debug_assert_eq!(dropped, 0, "pool {} double-booked", pool.name);
    out
}

/// Remove every double-booked claim from `planned`, recording a violation each.
///
/// Returns how many claims were dropped.
fn drop_double_bookings(pool: &str, planned: &mut PoolPlan) -> usize {
    let conflicts = find_double_bookings(&planned.placed);
    let dropped = conflicts.len();
    for (session_id, player) in conflicts {
        tracing::error!("pool {}: player {} double-booked, dropping {}", pool, player, session_id);
        planned.placed.remove(&session_id);
        planned.violations.push(ResolverWarning::InvariantViolation {
            pool: pool.to_string(),
            player,
            session_id,
        });
    }
    dropped
}

/// Sessions that overlap an earlier session on the same player.
///
/// Earlier means smaller start, then smaller session id. The earlier claim
/// is kept, so dropping every returned session leaves a valid assignment.
#[must_use]
pub fn find_double_bookings(placed: &BTreeMap<SessionId, Assignment>) -> Vec<(SessionId, PlayerId)> {
    let mut by_player: BTreeMap<&PlayerId, Vec<(&SessionId, &Assignment)>> = BTreeMap::new();
    for (session_id, assignment) in placed {
        by_player
            .entry(&assignment.player)
            .or_default()
            .push((session_id, assignment));
    }

    let mut conflicts = Vec::new();
    for (player, mut claims) in by_player {
        claims.sort_by(|a, b| a.1.window.start.cmp(&b.1.window.start).then_with(|| a.0.cmp(b.0)));
        let mut kept: Vec<TimeWindow> = Vec::new();
        for (session_id, assignment) in claims {
            if kept.iter().any(|w| w.overlaps(&assignment.window)) {
                conflicts.push((session_id.clone(), player.clone()));
            } else {
                kept.push(assignment.window);
            }
        }
    }
    conflicts
}

/// Resolve one pool and commit the result into `state`.
pub fn resolve(
    pool: &PoolDefinition,
    requests: &[SessionRequest],
    state: &mut ResolverState,
    options: &ResolverOptions,
    now: TimeMs,
) -> PoolResolution {
    let planned = match state.pool(&pool.name) {
        Some(previous) => plan(pool, requests, previous, options, now),
        None => plan(pool, requests, &PoolState::default(), options, now),
    };

    let requested: BTreeSet<SessionId> = requests
        .iter()
        .filter(|r| r.pool_name == pool.name)
        .map(|r| r.session_id.clone())
        .collect();
    let changes = state
        .pool_mut(&pool.name)
        .apply(planned.placed.clone(), &requested, &pool.players, now);

    let mut warnings: Vec<ResolverWarning> = planned
        .unassigned
        .iter()
        .map(|r| ResolverWarning::Unassignable {
            pool: pool.name.clone(),
            session_id: r.session_id.clone(),
        })
        .collect();
    warnings.extend(planned.violations);

    PoolResolution {
        assignment: PoolAssignment {
            pool: pool.name.clone(),
            assignments: planned.placed,
        },
        unassigned: planned.unassigned,
        dropped_optional: planned.dropped_optional,
        warnings,
        changes,
    }
}
