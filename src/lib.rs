//! # AB Pool Resolver
//!
//! Assigns a small, fixed set of physical players (video-server channels, GPI
//! outputs) to the logical playback sessions requested by a playout timeline.
//!
//! Before every take, next or ad-lib the timeline pipeline hands over its
//! candidate objects. The resolver then:
//!
//! 1. extracts one session request per `(pool, session)` inside the now-window,
//! 2. assigns players per pool, keeping existing assignments stable and never
//!    letting two overlapping sessions share a player,
//! 3. rewrites each object's layer onto its player's output layer.
//!
//! ## Key Properties
//!
//! - **Synchronous and deterministic**: no I/O, ordered maps throughout; the
//!   same inputs give the same assignment.
//! - **Stable**: a session keeps its player until it ends or something with a
//!   stronger claim needs it.
//! - **Best effort**: optional (lookahead) sessions are dropped quietly, and an
//!   unplaceable session is a warning, never an error.
//! - **Explicit state**: carried state is passed by reference; previews run on
//!   a clone and cannot disturb the committed assignment.
//!
//! ```rust,ignore
//! use ab_pool_resolver::builders::ResolverBuilder;
//! use ab_pool_resolver::core::{LayerChangeRule, ResolverOptions, ResolverState};
//! use ab_pool_resolver::util::PlayerId;
//!
//! let resolver = ResolverBuilder::new(ResolverOptions::default())
//!     .with_pool("clip", vec![PlayerId::Number(1), PlayerId::Number(2)])
//!     .with_layer_rule("clip_pending", LayerChangeRule::template(["clip"], "casparcg_player_{player}"))
//!     .build()?;
//!
//! let mut state = ResolverState::new();
//! let outcome = resolver.commit(&mut state, timeline_objects, now);
//! let preview = resolver.preview(&state, adlib_objects, now);
//! ```
//!
//! For complete examples, see:
//! - `tests/ab_resolver_test.rs` - Full integration tests

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Session model, extraction, pool resolution and layer rewriting.
pub mod core;
/// Configuration models for pools, layer rules and tuning.
pub mod config;
/// Builders to construct resolvers from configuration.
pub mod builders;
/// Host-facing studio handle and API models.
pub mod runtime;
/// Shared utilities.
pub mod util;
