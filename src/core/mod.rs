//! Resolver data model, algorithm and layer rewriting.

pub mod audit;
pub mod engine;
pub mod error;
pub mod extractor;
pub mod resolver;
pub mod rewriter;
pub mod session;
pub mod state;

pub use audit::{build_audit_event, AuditEvent, AuditSink, InMemoryAuditSink};
pub use engine::{AbResolver, ResolveMode, ResolveOutcome};
pub use error::{AppResult, ConfigurationWarning, ResolverError, ResolverWarning};
pub use extractor::{extract, in_resolve_window, Extraction};
pub use resolver::{
    find_double_bookings, plan, resolve, PoolAssignment, PoolDefinition, PoolPlan, PoolResolution,
    PoolTable, ResolverOptions,
};
pub use rewriter::{
    apply_assignment, CustomHook, HookContext, HookOutcome, LayerChangeRule, LayerNameStrategy,
    LayerRuleTable, PLAYER_PLACEHOLDER,
};
pub use session::{AbSessionRef, SessionId, SessionName, SessionRequest, TimelineObject};
pub use state::{Assignment, AssignmentChange, PoolState, ResolverState};
