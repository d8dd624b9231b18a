//! Host-facing handle and API surface.

pub mod api;
pub mod studio;

pub use api::{handle_resolve, health, list_pools, ResolveRequest, ResolveResponse};
pub use studio::StudioResolver;
