//! Builders to construct resolvers from configuration.

pub mod resolver_builder;

pub use resolver_builder::{build_resolver, ResolverBuilder};
