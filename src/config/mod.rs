//! Configuration models for pools, layer rules and resolver tuning.

pub mod pool;

pub use pool::{LayerRuleConfig, PoolConfig, ResolverConfig, CONFIG_PATH_ENV};
