//! `LinkCache` implementations: Redis for production, Moka in-memory
//! for single-node use and tests.

pub mod moka;
pub mod redis;

pub use crate::moka::MokaLinkCache;
pub use crate::redis::RedisLinkCache;
pub use snaplink_core::{CacheError, LinkCache};
