//! Core types and traits for the Snaplink URL shortener.
//!
//! This crate provides the domain model, the error taxonomy, and the
//! capability traits (`LinkStore`, `LinkCache`) consumed by the engine,
//! the sweeper, and the gateway.

pub mod cache;
pub mod error;
pub mod model;
pub mod store;

pub use cache::LinkCache;
pub use error::{CacheError, StoreError};
pub use model::{LinkStats, OriginalLink, ShortLink};
pub use store::LinkStore;
