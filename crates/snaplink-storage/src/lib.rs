//! `LinkStore` implementations: Postgres for production, an in-memory
//! transactional store for tests.

pub mod memory;
pub mod postgres;

pub use memory::MemoryLinkStore;
pub use postgres::PgLinkStore;
pub use snaplink_core::{LinkStore, StoreError};
