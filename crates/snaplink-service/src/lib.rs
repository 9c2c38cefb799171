//! The link resolution and lifecycle engine.
//!
//! This crate hosts the creation, resolution, and listing coordinators
//! (`LinkService`) together with short-code generation and URL
//! validation. Storage and cache backends are injected through the
//! `snaplink-core` capability traits.

pub mod engine;
pub mod error;
pub mod generator;
pub mod service;
pub mod validate;

pub use engine::LinkEngine;
pub use error::LinkError;
pub use generator::{CodeGenerator, RandomCodeGenerator};
pub use service::{LinkService, LinkServiceSettings};
