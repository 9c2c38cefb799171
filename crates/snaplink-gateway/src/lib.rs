//! HTTP surface for the Snaplink engine: create, list, redirect, and
//! health endpoints over axum.

pub mod app;
pub mod error;
pub mod handlers;
pub mod model;
pub mod state;

pub use app::App;
pub use state::AppState;
