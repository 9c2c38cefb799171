mod health;
mod links;
mod redirect;

pub use health::health_handler;
pub use links::{create_link_handler, list_links_handler};
pub use redirect::redirect_handler;

use crate::error::ApiError;
use snaplink_service::LinkError;
use std::future::Future;
use std::time::Duration;

/// Bounds an engine call with the per-request deadline, mapping both
/// engine errors and deadline expiry into responses.
async fn bounded<F, T>(limit: Duration, call: F) -> Result<T, ApiError>
where
    F: Future<Output = Result<T, LinkError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result.map_err(ApiError::from),
        Err(_) => Err(ApiError::timeout()),
    }
}
