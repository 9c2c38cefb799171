use snaplink_core::StoreError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum LinkError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("short link not found: {0}")]
    NotFound(String),
    #[error("too many short code generation attempts")]
    TooManyAttempts,
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
