use snaplink_service::LinkEngine;
use std::sync::Arc;
use std::time::Duration;

/// Bound on one interactive engine call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct AppState {
    engine: Arc<dyn LinkEngine>,
    base_url: String,
    request_timeout: Duration,
}

impl AppState {
    pub fn new(engine: Arc<dyn LinkEngine>, public_base_url: impl Into<String>) -> Self {
        Self {
            engine,
            base_url: public_base_url.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub fn engine(&self) -> &dyn LinkEngine {
        self.engine.as_ref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}
