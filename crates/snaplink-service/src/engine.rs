use crate::error::LinkError;
use crate::generator::CodeGenerator;
use crate::service::LinkService;
use async_trait::async_trait;
use snaplink_core::model::LinkStats;
use snaplink_core::{LinkCache, LinkStore};

/// Object-safe facade over the engine's public operations, the seam
/// consumed by transport layers.
#[async_trait]
pub trait LinkEngine: Send + Sync {
    /// Shortens a URL; see [`LinkService::create`].
    async fn create(&self, original_url: &str) -> Result<LinkStats, LinkError>;

    /// Resolves a short code; see [`LinkService::resolve`].
    async fn resolve(&self, code: &str) -> Result<String, LinkError>;

    /// Lists all short links; see [`LinkService::list`].
    async fn list(&self) -> Result<Vec<LinkStats>, LinkError>;
}

#[async_trait]
impl<S: LinkStore, C: LinkCache, G: CodeGenerator> LinkEngine for LinkService<S, C, G> {
    async fn create(&self, original_url: &str) -> Result<LinkStats, LinkError> {
        LinkService::create(self, original_url).await
    }

    async fn resolve(&self, code: &str) -> Result<String, LinkError> {
        LinkService::resolve(self, code).await
    }

    async fn list(&self) -> Result<Vec<LinkStats>, LinkError> {
        LinkService::list(self).await
    }
}
