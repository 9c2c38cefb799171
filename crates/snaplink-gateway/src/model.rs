use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use snaplink_core::model::LinkStats;

#[derive(Debug, Deserialize)]
pub struct CreateLinkRequest {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LinkStatsResponse {
    pub url: String,
    pub short_url: String,
    pub created_at: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accessed_at: Option<Timestamp>,
    pub accessed_count: i64,
}

impl LinkStatsResponse {
    /// Projects engine stats into the public shape, expanding the code
    /// into a full short URL under `base_url`.
    pub fn from_stats(stats: LinkStats, base_url: &str) -> Self {
        Self {
            url: stats.url,
            short_url: format!("{}/{}", base_url.trim_end_matches('/'), stats.short_code),
            created_at: stats.created_at,
            accessed_at: stats.accessed_at,
            accessed_count: stats.accessed_count,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
    pub time: Timestamp,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self { status: "ok" }
    }
}
