use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// A long URL stored once per distinct value.
///
/// Rows are created on the first shortening request for a URL, never
/// mutated, and deleted only by the sweeper once no short link
/// references them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginalLink {
    pub id: i64,
    pub url: String,
}

/// A short-code mapping onto an [`OriginalLink`].
///
/// `code` is globally unique among live rows. `accessed_count` is
/// monotonically non-decreasing and `accessed_at` moves only on a
/// successful resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortLink {
    pub id: i64,
    pub original_link_id: i64,
    pub code: String,
    pub created_at: Timestamp,
    pub accessed_at: Option<Timestamp>,
    pub accessed_count: i64,
}

/// The public record shape returned by creation and listing: a short
/// link joined with its original URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkStats {
    pub url: String,
    pub short_code: String,
    pub created_at: Timestamp,
    pub accessed_at: Option<Timestamp>,
    pub accessed_count: i64,
}

impl ShortLink {
    /// Projects the row into the public stats shape.
    pub fn into_stats(self, url: impl Into<String>) -> LinkStats {
        LinkStats {
            url: url.into(),
            short_code: self.code,
            created_at: self.created_at,
            accessed_at: self.accessed_at,
            accessed_count: self.accessed_count,
        }
    }
}
