use crate::error::LinkError;
use url::Url;

/// Longest accepted original URL, in bytes.
pub const MAX_URL_LENGTH: usize = 1000;

/// Validates an original URL before any storage work happens.
///
/// Accepts any well-formed absolute URI up to [`MAX_URL_LENGTH`]
/// bytes; everything else is a `BadRequest`.
pub fn validate_url(original_url: &str) -> Result<(), LinkError> {
    if original_url.is_empty() {
        return Err(LinkError::BadRequest("URL cannot be empty".to_string()));
    }

    if original_url.len() > MAX_URL_LENGTH {
        return Err(LinkError::BadRequest(format!(
            "URL exceeds {MAX_URL_LENGTH} characters"
        )));
    }

    // `Url::parse` rejects relative references outright.
    Url::parse(original_url)
        .map_err(|e| LinkError::BadRequest(format!("URL must be an absolute URI: {e}")))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_absolute_urls() {
        assert!(validate_url("https://example.com").is_ok());
        assert!(validate_url("http://example.com/a/b?q=1#frag").is_ok());
    }

    #[test]
    fn rejects_empty() {
        assert!(matches!(
            validate_url(""),
            Err(LinkError::BadRequest(_))
        ));
    }

    #[test]
    fn rejects_overlong() {
        let url = format!("https://example.com/{}", "a".repeat(MAX_URL_LENGTH));
        assert!(matches!(
            validate_url(&url),
            Err(LinkError::BadRequest(_))
        ));
    }

    #[test]
    fn rejects_relative_references() {
        assert!(matches!(
            validate_url("/just/a/path"),
            Err(LinkError::BadRequest(_))
        ));
        assert!(matches!(
            validate_url("not a url"),
            Err(LinkError::BadRequest(_))
        ));
    }
}
