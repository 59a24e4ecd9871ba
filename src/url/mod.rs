//! URL handling module
//!
//! This module provides URL normalization and the same-site scope rules
//! used by the parser.

mod normalize;
mod scope;

// Re-export main functions
pub use normalize::{normalize_url, with_default_scheme};
pub use scope::{in_scope, resolve_href};

use crate::CrawlError;
use url::Url;

/// Returns true if the URL uses a scheme the fetcher accepts
pub fn is_http_scheme(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

/// Rejects URLs whose scheme is not `http` or `https`
///
/// # Examples
///
/// ```
/// use sitemap_crawler::url::ensure_http_scheme;
/// use url::Url;
///
/// assert!(ensure_http_scheme(&Url::parse("https://example.com").unwrap()).is_ok());
/// assert!(ensure_http_scheme(&Url::parse("ftp://example.com").unwrap()).is_err());
/// ```
pub fn ensure_http_scheme(url: &Url) -> Result<(), CrawlError> {
    if is_http_scheme(url) {
        Ok(())
    } else {
        Err(CrawlError::InvalidScheme {
            url: url.to_string(),
            scheme: url.scheme().to_string(),
        })
    }
}
