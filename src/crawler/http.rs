//! HTTP client capability used by the fetcher
//!
//! The engine only needs `get(url)`. [`ReqwestClient`] is the production
//! implementation; tests substitute their own [`HttpClient`].

use crate::config::UserAgentConfig;
use crate::TransportError;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::{redirect::Policy, Client};
use std::future::Future;
use std::time::Duration;
use url::Url;

/// A successfully fetched page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// URL the response came from (after redirects)
    pub final_url: Url,

    /// HTTP status code
    pub status: u16,

    /// Response body
    pub body: String,
}

/// The single capability the fetcher depends on
pub trait HttpClient: Send + Sync + 'static {
    /// Performs a GET request
    ///
    /// Network failures, unreadable bodies and HTTP error statuses (4xx/5xx)
    /// are all reported as [`TransportError`]. Implementations may return an
    /// empty body for responses that are not HTML.
    fn get(&self, url: &Url) -> impl Future<Output = Result<FetchedPage, TransportError>> + Send;
}

/// Builds the reqwest client used for crawling
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Per-request timeout
///
/// # Example
///
/// ```no_run
/// use sitemap_crawler::config::UserAgentConfig;
/// use sitemap_crawler::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig, timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// [`HttpClient`] backed by reqwest
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: Client,
}

impl ReqwestClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a client from the user agent settings
    pub fn from_config(config: &UserAgentConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
        build_http_client(config, timeout).map(Self::new)
    }
}

impl HttpClient for ReqwestClient {
    async fn get(&self, url: &Url) -> Result<FetchedPage, TransportError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| classify_error(&e))?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(TransportError::Status(status.as_u16()));
        }

        let final_url = response.url().clone();
        if !is_html(response.headers()) {
            tracing::debug!("not parsing non-HTML response from {}", final_url);
            return Ok(FetchedPage {
                final_url,
                status: status.as_u16(),
                body: String::new(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?;

        Ok(FetchedPage {
            final_url,
            status: status.as_u16(),
            body,
        })
    }
}

/// True unless the response declares a content type other than HTML
///
/// A missing or unparsable `Content-Type` is treated as HTML.
fn is_html(headers: &HeaderMap) -> bool {
    match headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) {
        Some(value) => {
            let mime = value.split(';').next().unwrap_or("").trim();
            mime.is_empty()
                || mime.eq_ignore_ascii_case("text/html")
                || mime.eq_ignore_ascii_case("application/xhtml+xml")
        }
        None => true,
    }
}

fn classify_error(error: &reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Request("request timeout".to_string())
    } else if error.is_connect() {
        TransportError::Request(format!("connection failed: {}", error))
    } else if error.is_redirect() {
        TransportError::Request(format!("redirect error: {}", error))
    } else {
        TransportError::Request(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(5));
        assert!(client.is_ok());
    }

    fn content_type(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, value.parse().unwrap());
        headers
    }

    #[test]
    fn test_is_html() {
        assert!(is_html(&HeaderMap::new()));
        assert!(is_html(&content_type("text/html")));
        assert!(is_html(&content_type("text/html; charset=utf-8")));
        assert!(is_html(&content_type("TEXT/HTML")));
        assert!(is_html(&content_type("application/xhtml+xml")));
        assert!(!is_html(&content_type("application/pdf")));
        assert!(!is_html(&content_type("image/png")));
        assert!(!is_html(&content_type("text/plain")));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let client =
            ReqwestClient::from_config(&UserAgentConfig::default(), Duration::from_secs(2)).unwrap();
        // Port 9 (discard) on localhost is closed in test environments
        let url = Url::parse("http://127.0.0.1:9/").unwrap();
        let result = client.get(&url).await;
        assert!(matches!(result, Err(TransportError::Request(_))));
    }
}
