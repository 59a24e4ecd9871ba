use url::Url;

/// Rewrites a root-relative href into an absolute URL string on the seed's origin
///
/// - `/about` on seed `http://example.com:8080/` becomes `http://example.com:8080/about`
/// - `//cdn.example.com/x` (protocol-relative) takes the seed's scheme
/// - anything else is returned trimmed and untouched
///
/// Path-relative hrefs such as `about.html` are not resolved; they fail
/// normalization later and are dropped.
pub fn resolve_href(href: &str, seed: &Url) -> String {
    let href = href.trim();

    if href.starts_with("//") {
        return format!("{}:{}", seed.scheme(), href);
    }

    if href.starts_with('/') {
        let host = seed.host_str().unwrap_or_default();
        return match seed.port() {
            Some(port) => format!("{}://{}:{}{}", seed.scheme(), host, port, href),
            None => format!("{}://{}{}", seed.scheme(), host, href),
        };
    }

    href.to_string()
}

/// Returns true if a normalized URL falls under the normalized seed
///
/// Scoping is a plain string-prefix test on the serialized URLs, so a seed
/// of `http://example.com/docs/` keeps the crawl inside `/docs/`.
///
/// # Examples
///
/// ```
/// use sitemap_crawler::url::{in_scope, normalize_url};
///
/// let seed = normalize_url("http://example.com/").unwrap();
/// assert!(in_scope(&normalize_url("http://example.com/about").unwrap(), &seed));
/// assert!(!in_scope(&normalize_url("http://other.com/").unwrap(), &seed));
/// ```
pub fn in_scope(candidate: &Url, seed: &Url) -> bool {
    let is_http = candidate.scheme() == "http" || candidate.scheme() == "https";
    is_http && candidate.as_str().starts_with(seed.as_str())
}
