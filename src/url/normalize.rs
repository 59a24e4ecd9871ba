use crate::UrlError;
use url::{ParseError, Url};

/// Normalizes a URL into the canonical form used for dedup and graph identity
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed or relative (no scheme/host)
/// 2. Reject any scheme other than `http` and `https`
/// 3. Lowercase scheme and host, strip default ports, resolve dot segments
///    (done by the `url` parser)
/// 4. Collapse repeated slashes in the path, keeping a trailing slash
/// 5. Remove the fragment
/// 6. Remove an empty query string (trailing `?`)
///
/// Two URLs that normalize to the same string are the same page.
///
/// # Examples
///
/// ```
/// use sitemap_crawler::url::normalize_url;
///
/// let url = normalize_url("HTTP://Example.COM:80/a/../docs//intro#top").unwrap();
/// assert_eq!(url.as_str(), "http://example.com/docs/intro");
/// ```
pub fn normalize_url(input: &str) -> Result<Url, UrlError> {
    let input = input.trim();

    // Step 1: Parse the URL
    let mut url = Url::parse(input).map_err(|e| match e {
        ParseError::RelativeUrlWithoutBase => UrlError::RelativeUrl(input.to_string()),
        other => UrlError::Parse(format!("{}: {}", input, other)),
    })?;

    // Step 2: Validate scheme
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => {}
        _ => return Err(UrlError::MissingHost),
    }

    // Step 4: Normalize path
    let path = collapse_slashes(url.path());
    url.set_path(&path);

    // Step 5: Remove fragment
    url.set_fragment(None);

    // Step 6: Drop an empty query
    if url.query() == Some("") {
        url.set_query(None);
    }

    Ok(url)
}

/// Prepends `http://` to input that has no scheme at all
///
/// Seeds typed on the command line are often bare hosts (`example.com`).
/// Anything that already parses as an absolute URL, or that starts with a
/// slash, is returned unchanged so that normalization can reject it with a
/// precise error.
pub fn with_default_scheme(input: &str) -> String {
    let input = input.trim();
    match Url::parse(input) {
        Err(ParseError::RelativeUrlWithoutBase) if !input.starts_with('/') => {
            format!("http://{}", input)
        }
        _ => input.to_string(),
    }
}

/// Replaces runs of `/` in a path with a single slash
fn collapse_slashes(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }

    let mut result = String::with_capacity(path.len());
    let mut previous_slash = false;
    for c in path.chars() {
        if c == '/' {
            if previous_slash {
                continue;
            }
            previous_slash = true;
        } else {
            previous_slash = false;
        }
        result.push(c);
    }
    result
}
