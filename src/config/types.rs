use serde::Deserialize;

/// Main configuration structure for the sitemap crawler
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub dedup: DedupConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Timeout of a single HTTP request (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Upper bound on the whole crawl (seconds); unbounded when absent
    #[serde(rename = "crawl-timeout-secs")]
    pub crawl_timeout_secs: Option<u64>,

    /// Buffer size of the channels between workers
    #[serde(rename = "channel-capacity")]
    pub channel_capacity: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            crawl_timeout_secs: None,
            channel_capacity: 1,
        }
    }
}

/// Dedup filter sizing
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    /// Number of distinct URLs the filter is sized for
    #[serde(rename = "expected-urls")]
    pub expected_urls: usize,

    /// Target false-positive rate once `expected_urls` are stored
    #[serde(rename = "false-positive-rate")]
    pub false_positive_rate: f64,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            expected_urls: 20_000,
            false_positive_rate: 0.01,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: env!("CARGO_PKG_NAME").to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
        }
    }
}

impl UserAgentConfig {
    /// Value sent in the `User-Agent` header
    ///
    /// # Example
    ///
    /// ```
    /// use sitemap_crawler::config::UserAgentConfig;
    ///
    /// let config = UserAgentConfig {
    ///     crawler_name: "MapBot".to_string(),
    ///     crawler_version: "2.1".to_string(),
    ///     contact_url: Some("https://example.com/bot".to_string()),
    /// };
    /// assert_eq!(config.header_value(), "MapBot/2.1 (+https://example.com/bot)");
    /// ```
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(contact) => format!(
                "{}/{} (+{})",
                self.crawler_name, self.crawler_version, contact
            ),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Where the site map is written; `.md` selects markdown
    pub path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: "result.out".to_string(),
        }
    }
}
