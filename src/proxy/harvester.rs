//! Proxy harvester for collecting proxies from web pages
//!
//! This module provides functionality for:
//! - Fetching HTML pages (or reading saved ones) that advertise proxies
//! - Extracting `proxy:` anchor links of the form
//!   `proxy:host=1.2.3.4&port=8080&isSocks=true&name=...`
//! - Normalizing them into the `scheme://host[:port]` lines the proxy source reads

use crate::error::HarvestError;
use crate::proxy::models::{ProxyDescriptor, ProxyScheme};
use crate::Result;
use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Default timeout for HTTP requests in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default user agent for HTTP requests
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Mac OS X) Gecko/20100101 Firefox";

/// Regex matching the href attribute of anchor elements
static ANCHOR_HREF_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<a\b[^>]*?\bhref\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#)
        .expect("Invalid anchor href regex")
});

/// Configuration for proxy harvester
#[derive(Debug, Clone)]
pub struct HarvesterConfig {
    /// Timeout for HTTP requests
    pub timeout: Duration,
    /// User agent for HTTP requests
    pub user_agent: String,
}

impl Default for HarvesterConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl HarvesterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }
}

/// Collect the href of every anchor element, entity-decoded
pub fn extract_links(html: &str) -> Vec<String> {
    ANCHOR_HREF_REGEX
        .captures_iter(html)
        .filter_map(|cap| cap.get(1).or_else(|| cap.get(2)).or_else(|| cap.get(3)))
        .map(|m| decode_entities(m.as_str()))
        .collect()
}

fn decode_entities(value: &str) -> String {
    value
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Parse a `proxy:` link
///
/// Fields: `host` (required), `port` (optional), `isSocks` (any non-empty
/// value selects SOCKS). Everything else (`name`, `notes`, `confirmation`,
/// `foxyproxymode`) is ignored.
pub fn parse_proxy_link(link: &str) -> std::result::Result<ProxyDescriptor, HarvestError> {
    let url = Url::parse(link.trim())?;
    if url.scheme() != "proxy" {
        return Err(HarvestError::WrongScheme(url.scheme().to_string()));
    }

    // fields live in the opaque path; `proxy:?host=..` puts them in the query
    let query = match url.path() {
        "" => url.query().unwrap_or_default(),
        path => path,
    };
    let field = |name: &str| {
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
            .filter(|value| !value.is_empty())
    };

    let host = field("host").ok_or(HarvestError::MissingHost)?;
    let port = field("port")
        .map(|port| port.parse::<u16>().map_err(|_| HarvestError::InvalidPort(port)))
        .transpose()?;
    let scheme = if field("isSocks").is_some() {
        ProxyScheme::Socks
    } else {
        ProxyScheme::Forward { tls: false }
    };

    Ok(ProxyDescriptor::new(scheme, host, port))
}

/// Harvester fetching pages and extracting proxies from them
pub struct Harvester {
    client: Client,
}

impl Harvester {
    /// Create a new harvester with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(HarvesterConfig::default())
    }

    /// Create a new harvester with custom configuration
    pub fn with_config(config: HarvesterConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self { client })
    }

    /// Fetch an `http(s)` URL, or read a local file otherwise, and parse its proxy links
    pub async fn harvest_source(&self, source: &str) -> Result<Vec<ProxyDescriptor>> {
        let html = if source.starts_with("http://") || source.starts_with("https://") {
            self.client
                .get(source)
                .send()
                .await?
                .error_for_status()?
                .text()
                .await?
        } else {
            tokio::fs::read_to_string(source)
                .await
                .with_context(|| format!("failed to read {}", source))?
        };
        Ok(Self::parse_proxies_from_html(&html))
    }

    /// Extract every parsable `proxy:` link, skipping the rest
    pub fn parse_proxies_from_html(html: &str) -> Vec<ProxyDescriptor> {
        extract_links(html)
            .iter()
            .filter_map(|link| match parse_proxy_link(link) {
                Ok(proxy) => Some(proxy),
                Err(e) => {
                    tracing::debug!(link = link.as_str(), "ignoring link: {}", e);
                    None
                }
            })
            .collect()
    }
}
