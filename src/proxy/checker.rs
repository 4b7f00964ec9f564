//! Proxy checker running the two-step check protocol
//!
//! Every proxy is first asked where it exits (geolocation through the proxy),
//! then asked to fetch the target URL. The body must match the expected
//! content byte for byte.

use crate::error::CheckError;
use crate::proxy::diagnostics::Diagnostics;
use crate::proxy::dialer::Dialer;
use crate::proxy::geo::{GeoLocation, DEFAULT_GEO_ENDPOINT};
use crate::proxy::models::{CheckResult, ProxyDescriptor};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};

/// Default timeout for proxy checks in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Default number of concurrent checks
const DEFAULT_CONCURRENCY: usize = 10;

/// Configuration for proxy checker
#[derive(Debug, Clone)]
pub struct CheckerConfig {
    /// Timeout for a whole check, both steps included
    pub timeout: Duration,
    /// Number of concurrent checks
    pub concurrency: usize,
    /// URL fetched through every proxy
    pub target_url: String,
    /// Body the target URL must return
    pub expected: Vec<u8>,
    /// Geolocation service endpoint
    pub geo_endpoint: String,
    /// Surface every non-ok result as a diagnostic
    pub verbose: bool,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            concurrency: DEFAULT_CONCURRENCY,
            target_url: String::new(),
            expected: Vec::new(),
            geo_endpoint: DEFAULT_GEO_ENDPOINT.to_string(),
            verbose: false,
        }
    }
}

impl CheckerConfig {
    pub fn new(target_url: impl Into<String>, expected: impl Into<Vec<u8>>) -> Self {
        Self {
            target_url: target_url.into(),
            expected: expected.into(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Zero is treated as one
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_geo_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.geo_endpoint = endpoint.into();
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// Status and body of a fetched URL
#[derive(Debug, Clone)]
pub struct Fetched {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

/// A network client bound to one proxy
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<Fetched, CheckError>;
}

/// Creates a fresh [`Transport`] for each proxy
pub trait Connector: Send + Sync + 'static {
    type Transport: Transport;

    fn connect(
        &self,
        proxy: &ProxyDescriptor,
        timeout: Duration,
    ) -> Result<Self::Transport, CheckError>;
}

/// [`Transport`] backed by a proxied reqwest client
pub struct ReqwestTransport {
    client: Client,
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<Fetched, CheckError> {
        let response = self.client.get(url).send().await.map_err(request_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(request_error)?;
        Ok(Fetched {
            status,
            body: body.to_vec(),
        })
    }
}

fn request_error(e: reqwest::Error) -> CheckError {
    if e.is_timeout() {
        CheckError::Timeout
    } else {
        CheckError::Request(e)
    }
}

/// Production connector: one reqwest client per proxy
#[derive(Debug, Clone, Copy, Default)]
pub struct ReqwestConnector;

impl Connector for ReqwestConnector {
    type Transport = ReqwestTransport;

    fn connect(
        &self,
        proxy: &ProxyDescriptor,
        timeout: Duration,
    ) -> Result<ReqwestTransport, CheckError> {
        let client = Dialer::for_proxy(proxy).build_client(timeout)?;
        Ok(ReqwestTransport { client })
    }
}

/// Proxy checker for classifying proxies
pub struct ProxyChecker<C = ReqwestConnector> {
    config: CheckerConfig,
    connector: C,
    diagnostics: Arc<dyn Diagnostics>,
}

impl ProxyChecker<ReqwestConnector> {
    /// Create a checker that talks to the real network
    pub fn new(config: CheckerConfig, diagnostics: Arc<dyn Diagnostics>) -> Self {
        Self::with_connector(config, ReqwestConnector, diagnostics)
    }
}

impl<C: Connector> ProxyChecker<C> {
    pub fn with_connector(
        config: CheckerConfig,
        connector: C,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> Self {
        Self {
            config,
            connector,
            diagnostics,
        }
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    /// Check a single proxy
    ///
    /// Never fails: every problem ends up classified in the returned result.
    pub async fn check_proxy(&self, proxy: ProxyDescriptor) -> CheckResult {
        let deadline = Instant::now() + self.config.timeout;

        let transport = match self.connector.connect(&proxy, self.config.timeout) {
            Ok(transport) => transport,
            Err(e) => return self.finish(CheckResult::error(proxy, None, e.to_string())),
        };

        let country = match self.locate(&transport, deadline).await {
            Ok(country) => country,
            Err(e) => return self.finish(CheckResult::error(proxy, None, e.to_string())),
        };

        let result = match self.verify(&transport, deadline).await {
            Ok(()) => CheckResult::ok(proxy, country),
            Err(e @ CheckError::Mismatch { .. }) => {
                CheckResult::blocked(proxy, country, e.to_string())
            }
            Err(e) => CheckResult::error(proxy, country, e.to_string()),
        };
        self.finish(result)
    }

    async fn locate(
        &self,
        transport: &C::Transport,
        deadline: Instant,
    ) -> Result<Option<String>, CheckError> {
        let fetched = fetch_before(transport, &self.config.geo_endpoint, deadline).await?;
        if !fetched.status.is_success() {
            return Err(CheckError::Status(fetched.status));
        }
        let location = GeoLocation::from_body(&fetched.body)?;
        Ok(location.country_name().map(str::to_string))
    }

    async fn verify(&self, transport: &C::Transport, deadline: Instant) -> Result<(), CheckError> {
        let fetched = fetch_before(transport, &self.config.target_url, deadline).await?;
        if fetched.body != self.config.expected {
            return Err(CheckError::mismatch(&fetched.body, &self.config.expected));
        }
        Ok(())
    }

    fn finish(&self, result: CheckResult) -> CheckResult {
        self.diagnostics.check_finished(&result);
        result
    }
}

async fn fetch_before<T: Transport + ?Sized>(
    transport: &T,
    url: &str,
    deadline: Instant,
) -> Result<Fetched, CheckError> {
    timeout_at(deadline, transport.get(url))
        .await
        .map_err(|_| CheckError::Timeout)?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::models::{CheckStatus, UNKNOWN_COUNTRY};
    use crate::proxy::recording::RecordingDiagnostics;
    use crate::proxy::testing::{MockNetwork, MockProxy, TARGET_URL};

    fn checker(network: MockNetwork, expected: &str) -> ProxyChecker<MockNetwork> {
        let config = CheckerConfig::new(TARGET_URL, expected)
            .with_timeout(Duration::from_millis(200));
        ProxyChecker::with_connector(config, network, Arc::new(RecordingDiagnostics::new()))
    }

    #[test]
    fn test_checker_config_default() {
        let config = CheckerConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(config.concurrency, DEFAULT_CONCURRENCY);
        assert_eq!(config.geo_endpoint, DEFAULT_GEO_ENDPOINT);
        assert!(!config.verbose);
    }

    #[test]
    fn test_checker_config_builder() {
        let config = CheckerConfig::new("http://example.com", "hello")
            .with_timeout(Duration::from_secs(30))
            .with_concurrency(20)
            .with_geo_endpoint("http://geo.local/json")
            .with_verbose(true);

        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.concurrency, 20);
        assert_eq!(config.target_url, "http://example.com");
        assert_eq!(config.expected, b"hello");
        assert_eq!(config.geo_endpoint, "http://geo.local/json");
        assert!(config.verbose);
    }

    #[test]
    fn test_zero_concurrency_is_clamped() {
        let config = CheckerConfig::default().with_concurrency(0);
        assert_eq!(config.concurrency, 1);
    }

    #[tokio::test]
    async fn test_matching_content_is_ok() {
        let proxy = ProxyDescriptor::forward("10.0.0.1", 8080);
        let network = MockNetwork::new().with(&proxy, MockProxy::serving("US", "hello"));

        let result = checker(network, "hello").check_proxy(proxy).await;
        assert_eq!(result.status(), CheckStatus::Ok);
        assert_eq!(result.country(), "US");
        assert!(result.detail().is_none());
    }

    #[tokio::test]
    async fn test_different_content_is_blocked() {
        let proxy = ProxyDescriptor::forward("10.0.0.1", 8080);
        let network = MockNetwork::new().with(&proxy, MockProxy::serving("US", "hello!"));

        let result = checker(network, "hello").check_proxy(proxy).await;
        assert_eq!(result.status(), CheckStatus::Blocked);
        assert_eq!(result.country(), "US");
        let detail = result.detail().unwrap();
        assert!(detail.contains("'hello!'"));
        assert!(detail.contains("'hello'"));
    }

    #[tokio::test]
    async fn test_unreachable_proxy_is_error_without_country() {
        let proxy = ProxyDescriptor::forward("10.0.0.1", 8080);
        let network = MockNetwork::new().with(&proxy, MockProxy::Unreachable);

        let result = checker(network, "hello").check_proxy(proxy).await;
        assert_eq!(result.status(), CheckStatus::Error);
        assert_eq!(result.country(), UNKNOWN_COUNTRY);
        assert!(result.detail().is_some());
    }

    #[tokio::test]
    async fn test_geolocation_bad_status_skips_content_check() {
        let proxy = ProxyDescriptor::forward("10.0.0.1", 8080);
        let network = MockNetwork::new().with(&proxy, MockProxy::GeoStatus(503));

        let result = checker(network.clone(), "hello").check_proxy(proxy).await;
        assert_eq!(result.status(), CheckStatus::Error);
        assert_eq!(result.country(), UNKNOWN_COUNTRY);
        assert!(result.detail().unwrap().contains("503"));
        assert_eq!(network.content_requests(), 0);
    }

    #[tokio::test]
    async fn test_geolocation_garbage_is_error() {
        let proxy = ProxyDescriptor::forward("10.0.0.1", 8080);
        let network = MockNetwork::new().with(&proxy, MockProxy::GeoGarbage);

        let result = checker(network.clone(), "hello").check_proxy(proxy).await;
        assert_eq!(result.status(), CheckStatus::Error);
        assert_eq!(result.country(), UNKNOWN_COUNTRY);
        assert_eq!(network.content_requests(), 0);
    }

    #[tokio::test]
    async fn test_content_step_failure_keeps_country() {
        let proxy = ProxyDescriptor::socks("10.0.0.1", 1080);
        let network = MockNetwork::new().with(&proxy, MockProxy::GeoOnly("DE".to_string()));

        let result = checker(network, "hello").check_proxy(proxy).await;
        assert_eq!(result.status(), CheckStatus::Error);
        assert_eq!(result.country(), "DE");
    }

    #[tokio::test]
    async fn test_content_step_timeout_keeps_country() {
        let proxy = ProxyDescriptor::forward("10.0.0.3", 3128);
        let network = MockNetwork::new().with(
            &proxy,
            MockProxy::StallOnTarget {
                country: "DE".to_string(),
                delay: Duration::from_secs(5),
            },
        );

        let result = checker(network.clone(), "hello").check_proxy(proxy).await;
        assert_eq!(result.status(), CheckStatus::Error);
        assert_eq!(result.country(), "DE");
        assert_eq!(result.detail(), Some("check timed out"));
        assert_eq!(network.content_requests(), 1);
    }

    #[tokio::test]
    async fn test_slow_proxy_times_out() {
        let proxy = ProxyDescriptor::forward("10.0.0.1", 8080);
        let network = MockNetwork::new().with(
            &proxy,
            MockProxy::Slow(Duration::from_secs(5)),
        );

        let result = checker(network, "hello").check_proxy(proxy).await;
        assert_eq!(result.status(), CheckStatus::Error);
        assert_eq!(result.country(), UNKNOWN_COUNTRY);
        assert_eq!(result.detail(), Some("check timed out"));
    }

    #[tokio::test]
    async fn test_check_reports_finished() {
        let proxy = ProxyDescriptor::forward("10.0.0.1", 8080);
        let network = MockNetwork::new().with(&proxy, MockProxy::serving("US", "hello"));
        let diagnostics = Arc::new(RecordingDiagnostics::new());
        let checker = ProxyChecker::with_connector(
            CheckerConfig::new(TARGET_URL, "hello"),
            network,
            diagnostics.clone(),
        );

        checker.check_proxy(proxy).await;
        assert_eq!(diagnostics.events().len(), 1);
    }
}
