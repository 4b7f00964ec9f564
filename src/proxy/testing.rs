//! Deterministic in-memory network for pipeline tests

use crate::error::CheckError;
use crate::proxy::checker::{Connector, Fetched, Transport};
use crate::proxy::geo::DEFAULT_GEO_ENDPOINT;
use crate::proxy::models::ProxyDescriptor;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const TARGET_URL: &str = "http://target.test/probe";

/// How a mocked proxy behaves
#[derive(Debug, Clone)]
pub enum MockProxy {
    /// Nothing listens
    Unreachable,
    /// Geolocates to `country` and returns `content` for the target
    Serve { country: String, content: Vec<u8> },
    /// Geolocation answers with this status
    GeoStatus(u16),
    /// Geolocation answers with a non-JSON body
    GeoGarbage,
    /// Geolocation works, the target fetch fails
    GeoOnly(String),
    /// Every request hangs this long
    Slow(Duration),
    /// Geolocation works, the target fetch hangs this long
    StallOnTarget { country: String, delay: Duration },
}

impl MockProxy {
    pub fn serving(country: &str, content: &str) -> Self {
        MockProxy::Serve {
            country: country.to_string(),
            content: content.as_bytes().to_vec(),
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    content_requests: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

/// Connector resolving proxies against a fixed table
#[derive(Debug, Clone, Default)]
pub struct MockNetwork {
    proxies: Arc<HashMap<ProxyDescriptor, MockProxy>>,
    latency: Duration,
    counters: Arc<Counters>,
}

impl MockNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, proxy: &ProxyDescriptor, behavior: MockProxy) -> Self {
        Arc::make_mut(&mut self.proxies).insert(proxy.clone(), behavior);
        self
    }

    /// Delay added to every request
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn content_requests(&self) -> usize {
        self.counters.content_requests.load(Ordering::SeqCst)
    }

    /// Highest number of proxies checked at the same time
    pub fn max_in_flight(&self) -> usize {
        self.counters.max_in_flight.load(Ordering::SeqCst)
    }
}

impl Connector for MockNetwork {
    type Transport = MockTransport;

    fn connect(
        &self,
        proxy: &ProxyDescriptor,
        _timeout: Duration,
    ) -> Result<MockTransport, CheckError> {
        let behavior = self
            .proxies
            .get(proxy)
            .cloned()
            .unwrap_or(MockProxy::Unreachable);

        let now = self.counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.max_in_flight.fetch_max(now, Ordering::SeqCst);

        Ok(MockTransport {
            behavior,
            latency: self.latency,
            counters: Arc::clone(&self.counters),
        })
    }
}

pub struct MockTransport {
    behavior: MockProxy,
    latency: Duration,
    counters: Arc<Counters>,
}

impl Drop for MockTransport {
    fn drop(&mut self) {
        self.counters.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A genuine reqwest failure, as a dead proxy would produce
fn refused() -> CheckError {
    let error = Client::new()
        .get("http://")
        .build()
        .expect_err("a URL without host never builds");
    CheckError::Request(error)
}

fn ok(body: Vec<u8>) -> Result<Fetched, CheckError> {
    Ok(Fetched {
        status: StatusCode::OK,
        body,
    })
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, url: &str) -> Result<Fetched, CheckError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let is_geo = url == DEFAULT_GEO_ENDPOINT;
        if !is_geo {
            self.counters.content_requests.fetch_add(1, Ordering::SeqCst);
        }

        match (&self.behavior, is_geo) {
            (MockProxy::Unreachable, _) => Err(refused()),
            (MockProxy::Slow(delay), _) => {
                tokio::time::sleep(*delay).await;
                Err(refused())
            }
            (MockProxy::GeoStatus(code), true) => Ok(Fetched {
                status: StatusCode::from_u16(*code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                body: Vec::new(),
            }),
            (MockProxy::GeoGarbage, true) => ok(b"<html>captive portal</html>".to_vec()),
            (MockProxy::Serve { country, .. }, true)
            | (MockProxy::GeoOnly(country), true)
            | (MockProxy::StallOnTarget { country, .. }, true) => {
                ok(format!(r#"{{"status":"success","country":"{}"}}"#, country).into_bytes())
            }
            (MockProxy::Serve { content, .. }, false) => ok(content.clone()),
            (MockProxy::StallOnTarget { delay, .. }, false) => {
                tokio::time::sleep(*delay).await;
                Err(refused())
            }
            (_, false) => Err(refused()),
        }
    }
}
