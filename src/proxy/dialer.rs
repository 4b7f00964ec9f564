//! Scheme-specific transport configuration for a single proxy

use crate::error::CheckError;
use crate::proxy::models::{ProxyDescriptor, ProxyScheme};
use reqwest::{Client, Proxy as ReqwestProxy};
use std::time::Duration;

/// Default port for SOCKS proxies given without one
pub const DEFAULT_SOCKS_PORT: u16 = 1080;

/// Routes every request through a plain HTTP forward proxy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardProxyDialer {
    proxy_url: String,
}

impl ForwardProxyDialer {
    pub fn new(proxy: &ProxyDescriptor) -> Self {
        Self {
            proxy_url: proxy.to_string(),
        }
    }

    pub fn proxy_url(&self) -> &str {
        &self.proxy_url
    }
}

/// Tunnels every connection through a SOCKS5 proxy, resolving names remotely
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocksProxyDialer {
    proxy_url: String,
}

impl SocksProxyDialer {
    pub fn new(proxy: &ProxyDescriptor) -> Self {
        let port = proxy.port.unwrap_or(DEFAULT_SOCKS_PORT);
        Self {
            proxy_url: format!("socks5h://{}:{}", proxy.host, port),
        }
    }

    pub fn proxy_url(&self) -> &str {
        &self.proxy_url
    }
}

/// Dialer picked once per proxy from its scheme
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dialer {
    Forward(ForwardProxyDialer),
    Socks(SocksProxyDialer),
}

impl Dialer {
    pub fn for_proxy(proxy: &ProxyDescriptor) -> Self {
        match proxy.scheme {
            ProxyScheme::Forward { .. } => Dialer::Forward(ForwardProxyDialer::new(proxy)),
            ProxyScheme::Socks => Dialer::Socks(SocksProxyDialer::new(proxy)),
        }
    }

    pub fn proxy_url(&self) -> &str {
        match self {
            Dialer::Forward(dialer) => dialer.proxy_url(),
            Dialer::Socks(dialer) => dialer.proxy_url(),
        }
    }

    /// Build a client whose traffic only ever leaves through this proxy
    ///
    /// The client is not shared: each check gets a fresh connection pool.
    pub fn build_client(&self, timeout: Duration) -> Result<Client, CheckError> {
        let reqwest_proxy = ReqwestProxy::all(self.proxy_url()).map_err(CheckError::Client)?;

        Client::builder()
            .proxy(reqwest_proxy)
            .timeout(timeout)
            .connect_timeout(timeout)
            .pool_max_idle_per_host(1)
            .build()
            .map_err(CheckError::Client)
    }
}
