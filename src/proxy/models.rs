//! Proxy data models

use std::fmt;

/// Label used for results whose egress country could not be resolved
pub const UNKNOWN_COUNTRY: &str = "N/A";

/// How traffic reaches the proxy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProxyScheme {
    /// Plain HTTP forward proxy (`http://` or `https://`)
    Forward { tls: bool },
    /// SOCKS5 tunnel (`socks://` or `socks5://`)
    Socks,
}

impl ProxyScheme {
    /// Map a URI scheme onto a supported proxy scheme
    pub fn from_uri_scheme(scheme: &str) -> Option<Self> {
        match scheme.to_ascii_lowercase().as_str() {
            "http" => Some(ProxyScheme::Forward { tls: false }),
            "https" => Some(ProxyScheme::Forward { tls: true }),
            "socks" | "socks5" => Some(ProxyScheme::Socks),
            _ => None,
        }
    }
}

impl fmt::Display for ProxyScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyScheme::Forward { tls: false } => write!(f, "http"),
            ProxyScheme::Forward { tls: true } => write!(f, "https"),
            ProxyScheme::Socks => write!(f, "socks"),
        }
    }
}

/// A candidate proxy, immutable once parsed
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProxyDescriptor {
    pub scheme: ProxyScheme,
    pub host: String,
    pub port: Option<u16>,
}

impl ProxyDescriptor {
    pub fn new(scheme: ProxyScheme, host: impl Into<String>, port: Option<u16>) -> Self {
        Self {
            scheme,
            host: host.into(),
            port,
        }
    }

    pub fn forward(host: impl Into<String>, port: u16) -> Self {
        Self::new(ProxyScheme::Forward { tls: false }, host, Some(port))
    }

    pub fn socks(host: impl Into<String>, port: u16) -> Self {
        Self::new(ProxyScheme::Socks, host, Some(port))
    }

    /// Get the proxy string in HOST[:PORT] format
    pub fn authority(&self) -> String {
        match self.port {
            Some(port) => format!("{}:{}", self.host, port),
            None => self.host.clone(),
        }
    }
}

impl fmt::Display for ProxyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.authority())
    }
}

/// Classification of a finished check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckStatus {
    Ok,
    Blocked,
    Error,
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckStatus::Ok => write!(f, "ok"),
            CheckStatus::Blocked => write!(f, "blocked"),
            CheckStatus::Error => write!(f, "error"),
        }
    }
}

/// Outcome of checking a single proxy
///
/// The error detail is present exactly when the status is not [`CheckStatus::Ok`].
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub proxy: ProxyDescriptor,
    status: CheckStatus,
    country: Option<String>,
    detail: Option<String>,
}

impl CheckResult {
    pub fn ok(proxy: ProxyDescriptor, country: Option<String>) -> Self {
        Self {
            proxy,
            status: CheckStatus::Ok,
            country,
            detail: None,
        }
    }

    pub fn blocked(proxy: ProxyDescriptor, country: Option<String>, detail: String) -> Self {
        Self {
            proxy,
            status: CheckStatus::Blocked,
            country,
            detail: Some(detail),
        }
    }

    pub fn error(proxy: ProxyDescriptor, country: Option<String>, detail: String) -> Self {
        Self {
            proxy,
            status: CheckStatus::Error,
            country,
            detail: Some(detail),
        }
    }

    pub fn status(&self) -> CheckStatus {
        self.status
    }

    /// Egress country, or `"N/A"` when it was never resolved
    pub fn country(&self) -> &str {
        self.country.as_deref().unwrap_or(UNKNOWN_COUNTRY)
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    pub fn is_ok(&self) -> bool {
        self.status == CheckStatus::Ok
    }
}
