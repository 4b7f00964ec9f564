//! Proxy module for parsing, checking and harvesting proxies
//!
//! This module provides functionality for:
//! - Reading proxy lists (one `scheme://host[:port]` per line)
//! - Checking each proxy's egress country and whether it tampers with content
//! - Running checks on a bounded worker pool and tallying results per country
//! - Harvesting `proxy:` links from web pages into proxy lists

pub mod aggregator;
pub mod checker;
pub mod diagnostics;
pub mod dialer;
pub mod dispatcher;
pub mod geo;
pub mod harvester;
pub mod models;
pub mod pipeline;
#[doc(hidden)]
pub mod recording;
pub mod source;

#[cfg(test)]
pub(crate) mod testing;

pub use aggregator::{Aggregator, CountryStat, Report};
pub use checker::{CheckerConfig, Connector, Fetched, ProxyChecker, ReqwestConnector, Transport};
pub use diagnostics::{Diagnostics, TracingDiagnostics};
pub use dialer::{Dialer, ForwardProxyDialer, SocksProxyDialer};
pub use dispatcher::Dispatcher;
pub use geo::{GeoLocation, DEFAULT_GEO_ENDPOINT};
pub use harvester::{Harvester, HarvesterConfig};
pub use models::{CheckResult, CheckStatus, ProxyDescriptor, ProxyScheme, UNKNOWN_COUNTRY};
pub use source::ProxySource;
