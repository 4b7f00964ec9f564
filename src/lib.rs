//! Geo Proxy Check - Proxy Tampering Checker
//!
//! Routes a probe request through every proxy of a list, compares the answer
//! with the expected content and groups the outcomes by the proxy's egress
//! country.

pub mod error;
pub mod logging;
pub mod proxy;

pub use error::{CheckError, HarvestError, SourceError};
pub use proxy::*;

/// Application result type
pub type Result<T> = anyhow::Result<T>;
