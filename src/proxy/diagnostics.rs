//! Diagnostics sink handed to the pipeline stages
//!
//! The source, checker and aggregator report through this trait instead of
//! logging globally, so callers decide where diagnostics go.

use crate::error::SourceError;
use crate::proxy::models::CheckResult;
use std::io;

pub trait Diagnostics: Send + Sync {
    /// A proxy list line was skipped
    fn skipped_line(&self, line_no: usize, line: &str, error: &SourceError);

    /// Reading the proxy list failed; the scan ends here
    fn read_failed(&self, error: &io::Error);

    /// A check finished
    fn check_finished(&self, result: &CheckResult);

    /// A non-ok result surfaced in verbose mode
    fn check_failed(&self, result: &CheckResult);
}

/// Forwards diagnostics to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn skipped_line(&self, line_no: usize, line: &str, error: &SourceError) {
        tracing::warn!(line_no, line, "skipping proxy line: {}", error);
    }

    fn read_failed(&self, error: &io::Error) {
        tracing::error!("error while scanning proxy list: {}", error);
    }

    fn check_finished(&self, result: &CheckResult) {
        tracing::debug!(
            proxy = %result.proxy,
            status = %result.status(),
            country = result.country(),
            "check finished"
        );
    }

    fn check_failed(&self, result: &CheckResult) {
        tracing::warn!(
            "Error: {} - {}",
            result.country(),
            result.detail().unwrap_or_default()
        );
    }
}
