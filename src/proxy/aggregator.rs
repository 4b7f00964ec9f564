//! Per-country tally of check results

use crate::proxy::diagnostics::Diagnostics;
use crate::proxy::models::{CheckResult, CheckStatus};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Counters for one egress country
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CountryStat {
    pub ok: usize,
    pub blocked: usize,
    pub err: usize,
}

impl CountryStat {
    pub fn new(ok: usize, blocked: usize, err: usize) -> Self {
        Self { ok, blocked, err }
    }

    fn record(&mut self, status: CheckStatus) {
        match status {
            CheckStatus::Ok => self.ok += 1,
            CheckStatus::Blocked => self.blocked += 1,
            CheckStatus::Error => self.err += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.ok + self.blocked + self.err
    }
}

/// Single consumer of the result stream
pub struct Aggregator {
    stats: HashMap<String, CountryStat>,
    verbose: bool,
    diagnostics: Arc<dyn Diagnostics>,
}

impl Aggregator {
    pub fn new(verbose: bool, diagnostics: Arc<dyn Diagnostics>) -> Self {
        Self {
            stats: HashMap::new(),
            verbose,
            diagnostics,
        }
    }

    /// Count one result under its country
    pub fn record(&mut self, result: &CheckResult) {
        self.stats
            .entry(result.country().to_string())
            .or_default()
            .record(result.status());

        if self.verbose && !result.is_ok() {
            self.diagnostics.check_failed(result);
        }
    }

    /// Drain `results` until every sender is gone, then report
    pub async fn consume(mut self, mut results: mpsc::Receiver<CheckResult>) -> Report {
        while let Some(result) = results.recv().await {
            self.record(&result);
        }
        self.finish()
    }

    pub fn finish(self) -> Report {
        let mut rows: Vec<_> = self.stats.into_iter().collect();
        rows.sort_by(|a, b| a.0.cmp(&b.0));
        Report { rows }
    }
}

/// Final table, one row per observed country
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    rows: Vec<(String, CountryStat)>,
}

impl Report {
    pub fn rows(&self) -> &[(String, CountryStat)] {
        &self.rows
    }

    pub fn get(&self, country: &str) -> Option<CountryStat> {
        self.rows
            .iter()
            .find(|(name, _)| name == country)
            .map(|(_, stat)| *stat)
    }

    /// Number of results counted across all countries
    pub fn total(&self) -> usize {
        self.rows.iter().map(|(_, stat)| stat.total()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>5} {:>5} {:>5}  :  {:>16}", "ok", "block", "err", "country")?;
        for (country, stat) in &self.rows {
            writeln!(
                f,
                "{:>5} {:>5} {:>5}  :  {:>16}",
                stat.ok, stat.blocked, stat.err, country
            )?;
        }
        Ok(())
    }
}
