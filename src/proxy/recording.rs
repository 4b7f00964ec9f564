//! In-memory [`Diagnostics`] sink for tests

use crate::error::SourceError;
use crate::proxy::diagnostics::Diagnostics;
use crate::proxy::models::CheckResult;
use std::io;
use std::sync::Mutex;

/// A recorded diagnostic
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Skipped { line_no: usize, line: String },
    ReadFailed(String),
    Finished(String),
    Failed { country: String, detail: String },
}

/// Keeps every diagnostic in memory
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    events: Mutex<Vec<Event>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.lock().clone()
    }

    pub fn skipped(&self) -> Vec<(usize, String)> {
        self.lock()
            .iter()
            .filter_map(|event| match event {
                Event::Skipped { line_no, line } => Some((*line_no, line.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn failures(&self) -> usize {
        self.lock()
            .iter()
            .filter(|event| matches!(event, Event::Failed { .. }))
            .count()
    }

    fn push(&self, event: Event) {
        self.lock().push(event);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Event>> {
        // a poisoned log is still a usable log
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn skipped_line(&self, line_no: usize, line: &str, _error: &SourceError) {
        self.push(Event::Skipped {
            line_no,
            line: line.to_string(),
        });
    }

    fn read_failed(&self, error: &io::Error) {
        self.push(Event::ReadFailed(error.to_string()));
    }

    fn check_finished(&self, result: &CheckResult) {
        self.push(Event::Finished(result.proxy.to_string()));
    }

    fn check_failed(&self, result: &CheckResult) {
        self.push(Event::Failed {
            country: result.country().to_string(),
            detail: result.detail().unwrap_or_default().to_string(),
        });
    }
}
