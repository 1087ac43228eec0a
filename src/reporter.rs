//! Error reporting capability injected into the engine.
use log::*;
use std::sync::Mutex;

use crate::CaretakerError;

/// Sink for failures worth surfacing beyond the returned result, including
/// best-effort failures that are otherwise swallowed.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, error: &CaretakerError);
}

/// Reports through the log facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, error: &CaretakerError) {
        error!("[{}] {error}", error.code());
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ErrorReporter for NoopReporter {
    fn report(&self, _error: &CaretakerError) {}
}

/// Keeps the rendered error messages, in report order.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    reports: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn reports(&self) -> Vec<String> {
        self.reports
            .lock()
            .map(|reports| reports.clone())
            .unwrap_or_default()
    }
}

impl ErrorReporter for RecordingReporter {
    fn report(&self, error: &CaretakerError) {
        if let Ok(mut reports) = self.reports.lock() {
            reports.push(error.to_string());
        }
    }
}
