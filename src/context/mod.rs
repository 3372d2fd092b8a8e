//! Per-run counters and warnings, passed explicitly through every stage

use log::warn;
use serde::{Deserialize, Serialize};

/// Structured outcome of one ingestion run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Container files matched by extension
    pub files_discovered: u64,
    /// Container files opened and traversed
    pub files_processed: u64,
    /// Container files that could not be opened at all
    pub files_failed: u64,
    /// Messages whose fields were extracted
    pub messages_read: u64,
    /// Messages that could not be read inside an otherwise valid container
    pub messages_failed: u64,
    /// Subfolders that could not be opened
    pub folders_failed: u64,
    /// Canonical emails produced
    pub emails_emitted: u64,
    /// Records dropped because no sender address could be recovered
    pub dropped_no_sender: u64,
    /// Warning messages, in the order they were raised
    pub warnings: Vec<String>,
}

/// Mutable run state threaded through readers, normalizer and pipeline
#[derive(Debug, Default)]
pub struct RunContext {
    report: RunReport,
}

impl RunContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning and emit it through the logger
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("{message}");
        self.report.warnings.push(message);
    }

    pub fn file_discovered(&mut self, count: usize) {
        self.report.files_discovered += count as u64;
    }

    pub fn file_processed(&mut self) {
        self.report.files_processed += 1;
    }

    pub fn file_failed(&mut self) {
        self.report.files_failed += 1;
    }

    pub fn message_read(&mut self) {
        self.report.messages_read += 1;
    }

    pub fn message_failed(&mut self) {
        self.report.messages_failed += 1;
    }

    pub fn folder_failed(&mut self) {
        self.report.folders_failed += 1;
    }

    pub fn email_emitted(&mut self) {
        self.report.emails_emitted += 1;
    }

    pub fn dropped_no_sender(&mut self) {
        self.report.dropped_no_sender += 1;
    }

    /// Current counters
    #[must_use]
    pub const fn report(&self) -> &RunReport {
        &self.report
    }

    /// Consume the context and hand back the report
    #[must_use]
    pub fn finish(self) -> RunReport {
        self.report
    }
}
