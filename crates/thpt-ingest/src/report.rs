//! Progress and metrics reporting
//!
//! Purely observational: the sink receives run lifecycle events and
//! telemetry but can never influence control flow. Swapping in
//! [`NoopReporter`] must not change any ingestion outcome.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};

use crate::governor::MemorySample;

/// Final accounting for one ingestion run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Rows read from the source (header excluded)
    pub processed: u64,
    /// Rows accepted and inserted
    pub succeeded: u64,
    /// Rows rejected and skipped
    pub errors: u64,
    /// Row count in the store after commit
    pub final_store_count: i64,
    /// Peak resident memory observed, in megabytes
    pub peak_memory_mb: f64,
    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

/// Observational sink for run progress and telemetry
pub trait ProgressSink {
    /// Run started; total rows is None when precounting is disabled
    fn on_start(&mut self, _total_rows: Option<u64>) {}

    /// One source row was processed (accepted or rejected)
    fn on_row(&mut self) {}

    /// A batch of the given size is about to be flushed
    fn on_flush(&mut self, _batch_len: usize) {}

    /// Periodic memory snapshot at a chunk boundary
    fn on_memory(&mut self, _sample: &MemorySample, _processed: u64) {}

    /// Run finished successfully
    fn on_finish(&mut self, _summary: &RunSummary) {}
}

/// Discards all events; used by tests and `--no-progress`
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ProgressSink for NoopReporter {}

/// Renders an indicatif progress bar and logs telemetry snapshots
pub struct ConsoleReporter {
    bar: Option<ProgressBar>,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self { bar: None }
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for ConsoleReporter {
    fn on_start(&mut self, total_rows: Option<u64>) {
        let bar = match total_rows {
            Some(total) => {
                let bar = ProgressBar::new(total);
                bar.set_style(
                    ProgressStyle::default_bar()
                        .template(
                            "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] \
                             {pos}/{len} ({eta})",
                        )
                        .unwrap_or_else(|_| ProgressStyle::default_bar())
                        .progress_chars("#>-"),
                );
                bar
            },
            None => {
                let bar = ProgressBar::new_spinner();
                bar.set_style(
                    ProgressStyle::default_spinner()
                        .template("{spinner:.green} {pos} rows {msg}")
                        .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                );
                bar.enable_steady_tick(Duration::from_millis(200));
                bar
            },
        };
        bar.set_message("importing scores");
        self.bar = Some(bar);
    }

    fn on_row(&mut self) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    fn on_flush(&mut self, batch_len: usize) {
        tracing::debug!(batch_len, "Flushing batch");
    }

    fn on_memory(&mut self, sample: &MemorySample, processed: u64) {
        tracing::info!(
            memory_mb = format!("{:.2}", sample.current_mb()),
            peak_mb = format!("{:.2}", sample.peak_mb()),
            processed,
            "Memory snapshot"
        );
    }

    fn on_finish(&mut self, summary: &RunSummary) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
        tracing::info!(
            processed = summary.processed,
            succeeded = summary.succeeded,
            errors = summary.errors,
            final_store_count = summary.final_store_count,
            peak_memory_mb = format!("{:.2}", summary.peak_memory_mb),
            elapsed_secs = summary.elapsed.as_secs_f64(),
            "Import completed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_reporter_accepts_all_events() {
        let mut sink = NoopReporter;
        sink.on_start(Some(10));
        sink.on_row();
        sink.on_flush(5);
        sink.on_memory(
            &MemorySample {
                current_bytes: 1024,
                peak_bytes: 2048,
            },
            100,
        );
        sink.on_finish(&RunSummary {
            processed: 10,
            succeeded: 9,
            errors: 1,
            final_store_count: 9,
            peak_memory_mb: 12.5,
            elapsed: Duration::from_secs(1),
        });
    }

    #[test]
    fn test_console_reporter_with_known_total() {
        let mut sink = ConsoleReporter::new();
        sink.on_start(Some(100));
        sink.on_row();
        sink.on_row();
        assert_eq!(sink.bar.as_ref().and_then(|b| b.length()), Some(100));
    }
}
