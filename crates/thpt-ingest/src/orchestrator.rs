//! Ingestion orchestrator
//!
//! Drives the read -> parse -> accumulate -> flush loop, owns the single
//! enclosing transaction, and produces the final run summary. The
//! destination table is cleared inside the same transaction as the
//! inserts, so readers either see the previous dataset or the complete
//! new one, never a partial load.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Instant;

use sqlx::SqlitePool;
use tracing::{debug, info, trace, warn};

use crate::batch::BatchAccumulator;
use crate::error::{ImportError, ImportResult};
use crate::governor::{MemoryGovernor, Profile};
use crate::loader;
use crate::parser;
use crate::report::{ProgressSink, RunSummary};

/// Orchestrator lifecycle states
///
/// `Completed`, `RolledBack` and `Failed` are terminal; an orchestrator
/// instance is never reused across runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Initializing,
    Streaming,
    Flushing,
    Committing,
    Completed,
    RolledBack,
    Failed,
}

/// One complete ingestion attempt, from source open to commit or rollback
pub struct ImportRun {
    pool: SqlitePool,
    source: PathBuf,
    profile: Profile,
    state: RunState,
}

impl ImportRun {
    pub fn new(pool: SqlitePool, source: impl Into<PathBuf>, profile: Profile) -> Self {
        Self {
            pool,
            source: source.into(),
            profile,
            state: RunState::Idle,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Execute the run
    ///
    /// Per-row rejections are counted and skipped; any storage or I/O
    /// failure aborts the enclosing transaction and leaves the store in
    /// its pre-run state.
    pub async fn run(&mut self, sink: &mut dyn ProgressSink) -> ImportResult<RunSummary> {
        if self.state != RunState::Idle {
            return Err(ImportError::Config(
                "import run already executed; orchestrator instances are single-use".to_string(),
            ));
        }

        match self.execute(sink).await {
            Ok(summary) => {
                self.state = RunState::Completed;
                Ok(summary)
            },
            Err(e) => {
                // A failure before the transaction opened left nothing to
                // undo; afterwards the dropped transaction rolls back.
                self.state = if self.state == RunState::Initializing {
                    RunState::Failed
                } else {
                    RunState::RolledBack
                };
                warn!(state = ?self.state, error = %e, "Import run aborted");
                Err(e)
            },
        }
    }

    async fn execute(&mut self, sink: &mut dyn ProgressSink) -> ImportResult<RunSummary> {
        self.state = RunState::Initializing;
        let started = Instant::now();

        if !self.source.exists() {
            return Err(ImportError::SourceNotFound(self.source.clone()));
        }

        let catalog = thpt_store::schema::load_catalog(&self.pool).await?;
        debug!(subjects = catalog.len(), "Subject catalog loaded");

        let total_rows = if self.profile.precount {
            let total = count_data_rows(&self.source)?;
            info!(total, "Pre-counted source rows");
            Some(total)
        } else {
            None
        };

        info!(
            profile = %self.profile.kind,
            batch_size = self.profile.batch_size,
            sub_chunk_size = self.profile.sub_chunk_size,
            source = %self.source.display(),
            "Starting import run"
        );

        let mut governor = MemoryGovernor::new();
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&self.source)?;

        sink.on_start(total_rows);

        // Clearing happens inside the same transaction as every insert:
        // rollback restores the previous dataset in full.
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM scores").execute(&mut *tx).await?;

        self.state = RunState::Streaming;

        let mut accumulator = BatchAccumulator::new(self.profile.batch_size);
        let mut processed: u64 = 0;
        let mut succeeded: u64 = 0;
        let mut errors: u64 = 0;
        let mut row = csv::StringRecord::new();

        while reader.read_record(&mut row)? {
            match parser::parse_row(&row) {
                Ok(record) => {
                    accumulator.push(record);
                    succeeded += 1;
                },
                Err(rejection) => {
                    trace!(row = processed + 1, %rejection, "Row rejected");
                    errors += 1;
                },
            }
            processed += 1;
            sink.on_row();

            if accumulator.is_full() {
                self.state = RunState::Flushing;
                let batch = accumulator.drain();
                sink.on_flush(batch.len());
                loader::flush_batch(&mut tx, batch, self.profile.sub_chunk_size).await?;

                if processed % self.profile.chunk_size == 0 {
                    let sample = governor.sample();
                    sink.on_memory(&sample, processed);
                }
                self.state = RunState::Streaming;
            }
        }

        if !accumulator.is_empty() {
            self.state = RunState::Flushing;
            let batch = accumulator.drain();
            sink.on_flush(batch.len());
            loader::flush_batch(&mut tx, batch, self.profile.sub_chunk_size).await?;
        }

        self.state = RunState::Committing;
        tx.commit().await?;

        let final_store_count = thpt_store::queries::count_scores(&self.pool).await?;
        let peak_memory_mb = governor.sample().peak_mb();

        let summary = RunSummary {
            processed,
            succeeded,
            errors,
            final_store_count,
            peak_memory_mb,
            elapsed: started.elapsed(),
        };
        sink.on_finish(&summary);

        info!(
            processed,
            succeeded,
            errors,
            final_store_count,
            "Import run committed"
        );

        Ok(summary)
    }
}

/// Count data rows in the source, excluding the header line
///
/// Only used under the fast profile; the micro profile skips the extra
/// full pass over the file.
fn count_data_rows(path: &Path) -> ImportResult<u64> {
    let reader = BufReader::new(File::open(path)?);
    let lines = reader.lines().count() as u64;
    Ok(lines.saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_data_rows_excludes_header() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        use std::io::Write;
        writeln!(file, "sbd,toan").unwrap();
        writeln!(file, "10000001,5.0").unwrap();
        writeln!(file, "10000002,6.0").unwrap();

        assert_eq!(count_data_rows(file.path()).unwrap(), 2);
    }

    #[test]
    fn test_count_data_rows_empty_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert_eq!(count_data_rows(file.path()).unwrap(), 0);
    }
}
