//! End-to-end import run tests against an in-memory store

use std::io::Write;

use sqlx::SqlitePool;
use tempfile::NamedTempFile;
use thpt_common::subjects::SubjectCatalog;
use thpt_ingest::governor::MemorySample;
use thpt_ingest::report::{NoopReporter, ProgressSink, RunSummary};
use thpt_ingest::{ImportError, ImportRun, Profile, RunState};
use thpt_store::db::connect_in_memory;
use thpt_store::queries::{count_scores, find_by_sbd};
use thpt_store::schema::init_schema;

/// Records every event the orchestrator emits
#[derive(Default)]
struct RecordingSink {
    started: Vec<Option<u64>>,
    rows: u64,
    flushes: Vec<usize>,
    memory_events: u64,
    summary: Option<RunSummary>,
}

impl ProgressSink for RecordingSink {
    fn on_start(&mut self, total_rows: Option<u64>) {
        self.started.push(total_rows);
    }

    fn on_row(&mut self) {
        self.rows += 1;
    }

    fn on_flush(&mut self, batch_len: usize) {
        self.flushes.push(batch_len);
    }

    fn on_memory(&mut self, _sample: &MemorySample, _processed: u64) {
        self.memory_events += 1;
    }

    fn on_finish(&mut self, summary: &RunSummary) {
        self.summary = Some(summary.clone());
    }
}

async fn fresh_store() -> SqlitePool {
    let pool = connect_in_memory().await.expect("in-memory pool");
    init_schema(&pool).await.expect("schema init");
    pool
}

fn write_csv(rows: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp csv");
    writeln!(
        file,
        "sbd,toan,ngu_van,ngoai_ngu,vat_li,hoa_hoc,sinh_hoc,lich_su,dia_li,gdcd,ma_ngoai_ngu"
    )
    .unwrap();
    for row in rows {
        writeln!(file, "{row}").unwrap();
    }
    file.flush().unwrap();
    file
}

fn micro_profile() -> Profile {
    Profile::micro()
}

#[tokio::test]
async fn test_import_counts_and_field_values() {
    let pool = fresh_store().await;
    let csv = write_csv(&[
        // Example row from the CSV contract: decimal comma, blanks, stray space
        r#"12345678,8.5,"7,0",,9.0,,,,,," ""#,
        "87654321,,,,,,,,,6.75,N1",
        "abc,8.5,7.0,,,,,,,,",   // invalid registration number
        "11112222,,null,,,,,,,", // no usable scores
    ]);

    let mut run = ImportRun::new(pool.clone(), csv.path(), micro_profile());
    let mut sink = RecordingSink::default();
    let summary = run.run(&mut sink).await.expect("run succeeds");

    assert_eq!(run.state(), RunState::Completed);
    assert_eq!(summary.processed, 4);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.errors, 2);
    assert_eq!(summary.succeeded + summary.errors, summary.processed);
    assert_eq!(summary.final_store_count, 2);
    assert_eq!(sink.rows, 4);

    let stored = find_by_sbd(&pool, "12345678").await.unwrap().unwrap();
    assert_eq!(stored.toan, Some(8.5));
    assert_eq!(stored.ngu_van, Some(7.0));
    assert_eq!(stored.ngoai_ngu, None);
    assert_eq!(stored.vat_li, Some(9.0));
    assert_eq!(stored.gdcd, None);
    assert_eq!(stored.ma_ngoai_ngu, None);

    let other = find_by_sbd(&pool, "87654321").await.unwrap().unwrap();
    assert_eq!(other.gdcd, Some(6.75));
    assert_eq!(other.ma_ngoai_ngu, Some("N1".to_string()));

    assert!(find_by_sbd(&pool, "11112222").await.unwrap().is_none());
}

#[tokio::test]
async fn test_batch_of_two_flushes_twice() {
    let pool = fresh_store().await;
    let csv = write_csv(&[
        "10000001,5.0,,,,,,,,,",
        "10000002,6.0,,,,,,,,,",
        "10000003,7.0,,,,,,,,,",
    ]);

    let profile = micro_profile().with_overrides(Some(2), Some(2), None);
    let mut run = ImportRun::new(pool.clone(), csv.path(), profile);
    let mut sink = RecordingSink::default();
    run.run(&mut sink).await.expect("run succeeds");

    // First flush at capacity, second with the end-of-stream remainder
    assert_eq!(sink.flushes, vec![2, 1]);
    assert_eq!(count_scores(&pool).await.unwrap(), 3);
}

#[tokio::test]
async fn test_fast_profile_precounts_rows() {
    let pool = fresh_store().await;
    let csv = write_csv(&[
        "10000001,5.0,,,,,,,,,",
        "10000002,6.0,,,,,,,,,",
        "10000003,7.0,,,,,,,,,",
    ]);

    let mut run = ImportRun::new(pool, csv.path(), Profile::fast());
    let mut sink = RecordingSink::default();
    run.run(&mut sink).await.expect("run succeeds");

    assert_eq!(sink.started, vec![Some(3)]);
}

#[tokio::test]
async fn test_micro_profile_skips_precount() {
    let pool = fresh_store().await;
    let csv = write_csv(&["10000001,5.0,,,,,,,,,"]);

    let mut run = ImportRun::new(pool, csv.path(), Profile::micro());
    let mut sink = RecordingSink::default();
    run.run(&mut sink).await.expect("run succeeds");

    assert_eq!(sink.started, vec![None]);
}

#[tokio::test]
async fn test_memory_snapshots_at_chunk_boundaries() {
    let pool = fresh_store().await;
    let rows: Vec<String> = (0..4).map(|i| format!("1000000{i},5.0,,,,,,,,,")).collect();
    let row_refs: Vec<&str> = rows.iter().map(String::as_str).collect();
    let csv = write_csv(&row_refs);

    // Batch of 2 and chunk of 2: snapshots after rows 2 and 4
    let profile = micro_profile().with_overrides(Some(2), None, Some(2));
    let mut run = ImportRun::new(pool, csv.path(), profile);
    let mut sink = RecordingSink::default();
    run.run(&mut sink).await.expect("run succeeds");

    assert_eq!(sink.memory_events, 2);
}

#[tokio::test]
async fn test_missing_source_fails_before_transaction() {
    let pool = fresh_store().await;
    let mut run = ImportRun::new(pool, "/nonexistent/scores.csv", micro_profile());
    let mut sink = NoopReporter;

    let result = run.run(&mut sink).await;
    assert!(matches!(result, Err(ImportError::SourceNotFound(_))));
    assert_eq!(run.state(), RunState::Failed);
}

#[tokio::test]
async fn test_subchunk_failure_rolls_back_to_previous_dataset() {
    let pool = fresh_store().await;

    // Previous dataset: one committed row
    let seed = write_csv(&["00000001,4.5,,,,,,,,,"]);
    let mut seed_run = ImportRun::new(pool.clone(), seed.path(), micro_profile());
    seed_run.run(&mut NoopReporter).await.expect("seed run");
    assert_eq!(count_scores(&pool).await.unwrap(), 1);

    // Storage failure injected for one specific registration number
    sqlx::query(
        "CREATE TRIGGER fail_injected BEFORE INSERT ON scores \
         WHEN NEW.sbd = '66666666' \
         BEGIN SELECT RAISE(ABORT, 'injected storage failure'); END",
    )
    .execute(&pool)
    .await
    .unwrap();

    let csv = write_csv(&[
        "10000001,5.0,,,,,,,,,",
        "66666666,6.0,,,,,,,,,",
        "10000003,7.0,,,,,,,,,",
    ]);
    let mut run = ImportRun::new(pool.clone(), csv.path(), micro_profile());
    let result = run.run(&mut NoopReporter).await;

    assert!(matches!(result, Err(ImportError::SubChunkWrite { .. })));
    assert_eq!(run.state(), RunState::RolledBack);

    // The in-transaction DELETE was rolled back too: the previous dataset
    // is intact and nothing from the failed run is visible.
    assert_eq!(count_scores(&pool).await.unwrap(), 1);
    let previous = find_by_sbd(&pool, "00000001").await.unwrap().unwrap();
    assert_eq!(previous.toan, Some(4.5));
    assert!(find_by_sbd(&pool, "10000001").await.unwrap().is_none());
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let pool = fresh_store().await;
    let csv = write_csv(&[
        r#"12345678,8.5,"7,0",,9.0,,,,,,"#,
        "87654321,,,,,,,,,6.75,N1",
    ]);

    let mut first = ImportRun::new(pool.clone(), csv.path(), micro_profile());
    let first_summary = first.run(&mut NoopReporter).await.expect("first run");

    let before = find_by_sbd(&pool, "12345678").await.unwrap().unwrap();

    let mut second = ImportRun::new(pool.clone(), csv.path(), micro_profile());
    let second_summary = second.run(&mut NoopReporter).await.expect("second run");

    assert_eq!(first_summary.final_store_count, second_summary.final_store_count);
    assert_eq!(first_summary.succeeded, second_summary.succeeded);

    let after = find_by_sbd(&pool, "12345678").await.unwrap().unwrap();
    assert_eq!(before.toan, after.toan);
    assert_eq!(before.ngu_van, after.ngu_van);
    assert_eq!(before.vat_li, after.vat_li);
    assert_eq!(before.ma_ngoai_ngu, after.ma_ngoai_ngu);
}

#[tokio::test]
async fn test_orchestrator_is_single_use() {
    let pool = fresh_store().await;
    let csv = write_csv(&["10000001,5.0,,,,,,,,,"]);

    let mut run = ImportRun::new(pool, csv.path(), micro_profile());
    run.run(&mut NoopReporter).await.expect("first run");

    let second = run.run(&mut NoopReporter).await;
    assert!(matches!(second, Err(ImportError::Config(_))));
}

#[tokio::test]
async fn test_bulk_and_strict_paths_agree_on_acceptability() {
    // For in-domain score values, a row accepted by the bulk parser must
    // also be accepted by the strict validator, and rejections line up.
    let catalog = SubjectCatalog::canonical();
    let rows = [
        (r"12345678", "8.5", true),
        (r"87654321", "0.0", true),
        (r"abc", "8.5", false),
        (r"11112222", "", false),
    ];

    for (sbd, toan, expect_accepted) in rows {
        let record = csv::StringRecord::from(vec![sbd, toan]);
        let parsed = thpt_ingest::parser::parse_row(&record);

        assert_eq!(parsed.is_ok(), expect_accepted, "bulk path, sbd={sbd:?}");

        if let Ok(record) = parsed {
            let report = thpt_ingest::validation::validate_records(
                std::slice::from_ref(&record),
                &catalog,
            );
            assert!(report.valid, "strict path disagrees for sbd={sbd:?}");
        }
    }
}

#[tokio::test]
async fn test_sink_choice_does_not_change_outcome() {
    let rows = [
        "10000001,5.0,,,,,,,,,",
        "bad,5.0,,,,,,,,,",
        "10000003,7.0,,,,,,,,,",
    ];

    let pool_a = fresh_store().await;
    let csv_a = write_csv(&rows);
    let mut run_a = ImportRun::new(pool_a.clone(), csv_a.path(), micro_profile());
    let summary_a = run_a.run(&mut NoopReporter).await.expect("noop run");

    let pool_b = fresh_store().await;
    let csv_b = write_csv(&rows);
    let mut run_b = ImportRun::new(pool_b.clone(), csv_b.path(), micro_profile());
    let mut sink = RecordingSink::default();
    let summary_b = run_b.run(&mut sink).await.expect("recording run");

    assert_eq!(summary_a.processed, summary_b.processed);
    assert_eq!(summary_a.succeeded, summary_b.succeeded);
    assert_eq!(summary_a.errors, summary_b.errors);
    assert_eq!(summary_a.final_store_count, summary_b.final_store_count);
    assert_eq!(
        count_scores(&pool_a).await.unwrap(),
        count_scores(&pool_b).await.unwrap()
    );
}
