//! Read-only query layer
//!
//! Point lookup by registration number, per-subject grade-band statistics,
//! and top-N ranking by exam-group total. All aggregation happens in SQL;
//! the store is never materialized into memory.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thpt_common::subjects::{round_score, ExamGroup, SubjectCatalog, SubjectCode};

use crate::db::StoreResult;
use crate::models::StoredScore;

const SCORE_COLUMNS: &str = "sbd, toan, ngu_van, ngoai_ngu, vat_li, hoa_hoc, sinh_hoc, \
                             lich_su, dia_li, gdcd, ma_ngoai_ngu, created_at, updated_at";

/// Find a score record by student registration number
pub async fn find_by_sbd(pool: &SqlitePool, sbd: &str) -> StoreResult<Option<StoredScore>> {
    let record = sqlx::query_as::<_, StoredScore>(&format!(
        "SELECT {} FROM scores WHERE sbd = ?",
        SCORE_COLUMNS
    ))
    .bind(sbd)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

/// Total number of stored score records
pub async fn count_scores(pool: &SqlitePool) -> StoreResult<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM scores")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Grade-band percentages for one subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandPercentages {
    pub excellent: f64,
    pub good: f64,
    pub average: f64,
    pub weak: f64,
}

/// Aggregate statistics for one subject
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectStatistics {
    pub subject_code: SubjectCode,
    pub subject_name: String,
    pub total: i64,
    /// score >= 8
    pub excellent: i64,
    /// 6 <= score < 8
    pub good: i64,
    /// 4 <= score < 6
    pub average: i64,
    /// score < 4
    pub weak: i64,
    pub average_score: f64,
    pub min_score: f64,
    pub max_score: f64,
    pub percentages: BandPercentages,
}

/// Dataset-level summary attached to the statistics report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticsSummary {
    pub total_students: i64,
    pub total_subjects: i64,
    pub generated_at: DateTime<Utc>,
}

/// Per-subject statistics for every active subject with data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticsReport {
    pub statistics: Vec<SubjectStatistics>,
    pub summary: StatisticsSummary,
}

/// Compute grade-band statistics for every active subject
///
/// Subjects with no scored records are omitted from the report.
pub async fn subject_statistics(
    pool: &SqlitePool,
    catalog: &SubjectCatalog,
) -> StoreResult<StatisticsReport> {
    let mut statistics = Vec::new();

    for subject in catalog.active() {
        if let Some(stats) = single_subject_statistics(pool, subject.code).await? {
            statistics.push(SubjectStatistics {
                subject_name: subject.display_name.clone(),
                ..stats
            });
        }
    }

    let summary = StatisticsSummary {
        total_students: count_scores(pool).await?,
        total_subjects: catalog.active().count() as i64,
        generated_at: Utc::now(),
    };

    Ok(StatisticsReport {
        statistics,
        summary,
    })
}

async fn single_subject_statistics(
    pool: &SqlitePool,
    code: SubjectCode,
) -> StoreResult<Option<SubjectStatistics>> {
    let column = code.as_str();

    // Column names come from the SubjectCode enum, never from user input.
    let sql = format!(
        r#"
        SELECT
            COUNT(*) as total,
            MAX({col}) as max_score,
            MIN({col}) as min_score,
            AVG({col}) as avg_score,
            SUM(CASE WHEN {col} >= 8.0 THEN 1 ELSE 0 END) as excellent,
            SUM(CASE WHEN {col} >= 6.0 AND {col} < 8.0 THEN 1 ELSE 0 END) as good,
            SUM(CASE WHEN {col} >= 4.0 AND {col} < 6.0 THEN 1 ELSE 0 END) as average,
            SUM(CASE WHEN {col} < 4.0 THEN 1 ELSE 0 END) as weak
        FROM scores
        WHERE {col} IS NOT NULL
        "#,
        col = column
    );

    type AggRow = (
        i64,
        Option<f64>,
        Option<f64>,
        Option<f64>,
        Option<i64>,
        Option<i64>,
        Option<i64>,
        Option<i64>,
    );

    let (total, max_score, min_score, avg_score, excellent, good, average, weak): AggRow =
        sqlx::query_as(&sql).fetch_one(pool).await?;

    if total == 0 {
        return Ok(None);
    }

    let excellent = excellent.unwrap_or(0);
    let good = good.unwrap_or(0);
    let average = average.unwrap_or(0);
    let weak = weak.unwrap_or(0);

    let pct = |count: i64| round_score(count as f64 / total as f64 * 100.0);

    Ok(Some(SubjectStatistics {
        subject_code: code,
        subject_name: code.display_name().to_string(),
        total,
        excellent,
        good,
        average,
        weak,
        average_score: round_score(avg_score.unwrap_or(0.0)),
        min_score: min_score.unwrap_or(0.0),
        max_score: max_score.unwrap_or(0.0),
        percentages: BandPercentages {
            excellent: pct(excellent),
            good: pct(good),
            average: pct(average),
            weak: pct(weak),
        },
    }))
}

/// One ranked entry in a group top list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedStudent {
    pub rank: u32,
    pub sbd: String,
    /// The three group subject scores, in group order
    pub scores: [f64; 3],
    pub total_score: f64,
}

/// Top-N ranking for one exam group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupRanking {
    pub group: ExamGroup,
    pub group_name: String,
    pub subject_names: Vec<String>,
    pub students: Vec<RankedStudent>,
}

/// Rank students by descending sum of the group's three subjects
///
/// Only records with all three subjects scored participate.
pub async fn top_group(
    pool: &SqlitePool,
    group: ExamGroup,
    limit: u32,
) -> StoreResult<GroupRanking> {
    let [s1, s2, s3] = group.subjects();
    let (c1, c2, c3) = (s1.as_str(), s2.as_str(), s3.as_str());

    let sql = format!(
        r#"
        SELECT sbd, {c1}, {c2}, {c3}, ({c1} + {c2} + {c3}) as total_score
        FROM scores
        WHERE {c1} IS NOT NULL AND {c2} IS NOT NULL AND {c3} IS NOT NULL
        ORDER BY total_score DESC
        LIMIT ?
        "#
    );

    let rows: Vec<(String, f64, f64, f64, f64)> = sqlx::query_as(&sql)
        .bind(limit as i64)
        .fetch_all(pool)
        .await?;

    let students = rows
        .into_iter()
        .enumerate()
        .map(|(i, (sbd, a, b, c, total_score))| RankedStudent {
            rank: (i + 1) as u32,
            sbd,
            scores: [a, b, c],
            total_score,
        })
        .collect();

    Ok(GroupRanking {
        group,
        group_name: group.display_name().to_string(),
        subject_names: group
            .subjects()
            .iter()
            .map(|s| s.display_name().to_string())
            .collect(),
        students,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_in_memory;
    use crate::schema::init_schema;

    async fn seeded_pool() -> SqlitePool {
        let pool = connect_in_memory().await.unwrap();
        init_schema(&pool).await.unwrap();
        pool
    }

    async fn insert_score(
        pool: &SqlitePool,
        sbd: &str,
        toan: Option<f64>,
        vat_li: Option<f64>,
        hoa_hoc: Option<f64>,
    ) {
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO scores (sbd, toan, vat_li, hoa_hoc, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(sbd)
        .bind(toan)
        .bind(vat_li)
        .bind(hoa_hoc)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_find_by_sbd() {
        let pool = seeded_pool().await;
        insert_score(&pool, "12345678", Some(8.5), None, None).await;

        let found = find_by_sbd(&pool, "12345678").await.unwrap().unwrap();
        assert_eq!(found.sbd, "12345678");
        assert_eq!(found.toan, Some(8.5));
        assert_eq!(found.vat_li, None);

        assert!(find_by_sbd(&pool, "99999999").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_count_scores() {
        let pool = seeded_pool().await;
        assert_eq!(count_scores(&pool).await.unwrap(), 0);

        insert_score(&pool, "10000001", Some(5.0), None, None).await;
        insert_score(&pool, "10000002", Some(6.0), None, None).await;
        assert_eq!(count_scores(&pool).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_subject_statistics_band_bucketing() {
        let pool = seeded_pool().await;
        // One score per band, plus the boundary values
        insert_score(&pool, "10000001", Some(9.0), None, None).await; // excellent
        insert_score(&pool, "10000002", Some(8.0), None, None).await; // excellent (boundary)
        insert_score(&pool, "10000003", Some(6.0), None, None).await; // good (boundary)
        insert_score(&pool, "10000004", Some(4.0), None, None).await; // average (boundary)
        insert_score(&pool, "10000005", Some(3.99), None, None).await; // weak

        let catalog = SubjectCatalog::canonical();
        let report = subject_statistics(&pool, &catalog).await.unwrap();

        // Only toan has data; every other subject is omitted
        assert_eq!(report.statistics.len(), 1);
        let stats = &report.statistics[0];
        assert_eq!(stats.subject_code, SubjectCode::Toan);
        assert_eq!(stats.total, 5);
        assert_eq!(stats.excellent, 2);
        assert_eq!(stats.good, 1);
        assert_eq!(stats.average, 1);
        assert_eq!(stats.weak, 1);
        assert_eq!(stats.max_score, 9.0);
        assert_eq!(stats.min_score, 3.99);
        assert_eq!(stats.percentages.excellent, 40.0);
        assert_eq!(stats.percentages.weak, 20.0);

        assert_eq!(report.summary.total_students, 5);
        assert_eq!(report.summary.total_subjects, 9);
    }

    #[tokio::test]
    async fn test_top_group_ranking_and_null_exclusion() {
        let pool = seeded_pool().await;
        insert_score(&pool, "10000001", Some(9.0), Some(9.0), Some(9.0)).await; // 27.0
        insert_score(&pool, "10000002", Some(8.0), Some(8.0), Some(8.0)).await; // 24.0
        insert_score(&pool, "10000003", Some(10.0), Some(10.0), None).await; // excluded

        let ranking = top_group(&pool, ExamGroup::A, 10).await.unwrap();
        assert_eq!(ranking.group_name, "Khối A");
        assert_eq!(ranking.students.len(), 2);
        assert_eq!(ranking.students[0].rank, 1);
        assert_eq!(ranking.students[0].sbd, "10000001");
        assert_eq!(ranking.students[0].total_score, 27.0);
        assert_eq!(ranking.students[1].rank, 2);
        assert_eq!(ranking.students[1].sbd, "10000002");
    }

    #[tokio::test]
    async fn test_top_group_respects_limit() {
        let pool = seeded_pool().await;
        for i in 0..5 {
            let sbd = format!("1000000{}", i);
            insert_score(&pool, &sbd, Some(5.0 + i as f64), Some(5.0), Some(5.0)).await;
        }

        let ranking = top_group(&pool, ExamGroup::A, 3).await.unwrap();
        assert_eq!(ranking.students.len(), 3);
        assert_eq!(ranking.students[0].total_score, 19.0);
    }
}
