//! Schema bootstrap and subject seeding
//!
//! Creates the `scores` and `subjects` tables with their indexes and seeds
//! the nine canonical subjects. Idempotent: safe to run against an already
//! initialized store.

use chrono::Utc;
use sqlx::SqlitePool;
use thpt_common::subjects::{Subject, SubjectCatalog, SubjectCode};

use crate::db::{StoreError, StoreResult};

const CREATE_SCORES: &str = r#"
CREATE TABLE IF NOT EXISTS scores (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    sbd TEXT NOT NULL UNIQUE,
    ma_ngoai_ngu TEXT,
    toan REAL,
    ngu_van REAL,
    ngoai_ngu REAL,
    vat_li REAL,
    hoa_hoc REAL,
    sinh_hoc REAL,
    lich_su REAL,
    dia_li REAL,
    gdcd REAL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
"#;

const CREATE_SUBJECTS: &str = r#"
CREATE TABLE IF NOT EXISTS subjects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    code TEXT NOT NULL UNIQUE,
    display_name TEXT NOT NULL,
    group_code TEXT,
    is_required INTEGER NOT NULL DEFAULT 0,
    is_active INTEGER NOT NULL DEFAULT 1,
    display_order INTEGER NOT NULL DEFAULT 999,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
"#;

const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_scores_group_a ON scores (toan, vat_li, hoa_hoc)",
    "CREATE INDEX IF NOT EXISTS idx_scores_foreign_lang ON scores (ma_ngoai_ngu)",
    "CREATE INDEX IF NOT EXISTS idx_subjects_group ON subjects (group_code)",
    "CREATE INDEX IF NOT EXISTS idx_subjects_active_order ON subjects (is_active, display_order)",
];

/// Create tables and indexes, then seed the canonical subjects
pub async fn init_schema(pool: &SqlitePool) -> StoreResult<()> {
    sqlx::query(CREATE_SCORES).execute(pool).await?;
    sqlx::query(CREATE_SUBJECTS).execute(pool).await?;
    for statement in CREATE_INDEXES {
        sqlx::query(statement).execute(pool).await?;
    }

    seed_subjects(pool, &SubjectCatalog::canonical()).await?;

    tracing::debug!("Store schema initialized");
    Ok(())
}

/// Upsert the subject reference rows (ingestion never mutates them)
pub async fn seed_subjects(pool: &SqlitePool, catalog: &SubjectCatalog) -> StoreResult<()> {
    let now = Utc::now();

    for subject in catalog.subjects() {
        sqlx::query(
            r#"
            INSERT INTO subjects
                (code, display_name, group_code, is_required, is_active, display_order,
                 created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(code) DO UPDATE SET
                display_name = excluded.display_name,
                group_code = excluded.group_code,
                is_required = excluded.is_required,
                is_active = excluded.is_active,
                display_order = excluded.display_order,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(subject.code.as_str())
        .bind(&subject.display_name)
        .bind(subject.group_code.map(|g| g.to_string()))
        .bind(subject.is_required)
        .bind(subject.is_active)
        .bind(subject.order as i64)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;
    }

    tracing::debug!(count = catalog.len(), "Subjects seeded");
    Ok(())
}

/// Load the subject catalog from the store
pub async fn load_catalog(pool: &SqlitePool) -> StoreResult<SubjectCatalog> {
    let rows: Vec<(String, String, Option<String>, bool, bool, i64)> = sqlx::query_as(
        r#"
        SELECT code, display_name, group_code, is_required, is_active, display_order
        FROM subjects
        ORDER BY display_order
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut subjects = Vec::with_capacity(rows.len());
    for (code, display_name, group_code, is_required, is_active, order) in rows {
        let code: SubjectCode = code
            .parse()
            .map_err(|_| StoreError::config(format!("Unknown subject code in store: '{}'", code)))?;
        let group_code = match group_code {
            Some(g) => Some(g.parse().map_err(|_| {
                StoreError::config(format!("Unknown exam group in store: '{}'", g))
            })?),
            None => None,
        };
        subjects.push(Subject {
            code,
            display_name,
            group_code,
            is_required,
            is_active,
            order: order as u16,
        });
    }

    Ok(SubjectCatalog::new(subjects))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_in_memory;

    #[tokio::test]
    async fn test_init_schema_is_idempotent() {
        let pool = connect_in_memory().await.unwrap();
        init_schema(&pool).await.unwrap();
        init_schema(&pool).await.unwrap();

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM subjects")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 9);
    }

    #[tokio::test]
    async fn test_load_catalog_round_trip() {
        let pool = connect_in_memory().await.unwrap();
        init_schema(&pool).await.unwrap();

        let catalog = load_catalog(&pool).await.unwrap();
        assert_eq!(catalog.len(), 9);
        assert_eq!(catalog.get(SubjectCode::Toan).unwrap().order, 1);
        assert_eq!(
            catalog.get(SubjectCode::Gdcd).unwrap().display_name,
            "GDCD"
        );
    }
}
