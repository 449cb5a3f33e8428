//! Bulk loader: persist drained batches in bounded sub-chunks
//!
//! Each batch is split into fixed-size sub-chunks with one multi-row
//! INSERT per sub-chunk, all inside the run's single enclosing
//! transaction. Sub-chunk buffers go out of scope as soon as their insert
//! returns, so peak memory tracks the sub-chunk size rather than the
//! batch size.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, Transaction};
use thpt_common::record::ScoreRecord;

use crate::error::{ImportError, ImportResult};

/// Persist one drained batch inside the enclosing transaction
///
/// Any sub-chunk failure propagates immediately; the caller is expected to
/// abort the transaction.
pub async fn flush_batch(
    tx: &mut Transaction<'_, Sqlite>,
    batch: Vec<ScoreRecord>,
    sub_chunk_size: usize,
) -> ImportResult<()> {
    let sub_chunk_size = sub_chunk_size.max(1);
    let now = Utc::now();

    for chunk in batch.chunks(sub_chunk_size) {
        let mut builder: QueryBuilder<'_, Sqlite> = QueryBuilder::new(
            "INSERT INTO scores \
             (sbd, toan, ngu_van, ngoai_ngu, vat_li, hoa_hoc, sinh_hoc, lich_su, dia_li, gdcd, \
              ma_ngoai_ngu, created_at, updated_at) ",
        );

        builder.push_values(chunk, |mut row, record| {
            row.push_bind(&record.sbd)
                .push_bind(record.toan)
                .push_bind(record.ngu_van)
                .push_bind(record.ngoai_ngu)
                .push_bind(record.vat_li)
                .push_bind(record.hoa_hoc)
                .push_bind(record.sinh_hoc)
                .push_bind(record.lich_su)
                .push_bind(record.dia_li)
                .push_bind(record.gdcd)
                .push_bind(&record.ma_ngoai_ngu)
                .push_bind(now)
                .push_bind(now);
        });

        builder
            .build()
            .execute(&mut **tx)
            .await
            .map_err(|source| ImportError::SubChunkWrite {
                rows: chunk.len(),
                source,
            })?;

        tracing::trace!(rows = chunk.len(), "Sub-chunk inserted");
    }

    Ok(())
}
