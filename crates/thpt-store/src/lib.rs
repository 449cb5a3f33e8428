//! THPT Store
//!
//! The relational store for exam score records: connection pool
//! construction, schema bootstrap with subject seeding, and the read-only
//! query layer (point lookup, per-subject grade-band statistics, top-N
//! group ranking).
//!
//! Writes happen only through the ingestion pipeline, which owns a single
//! enclosing transaction per run; everything here besides schema bootstrap
//! is read-only.

pub mod db;
pub mod models;
pub mod queries;
pub mod schema;

pub use db::{create_pool, DbConfig, StoreError, StoreResult};
pub use models::StoredScore;
