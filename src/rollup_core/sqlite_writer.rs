//! SQLite writer for rollup reports
//!
//! Every run appends its rows under a fresh `run_id`, so earlier reports stay queryable.

use super::normalizer::AggregateResult;
use super::writer_backend::{ensure_parent_dir, ReportWriterBackend, ReportWriterError};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection};
use std::path::Path;

pub struct SqliteReportWriter {
    conn: Connection,
    run_id: String,
    created_at: i64,
    batch: Vec<AggregateResult>,
    batch_size: usize,
}

impl SqliteReportWriter {
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self, ReportWriterError> {
        let db_path = db_path.as_ref();
        ensure_parent_dir(db_path)?;

        let conn = Connection::open(db_path)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS rollup_results (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                run_id TEXT NOT NULL,
                legal_entity TEXT NOT NULL,
                counter_party TEXT NOT NULL,
                tier TEXT NOT NULL,
                max_rating INTEGER NOT NULL,
                arap INTEGER NOT NULL,
                accr INTEGER NOT NULL,
                created_at INTEGER NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_rollup_run ON rollup_results(run_id, id)",
            [],
        )?;

        let now = Utc::now();
        let run_id = format!("rollup_{}", now.format("%Y%m%dT%H%M%S%.6f"));

        log::info!("✅ SQLite report writer initialized ({}, run {})", db_path.display(), run_id);

        Ok(Self {
            conn,
            run_id,
            created_at: now.timestamp(),
            batch: Vec::with_capacity(500),
            batch_size: 500,
        })
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    fn flush_batch(&mut self) -> Result<(), ReportWriterError> {
        if self.batch.is_empty() {
            return Ok(());
        }

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO rollup_results
                 (run_id, legal_entity, counter_party, tier, max_rating, arap, accr, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for row in &self.batch {
                let [legal_entity, counter_party, tier, ..] = row.to_fields();
                stmt.execute(params![
                    self.run_id,
                    legal_entity,
                    counter_party,
                    tier,
                    row.max_rating,
                    row.arap,
                    row.accr,
                    self.created_at,
                ])?;
            }
        }
        tx.commit()?;

        log::debug!("✅ Flushed {} report rows to SQLite", self.batch.len());
        self.batch.clear();
        Ok(())
    }
}

#[async_trait]
impl ReportWriterBackend for SqliteReportWriter {
    async fn write_row(&mut self, row: &AggregateResult) -> Result<(), ReportWriterError> {
        self.batch.push(row.clone());
        if self.batch.len() >= self.batch_size {
            self.flush_batch()?;
        }
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), ReportWriterError> {
        self.flush_batch()
    }

    fn backend_type(&self) -> &'static str {
        "SQLite"
    }
}
