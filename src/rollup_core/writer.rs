//! Unified writer interface for rollup reports
//!
//! Routes writes to the CSV, JSONL or SQLite backend based on configuration.

use super::csv_writer::CsvReportWriter;
use super::jsonl_writer::JsonlReportWriter;
use super::normalizer::AggregateResult;
use super::sqlite_writer::SqliteReportWriter;
use super::writer_backend::{ReportWriterBackend, ReportWriterError};
use crate::config::BackendType;
use std::path::PathBuf;

/// Unified writer that routes to the configured backend
pub enum ReportWriter {
    Csv(CsvReportWriter),
    Jsonl(JsonlReportWriter),
    Sqlite(SqliteReportWriter),
}

impl ReportWriter {
    /// Create a new report writer based on backend type
    pub fn new(backend: BackendType, output_path: PathBuf, delimiter: char) -> Result<Self, ReportWriterError> {
        match backend {
            BackendType::Csv => Ok(ReportWriter::Csv(CsvReportWriter::new(output_path, delimiter)?)),
            BackendType::Jsonl => Ok(ReportWriter::Jsonl(JsonlReportWriter::new(output_path)?)),
            BackendType::Sqlite => Ok(ReportWriter::Sqlite(SqliteReportWriter::new(output_path)?)),
        }
    }

    fn backend(&mut self) -> &mut dyn ReportWriterBackend {
        match self {
            ReportWriter::Csv(w) => w,
            ReportWriter::Jsonl(w) => w,
            ReportWriter::Sqlite(w) => w,
        }
    }

    /// Write a report row to the configured backend
    pub async fn write_row(&mut self, row: &AggregateResult) -> Result<(), ReportWriterError> {
        self.backend().write_row(row).await
    }

    /// Write every row, then flush
    pub async fn write_all(&mut self, rows: &[AggregateResult]) -> Result<usize, ReportWriterError> {
        for row in rows {
            self.write_row(row).await?;
        }
        self.flush().await?;
        Ok(rows.len())
    }

    /// Flush pending writes to storage
    pub async fn flush(&mut self) -> Result<(), ReportWriterError> {
        self.backend().flush().await
    }

    /// Get backend type for logging
    pub fn backend_type(&self) -> &'static str {
        match self {
            ReportWriter::Csv(_) => "CSV",
            ReportWriter::Jsonl(_) => "JSONL",
            ReportWriter::Sqlite(_) => "SQLite",
        }
    }
}
