//! Rollup Core - Invoice Join and Multi-Key Aggregation
//!
//! Joins invoice facts to the counter party tier mapping and rolls them up
//! over four grouping keys into a single report.
//!
//! # Architecture
//!
//! ```text
//! dataset1 (facts) ─┐
//!                   ├→ RecordJoiner (inner join on counter_party)
//! dataset2 (tiers) ─┘        ↓
//!        GroupAggregator × 4 (legal_entity | legal_entity+counter_party | counter_party | tier)
//!                            ↓
//!        ResultNormalizer (ungrouped columns → "Total")
//!                            ↓
//!        ResultMerger (fixed block order)
//!                            ↓
//!        ReportWriter → CSV, JSONL or SQLite backend
//! ```

pub mod aggregator;
pub mod csv_writer;
pub mod joiner;
pub mod jsonl_writer;
pub mod merger;
pub mod normalizer;
pub mod reader;
pub mod records;
pub mod sqlite_writer;
pub mod writer;
pub mod writer_backend;

pub use aggregator::{AccrPolicy, GroupAggregator, GroupKey, GroupKeyValue, GroupMetrics};
pub use csv_writer::CsvReportWriter;
pub use joiner::{JoinFanout, JoinStats, RecordJoiner};
pub use jsonl_writer::JsonlReportWriter;
pub use merger::{ResultMerger, REPORT_COLUMNS};
pub use normalizer::{AggregateResult, Dimension, ResultNormalizer, TOTAL_SENTINEL};
pub use reader::{load_dimensions, load_facts};
pub use records::{DimensionRecord, EnrichedRecord, FactRecord, Status};
pub use sqlite_writer::SqliteReportWriter;
pub use writer::ReportWriter;
pub use writer_backend::{ReportWriterBackend, ReportWriterError};
