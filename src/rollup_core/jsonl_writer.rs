//! JSONL writer - one report row per line

use super::normalizer::AggregateResult;
use super::writer_backend::{ensure_parent_dir, ReportWriterBackend, ReportWriterError};
use async_trait::async_trait;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub struct JsonlReportWriter {
    writer: BufWriter<File>,
}

impl JsonlReportWriter {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, ReportWriterError> {
        let path = path.as_ref();
        ensure_parent_dir(path)?;

        let file = File::create(path)?;
        log::info!("📝 Writing rollup report to: {}", path.display());

        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    pub fn write_row(&mut self, row: &AggregateResult) -> Result<(), ReportWriterError> {
        let json = serde_json::to_string(row)?;
        writeln!(self.writer, "{}", json)?;
        Ok(())
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

impl Drop for JsonlReportWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

#[async_trait]
impl ReportWriterBackend for JsonlReportWriter {
    async fn write_row(&mut self, row: &AggregateResult) -> Result<(), ReportWriterError> {
        JsonlReportWriter::write_row(self, row)
    }

    async fn flush(&mut self) -> Result<(), ReportWriterError> {
        JsonlReportWriter::flush(self)?;
        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "JSONL"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rollup_core::normalizer::Dimension;

    #[tokio::test]
    async fn test_jsonl_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rollup.jsonl");
        let mut writer = JsonlReportWriter::new(&path).unwrap();

        let rows = vec![
            AggregateResult {
                legal_entity: Dimension::Total,
                counter_party: Dimension::Total,
                tier: Dimension::Value(2),
                max_rating: 6,
                arap: 0,
                accr: 207,
            },
            AggregateResult {
                legal_entity: Dimension::Value("L1".to_string()),
                counter_party: Dimension::Value("C1".to_string()),
                tier: Dimension::Total,
                max_rating: 2,
                arap: 20,
                accr: 0,
            },
        ];
        for row in &rows {
            ReportWriterBackend::write_row(&mut writer, row).await.unwrap();
        }
        ReportWriterBackend::flush(&mut writer).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["legal_entity"], "Total");
        assert_eq!(lines[0]["tier"], 2);
        assert_eq!(lines[0]["ACCR"], 207);
        assert_eq!(lines[1]["counter_party"], "C1");
        assert_eq!(lines[1]["tier"], "Total");
        assert_eq!(lines[1]["ARAP"], 20);
    }
}
