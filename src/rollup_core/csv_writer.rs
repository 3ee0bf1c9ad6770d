//! Delimited text writer for the rollup report

use super::merger::REPORT_COLUMNS;
use super::normalizer::AggregateResult;
use super::writer_backend::{ensure_parent_dir, ReportWriterBackend, ReportWriterError};
use async_trait::async_trait;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub struct CsvReportWriter {
    writer: BufWriter<File>,
    delimiter: char,
    rows_written: usize,
}

impl CsvReportWriter {
    /// Create (or truncate) the report file and write the header row
    pub fn new(path: impl AsRef<Path>, delimiter: char) -> Result<Self, ReportWriterError> {
        let path = path.as_ref();
        ensure_parent_dir(path)?;

        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "{}", REPORT_COLUMNS.join(&delimiter.to_string()))?;

        log::info!("📝 Writing rollup report to: {}", path.display());

        Ok(Self {
            writer,
            delimiter,
            rows_written: 0,
        })
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    fn escape(&self, field: &str) -> String {
        if field.contains(self.delimiter) || field.contains('"') || field.contains('\n') || field.contains('\r') {
            format!("\"{}\"", field.replace('"', "\"\""))
        } else {
            field.to_string()
        }
    }

    pub fn write_row(&mut self, row: &AggregateResult) -> std::io::Result<()> {
        let line = row
            .to_fields()
            .iter()
            .map(|f| self.escape(f))
            .collect::<Vec<_>>()
            .join(&self.delimiter.to_string());
        writeln!(self.writer, "{}", line)?;
        self.rows_written += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

impl Drop for CsvReportWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

#[async_trait]
impl ReportWriterBackend for CsvReportWriter {
    async fn write_row(&mut self, row: &AggregateResult) -> Result<(), ReportWriterError> {
        CsvReportWriter::write_row(self, row)?;
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), ReportWriterError> {
        CsvReportWriter::flush(self)?;
        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "CSV"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rollup_core::normalizer::Dimension;
    use crate::rollup_core::reader::split_record;

    fn create_test_row(legal_entity: &str) -> AggregateResult {
        AggregateResult {
            legal_entity: Dimension::Value(legal_entity.to_string()),
            counter_party: Dimension::Total,
            tier: Dimension::Total,
            max_rating: 2,
            arap: 20,
            accr: -5,
        }
    }

    #[test]
    fn test_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("rollup.csv");

        let mut writer = CsvReportWriter::new(&path, ',').unwrap();
        writer.write_row(&create_test_row("L1")).unwrap();
        writer.flush().unwrap();
        assert_eq!(writer.rows_written(), 1);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "legal_entity,counter_party,tier,max_rating,ARAP,ACCR\nL1,Total,Total,2,20,-5\n"
        );
    }

    #[test]
    fn test_fields_with_delimiter_are_quoted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rollup.csv");

        let mut writer = CsvReportWriter::new(&path, ',').unwrap();
        writer.write_row(&create_test_row("Acme, \"Ltd\"")).unwrap();
        drop(writer);

        let content = std::fs::read_to_string(&path).unwrap();
        let row_line = content.lines().nth(1).unwrap();
        assert_eq!(row_line, "\"Acme, \"\"Ltd\"\"\",Total,Total,2,20,-5");
        assert_eq!(split_record(row_line, ',')[0], "Acme, \"Ltd\"");
    }

    #[test]
    fn test_fields_with_carriage_return_are_quoted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rollup.csv");

        let mut writer = CsvReportWriter::new(&path, ',').unwrap();
        writer.write_row(&create_test_row("L1\rX")).unwrap();
        drop(writer);

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.ends_with("\n\"L1\rX\",Total,Total,2,20,-5\n"));
    }

    #[tokio::test]
    async fn test_backend_trait() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rollup.tsv");

        let mut writer: Box<dyn ReportWriterBackend> = Box::new(CsvReportWriter::new(&path, '\t').unwrap());
        writer.write_row(&create_test_row("L1")).await.unwrap();
        writer.flush().await.unwrap();
        assert_eq!(writer.backend_type(), "CSV");

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("legal_entity\tcounter_party\t"));
        assert!(content.contains("L1\tTotal\tTotal\t2\t20\t-5"));
    }
}
