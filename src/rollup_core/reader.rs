//! Delimited table loading for the fact and dimension inputs
//!
//! Columns are located by header name, so their order in the file does not
//! matter and extra columns are ignored. Blank lines are skipped.

use super::records::{DimensionRecord, FactRecord, Status};
use crate::error::RollupError;
use std::path::Path;

pub const FACT_COLUMNS: [&str; 5] = ["legal_entity", "counter_party", "rating", "status", "value"];
pub const DIMENSION_COLUMNS: [&str; 2] = ["counter_party", "tier"];

/// Split one record on `delimiter`, honouring double-quoted fields.
pub fn split_record(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.trim_end_matches(['\r', '\n']).chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(c);
            }
        } else if c == '"' {
            in_quotes = true;
        } else if c == delimiter {
            fields.push(current.trim().to_string());
            current.clear();
        } else {
            current.push(c);
        }
    }
    fields.push(current.trim().to_string());
    fields
}

/// Header-indexed view over a delimited text table
struct DelimitedTable<'a> {
    source: &'a str,
    header: Vec<String>,
    rows: Vec<(usize, Vec<String>)>,
}

impl<'a> DelimitedTable<'a> {
    fn parse(source: &'a str, text: &str, delimiter: char) -> Result<Self, RollupError> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(idx, line)| (idx + 1, line))
            .filter(|(_, line)| !line.trim().is_empty());

        let header = match lines.next() {
            Some((_, line)) => split_record(line.strip_prefix('\u{feff}').unwrap_or(line), delimiter),
            None => return Err(RollupError::input_format(source, 1, "missing header row")),
        };

        let rows = lines
            .map(|(line_no, line)| (line_no, split_record(line, delimiter)))
            .collect();

        Ok(Self {
            source,
            header,
            rows,
        })
    }

    /// Resolve the position of every required column, failing on the first missing one.
    fn column_indices<const N: usize>(&self, required: [&str; N]) -> Result<[usize; N], RollupError> {
        let mut indices = [0usize; N];
        for (slot, name) in indices.iter_mut().zip(required) {
            *slot = self
                .header
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| {
                    RollupError::input_format(self.source, 1, format!("missing required column '{}'", name))
                })?;
        }
        Ok(indices)
    }

    fn check_width(&self, line_no: usize, fields: &[String]) -> Result<(), RollupError> {
        if fields.len() != self.header.len() {
            return Err(RollupError::input_format(
                self.source,
                line_no,
                format!("expected {} fields, found {}", self.header.len(), fields.len()),
            ));
        }
        Ok(())
    }

    fn parse_int(&self, line_no: usize, column: &str, raw: &str) -> Result<i64, RollupError> {
        raw.parse::<i64>().map_err(|_| {
            RollupError::input_format(
                self.source,
                line_no,
                format!("column '{}' is not an integer: '{}'", column, raw),
            )
        })
    }
}

pub fn parse_facts(source: &str, text: &str, delimiter: char) -> Result<Vec<FactRecord>, RollupError> {
    let table = DelimitedTable::parse(source, text, delimiter)?;
    let [legal_entity, counter_party, rating, status, value] = table.column_indices(FACT_COLUMNS)?;

    let mut facts = Vec::with_capacity(table.rows.len());
    for (line_no, fields) in &table.rows {
        table.check_width(*line_no, fields)?;

        let parsed_rating = table.parse_int(*line_no, "rating", &fields[rating])?;
        if parsed_rating < 0 {
            return Err(RollupError::input_format(
                source,
                *line_no,
                format!("rating must be non-negative, got {}", parsed_rating),
            ));
        }

        facts.push(FactRecord {
            legal_entity: fields[legal_entity].clone(),
            counter_party: fields[counter_party].clone(),
            rating: parsed_rating,
            status: Status::parse(&fields[status]),
            value: table.parse_int(*line_no, "value", &fields[value])?,
        });
    }

    Ok(facts)
}

pub fn parse_dimensions(
    source: &str,
    text: &str,
    delimiter: char,
) -> Result<Vec<DimensionRecord>, RollupError> {
    let table = DelimitedTable::parse(source, text, delimiter)?;
    let [counter_party, tier] = table.column_indices(DIMENSION_COLUMNS)?;

    let mut dims = Vec::with_capacity(table.rows.len());
    for (line_no, fields) in &table.rows {
        table.check_width(*line_no, fields)?;
        dims.push(DimensionRecord {
            counter_party: fields[counter_party].clone(),
            tier: table.parse_int(*line_no, "tier", &fields[tier])?,
        });
    }

    Ok(dims)
}

/// Load the fact table from disk
pub async fn load_facts(path: &Path, delimiter: char) -> Result<Vec<FactRecord>, RollupError> {
    let text = tokio::fs::read_to_string(path).await?;
    let facts = parse_facts(&path.display().to_string(), &text, delimiter)?;
    log::info!("📖 Loaded {} fact rows from {}", facts.len(), path.display());
    Ok(facts)
}

/// Load the counter party to tier mapping from disk
pub async fn load_dimensions(path: &Path, delimiter: char) -> Result<Vec<DimensionRecord>, RollupError> {
    let text = tokio::fs::read_to_string(path).await?;
    let dims = parse_dimensions(&path.display().to_string(), &text, delimiter)?;
    log::info!("📖 Loaded {} dimension rows from {}", dims.len(), path.display());
    Ok(dims)
}
