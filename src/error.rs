//! Error type shared by loading, joining and report writing

use crate::rollup_core::writer_backend::ReportWriterError;

#[derive(Debug)]
pub enum RollupError {
    /// Malformed input table. `line` is 1-based and counts the header.
    InputFormat {
        source: String,
        line: usize,
        message: String,
    },
    /// A counter party maps to several tiers while the fan-out policy rejects that.
    DuplicateDimension { counter_party: String, tiers: Vec<i64> },
    /// A group's ARAP or ACCR sum does not fit in i64.
    SumOverflow {
        key: &'static str,
        group: String,
        column: &'static str,
    },
    Io(std::io::Error),
    Writer(ReportWriterError),
    Task(String),
}

impl RollupError {
    pub fn input_format(source: impl Into<String>, line: usize, message: impl Into<String>) -> Self {
        RollupError::InputFormat {
            source: source.into(),
            line,
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for RollupError {
    fn from(err: std::io::Error) -> Self {
        RollupError::Io(err)
    }
}

impl From<ReportWriterError> for RollupError {
    fn from(err: ReportWriterError) -> Self {
        RollupError::Writer(err)
    }
}

impl From<tokio::task::JoinError> for RollupError {
    fn from(err: tokio::task::JoinError) -> Self {
        RollupError::Task(err.to_string())
    }
}

impl std::fmt::Display for RollupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RollupError::InputFormat {
                source,
                line,
                message,
            } => write!(f, "Input format error in {} (line {}): {}", source, line, message),
            RollupError::DuplicateDimension {
                counter_party,
                tiers,
            } => write!(
                f,
                "Counter party {} has {} dimension rows (tiers {:?})",
                counter_party,
                tiers.len(),
                tiers
            ),
            RollupError::SumOverflow { key, group, column } => write!(
                f,
                "{} sum overflows i64 for group {} (grouped by {})",
                column, group, key
            ),
            RollupError::Io(e) => write!(f, "IO error: {}", e),
            RollupError::Writer(e) => write!(f, "Writer error: {}", e),
            RollupError::Task(e) => write!(f, "Aggregation task failed: {}", e),
        }
    }
}

impl std::error::Error for RollupError {}
