use crate::rollup_core::{AccrPolicy, JoinFanout};
use std::env;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    Csv,
    Jsonl,
    Sqlite,
}

impl BackendType {
    pub fn default_output_path(&self) -> &'static str {
        match self {
            BackendType::Csv => "output/rollup.csv",
            BackendType::Jsonl => "output/rollup.jsonl",
            BackendType::Sqlite => "data/tierflow.db",
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue(msg) => write!(f, "Invalid configuration value: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Configuration loaded from environment variables and the `--backend` flag
#[derive(Debug, Clone)]
pub struct RollupConfig {
    pub facts_path: PathBuf,
    pub dimensions_path: PathBuf,
    pub output_path: PathBuf,
    pub backend: BackendType,
    pub delimiter: char,
    pub join_fanout: JoinFanout,
    pub accr_policy: AccrPolicy,
    /// Records per partial aggregate; 0 aggregates each key in one pass
    pub chunk_size: usize,
}

impl RollupConfig {
    /// Load configuration from environment variables
    ///
    /// - `TIERFLOW_FACTS_PATH` (default: data/dataset1.csv)
    /// - `TIERFLOW_DIMENSIONS_PATH` (default: data/dataset2.csv)
    /// - `TIERFLOW_OUTPUT_PATH` (default depends on backend)
    /// - `TIERFLOW_DELIMITER` (default: ,)
    /// - `TIERFLOW_JOIN_FANOUT` cross | first | reject (default: cross)
    /// - `TIERFLOW_ACCR_POLICY` not_arap | strict (default: not_arap)
    /// - `TIERFLOW_CHUNK_SIZE` (default: 0)
    pub fn from_env() -> Result<Self, ConfigError> {
        let args: Vec<String> = env::args().collect();
        Self::from_env_and_args(&args)
    }

    pub fn from_env_and_args(args: &[String]) -> Result<Self, ConfigError> {
        let backend = parse_backend_from_args(args)?;

        let output_path = env::var("TIERFLOW_OUTPUT_PATH")
            .unwrap_or_else(|_| backend.default_output_path().to_string());

        let delimiter = match env::var("TIERFLOW_DELIMITER") {
            Ok(raw) => parse_delimiter(&raw)?,
            Err(_) => ',',
        };

        let join_fanout = match env::var("TIERFLOW_JOIN_FANOUT") {
            Ok(raw) => JoinFanout::from_str(raw.trim().to_lowercase().as_str()).ok_or_else(|| {
                ConfigError::InvalidValue(format!(
                    "TIERFLOW_JOIN_FANOUT must be cross, first or reject, got '{}'",
                    raw
                ))
            })?,
            Err(_) => JoinFanout::default(),
        };

        let accr_policy = match env::var("TIERFLOW_ACCR_POLICY") {
            Ok(raw) => AccrPolicy::from_str(raw.trim().to_lowercase().as_str()).ok_or_else(|| {
                ConfigError::InvalidValue(format!(
                    "TIERFLOW_ACCR_POLICY must be not_arap or strict, got '{}'",
                    raw
                ))
            })?,
            Err(_) => AccrPolicy::default(),
        };

        let chunk_size = match env::var("TIERFLOW_CHUNK_SIZE") {
            Ok(raw) => raw.trim().parse::<usize>().map_err(|_| {
                ConfigError::InvalidValue(format!("TIERFLOW_CHUNK_SIZE must be a non-negative integer, got '{}'", raw))
            })?,
            Err(_) => 0,
        };

        Ok(Self {
            facts_path: env::var("TIERFLOW_FACTS_PATH")
                .unwrap_or_else(|_| "data/dataset1.csv".to_string())
                .into(),
            dimensions_path: env::var("TIERFLOW_DIMENSIONS_PATH")
                .unwrap_or_else(|_| "data/dataset2.csv".to_string())
                .into(),
            output_path: output_path.into(),
            backend,
            delimiter,
            join_fanout,
            accr_policy,
            chunk_size,
        })
    }
}

fn parse_backend_from_args(args: &[String]) -> Result<BackendType, ConfigError> {
    match args.iter().position(|x| x == "--backend") {
        Some(idx) => match args.get(idx + 1).map(|s| s.as_str()) {
            Some("csv") => Ok(BackendType::Csv),
            Some("jsonl") => Ok(BackendType::Jsonl),
            Some("sqlite") => Ok(BackendType::Sqlite),
            other => Err(ConfigError::InvalidValue(format!(
                "--backend must be csv, jsonl or sqlite, got {:?}",
                other
            ))),
        },
        None => Ok(BackendType::Csv),
    }
}

fn parse_delimiter(raw: &str) -> Result<char, ConfigError> {
    if raw == "\\t" {
        return Ok('\t');
    }
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c != '"' => Ok(c),
        _ => Err(ConfigError::InvalidValue(format!(
            "TIERFLOW_DELIMITER must be a single character other than '\"', got '{}'",
            raw
        ))),
    }
}

/// Load `.env` (from `env_file`, or the working directory) and build the stderr logger.
/// The file is read before the filter so a `RUST_LOG` set there applies.
pub fn build_logger(env_file: Option<&Path>) -> env_logger::Logger {
    match env_file {
        Some(path) => {
            dotenv::from_path(path).ok();
        }
        None => {
            dotenv::dotenv().ok();
        }
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .build()
}

/// Install the logger from [`build_logger`] as the global `log` sink
pub fn init_logging() -> Result<(), log::SetLoggerError> {
    let logger = build_logger(None);
    let level = logger.filter();
    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(level);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARS: [&str; 7] = [
        "TIERFLOW_FACTS_PATH",
        "TIERFLOW_DIMENSIONS_PATH",
        "TIERFLOW_OUTPUT_PATH",
        "TIERFLOW_DELIMITER",
        "TIERFLOW_JOIN_FANOUT",
        "TIERFLOW_ACCR_POLICY",
        "TIERFLOW_CHUNK_SIZE",
    ];

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    // Env vars are process-global, so every env scenario runs inside this one test.
    #[test]
    fn test_config_from_env() {
        for var in VARS {
            env::remove_var(var);
        }

        let config = RollupConfig::from_env_and_args(&args(&["rollup"])).unwrap();
        assert_eq!(config.facts_path, PathBuf::from("data/dataset1.csv"));
        assert_eq!(config.dimensions_path, PathBuf::from("data/dataset2.csv"));
        assert_eq!(config.output_path, PathBuf::from("output/rollup.csv"));
        assert_eq!(config.backend, BackendType::Csv);
        assert_eq!(config.delimiter, ',');
        assert_eq!(config.join_fanout, JoinFanout::CrossProduct);
        assert_eq!(config.accr_policy, AccrPolicy::NotArap);
        assert_eq!(config.chunk_size, 0);

        let config = RollupConfig::from_env_and_args(&args(&["rollup", "--backend", "sqlite"])).unwrap();
        assert_eq!(config.output_path, PathBuf::from("data/tierflow.db"));

        env::set_var("TIERFLOW_OUTPUT_PATH", "/tmp/report.tsv");
        env::set_var("TIERFLOW_DELIMITER", "\\t");
        env::set_var("TIERFLOW_JOIN_FANOUT", "First");
        env::set_var("TIERFLOW_ACCR_POLICY", "strict");
        env::set_var("TIERFLOW_CHUNK_SIZE", "1000");

        let config = RollupConfig::from_env_and_args(&args(&["rollup"])).unwrap();
        assert_eq!(config.output_path, PathBuf::from("/tmp/report.tsv"));
        assert_eq!(config.delimiter, '\t');
        assert_eq!(config.join_fanout, JoinFanout::FirstMatch);
        assert_eq!(config.accr_policy, AccrPolicy::StrictAccr);
        assert_eq!(config.chunk_size, 1000);

        env::set_var("TIERFLOW_JOIN_FANOUT", "outer");
        assert!(RollupConfig::from_env_and_args(&args(&["rollup"])).is_err());
        env::set_var("TIERFLOW_JOIN_FANOUT", "cross");

        env::set_var("TIERFLOW_DELIMITER", ";;");
        assert!(RollupConfig::from_env_and_args(&args(&["rollup"])).is_err());

        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_env_file_sets_log_filter() {
        env::remove_var("RUST_LOG");
        let dir = tempfile::tempdir().unwrap();
        let env_file = dir.path().join(".env");
        std::fs::write(&env_file, "RUST_LOG=warn\n").unwrap();

        let logger = build_logger(Some(&env_file));
        assert_eq!(logger.filter(), log::LevelFilter::Warn);

        env::remove_var("RUST_LOG");
        assert_eq!(build_logger(None).filter(), log::LevelFilter::Info);
    }

    #[test]
    fn test_backend_flag() {
        assert_eq!(parse_backend_from_args(&args(&["rollup"])).unwrap(), BackendType::Csv);
        assert_eq!(
            parse_backend_from_args(&args(&["rollup", "--backend", "jsonl"])).unwrap(),
            BackendType::Jsonl
        );
        assert!(parse_backend_from_args(&args(&["rollup", "--backend"])).is_err());
        assert!(parse_backend_from_args(&args(&["rollup", "--backend", "parquet"])).is_err());
    }

    #[test]
    fn test_parse_delimiter() {
        assert_eq!(parse_delimiter(",").unwrap(), ',');
        assert_eq!(parse_delimiter("|").unwrap(), '|');
        assert_eq!(parse_delimiter("\\t").unwrap(), '\t');
        assert!(parse_delimiter("").is_err());
        assert!(parse_delimiter("\"").is_err());
    }
}
