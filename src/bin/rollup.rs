//! Rollup Binary - Invoice Tier Aggregation Report
//!
//! Joins the invoice fact table with the counter party tier mapping and writes
//! the four-key rollup report.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --bin rollup -- --backend csv
//! ```
//!
//! ## Environment Variables
//!
//! - TIERFLOW_FACTS_PATH - Invoice fact table (default: data/dataset1.csv)
//! - TIERFLOW_DIMENSIONS_PATH - Counter party tier mapping (default: data/dataset2.csv)
//! - TIERFLOW_OUTPUT_PATH - Report destination (default: output/rollup.csv, output/rollup.jsonl or data/tierflow.db)
//! - TIERFLOW_DELIMITER - Field delimiter for input and CSV output (default: ,)
//! - TIERFLOW_JOIN_FANOUT - cross | first | reject (default: cross)
//! - TIERFLOW_ACCR_POLICY - not_arap | strict (default: not_arap)
//! - TIERFLOW_CHUNK_SIZE - Records per partial aggregate, 0 for single pass (default: 0)
//! - RUST_LOG - Logging level (optional, default: info)

use tierflow::{RollupConfig, RollupPipeline};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tierflow::config::init_logging()?;

    let config = RollupConfig::from_env()?;

    log::info!("🚀 Starting invoice tier rollup");
    log::info!("   Facts: {}", config.facts_path.display());
    log::info!("   Tiers: {}", config.dimensions_path.display());
    log::info!("   Output: {} ({:?})", config.output_path.display(), config.backend);
    log::info!("   Join fan-out: {}", config.join_fanout.as_str());
    log::info!("   ACCR policy: {}", config.accr_policy.as_str());

    let pipeline = RollupPipeline::from_config(&config);

    match pipeline.run_files(&config).await {
        Ok(report) => {
            log::info!(
                "✅ Rollup complete: {} rows from {} joined records ({} facts dropped)",
                report.rows.len(),
                report.join_stats.enriched,
                report.join_stats.unmatched
            );
            Ok(())
        }
        Err(e) => {
            log::error!("❌ Rollup failed: {}", e);
            Err(e.into())
        }
    }
}
