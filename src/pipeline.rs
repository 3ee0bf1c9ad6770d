//! Rollup pipeline - orchestration of join, aggregation, normalization and merge
//!
//! The joiner runs once; the four group-by passes read the same immutable
//! enriched records and are merged back in fixed key order.
//!
//! ```text
//! facts + dims → RecordJoiner → Arc<[EnrichedRecord]>
//!                                   ├→ aggregate(LegalEntity)             ─┐
//!                                   ├→ aggregate(LegalEntityCounterParty) ─┤
//!                                   ├→ aggregate(CounterParty)            ─┼→ ResultMerger → rows
//!                                   └→ aggregate(Tier)                    ─┘
//! ```

use crate::config::RollupConfig;
use crate::error::RollupError;
use crate::rollup_core::aggregator::count_unknown_status;
use crate::rollup_core::{
    load_dimensions, load_facts, AccrPolicy, AggregateResult, DimensionRecord, EnrichedRecord, FactRecord,
    GroupAggregator, GroupKey, JoinFanout, JoinStats, RecordJoiner, ReportWriter, ResultMerger, ResultNormalizer,
};
use std::sync::Arc;

/// Output of one rollup run
#[derive(Debug, Clone)]
pub struct RollupReport {
    /// Report rows in canonical block order
    pub rows: Vec<AggregateResult>,
    pub join_stats: JoinStats,
    /// Row count per grouping key, in report order
    pub block_sizes: Vec<(GroupKey, usize)>,
    /// Joined records whose status is neither ARAP nor ACCR
    pub unknown_status_records: usize,
}

impl RollupReport {
    /// Rows produced by one grouping key
    pub fn block(&self, key: GroupKey) -> &[AggregateResult] {
        let mut start = 0;
        for (block_key, size) in &self.block_sizes {
            if *block_key == key {
                return &self.rows[start..start + size];
            }
            start += size;
        }
        &[]
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RollupPipeline {
    join_fanout: JoinFanout,
    accr_policy: AccrPolicy,
    chunk_size: usize,
}

impl RollupPipeline {
    pub fn new(join_fanout: JoinFanout, accr_policy: AccrPolicy) -> Self {
        Self {
            join_fanout,
            accr_policy,
            chunk_size: 0,
        }
    }

    pub fn from_config(config: &RollupConfig) -> Self {
        Self::new(config.join_fanout, config.accr_policy).with_chunk_size(config.chunk_size)
    }

    /// Aggregate in partial chunks of `chunk_size` records (0 disables chunking)
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Run the whole rollup on the calling thread
    pub fn run(&self, facts: &[FactRecord], dims: &[DimensionRecord]) -> Result<RollupReport, RollupError> {
        let (enriched, join_stats) = self.join(facts, dims)?;

        let blocks = GroupKey::all()
            .into_iter()
            .map(|key| Ok((key, self.rollup_key(&enriched, key)?)))
            .collect::<Result<Vec<_>, RollupError>>()?;

        Ok(self.finish(blocks, join_stats, &enriched))
    }

    /// Run the four grouping passes concurrently on the blocking pool
    pub async fn run_concurrent(
        &self,
        facts: &[FactRecord],
        dims: &[DimensionRecord],
    ) -> Result<RollupReport, RollupError> {
        let (enriched, join_stats) = self.join(facts, dims)?;
        let enriched: Arc<[EnrichedRecord]> = enriched.into();

        let handles: Vec<_> = GroupKey::all()
            .into_iter()
            .map(|key| {
                let records = Arc::clone(&enriched);
                let pipeline = *self;
                tokio::task::spawn_blocking(move || pipeline.rollup_key(&records, key).map(|rows| (key, rows)))
            })
            .collect();

        let mut blocks = Vec::with_capacity(handles.len());
        for handle in handles {
            blocks.push(handle.await??);
        }

        Ok(self.finish(blocks, join_stats, &enriched))
    }

    /// Load both tables, run the rollup concurrently and write the report
    pub async fn run_files(&self, config: &RollupConfig) -> Result<RollupReport, RollupError> {
        let facts = load_facts(&config.facts_path, config.delimiter).await?;
        let dims = load_dimensions(&config.dimensions_path, config.delimiter).await?;

        let report = self.run_concurrent(&facts, &dims).await?;

        let mut writer = ReportWriter::new(config.backend, config.output_path.clone(), config.delimiter)?;
        let written = writer.write_all(&report.rows).await?;
        log::info!(
            "✅ Wrote {} report rows ({} backend) to {}",
            written,
            writer.backend_type(),
            config.output_path.display()
        );

        Ok(report)
    }

    fn join(
        &self,
        facts: &[FactRecord],
        dims: &[DimensionRecord],
    ) -> Result<(Vec<EnrichedRecord>, JoinStats), RollupError> {
        let (enriched, stats) = RecordJoiner::new(self.join_fanout).join(facts, dims)?;

        log::info!(
            "🔗 Joined {} facts with {} tier rows → {} records (fan-out: {})",
            stats.facts,
            stats.dimensions,
            stats.enriched,
            self.join_fanout.as_str()
        );
        if stats.unmatched > 0 {
            log::warn!("⚠️  {} facts have no tier for their counter party and were dropped", stats.unmatched);
        }

        Ok((enriched, stats))
    }

    fn rollup_key(&self, records: &[EnrichedRecord], key: GroupKey) -> Result<Vec<AggregateResult>, RollupError> {
        let aggregator = GroupAggregator::new(self.accr_policy);
        let groups = if self.chunk_size > 0 {
            aggregator.aggregate_chunked(records, key, self.chunk_size)?
        } else {
            aggregator.aggregate(records, key)?
        };

        let rows = ResultNormalizer::new().normalize_all(key, &groups);
        log::debug!("📊 {} → {} rows", key.as_str(), rows.len());
        Ok(rows)
    }

    fn finish(
        &self,
        blocks: Vec<(GroupKey, Vec<AggregateResult>)>,
        join_stats: JoinStats,
        enriched: &[EnrichedRecord],
    ) -> RollupReport {
        let mut block_sizes: Vec<(GroupKey, usize)> = blocks.iter().map(|(key, rows)| (*key, rows.len())).collect();
        block_sizes.sort_by_key(|(key, _)| *key);

        let unknown_status_records = count_unknown_status(enriched);
        if unknown_status_records > 0 {
            let treatment = match self.accr_policy {
                AccrPolicy::NotArap => "counted as ACCR",
                AccrPolicy::StrictAccr => "excluded from both sums",
            };
            log::warn!(
                "⚠️  {} records have a status other than ARAP/ACCR ({})",
                unknown_status_records,
                treatment
            );
        }

        let rows = ResultMerger::new().merge(blocks);
        log::info!("📊 Rollup produced {} rows {:?}", rows.len(), block_sizes);

        RollupReport {
            rows,
            join_stats,
            block_sizes,
            unknown_status_records,
        }
    }
}
