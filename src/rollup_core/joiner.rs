//! Counter party join between the fact table and the tier mapping

use super::records::{DimensionRecord, EnrichedRecord, FactRecord};
use crate::error::RollupError;
use std::collections::HashMap;

/// How a counter party with several dimension rows is joined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinFanout {
    /// One enriched record per matching dimension row
    #[default]
    CrossProduct,
    /// Only the first dimension row in file order is used
    FirstMatch,
    /// Duplicate dimension rows abort the join
    Reject,
}

impl JoinFanout {
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinFanout::CrossProduct => "cross",
            JoinFanout::FirstMatch => "first",
            JoinFanout::Reject => "reject",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "cross" => Some(JoinFanout::CrossProduct),
            "first" => Some(JoinFanout::FirstMatch),
            "reject" => Some(JoinFanout::Reject),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JoinStats {
    pub facts: usize,
    pub dimensions: usize,
    pub enriched: usize,
    /// Facts dropped because their counter party has no tier
    pub unmatched: usize,
}

pub struct RecordJoiner {
    fanout: JoinFanout,
}

impl RecordJoiner {
    pub fn new(fanout: JoinFanout) -> Self {
        Self { fanout }
    }

    /// Inner join on `counter_party`.
    ///
    /// Output follows fact order, and all records produced from one fact are
    /// contiguous, in dimension file order.
    pub fn join(
        &self,
        facts: &[FactRecord],
        dims: &[DimensionRecord],
    ) -> Result<(Vec<EnrichedRecord>, JoinStats), RollupError> {
        let tier_index = self.build_index(dims)?;

        let mut enriched = Vec::with_capacity(facts.len());
        let mut unmatched = 0;

        for fact in facts {
            match tier_index.get(fact.counter_party.as_str()) {
                Some(tiers) => {
                    enriched.extend(tiers.iter().map(|&tier| EnrichedRecord::from_fact(fact, tier)));
                }
                None => {
                    log::debug!(
                        "No tier for counter party {} (legal entity {}), dropping fact",
                        fact.counter_party,
                        fact.legal_entity
                    );
                    unmatched += 1;
                }
            }
        }

        let stats = JoinStats {
            facts: facts.len(),
            dimensions: dims.len(),
            enriched: enriched.len(),
            unmatched,
        };

        Ok((enriched, stats))
    }

    fn build_index<'a>(&self, dims: &'a [DimensionRecord]) -> Result<HashMap<&'a str, Vec<i64>>, RollupError> {
        let mut index: HashMap<&str, Vec<i64>> = HashMap::with_capacity(dims.len());

        for dim in dims {
            let tiers = index.entry(dim.counter_party.as_str()).or_default();
            if tiers.is_empty() || self.fanout == JoinFanout::CrossProduct {
                tiers.push(dim.tier);
            } else if self.fanout == JoinFanout::Reject {
                tiers.push(dim.tier);
                return Err(RollupError::DuplicateDimension {
                    counter_party: dim.counter_party.clone(),
                    tiers: tiers.clone(),
                });
            }
        }

        Ok(index)
    }
}
