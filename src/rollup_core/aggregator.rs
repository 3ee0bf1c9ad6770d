//! Group-by aggregation over joined invoice records

use super::records::EnrichedRecord;
use crate::error::RollupError;
use std::collections::BTreeMap;

/// The four grouping dimensions a rollup is computed over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GroupKey {
    LegalEntity,
    LegalEntityCounterParty,
    CounterParty,
    Tier,
}

impl GroupKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupKey::LegalEntity => "legal_entity",
            GroupKey::LegalEntityCounterParty => "legal_entity+counter_party",
            GroupKey::CounterParty => "counter_party",
            GroupKey::Tier => "tier",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "legal_entity" => Some(GroupKey::LegalEntity),
            "legal_entity+counter_party" => Some(GroupKey::LegalEntityCounterParty),
            "counter_party" => Some(GroupKey::CounterParty),
            "tier" => Some(GroupKey::Tier),
            _ => None,
        }
    }

    /// All keys in report order
    pub fn all() -> [GroupKey; 4] {
        [
            GroupKey::LegalEntity,
            GroupKey::LegalEntityCounterParty,
            GroupKey::CounterParty,
            GroupKey::Tier,
        ]
    }

    pub fn includes_legal_entity(&self) -> bool {
        matches!(self, GroupKey::LegalEntity | GroupKey::LegalEntityCounterParty)
    }

    pub fn includes_counter_party(&self) -> bool {
        matches!(self, GroupKey::LegalEntityCounterParty | GroupKey::CounterParty)
    }

    pub fn includes_tier(&self) -> bool {
        matches!(self, GroupKey::Tier)
    }

    /// Project a record onto this key's fields; fields outside the key are `None`.
    pub fn project(&self, record: &EnrichedRecord) -> GroupKeyValue {
        GroupKeyValue {
            legal_entity: self
                .includes_legal_entity()
                .then(|| record.legal_entity.clone()),
            counter_party: self
                .includes_counter_party()
                .then(|| record.counter_party.clone()),
            tier: self.includes_tier().then_some(record.tier),
        }
    }
}

/// Values of the grouped fields for one group
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKeyValue {
    pub legal_entity: Option<String>,
    pub counter_party: Option<String>,
    pub tier: Option<i64>,
}

/// Which statuses count toward the ACCR sum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccrPolicy {
    /// Everything that is not ARAP
    #[default]
    NotArap,
    /// Only the literal ACCR status
    StrictAccr,
}

impl AccrPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccrPolicy::NotArap => "not_arap",
            AccrPolicy::StrictAccr => "strict",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "not_arap" => Some(AccrPolicy::NotArap),
            "strict" => Some(AccrPolicy::StrictAccr),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupMetrics {
    pub max_rating: i64,
    pub arap: i64,
    pub accr: i64,
    pub record_count: usize,
}

impl GroupMetrics {
    pub fn new() -> Self {
        Self {
            max_rating: i64::MIN,
            arap: 0,
            accr: 0,
            record_count: 0,
        }
    }

    pub fn add_record(&mut self, record: &EnrichedRecord, policy: AccrPolicy) -> Result<(), SumOverflow> {
        self.max_rating = self.max_rating.max(record.rating);
        self.record_count += 1;

        if record.status.is_arap() {
            self.arap = checked_sum(self.arap, record.value, "ARAP")?;
        } else if policy == AccrPolicy::NotArap || record.status.is_accr() {
            self.accr = checked_sum(self.accr, record.value, "ACCR")?;
        }
        Ok(())
    }

    /// Combine partial results computed over disjoint slices of one group
    pub fn merge(&mut self, other: &GroupMetrics) -> Result<(), SumOverflow> {
        self.max_rating = self.max_rating.max(other.max_rating);
        self.arap = checked_sum(self.arap, other.arap, "ARAP")?;
        self.accr = checked_sum(self.accr, other.accr, "ACCR")?;
        self.record_count += other.record_count;
        Ok(())
    }
}

/// A group's ARAP or ACCR sum left the i64 range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SumOverflow {
    pub column: &'static str,
}

fn checked_sum(acc: i64, value: i64, column: &'static str) -> Result<i64, SumOverflow> {
    acc.checked_add(value).ok_or(SumOverflow { column })
}

impl Default for GroupMetrics {
    fn default() -> Self {
        Self::new()
    }
}

pub struct GroupAggregator {
    policy: AccrPolicy,
}

impl GroupAggregator {
    pub fn new(policy: AccrPolicy) -> Self {
        Self { policy }
    }

    /// Partition `records` by `key` and fold each partition.
    ///
    /// Every record lands in exactly one group, so groups are never empty.
    pub fn aggregate(
        &self,
        records: &[EnrichedRecord],
        key: GroupKey,
    ) -> Result<BTreeMap<GroupKeyValue, GroupMetrics>, RollupError> {
        let mut groups: BTreeMap<GroupKeyValue, GroupMetrics> = BTreeMap::new();

        for record in records {
            let value = key.project(record);
            let metrics = groups.entry(value.clone()).or_default();
            if let Err(overflow) = metrics.add_record(record, self.policy) {
                return Err(overflow_error(key, value, overflow));
            }
        }

        log::debug!("Grouped {} records into {} groups by {}", records.len(), groups.len(), key.as_str());
        Ok(groups)
    }

    /// Aggregate in fixed-size chunks and merge the partial groups.
    ///
    /// Produces the same result as [`GroupAggregator::aggregate`].
    pub fn aggregate_chunked(
        &self,
        records: &[EnrichedRecord],
        key: GroupKey,
        chunk_size: usize,
    ) -> Result<BTreeMap<GroupKeyValue, GroupMetrics>, RollupError> {
        let mut groups: BTreeMap<GroupKeyValue, GroupMetrics> = BTreeMap::new();

        for chunk in records.chunks(chunk_size.max(1)) {
            for (value, partial) in self.aggregate(chunk, key)? {
                let metrics = groups.entry(value.clone()).or_default();
                if let Err(overflow) = metrics.merge(&partial) {
                    return Err(overflow_error(key, value, overflow));
                }
            }
        }

        Ok(groups)
    }
}

fn overflow_error(key: GroupKey, group: GroupKeyValue, overflow: SumOverflow) -> RollupError {
    RollupError::SumOverflow {
        key: key.as_str(),
        group: format!("{:?}", group),
        column: overflow.column,
    }
}

/// Count records whose status is neither ARAP nor ACCR
pub fn count_unknown_status(records: &[EnrichedRecord]) -> usize {
    records
        .iter()
        .filter(|r| !r.status.is_arap() && !r.status.is_accr())
        .count()
}
