//! Conversion of grouped metrics into report rows with "Total" fill-in

use super::aggregator::{GroupKey, GroupKeyValue, GroupMetrics};
use serde::{Serialize, Serializer};
use std::fmt;

pub const TOTAL_SENTINEL: &str = "Total";

/// A report column that either carries a grouped value or aggregates across all values
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Dimension<T> {
    Value(T),
    Total,
}

impl<T> Dimension<T> {
    pub fn is_total(&self) -> bool {
        matches!(self, Dimension::Total)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Dimension::Value(v) => Some(v),
            Dimension::Total => None,
        }
    }
}

impl<T> From<Option<T>> for Dimension<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Dimension::Total, Dimension::Value)
    }
}

impl<T: fmt::Display> fmt::Display for Dimension<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::Value(v) => fmt::Display::fmt(v, f),
            Dimension::Total => f.write_str(TOTAL_SENTINEL),
        }
    }
}

impl<T: Serialize> Serialize for Dimension<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Dimension::Value(v) => v.serialize(serializer),
            Dimension::Total => serializer.serialize_str(TOTAL_SENTINEL),
        }
    }
}

/// One row of the rollup report, in canonical column order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateResult {
    pub legal_entity: Dimension<String>,
    pub counter_party: Dimension<String>,
    pub tier: Dimension<i64>,
    pub max_rating: i64,
    #[serde(rename = "ARAP")]
    pub arap: i64,
    #[serde(rename = "ACCR")]
    pub accr: i64,
}

impl AggregateResult {
    /// Report cells as text, sentinel fields rendered as "Total"
    pub fn to_fields(&self) -> [String; 6] {
        [
            self.legal_entity.to_string(),
            self.counter_party.to_string(),
            self.tier.to_string(),
            self.max_rating.to_string(),
            self.arap.to_string(),
            self.accr.to_string(),
        ]
    }
}

pub struct ResultNormalizer;

impl ResultNormalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, key: GroupKey, group_value: &GroupKeyValue, metrics: &GroupMetrics) -> AggregateResult {
        let legal_entity = group_value.legal_entity.clone().filter(|_| key.includes_legal_entity());
        let counter_party = group_value.counter_party.clone().filter(|_| key.includes_counter_party());
        let tier = group_value.tier.filter(|_| key.includes_tier());

        AggregateResult {
            legal_entity: legal_entity.into(),
            counter_party: counter_party.into(),
            tier: tier.into(),
            max_rating: metrics.max_rating,
            arap: metrics.arap,
            accr: metrics.accr,
        }
    }

    /// Normalize every group produced for `key`
    pub fn normalize_all<'a, I>(&self, key: GroupKey, groups: I) -> Vec<AggregateResult>
    where
        I: IntoIterator<Item = (&'a GroupKeyValue, &'a GroupMetrics)>,
    {
        groups
            .into_iter()
            .map(|(value, metrics)| self.normalize(key, value, metrics))
            .collect()
    }
}

impl Default for ResultNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_metrics(max_rating: i64, arap: i64, accr: i64) -> GroupMetrics {
        GroupMetrics {
            max_rating,
            arap,
            accr,
            record_count: 1,
        }
    }

    fn full_value() -> GroupKeyValue {
        GroupKeyValue {
            legal_entity: Some("L1".to_string()),
            counter_party: Some("C1".to_string()),
            tier: Some(1),
        }
    }

    #[test]
    fn test_sentinel_fill_per_key() {
        let normalizer = ResultNormalizer::new();
        let metrics = create_test_metrics(2, 20, 0);

        let row = normalizer.normalize(GroupKey::LegalEntity, &full_value(), &metrics);
        assert_eq!(row.legal_entity, Dimension::Value("L1".to_string()));
        assert!(row.counter_party.is_total());
        assert!(row.tier.is_total());

        let row = normalizer.normalize(GroupKey::LegalEntityCounterParty, &full_value(), &metrics);
        assert!(!row.legal_entity.is_total());
        assert!(!row.counter_party.is_total());
        assert!(row.tier.is_total());

        let row = normalizer.normalize(GroupKey::CounterParty, &full_value(), &metrics);
        assert!(row.legal_entity.is_total());
        assert_eq!(row.counter_party.value().map(String::as_str), Some("C1"));
        assert!(row.tier.is_total());

        let row = normalizer.normalize(GroupKey::Tier, &full_value(), &metrics);
        assert!(row.legal_entity.is_total());
        assert!(row.counter_party.is_total());
        assert_eq!(row.tier, Dimension::Value(1));
    }

    #[test]
    fn test_metrics_copied() {
        let row = ResultNormalizer::new().normalize(
            GroupKey::Tier,
            &full_value(),
            &create_test_metrics(6, -15, 207),
        );
        assert_eq!((row.max_rating, row.arap, row.accr), (6, -15, 207));
    }

    #[test]
    fn test_fields_render_total() {
        let row = ResultNormalizer::new().normalize(GroupKey::LegalEntity, &full_value(), &create_test_metrics(2, 20, 0));
        assert_eq!(row.to_fields(), ["L1", "Total", "Total", "2", "20", "0"].map(String::from));
    }

    #[test]
    fn test_serialize_canonical_columns() {
        let row = ResultNormalizer::new().normalize(GroupKey::Tier, &full_value(), &create_test_metrics(6, 0, 207));
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(
            json,
            r#"{"legal_entity":"Total","counter_party":"Total","tier":1,"max_rating":6,"ARAP":0,"ACCR":207}"#
        );
    }
}
