//! Union of the per-key result blocks into one report

use super::aggregator::GroupKey;
use super::normalizer::AggregateResult;

pub const REPORT_COLUMNS: [&str; 6] = ["legal_entity", "counter_party", "tier", "max_rating", "ARAP", "ACCR"];

pub struct ResultMerger;

impl ResultMerger {
    pub fn new() -> Self {
        Self
    }

    /// Concatenate blocks in [`GroupKey::all`] order, whatever order they arrive in.
    ///
    /// Rows are never deduplicated across blocks.
    pub fn merge(&self, mut blocks: Vec<(GroupKey, Vec<AggregateResult>)>) -> Vec<AggregateResult> {
        blocks.sort_by_key(|(key, _)| *key);

        let total = blocks.iter().map(|(_, rows)| rows.len()).sum();
        let mut merged = Vec::with_capacity(total);
        for (_, rows) in blocks {
            merged.extend(rows);
        }
        merged
    }
}

impl Default for ResultMerger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rollup_core::normalizer::Dimension;

    fn create_test_row(key: GroupKey, label: &str) -> AggregateResult {
        let value = |included: bool| {
            if included {
                Dimension::Value(label.to_string())
            } else {
                Dimension::Total
            }
        };
        AggregateResult {
            legal_entity: value(key.includes_legal_entity()),
            counter_party: value(key.includes_counter_party()),
            tier: if key.includes_tier() {
                Dimension::Value(1)
            } else {
                Dimension::Total
            },
            max_rating: 1,
            arap: 0,
            accr: 0,
        }
    }

    #[test]
    fn test_merge_restores_key_order() {
        let blocks = vec![
            (GroupKey::Tier, vec![create_test_row(GroupKey::Tier, "t")]),
            (GroupKey::CounterParty, vec![create_test_row(GroupKey::CounterParty, "c")]),
            (
                GroupKey::LegalEntity,
                vec![
                    create_test_row(GroupKey::LegalEntity, "a"),
                    create_test_row(GroupKey::LegalEntity, "b"),
                ],
            ),
            (
                GroupKey::LegalEntityCounterParty,
                vec![create_test_row(GroupKey::LegalEntityCounterParty, "lc")],
            ),
        ];

        let merged = ResultMerger::new().merge(blocks);

        assert_eq!(merged.len(), 5);
        assert_eq!(merged[0].legal_entity, Dimension::Value("a".to_string()));
        assert_eq!(merged[1].legal_entity, Dimension::Value("b".to_string()));
        assert_eq!(merged[2].counter_party, Dimension::Value("lc".to_string()));
        assert!(merged[3].legal_entity.is_total());
        assert_eq!(merged[4].tier, Dimension::Value(1));
    }

    #[test]
    fn test_merge_keeps_duplicates() {
        let row = create_test_row(GroupKey::LegalEntity, "a");
        let merged = ResultMerger::new().merge(vec![
            (GroupKey::LegalEntity, vec![row.clone(), row.clone()]),
            (GroupKey::Tier, vec![]),
        ]);
        assert_eq!(merged, vec![row.clone(), row]);
    }

    #[test]
    fn test_merge_empty() {
        assert!(ResultMerger::new().merge(Vec::new()).is_empty());
    }
}
