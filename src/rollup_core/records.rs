//! Input and joined record types

use serde::{Deserialize, Serialize};
use std::fmt;

pub const ARAP_LABEL: &str = "ARAP";
pub const ACCR_LABEL: &str = "ACCR";

/// Invoice status. Labels other than ARAP/ACCR are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "ARAP")]
    Arap,
    #[serde(rename = "ACCR")]
    Accr,
    #[serde(untagged)]
    Other(String),
}

impl Status {
    pub fn parse(label: &str) -> Self {
        match label {
            ARAP_LABEL => Status::Arap,
            ACCR_LABEL => Status::Accr,
            other => Status::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Status::Arap => ARAP_LABEL,
            Status::Accr => ACCR_LABEL,
            Status::Other(label) => label,
        }
    }

    pub fn is_arap(&self) -> bool {
        matches!(self, Status::Arap)
    }

    pub fn is_accr(&self) -> bool {
        matches!(self, Status::Accr)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One invoice line from the fact table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactRecord {
    pub legal_entity: String,
    pub counter_party: String,
    pub rating: i64,
    pub status: Status,
    pub value: i64,
}

/// One row of the counter party to tier mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionRecord {
    pub counter_party: String,
    pub tier: i64,
}

/// Fact record joined with the tier of its counter party
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    pub legal_entity: String,
    pub counter_party: String,
    pub rating: i64,
    pub status: Status,
    pub value: i64,
    pub tier: i64,
}

impl EnrichedRecord {
    pub fn from_fact(fact: &FactRecord, tier: i64) -> Self {
        Self {
            legal_entity: fact.legal_entity.clone(),
            counter_party: fact.counter_party.clone(),
            rating: fact.rating,
            status: fact.status.clone(),
            value: fact.value,
            tier,
        }
    }
}
