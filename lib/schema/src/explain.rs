//! Explainability for category ratings
//!
//! Shows, per category, which keys were looked up, what they resolved to and
//! which resolver strategy found them.

use reviewdex_core::MatchStrategy;
use serde::Serialize;
use serde_json::Value;

use crate::rating::RatingSet;
use crate::schema::ProductKind;

/// One contributing key of a category
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldContribution {
    pub key: String,
    /// Raw resolved value, before numeric decoding
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<Value>,
    /// Numeric value that entered the mean; `None` when dropped
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<MatchStrategy>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CategoryBreakdown {
    pub name: String,
    pub label: String,
    pub score: f64,
    pub contributions: Vec<FieldContribution>,
}

impl CategoryBreakdown {
    /// Number of keys whose value survived into the mean
    pub fn survivors(&self) -> usize {
        self.contributions.iter().filter(|c| c.value.is_some()).count()
    }
}

/// Full rating computation for one record
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RatingBreakdown {
    pub kind: ProductKind,
    pub categories: Vec<CategoryBreakdown>,
    pub overall: f64,
}

impl RatingBreakdown {
    pub fn category(&self, name: &str) -> Option<&CategoryBreakdown> {
        self.categories.iter().find(|c| c.name == name)
    }

    /// Drop the provenance, keeping the scores
    pub fn into_rating_set(self) -> RatingSet {
        RatingSet::new(
            self.categories.into_iter().map(|c| (c.name, c.score)).collect(),
            self.overall,
        )
    }
}
