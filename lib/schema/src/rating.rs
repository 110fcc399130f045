//! Category rating aggregation
//!
//! Category score: mean of the resolvable numeric contributing fields,
//! rounded to the nearest 0.5; 0 when nothing resolves. Overall: mean of the
//! categories scoring above 0, rounded the same way.

use reviewdex_core::codec::decode_number;
use reviewdex_core::{FieldResolver, Rater, Record, ResolverConfig};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use tracing::debug;

use crate::explain::{CategoryBreakdown, FieldContribution, RatingBreakdown};
use crate::schema::{ProductKind, SchemaCatalog};

pub const OVERALL_KEY: &str = "overall";

/// Round to the nearest half point
#[inline]
pub fn round_half(value: f64) -> f64 {
    (value * 2.0).round() / 2.0
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Category scores in category-map order, plus the overall
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RatingSet {
    scores: Vec<(String, f64)>,
    overall: f64,
}

impl RatingSet {
    pub fn new(scores: Vec<(String, f64)>, overall: f64) -> Self {
        Self { scores, overall }
    }

    pub fn get(&self, category: &str) -> Option<f64> {
        self.scores
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, score)| *score)
    }

    pub fn overall(&self) -> f64 {
        self.overall
    }

    pub fn scores(&self) -> &[(String, f64)] {
        &self.scores
    }

    /// Flat JSON object: `{category: score, ..., "overall": n}`
    pub fn to_value(&self) -> Value {
        let mut map = serde_json::Map::new();
        for (name, score) in &self.scores {
            map.insert(name.clone(), Value::from(*score));
        }
        map.insert(OVERALL_KEY.to_string(), Value::from(self.overall));
        Value::Object(map)
    }
}

impl Serialize for RatingSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.scores.len() + 1))?;
        for (name, score) in &self.scores {
            map.serialize_entry(name, score)?;
        }
        map.serialize_entry(OVERALL_KEY, &self.overall)?;
        map.end()
    }
}

/// Computes category scores from a record's raw field values
#[derive(Debug, Clone)]
pub struct RatingAggregator {
    catalog: SchemaCatalog,
    resolver: ResolverConfig,
}

impl Default for RatingAggregator {
    fn default() -> Self {
        Self::new(SchemaCatalog::builtin())
    }
}

impl RatingAggregator {
    pub fn new(catalog: SchemaCatalog) -> Self {
        Self {
            catalog,
            resolver: ResolverConfig::default(),
        }
    }

    #[must_use]
    pub fn with_resolver(mut self, resolver: ResolverConfig) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn catalog(&self) -> &SchemaCatalog {
        &self.catalog
    }

    /// Scores of `record` under the category map of `kind`
    pub fn aggregate(&self, record: &Record, kind: ProductKind) -> RatingSet {
        self.explain(record, kind).into_rating_set()
    }

    /// Scores under the record's own kind (default kind when unknown)
    pub fn aggregate_record(&self, record: &Record) -> RatingSet {
        self.aggregate(record, self.catalog.kind_of(record.kind()))
    }

    /// Same computation as [`aggregate`](Self::aggregate), keeping provenance
    pub fn explain(&self, record: &Record, kind: ProductKind) -> RatingBreakdown {
        let schema = self.catalog.get(kind);
        let resolver = FieldResolver::with_config(record, &self.resolver);

        let categories: Vec<CategoryBreakdown> = schema
            .categories
            .iter()
            .map(|category| {
                let contributions: Vec<FieldContribution> = category
                    .fields
                    .iter()
                    .map(|key| match resolver.resolve_detailed(key) {
                        Some(found) => FieldContribution {
                            key: key.clone(),
                            raw: Some(found.value.clone()),
                            value: decode_number(found.value),
                            matched_key: Some(found.matched_key),
                            strategy: Some(found.strategy),
                        },
                        None => FieldContribution {
                            key: key.clone(),
                            raw: None,
                            value: None,
                            matched_key: None,
                            strategy: None,
                        },
                    })
                    .collect();

                let values: Vec<f64> = contributions.iter().filter_map(|c| c.value).collect();
                let score = mean(&values).map(round_half).unwrap_or(0.0);

                CategoryBreakdown {
                    name: category.name.clone(),
                    label: category.label.clone(),
                    score,
                    contributions,
                }
            })
            .collect();

        let positive: Vec<f64> = categories
            .iter()
            .map(|c| c.score)
            .filter(|s| *s > 0.0)
            .collect();
        let overall = mean(&positive).map(round_half).unwrap_or(0.0);

        debug!(kind = %schema.kind, overall, "ratings aggregated");

        RatingBreakdown {
            kind: schema.kind,
            categories,
            overall,
        }
    }
}

impl Rater for RatingAggregator {
    fn rate(&self, record: &Record) -> f64 {
        self.aggregate_record(record).overall()
    }
}
