// Listing filters: ordered predicate stages followed by a terminal sort
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::codec::{decode_number, string_items};
use crate::search::{normalize_query, SearchIndex};
use crate::{Error, Record, RecordId};

pub trait Filter {
    fn matches(&self, record: &Record) -> bool;
}

/// Source of the rating used by the min-rating filter and rating sorts
pub trait Rater {
    fn rate(&self, record: &Record) -> f64;
}

/// Reads the stored `overallRating`, then `note`; zero counts as unset
#[derive(Debug, Clone, Copy, Default)]
pub struct StoredRating;

impl Rater for StoredRating {
    fn rate(&self, record: &Record) -> f64 {
        ["overallRating", "note"]
            .iter()
            .filter_map(|key| record.get(key).and_then(decode_number))
            .find(|v| *v != 0.0)
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterCondition {
    /// Product kind label equals
    KindIs(String),
    /// Rating from the pipeline's rater is at least this
    MinRating(f64),
    /// Record id is in the set (text search results)
    IdIn(BTreeSet<RecordId>),
    /// String field equals
    Equals { field: String, value: String },
    /// String field contains, or list field has an element equal to, `value`
    Includes { field: String, value: String },
    /// Any of the conditions holds
    Or(Vec<FilterCondition>),
}

impl FilterCondition {
    pub fn equals(field: &str, value: &str) -> Self {
        FilterCondition::Equals {
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    pub fn includes(field: &str, value: &str) -> Self {
        FilterCondition::Includes {
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    pub fn matches_with(&self, record: &Record, rater: &dyn Rater) -> bool {
        match self {
            FilterCondition::KindIs(kind) => record.kind() == Some(kind.as_str()),
            FilterCondition::MinRating(min) => rater.rate(record) >= *min,
            FilterCondition::IdIn(ids) => record.id().map(|id| ids.contains(&id)).unwrap_or(false),
            FilterCondition::Equals { field, value } => record
                .get_str(field)
                .map(|v| v == value)
                .unwrap_or(false),
            FilterCondition::Includes { field, value } => match record.get(field) {
                Some(Value::String(s)) => s.contains(value.as_str()),
                array @ Some(Value::Array(_)) => string_items(array).iter().any(|item| item == value),
                _ => false,
            },
            FilterCondition::Or(conditions) => {
                conditions.iter().any(|c| c.matches_with(record, rater))
            }
        }
    }
}

/// A condition bound to a rater
pub struct RecordFilter<'r> {
    condition: FilterCondition,
    rater: &'r dyn Rater,
}

impl<'r> RecordFilter<'r> {
    pub fn new(condition: FilterCondition, rater: &'r dyn Rater) -> Self {
        Self { condition, rater }
    }
}

impl Filter for RecordFilter<'_> {
    fn matches(&self, record: &Record) -> bool {
        self.condition.matches_with(record, self.rater)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    #[default]
    DateDesc,
    DateAsc,
    RatingDesc,
    RatingAsc,
    Name,
}

impl FromStr for SortOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "date-desc" => Ok(SortOrder::DateDesc),
            "date-asc" => Ok(SortOrder::DateAsc),
            "rating-desc" => Ok(SortOrder::RatingDesc),
            "rating-asc" => Ok(SortOrder::RatingAsc),
            "name" => Ok(SortOrder::Name),
            other => Err(Error::InvalidConfig(format!("unknown sort order: {}", other))),
        }
    }
}

/// Listing filter settings. Unset, empty and `"all"` values disable a stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    #[serde(alias = "type")]
    pub kind: Option<String>,
    #[serde(alias = "minRating")]
    pub min_rating: Option<f64>,
    #[serde(alias = "search")]
    pub query: Option<String>,
    #[serde(alias = "dureeEffet")]
    pub effect_duration: Option<String>,
    #[serde(alias = "typeCulture")]
    pub cultivation_method: Option<String>,
    pub extraction: Option<String>,
    pub texture: Option<String>,
    #[serde(alias = "landrace")]
    pub lineage: Option<String>,
    #[serde(alias = "substrat")]
    pub substrate: Option<String>,
    pub ingredient: Option<String>,
    #[serde(alias = "sortBy")]
    pub sort: SortOrder,
}

fn active(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .filter(|v| !v.is_empty() && *v != "all")
}

pub struct FilterPipeline {
    criteria: FilterCriteria,
}

impl FilterPipeline {
    pub fn new(criteria: FilterCriteria) -> Self {
        Self { criteria }
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    /// Active predicate stages, in evaluation order
    pub fn conditions(&self, index: &SearchIndex) -> Vec<FilterCondition> {
        let c = &self.criteria;
        let mut stages = Vec::new();

        if let Some(kind) = active(&c.kind) {
            stages.push(FilterCondition::KindIs(kind.to_string()));
        }
        if let Some(min) = c.min_rating.filter(|m| *m > 0.0) {
            stages.push(FilterCondition::MinRating(min));
        }
        if let Some(query) = c.query.as_deref().filter(|q| !normalize_query(q).is_empty()) {
            stages.push(FilterCondition::IdIn(index.search(query)));
        }
        if let Some(duration) = active(&c.effect_duration) {
            stages.push(FilterCondition::equals("dureeEffet", duration));
        }
        if let Some(method) = active(&c.cultivation_method) {
            stages.push(FilterCondition::equals("typeCulture", method));
        }
        if let Some(extraction) = active(&c.extraction) {
            stages.push(FilterCondition::Or(vec![
                FilterCondition::includes("extractionMethod", extraction),
                FilterCondition::equals("extractionSolvant", extraction),
                FilterCondition::includes("separationMethod", extraction),
            ]));
        }
        if let Some(texture) = active(&c.texture) {
            stages.push(FilterCondition::equals("texture", texture));
        }
        if let Some(lineage) = active(&c.lineage) {
            stages.push(FilterCondition::equals("landrace", lineage));
        }
        if let Some(substrate) = active(&c.substrate) {
            stages.push(FilterCondition::Or(vec![
                FilterCondition::includes("substrat", substrate),
                FilterCondition::includes("substratsSystemes", substrate),
            ]));
        }
        if let Some(ingredient) = active(&c.ingredient) {
            stages.push(FilterCondition::includes("ingredients", ingredient));
        }

        stages
    }

    /// Narrow `records` through every active stage, then sort
    pub fn apply<'a>(
        &self,
        records: &'a [Record],
        index: &SearchIndex,
        rater: &dyn Rater,
    ) -> Vec<&'a Record> {
        let mut working: Vec<&Record> = records.iter().collect();

        for condition in self.conditions(index) {
            let filter = RecordFilter::new(condition, rater);
            working.retain(|record| filter.matches(record));
            debug!(remaining = working.len(), "filter stage applied");
        }

        sort_records(&mut working, self.criteria.sort, rater);
        working
    }
}

/// Stable sort; records without a parseable `createdAt` go last for both date orders
pub fn sort_records(records: &mut Vec<&Record>, order: SortOrder, rater: &dyn Rater) {
    match order {
        SortOrder::DateDesc | SortOrder::DateAsc => {
            let mut keyed: Vec<(Option<i64>, &Record)> =
                records.iter().map(|r| (created_at_millis(r), *r)).collect();
            keyed.sort_by(|a, b| match (a.0, b.0) {
                (Some(x), Some(y)) if order == SortOrder::DateAsc => x.cmp(&y),
                (Some(x), Some(y)) => y.cmp(&x),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            });
            *records = keyed.into_iter().map(|(_, r)| r).collect();
        }
        SortOrder::RatingDesc | SortOrder::RatingAsc => {
            let mut keyed: Vec<(OrderedFloat<f64>, &Record)> = records
                .iter()
                .map(|r| (OrderedFloat(rater.rate(r)), *r))
                .collect();
            if order == SortOrder::RatingAsc {
                keyed.sort_by(|a, b| a.0.cmp(&b.0));
            } else {
                keyed.sort_by(|a, b| b.0.cmp(&a.0));
            }
            *records = keyed.into_iter().map(|(_, r)| r).collect();
        }
        SortOrder::Name => {
            records.sort_by(|a, b| {
                let left = a.get_str("holderName").unwrap_or("");
                let right = b.get_str("holderName").unwrap_or("");
                left.to_lowercase()
                    .cmp(&right.to_lowercase())
                    .then_with(|| left.cmp(right))
            });
        }
    }
}

/// `createdAt` as epoch milliseconds: RFC 3339, naive date-time, plain date or a number
pub fn created_at_millis(record: &Record) -> Option<i64> {
    match record.get("createdAt")? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.timestamp_millis());
            }
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
                return Some(dt.and_utc().timestamp_millis());
            }
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc().timestamp_millis())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records() -> Vec<Record> {
        [
            json!({"id": 1, "type": "Fleur", "holderName": "beta", "overallRating": 8,
                   "typeCulture": "Indoor", "substrat": ["Coco"], "createdAt": "2024-03-01T10:00:00Z"}),
            json!({"id": 2, "type": "Hash", "holderName": "Alpha", "note": 6,
                   "separationMethod": ["Bubble Hash"], "texture": "Sableuse", "createdAt": "2024-05-01"}),
            json!({"id": 3, "type": "Concentré", "holderName": "gamma", "overallRating": 0, "note": 9,
                   "extractionSolvant": "Butane", "dureeEffet": "<2h", "createdAt": 1700000000000i64}),
            json!({"id": 4, "type": "Comestible", "holderName": "delta",
                   "ingredients": ["Beurre", "Sucre"]}),
        ]
        .into_iter()
        .map(|v| Record::from_value(v).unwrap())
        .collect()
    }

    fn ids(found: &[&Record]) -> Vec<RecordId> {
        found.iter().filter_map(|r| r.id()).collect()
    }

    fn run(criteria: FilterCriteria) -> Vec<RecordId> {
        let data = records();
        let index = SearchIndex::build(&data);
        ids(&FilterPipeline::new(criteria).apply(&data, &index, &StoredRating))
    }

    #[test]
    fn test_stored_rating_falls_through_zero() {
        let data = records();
        assert_eq!(StoredRating.rate(&data[0]), 8.0);
        assert_eq!(StoredRating.rate(&data[1]), 6.0);
        assert_eq!(StoredRating.rate(&data[2]), 9.0);
        assert_eq!(StoredRating.rate(&data[3]), 0.0);
    }

    #[test]
    fn test_default_criteria_keeps_all_sorted_by_date_desc() {
        let found = run(FilterCriteria::default());
        assert_eq!(found, vec![RecordId::Integer(2), RecordId::Integer(1), RecordId::Integer(3), RecordId::Integer(4)]);
    }

    #[test]
    fn test_kind_and_all_sentinel() {
        let found = run(FilterCriteria {
            kind: Some("Hash".into()),
            ..Default::default()
        });
        assert_eq!(found, vec![RecordId::Integer(2)]);

        let found = run(FilterCriteria {
            kind: Some("all".into()),
            ..Default::default()
        });
        assert_eq!(found.len(), 4);
    }

    #[test]
    fn test_min_rating_and_rating_sort() {
        let found = run(FilterCriteria {
            min_rating: Some(7.0),
            sort: SortOrder::RatingAsc,
            ..Default::default()
        });
        assert_eq!(found, vec![RecordId::Integer(1), RecordId::Integer(3)]);
    }

    #[test]
    fn test_text_search_stage() {
        let found = run(FilterCriteria {
            query: Some("ALP".into()),
            ..Default::default()
        });
        assert_eq!(found, vec![RecordId::Integer(2)]);

        let found = run(FilterCriteria {
            query: Some("   ".into()),
            ..Default::default()
        });
        assert_eq!(found.len(), 4);
    }

    #[test]
    fn test_advanced_filters() {
        let extraction = run(FilterCriteria {
            extraction: Some("Bubble".into()),
            ..Default::default()
        });
        // separationMethod is a list: membership, not substring
        assert!(extraction.is_empty());

        let extraction = run(FilterCriteria {
            extraction: Some("Butane".into()),
            ..Default::default()
        });
        assert_eq!(extraction, vec![RecordId::Integer(3)]);

        let substrate = run(FilterCriteria {
            substrate: Some("Coco".into()),
            ..Default::default()
        });
        assert_eq!(substrate, vec![RecordId::Integer(1)]);

        let ingredient = run(FilterCriteria {
            ingredient: Some("Sucre".into()),
            ..Default::default()
        });
        assert_eq!(ingredient, vec![RecordId::Integer(4)]);

        let duration = run(FilterCriteria {
            effect_duration: Some("<2h".into()),
            ..Default::default()
        });
        assert_eq!(duration, vec![RecordId::Integer(3)]);
    }

    #[test]
    fn test_stage_order_does_not_change_result() {
        let data = records();
        let index = SearchIndex::build(&data);
        let criteria = FilterCriteria {
            min_rating: Some(5.0),
            query: Some("a".into()),
            ..Default::default()
        };
        let pipeline = FilterPipeline::new(criteria);
        let mut stages = pipeline.conditions(&index);

        let keep = |stages: &[FilterCondition]| -> BTreeSet<RecordId> {
            data.iter()
                .filter(|r| stages.iter().all(|c| c.matches_with(r, &StoredRating)))
                .filter_map(|r| r.id())
                .collect()
        };
        let forward = keep(&stages);
        stages.reverse();
        assert_eq!(forward, keep(&stages));
    }

    #[test]
    fn test_name_sort_and_criteria_aliases() {
        let criteria: FilterCriteria =
            serde_json::from_value(json!({"type": "all", "sortBy": "name", "minRating": 0}))
                .unwrap();
        assert_eq!(criteria.sort, SortOrder::Name);
        let found = run(criteria);
        assert_eq!(found, vec![RecordId::Integer(2), RecordId::Integer(1), RecordId::Integer(4), RecordId::Integer(3)]);
    }

    #[test]
    fn test_sort_order_from_str() {
        assert_eq!("rating-desc".parse::<SortOrder>().unwrap(), SortOrder::RatingDesc);
        assert!("sideways".parse::<SortOrder>().is_err());
    }
}
