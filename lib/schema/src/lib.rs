//! # reviewdex Schema
//!
//! Product schemas and category rating aggregation.
//!
//! ## Overview
//!
//! Every review describes one of four product kinds. Each kind has a static
//! schema: ordered sections of typed fields, and a category map naming which
//! field keys feed which rating category.
//!
//! **How ratings work:**
//! 1. The record's kind selects a category map (unknown kinds use the default)
//! 2. Each contributing key is found with the field resolver, wherever it lives
//! 3. A category scores the half-point-rounded mean of its usable values
//! 4. The overall is the rounded mean of the categories scoring above zero
//!
//! ## Example
//!
//! ```rust
//! use reviewdex_core::Record;
//! use reviewdex_schema::{ProductKind, RatingAggregator};
//! use serde_json::json;
//!
//! let record = Record::from_value(json!({
//!     "type": "Fleur",
//!     "montee": 8,
//!     "intensiteEffet": 5,
//! })).unwrap();
//!
//! let ratings = RatingAggregator::default().aggregate(&record, ProductKind::Flower);
//! assert_eq!(ratings.get("effects"), Some(6.5));
//! assert_eq!(ratings.overall(), 6.5);
//! ```

pub mod catalog;
pub mod explain;
pub mod rating;
pub mod schema;

pub use catalog::{
    EFFECT_DURATIONS, FERTILIZERS, PREPARATION_ACTIONS, PURIFICATION_METHODS, SEPARATION_TYPES,
    SOLVENTLESS_EXTRACTIONS, SOLVENT_EXTRACTIONS,
};
pub use explain::{CategoryBreakdown, FieldContribution, RatingBreakdown};
pub use rating::{round_half, RatingAggregator, RatingSet, OVERALL_KEY};
pub use schema::{
    Category, FieldConfig, FieldType, ProductKind, ProductSchema, SchemaCatalog, SchemaError,
    Section,
};
