//! # reviewdex
//!
//! Structured product reviews: typed schemas, category ratings recomputed
//! from raw fields, ordered processing pipelines, and an inverted index for
//! substring search and autocomplete.
//!
//! ## Quick Start
//!
//! ### From the command line
//!
//! ```bash
//! reviewdex --records reviews.json rate 42
//! reviewdex --records reviews.json search straw
//! reviewdex --records reviews.json list --kind Hash --sort rating-desc
//! ```
//!
//! ### As a Library
//!
//! ```rust
//! use reviewdex::prelude::*;
//! use serde_json::json;
//!
//! let records = vec![
//!     Record::from_value(json!({"id": 1, "type": "Fleur", "holderName": "Strawberry Cough",
//!                               "montee": 8, "intensiteEffet": 6})).unwrap(),
//!     Record::from_value(json!({"id": 2, "type": "Fleur", "holderName": "Gelato"})).unwrap(),
//! ];
//!
//! let ratings = RatingAggregator::default();
//! assert_eq!(ratings.aggregate_record(&records[0]).get("effects"), Some(7.0));
//!
//! let collection = Collection::new(records);
//! let criteria = FilterCriteria { min_rating: Some(5.0), ..Default::default() };
//! let listing = collection.list(criteria, &ratings);
//! assert_eq!(listing.len(), 1);
//! ```
//!
//! ## Crate Structure
//!
//! - `reviewdex-core` - Records, field resolution, search index, listing filters
//! - `reviewdex-schema` - Product schemas, category maps, rating aggregation
//! - `reviewdex-pipeline` - Step classification and pipeline editing
//! - `reviewdex-storage` - In-memory and JSON file record stores

// Re-export core types
pub use reviewdex_core::{
    Collection, Error, FieldResolver, Filter, FilterCondition, FilterCriteria, FilterPipeline,
    MatchStrategy, Rater, Record, RecordId, ResolverConfig, Result, SearchIndex, SortOrder,
    StoredRating,
};

// Re-export schema
pub use reviewdex_schema::{
    FieldConfig, FieldType, ProductKind, ProductSchema, RatingAggregator, RatingBreakdown,
    RatingSet, SchemaCatalog, SchemaError,
};

// Re-export pipelines
pub use reviewdex_pipeline::{
    classify, Direction, Ingredient, PipelineBuilder, PipelineConfig, PipelineKind, PipelineStep,
    RoleSet, StepField, StepId, StepRole,
};

// Re-export storage
pub use reviewdex_storage::{JsonFileStore, MemoryStore, RecordStore};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        classify, Collection, Direction, Error, FieldResolver, FilterCriteria, Ingredient,
        JsonFileStore, MemoryStore, PipelineBuilder, PipelineConfig, ProductKind, Rater,
        RatingAggregator, RatingSet, Record, RecordId, RecordStore, Result, SchemaCatalog,
        SortOrder, StepField, StepRole,
    };
}
