//! # reviewdex Core
//!
//! Core library for the reviewdex review engine.
//!
//! This crate provides the record-level building blocks:
//!
//! - [`Record`] - Opaque review record (field key to JSON value)
//! - [`FieldResolver`] - Finds a logical field across the record and its auxiliary namespaces
//! - [`SearchIndex`] - Inverted term index with substring search and prefix suggestions
//! - [`FilterPipeline`] - Ordered listing filters followed by a sort
//! - [`Collection`] - Record snapshot that keeps its search index in step
//!
//! ## Example
//!
//! ```rust
//! use reviewdex_core::{Collection, FilterCriteria, Record, StoredRating};
//! use serde_json::json;
//!
//! let record = Record::from_value(json!({
//!     "id": 1,
//!     "type": "Hash",
//!     "holderName": "Strawberry Cough",
//! })).unwrap();
//!
//! let collection = Collection::new(vec![record]);
//! assert_eq!(collection.search("straw").len(), 1);
//! assert_eq!(collection.suggest("str", 5), vec!["strawberry cough"]);
//!
//! let listing = collection.list(FilterCriteria::default(), &StoredRating);
//! assert_eq!(listing.len(), 1);
//! ```

pub mod codec;
pub mod collection;
pub mod error;
pub mod filter;
pub mod record;
pub mod resolver;
pub mod search;

pub use collection::Collection;
pub use error::{Error, Result};
pub use filter::{
    Filter, FilterCondition, FilterCriteria, FilterPipeline, Rater, RecordFilter, SortOrder,
    StoredRating,
};
pub use record::{Record, RecordId, ID_FIELD, KIND_FIELD};
pub use resolver::{
    normalize_key, resolve, FieldResolver, MatchStrategy, Resolution, ResolverConfig,
    DEFAULT_NAMESPACES,
};
pub use search::{extract_terms, scan, SearchIndex};
