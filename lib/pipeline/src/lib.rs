//! # reviewdex Pipeline
//!
//! Ordered processing steps (fertilization, separation, extraction,
//! purification, recipe preparation) attached to a review.
//!
//! - [`classify`] - Step name to [`RoleSet`], a pure function
//! - [`PipelineStep`] - One step and its persisted JSON shape
//! - [`PipelineBuilder`] - Gated add, in-place update, remove, adjacent move,
//!   ingredient toggling, solvent-flag propagation
//! - [`PipelineConfig`] - What differs between the concrete pipelines
//!
//! ## Example
//!
//! ```rust
//! use reviewdex_pipeline::{Ingredient, PipelineBuilder, PipelineConfig};
//!
//! let mut builder = PipelineBuilder::new(PipelineConfig::extraction());
//! assert!(builder.add_step("Extraction au butane (BHO)").is_none());
//!
//! builder.set_prerequisites(vec![Ingredient::new("1", "Gelato")]);
//! let bho = builder.add_step("Extraction au butane (BHO)").unwrap();
//! builder.add_step("Tamisage WPFF").unwrap();
//! assert!(builder.contains_solvent_step());
//!
//! builder.remove_step(bho);
//! assert!(!builder.contains_solvent_step());
//! ```

pub mod builder;
pub mod classifier;
pub mod config;
pub mod step;

pub use builder::{Direction, PipelineBuilder, SolventObserver, VisibleParams};
pub use classifier::{classify, RoleSet, StepRole};
pub use config::{DetailMode, Gate, PipelineConfig, PipelineKind};
pub use step::{identity_of, Ingredient, MeshRange, PipelineStep, StepField, StepId};
