//! # unicat-core
//!
//! Core types, reference data, and migration algorithms for the unicat
//! parts catalog.
//!
//! This crate holds everything that does not need a database connection:
//! the code canonicalization passes, the legacy dimension expanders, the
//! section geometry used for weight synthesis, and the reference tables
//! those algorithms are configured with.

pub mod codes;
pub mod defaults;
pub mod dimensions;
pub mod error;
pub mod geometry;
pub mod logging;
pub mod models;
pub mod normalize;
pub mod profiles;
pub mod reference;

// Re-export commonly used types at crate root
pub use codes::{
    assign_category_targets, assign_subcategory_targets, compose_item_code, next_free_code,
    placeholder_code,
};
pub use dimensions::{Family, Generator, GeneratorRegistry};
pub use error::{Error, Result};
pub use geometry::{weight_per_meter, Measure, SectionGeometry, StandardGeometry};
pub use models::*;
pub use normalize::{canonical_code, normalize_upper};
pub use profiles::{ProfileShape, ShapeBuckets};
pub use reference::{KnownSubcategory, ReferenceData, StandardSeries, TaxonomyProfile};
