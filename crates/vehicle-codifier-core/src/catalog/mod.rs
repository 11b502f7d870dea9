//! Catalog cache and derived year-scoped indexes.

pub mod cache;
pub mod index;

pub use cache::{CatalogCache, CatalogSnapshot, CatalogSource};
pub use index::{CandidateIndex, CandidateIndexCache, MarcaFrequency};
