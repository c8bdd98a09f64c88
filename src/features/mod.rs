//! Feature extraction
//!
//! Produces the [`FeatureSet`] that drives memory selection.

pub mod extractor;

pub use extractor::{FeatureExtractor, FeatureSet, DEFAULT_MAX_ENTRIES, DOMAIN_KEYWORDS};
