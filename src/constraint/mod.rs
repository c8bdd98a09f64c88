//! Constraint extraction
//!
//! Turns free-text memory content into [`Constraint`]s the validator can
//! check with literal substring matching.

pub mod extractor;
pub mod types;

pub use extractor::{ConstraintExtractor, ConstraintSource};
pub use types::{line_col, Constraint, Violation};
