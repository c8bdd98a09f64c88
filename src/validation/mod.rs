//! Code validation against project memories
//!
//! [`Validator`] runs the stage pipeline over one file and produces a
//! [`ValidationReport`]. Stage implementations live in their own modules and
//! can be used directly.

pub mod dependency;
pub mod diagnostic;
pub mod naming;
pub mod patterns;
pub mod validator;

pub use dependency::{in_layer, layer_rules, LayerRule};
pub use diagnostic::{Diagnostic, DiagnosticKind, DiagnosticSource, Severity, ValidationReport};
pub use naming::{check_naming, naming_rules, NamingRule};
pub use patterns::{levenshtein, similarity, PatternLibrary, RecognizedPattern};
pub use validator::Validator;
