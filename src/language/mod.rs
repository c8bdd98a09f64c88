//! Language profiles and naming conventions
//!
//! All per-language knowledge (declaration syntax, import syntax, comment
//! markers, default naming) lives in one table looked up by editor language
//! tag.

pub mod naming;
pub mod profile;

pub use naming::{CaseStyle, IdentifierKind, NamingConventions, NAME_EXCEPTIONS};
pub use profile::{language_from_path, profile_for, Declaration, ImportBlock, ImportEdge, LanguageProfile};
