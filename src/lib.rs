//! memguard - project memory for code assistants
//!
//! memguard keeps a corpus of short natural-language project memories
//! (architecture rules, naming conventions, business invariants) and uses it
//! in two editor flows:
//!
//! ```text
//!   file opened / saved                     document changed (debounced)
//!          │                                          │
//!   ┌──────▼──────────┐                       ┌───────▼────────┐
//!   │ FeatureExtractor │                       │   Validator    │
//!   └──────┬──────────┘                       │  constraints   │
//!   ┌──────▼──────────┐                       │  naming        │
//!   │ RelevanceScorer  │◄── memory corpus ───►│  business      │
//!   └──────┬──────────┘    (read snapshot)    │  dependencies  │
//!   ┌──────▼──────────┐                       │  patterns      │
//!   │ContextCompressor │                       └───────┬────────┘
//!   └──────┬──────────┘                               │
//!    context bundle                             diagnostics
//! ```
//!
//! ## Modules
//!
//! - [`memory`]: records, stores and CRUD handlers
//! - [`language`]: per-language declaration, import and naming tables
//! - [`features`]: shallow feature extraction from source files
//! - [`constraint`]: constraints extracted from memory text
//! - [`selection`]: relevance scoring and context compression
//! - [`validation`]: the validation pipeline and pattern library
//! - [`session`]: per-document debouncing
//! - [`engine`]: component wiring shared by the CLI and API
//! - [`api`]: HTTP surface
//! - [`config`]: configuration management

pub mod api;
pub mod config;
pub mod constraint;
pub mod engine;
pub mod error;
pub mod features;
pub mod language;
pub mod memory;
pub mod selection;
pub mod session;
pub mod text;
pub mod validation;

pub use config::MemguardConfig;
pub use engine::Engine;
pub use error::{Error, Result};
pub use memory::{Importance, MemoryCategory, MemoryRecord, MemoryRecordBuilder, MemoryStore};
pub use validation::{Diagnostic, Severity, ValidationReport, Validator};
