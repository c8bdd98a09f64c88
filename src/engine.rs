//! Pipeline wiring shared by the CLI and the HTTP API
//!
//! An [`Engine`] owns one configured instance of every analysis component and
//! runs the two editor flows: select-and-compress for context injection, and
//! validate for diagnostics. It holds no corpus; callers pass a snapshot.

use crate::config::MemguardConfig;
use crate::features::{FeatureExtractor, FeatureSet};
use crate::language::language_from_path;
use crate::memory::MemoryRecord;
use crate::selection::{ContextBundle, ContextCompressor, RelevanceScorer, ScoredMemory};
use crate::validation::{PatternLibrary, ValidationReport, Validator};
use std::path::Path;

/// Language tag used when neither the caller nor the extension names one
pub const FALLBACK_LANGUAGE: &str = "generic";

/// Configured analysis components
#[derive(Clone, Default)]
pub struct Engine {
    features: FeatureExtractor,
    scorer: RelevanceScorer,
    compressor: ContextCompressor,
    validator: Validator,
}

impl Engine {
    pub fn new(config: &MemguardConfig) -> Self {
        Self {
            features: FeatureExtractor::new(config.features.max_entries),
            scorer: RelevanceScorer::new(config.selection.clone()),
            compressor: ContextCompressor::new(config.compression.clone()),
            validator: Validator::new(config.validation.clone()),
        }
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    /// Explicit language if given, else inferred from the path's extension.
    pub fn resolve_language(explicit: Option<&str>, path: &str) -> String {
        explicit
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .or_else(|| language_from_path(path).map(str::to_string))
            .unwrap_or_else(|| FALLBACK_LANGUAGE.to_string())
    }

    /// Features from supplied text, or from the file on disk when `code` is `None`.
    pub fn features(&self, path: &str, language: &str, code: Option<&str>) -> FeatureSet {
        match code {
            Some(code) => self.features.extract(code, path, language),
            None => self.features.extract_file(Path::new(path), language),
        }
    }

    /// Selected records with scores and signals.
    pub fn select(&self, corpus: &[MemoryRecord], features: &FeatureSet) -> Vec<ScoredMemory> {
        self.scorer.select_scored(corpus, features)
    }

    /// Select for the file and render the bundle. `budget` defaults to the configured one.
    pub fn context(
        &self,
        corpus: &[MemoryRecord],
        features: &FeatureSet,
        budget: Option<usize>,
    ) -> ContextBundle {
        let selected = self.scorer.select(corpus, features);
        let budget = budget.unwrap_or_else(|| self.compressor.default_budget());
        self.compressor.bundle(&selected, budget)
    }

    pub fn validate(
        &self,
        code: &str,
        path: &str,
        language: &str,
        corpus: &[MemoryRecord],
        patterns: Option<&PatternLibrary>,
    ) -> ValidationReport {
        self.validator
            .validate_with_patterns(code, path, language, corpus, patterns)
    }
}
