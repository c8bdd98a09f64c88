//! memguard configuration management

use crate::error::{Error, Result};
use crate::memory::Importance;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main memguard configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MemguardConfig {
    /// Relevance scoring and selection
    pub selection: SelectionConfig,

    /// Context bundle compression
    pub compression: CompressionConfig,

    /// Validation stages
    pub validation: ValidationConfig,

    /// Pattern-similarity learning
    pub patterns: PatternConfig,

    /// Feature extraction
    pub features: FeatureConfig,

    /// Memory store location
    pub store: StoreConfig,

    /// HTTP server
    pub server: ServerConfig,
}

impl MemguardConfig {
    /// Load a TOML config file. Missing sections and fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if given, else defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let p = &self.patterns;
        if !(0.0..=1.0).contains(&p.similarity_threshold) {
            return Err(Error::Config(format!(
                "patterns.similarity_threshold must be within [0, 1], got {}",
                p.similarity_threshold
            )));
        }
        if p.signature_lines == 0 {
            return Err(Error::Config("patterns.signature_lines must be at least 1".to_string()));
        }
        let c = &self.compression;
        if c.head_chars + c.tail_chars > c.aggressive_max_chars {
            return Err(Error::Config(
                "compression.head_chars + tail_chars must not exceed aggressive_max_chars"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

/// Scoring weights and selection policy.
///
/// Only the relative ordering is load-bearing:
/// critical bonus ≫ related file > tag > function/type > import > keyword > overlap.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub critical_bonus: f64,
    pub related_file: f64,
    pub tag_match: f64,
    pub function_match: f64,
    pub type_match: f64,
    pub import_match: f64,
    pub keyword_match: f64,
    pub word_overlap: f64,

    /// Multiplier for `high` records
    pub high_multiplier: f64,

    /// Multiplier for `medium` records
    pub medium_multiplier: f64,

    /// Non-critical records must score above this
    pub min_score: f64,

    /// Total selection cap, criticals counted first
    pub max_selected: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            critical_bonus: 100.0,
            related_file: 20.0,
            tag_match: 10.0,
            function_match: 5.0,
            type_match: 5.0,
            import_match: 3.0,
            keyword_match: 2.0,
            word_overlap: 1.0,
            high_multiplier: 1.5,
            medium_multiplier: 1.2,
            min_score: 5.0,
            max_selected: 20,
        }
    }
}

/// Context bundle compression
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionConfig {
    /// Default token budget for a bundle
    pub token_budget: usize,

    /// Absolute cap on critical entries in a bundle
    pub max_critical: usize,

    /// Aggressively compressed entries longer than this are elided
    pub aggressive_max_chars: usize,

    /// Characters kept before the elision marker
    pub head_chars: usize,

    /// Characters kept after the elision marker
    pub tail_chars: usize,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            token_budget: 2000,
            max_critical: 20,
            aggressive_max_chars: 160,
            head_chars: 100,
            tail_chars: 40,
        }
    }
}

/// Validation stage toggles
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub check_constraints: bool,
    pub check_naming: bool,
    pub check_business_rules: bool,
    pub check_dependencies: bool,
    pub check_patterns: bool,

    /// Records below this importance never produce constraint diagnostics
    pub rule_min_importance: Importance,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            check_constraints: true,
            check_naming: true,
            check_business_rules: true,
            check_dependencies: true,
            check_patterns: true,
            rule_min_importance: Importance::High,
        }
    }
}

/// Pattern-similarity learning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    /// Observations before a signature counts as a recognized pattern
    pub min_occurrences: usize,

    /// Distinct files before a signature counts as a recognized pattern
    pub min_files: usize,

    /// Frequency at which a pattern becomes a comparison baseline
    pub common_frequency: usize,

    /// Best similarity below this is reported
    pub similarity_threshold: f64,

    /// Normalized lines kept in a signature
    pub signature_lines: usize,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            min_occurrences: 3,
            min_files: 2,
            common_frequency: 5,
            similarity_threshold: 0.3,
            signature_lines: 5,
        }
    }
}

/// Feature extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Cap on each extracted feature list
    pub max_entries: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            max_entries: crate::features::DEFAULT_MAX_ENTRIES,
        }
    }
}

/// Memory store location
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON corpus file
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        let base = dirs_next::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("memguard");
        Self {
            path: base.join("memories.json"),
        }
    }
}

/// HTTP server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,

    /// Origins granted cross-origin access; empty means same-origin only
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 18791,
            cors_origins: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = MemguardConfig::default();
        assert_eq!(config.server.port, 18791);
        assert_eq!(config.selection.max_selected, 20);
        assert_eq!(config.compression.token_budget, 2000);
        assert_eq!(config.validation.rule_min_importance, Importance::High);
        assert!(config.store.path.ends_with("memguard/memories.json"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_weight_ordering() {
        let s = SelectionConfig::default();
        assert!(s.critical_bonus > s.related_file);
        assert!(s.related_file > s.tag_match);
        assert!(s.tag_match > s.function_match);
        assert_eq!(s.function_match, s.type_match);
        assert!(s.function_match > s.import_match);
        assert!(s.import_match > s.keyword_match);
        assert!(s.keyword_match > s.word_overlap);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: MemguardConfig = toml::from_str(
            r#"
[selection]
max_selected = 10

[validation]
check_patterns = false
rule_min_importance = "critical"
"#,
        )
        .unwrap();
        assert_eq!(config.selection.max_selected, 10);
        assert_eq!(config.selection.tag_match, 10.0);
        assert!(!config.validation.check_patterns);
        assert!(config.validation.check_naming);
        assert_eq!(config.validation.rule_min_importance, Importance::Critical);
        assert_eq!(config.server.port, 18791);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memguard.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[compression]\ntoken_budget = 500").unwrap();

        let config = MemguardConfig::load(&path).unwrap();
        assert_eq!(config.compression.token_budget, 500);
        assert_eq!(config.compression.max_critical, 20);
    }

    #[test]
    fn test_load_missing_file_is_config_error() {
        let err = MemguardConfig::load(Path::new("/nonexistent/memguard.toml")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let mut config = MemguardConfig::default();
        config.patterns.similarity_threshold = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_roundtrip_toml() {
        let config = MemguardConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: MemguardConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.patterns.common_frequency, 5);
        assert_eq!(parsed.server.host, "127.0.0.1");
    }
}
