//! Memory record data types
//!
//! A memory record is a short natural-language statement about the project
//! (an architecture rule, a naming convention, a business invariant). Records
//! are produced outside the analysis core and consumed as a read-only
//! snapshot by selection and validation.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A single project memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryRecord {
    /// Opaque unique identifier
    pub id: String,
    /// Free text, may mix English and Chinese
    pub content: String,
    /// What kind of knowledge this record holds
    pub category: MemoryCategory,
    /// Ordinal importance tier
    pub importance: Importance,
    /// Tags (order irrelevant, de-duplicated by the builder)
    #[serde(default)]
    pub tags: Vec<String>,
    /// Creation or last update instant
    pub timestamp: DateTime<Utc>,
    /// Paths this record is known to apply to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_files: Option<Vec<String>>,
    /// Producer confidence in [0, 1]; `None` means unknown, not zero
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

/// Category of a memory record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MemoryCategory {
    Architecture,
    CodeStyle,
    BusinessRule,
    ApiSpec,
    Database,
    Config,
    Constraint,
    Documentation,
    Other,
}

impl MemoryCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Architecture => "architecture",
            Self::CodeStyle => "code-style",
            Self::BusinessRule => "business-rule",
            Self::ApiSpec => "api-spec",
            Self::Database => "database",
            Self::Config => "config",
            Self::Constraint => "constraint",
            Self::Documentation => "documentation",
            Self::Other => "other",
        }
    }

    /// Parse a category name, accepting `snake_case` and `kebab-case` spellings.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "architecture" => Some(Self::Architecture),
            "code-style" | "style" => Some(Self::CodeStyle),
            "business-rule" | "business" => Some(Self::BusinessRule),
            "api-spec" | "api" => Some(Self::ApiSpec),
            "database" | "db" => Some(Self::Database),
            "config" => Some(Self::Config),
            "constraint" => Some(Self::Constraint),
            "documentation" | "docs" => Some(Self::Documentation),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    /// Categories whose records carry checkable code rules.
    pub fn carries_code_rules(&self) -> bool {
        matches!(
            self,
            Self::Architecture
                | Self::Constraint
                | Self::CodeStyle
                | Self::ApiSpec
                | Self::Database
                | Self::Config
        )
    }
}

impl fmt::Display for MemoryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Importance tier. Ordered `Low < Medium < High < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    Low,
    Medium,
    High,
    Critical,
}

impl Importance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }
}

impl fmt::Display for Importance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl MemoryRecord {
    /// Whether the record carries the given tag (case-insensitive).
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    /// Short excerpt of the content for diagnostics and listings.
    pub fn excerpt(&self, max_chars: usize) -> String {
        let collapsed = self.content.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.chars().count() <= max_chars {
            collapsed
        } else {
            let head: String = collapsed.chars().take(max_chars).collect();
            format!("{}...", head.trim_end())
        }
    }

    /// Apply a partial update, bumping the timestamp.
    pub fn apply(&mut self, patch: MemoryPatch) {
        if let Some(content) = patch.content {
            self.content = content;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(importance) = patch.importance {
            self.importance = importance;
        }
        if let Some(tags) = patch.tags {
            self.tags = dedup_tags(tags);
        }
        if let Some(files) = patch.related_files {
            self.related_files = Some(files);
        }
        if let Some(confidence) = patch.confidence {
            self.confidence = Some(confidence.clamp(0.0, 1.0));
        }
        self.timestamp = Utc::now();
    }
}

/// Partial update for a stored record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryPatch {
    pub content: Option<String>,
    pub category: Option<MemoryCategory>,
    pub importance: Option<Importance>,
    pub tags: Option<Vec<String>>,
    pub related_files: Option<Vec<String>>,
    pub confidence: Option<f32>,
}

/// Builder for constructing `MemoryRecord` instances
pub struct MemoryRecordBuilder {
    id: Option<String>,
    content: Option<String>,
    category: MemoryCategory,
    importance: Importance,
    tags: Vec<String>,
    timestamp: Option<DateTime<Utc>>,
    related_files: Option<Vec<String>>,
    confidence: Option<f32>,
}

impl MemoryRecordBuilder {
    /// Create a new builder with the required category
    pub fn new(category: MemoryCategory) -> Self {
        Self {
            id: None,
            content: None,
            category,
            importance: Importance::Medium,
            tags: Vec::new(),
            timestamp: None,
            related_files: None,
            confidence: None,
        }
    }

    /// Set an explicit identifier (a UUID is generated otherwise)
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the content text
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Set the importance tier
    pub fn importance(mut self, importance: Importance) -> Self {
        self.importance = importance;
        self
    }

    /// Add a tag
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Add tags from an iterator
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Add a related file path
    pub fn related_file(mut self, path: impl Into<String>) -> Self {
        self.related_files
            .get_or_insert_with(Vec::new)
            .push(path.into());
        self
    }

    /// Set the producer confidence (clamped to 0.0–1.0)
    pub fn confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence.clamp(0.0, 1.0));
        self
    }

    /// Set the timestamp (defaults to now)
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Build the record, returning an error if content is missing
    pub fn build(self) -> Result<MemoryRecord> {
        let content = self
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| Error::InvalidRecord("memory content is required".to_string()))?;

        let id = match self.id {
            Some(id) if id.trim().is_empty() => {
                return Err(Error::InvalidRecord("memory id must not be empty".to_string()))
            }
            Some(id) => id,
            None => Uuid::new_v4().to_string(),
        };

        Ok(MemoryRecord {
            id,
            content,
            category: self.category,
            importance: self.importance,
            tags: dedup_tags(self.tags),
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            related_files: self.related_files,
            confidence: self.confidence,
        })
    }
}

/// Trim, drop empties and remove duplicate tags while keeping first-seen order.
fn dedup_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_string();
        if !tag.is_empty() && !out.iter().any(|t| t.eq_ignore_ascii_case(&tag)) {
            out.push(tag);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let record = MemoryRecordBuilder::new(MemoryCategory::Architecture)
            .content("Handlers never talk to the database directly")
            .build()
            .unwrap();

        assert!(!record.id.is_empty());
        assert_eq!(record.importance, Importance::Medium);
        assert!(record.tags.is_empty());
        assert!(record.related_files.is_none());
        assert!(record.confidence.is_none());
    }

    #[test]
    fn test_builder_missing_content() {
        assert!(MemoryRecordBuilder::new(MemoryCategory::Other).build().is_err());
        assert!(MemoryRecordBuilder::new(MemoryCategory::Other)
            .content("   ")
            .build()
            .is_err());
    }

    #[test]
    fn test_builder_dedups_tags_and_clamps_confidence() {
        let record = MemoryRecordBuilder::new(MemoryCategory::CodeStyle)
            .content("Use camelCase")
            .tags(["naming", " Naming ", "", "style"])
            .confidence(1.7)
            .build()
            .unwrap();

        assert_eq!(record.tags, vec!["naming", "style"]);
        assert_eq!(record.confidence, Some(1.0));
    }

    #[test]
    fn test_importance_ordering() {
        assert!(Importance::Critical > Importance::High);
        assert!(Importance::High > Importance::Medium);
        assert!(Importance::Medium > Importance::Low);
    }

    #[test]
    fn test_serde_camel_case_and_kebab_category() {
        let record = MemoryRecordBuilder::new(MemoryCategory::BusinessRule)
            .id("m-1")
            .content("Orders over 1000 require approval")
            .importance(Importance::Critical)
            .related_file("src/orders/service.ts")
            .build()
            .unwrap();

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["category"], "business-rule");
        assert_eq!(json["importance"], "critical");
        assert_eq!(json["relatedFiles"][0], "src/orders/service.ts");
        assert!(json.get("confidence").is_none());
    }

    #[test]
    fn test_deserialize_rejects_unknown_importance() {
        let raw = r#"{"id":"x","content":"c","category":"other","importance":"urgent","timestamp":"2024-01-01T00:00:00Z"}"#;
        assert!(serde_json::from_str::<MemoryRecord>(raw).is_err());
    }

    #[test]
    fn test_apply_patch() {
        let mut record = MemoryRecordBuilder::new(MemoryCategory::Other)
            .content("old")
            .build()
            .unwrap();
        record.apply(MemoryPatch {
            content: Some("new".to_string()),
            importance: Some(Importance::High),
            tags: Some(vec!["a".to_string(), "A".to_string()]),
            ..Default::default()
        });

        assert_eq!(record.content, "new");
        assert_eq!(record.importance, Importance::High);
        assert_eq!(record.tags, vec!["a"]);
    }

    #[test]
    fn test_excerpt_truncates_by_chars() {
        let record = MemoryRecordBuilder::new(MemoryCategory::Other)
            .content("禁止在控制器中直接访问数据库")
            .build()
            .unwrap();
        assert_eq!(record.excerpt(4), "禁止在控...");
        assert_eq!(record.excerpt(100), "禁止在控制器中直接访问数据库");
    }

    #[test]
    fn test_category_parse() {
        assert_eq!(MemoryCategory::parse("business_rule"), Some(MemoryCategory::BusinessRule));
        assert_eq!(MemoryCategory::parse("Code-Style"), Some(MemoryCategory::CodeStyle));
        assert_eq!(MemoryCategory::parse("nope"), None);
    }
}
