//! Multi-signal relevance scoring and selection
//!
//! Each record's score is the sum of independent signals, in priority order:
//!
//! 1. flat bonus for `critical` importance
//! 2. a related file matches the current path (substring, either direction)
//! 3. per tag found in the file name, directory, a declared name or a keyword
//! 4. per declared function name found in the content or tags
//! 5. per declared type name, same rule
//! 6. per import target found in the content
//! 7. per domain keyword found in the content or tags
//! 8. per feature word occurring in the content
//!
//! then multiplied by the importance multiplier (`high`, `medium`).
//!
//! Selection always includes every critical record in corpus order, then fills
//! the remaining slots with the best-scoring records above the threshold. Ties
//! keep corpus order.

use crate::config::SelectionConfig;
use crate::features::FeatureSet;
use crate::memory::{Importance, MemoryRecord};
use serde::Serialize;
use std::cmp::Ordering;

/// Names shorter than this never count as substring hits
const MIN_NAME_LEN: usize = 3;

/// One scoring signal that fired for a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    Critical,
    RelatedFile,
    Tag,
    Function,
    Type,
    Import,
    Keyword,
    WordOverlap,
}

/// A fired signal with its match count and contribution before the multiplier
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Signal {
    pub kind: SignalKind,
    pub matches: usize,
    pub points: f64,
}

/// A record with its relevance score and the signals behind it
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredMemory {
    pub record: MemoryRecord,
    pub score: f64,
    pub signals: Vec<Signal>,
}

/// Scores a corpus against one file's features
#[derive(Debug, Clone, Default)]
pub struct RelevanceScorer {
    config: SelectionConfig,
}

impl RelevanceScorer {
    pub fn new(config: SelectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    /// Score one record.
    pub fn score(&self, record: &MemoryRecord, features: &FeatureSet) -> ScoredMemory {
        let w = &self.config;
        let content = record.content.to_lowercase();
        let tags: Vec<String> = record
            .tags
            .iter()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        let in_content_or_tags = |needle: &str| {
            content.contains(needle) || tags.iter().any(|t| t.contains(needle))
        };

        let mut signals = Vec::new();
        let mut push = |kind: SignalKind, matches: usize, weight: f64| {
            if matches > 0 {
                signals.push(Signal {
                    kind,
                    matches,
                    points: weight * matches as f64,
                });
            }
        };

        push(
            SignalKind::Critical,
            usize::from(record.importance == Importance::Critical),
            w.critical_bonus,
        );
        push(
            SignalKind::RelatedFile,
            usize::from(related_file_matches(record, &features.file_path)),
            w.related_file,
        );

        let file_name = features.file_name.to_lowercase();
        let directory = features.directory.to_lowercase();
        let names: Vec<String> = features
            .functions
            .iter()
            .chain(&features.types)
            .chain(&features.keywords)
            .map(|n| n.to_lowercase())
            .collect();
        let tag_hits = tags
            .iter()
            .filter(|t| {
                file_name.contains(t.as_str())
                    || directory.contains(t.as_str())
                    || names.iter().any(|n| n.contains(t.as_str()))
            })
            .count();
        push(SignalKind::Tag, tag_hits, w.tag_match);

        let name_hits = |list: &[String]| {
            list.iter()
                .filter(|n| n.chars().count() >= MIN_NAME_LEN)
                .filter(|n| in_content_or_tags(&n.to_lowercase()))
                .count()
        };
        push(SignalKind::Function, name_hits(&features.functions), w.function_match);
        push(SignalKind::Type, name_hits(&features.types), w.type_match);

        let import_hits = features
            .imports
            .iter()
            .filter(|i| i.chars().count() >= MIN_NAME_LEN)
            .filter(|i| content.contains(&i.to_lowercase()))
            .count();
        push(SignalKind::Import, import_hits, w.import_match);

        let keyword_hits = features
            .keywords
            .iter()
            .filter(|k| in_content_or_tags(&k.to_lowercase()))
            .count();
        push(SignalKind::Keyword, keyword_hits, w.keyword_match);

        let overlap = features
            .feature_words()
            .iter()
            .filter(|word| content.contains(word.as_str()))
            .count();
        push(SignalKind::WordOverlap, overlap, w.word_overlap);

        let base: f64 = signals.iter().map(|s| s.points).sum();
        let multiplier = match record.importance {
            Importance::High => w.high_multiplier,
            Importance::Medium => w.medium_multiplier,
            Importance::Low | Importance::Critical => 1.0,
        };

        ScoredMemory {
            record: record.clone(),
            score: base * multiplier,
            signals,
        }
    }

    /// Score every record, in corpus order.
    pub fn score_all(&self, corpus: &[MemoryRecord], features: &FeatureSet) -> Vec<ScoredMemory> {
        corpus.iter().map(|r| self.score(r, features)).collect()
    }

    /// Selected records with their scores: criticals first, then by score.
    pub fn select_scored(
        &self,
        corpus: &[MemoryRecord],
        features: &FeatureSet,
    ) -> Vec<ScoredMemory> {
        let (mut selected, mut others): (Vec<ScoredMemory>, Vec<ScoredMemory>) = self
            .score_all(corpus, features)
            .into_iter()
            .partition(|s| s.record.importance == Importance::Critical);

        let critical = selected.len();
        let remaining = self.config.max_selected.saturating_sub(critical);

        others.retain(|s| s.score > self.config.min_score);
        others.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        others.truncate(remaining);
        selected.extend(others);

        tracing::debug!(
            file = %features.file_path,
            corpus = corpus.len(),
            critical,
            selected = selected.len(),
            "Memory selection complete"
        );
        selected
    }

    /// Records to expose for a file.
    pub fn select(&self, corpus: &[MemoryRecord], features: &FeatureSet) -> Vec<MemoryRecord> {
        self.select_scored(corpus, features)
            .into_iter()
            .map(|s| s.record)
            .collect()
    }
}

fn related_file_matches(record: &MemoryRecord, path: &str) -> bool {
    let path = path.replace('\\', "/");
    if path.is_empty() {
        return false;
    }
    record.related_files.iter().flatten().any(|related| {
        let related = related.replace('\\', "/");
        !related.is_empty() && (path.contains(&related) || related.contains(&path))
    })
}
