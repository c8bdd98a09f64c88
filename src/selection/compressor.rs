//! Budget-constrained context bundle
//!
//! Renders a selection as one delimited text block, tier by tier
//! (critical, high, medium). Entries are lightly compressed and appended while
//! the estimated token cost stays within budget. After the first overflow,
//! every remaining non-critical entry is skipped and every remaining critical
//! entry is force-appended in aggressively compressed form, up to an absolute
//! cap on critical entries. The header, footer and tier headers count toward
//! the budget.

use crate::config::CompressionConfig;
use crate::memory::{Importance, MemoryRecord};
use crate::text::{collapse_whitespace, head_tail, is_cjk, strip_fillers};
use serde::Serialize;

/// First line of every bundle; its presence marks injected context
pub const CONTEXT_HEADER: &str = "=== CURSOR MEMORY CONTEXT - PROJECT RULES ===";

/// Last line of every bundle
pub const CONTEXT_FOOTER: &str = "=== END CURSOR MEMORY CONTEXT ===";

const TIERS: [(Importance, &str); 3] = [
    (Importance::Critical, "[CRITICAL] Must follow"),
    (Importance::High, "[HIGH] Important"),
    (Importance::Medium, "[MEDIUM] Recommended"),
];

/// Heuristic token cost: `ceil(cjk_chars * 1.5 + non_cjk_words)`.
pub fn estimate_tokens(text: &str) -> usize {
    let mut cjk = 0usize;
    let mut words = 0usize;
    let mut in_word = false;
    for c in text.chars() {
        if is_cjk(c) {
            cjk += 1;
            in_word = false;
        } else if c.is_whitespace() {
            in_word = false;
        } else if !in_word {
            words += 1;
            in_word = true;
        }
    }
    (cjk * 3 + 1) / 2 + words
}

/// Whether `text` already carries an injected bundle.
pub fn contains_context(text: &str) -> bool {
    text.contains(CONTEXT_HEADER)
}

/// Remove an injected bundle (header through footer) from `text`.
///
/// A header without a footer removes everything after the header.
pub fn strip_context(text: &str) -> String {
    let Some(start) = text.find(CONTEXT_HEADER) else {
        return text.to_string();
    };
    let end = text[start..]
        .find(CONTEXT_FOOTER)
        .map(|i| {
            let footer_end = start + i + CONTEXT_FOOTER.len();
            if text[footer_end..].starts_with('\n') {
                footer_end + 1
            } else {
                footer_end
            }
        })
        .unwrap_or(text.len());
    format!("{}{}", &text[..start], &text[end..])
}

/// A rendered bundle and its accounting
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextBundle {
    /// Bundle text; empty when nothing was included
    pub text: String,
    /// Estimated token cost of `text`
    pub tokens: usize,
    /// Entries included in full
    pub included: usize,
    /// Critical entries force-included in compressed form
    pub forced: usize,
    /// Entries left out
    pub skipped: usize,
}

/// Compresses selected memories into a bundle
#[derive(Debug, Clone, Default)]
pub struct ContextCompressor {
    config: CompressionConfig,
}

impl ContextCompressor {
    pub fn new(config: CompressionConfig) -> Self {
        Self { config }
    }

    pub fn default_budget(&self) -> usize {
        self.config.token_budget
    }

    /// Bundle text for `selected` within `budget` tokens.
    pub fn compress(&self, selected: &[MemoryRecord], budget: usize) -> String {
        self.bundle(selected, budget).text
    }

    /// Bundle with accounting.
    pub fn bundle(&self, selected: &[MemoryRecord], budget: usize) -> ContextBundle {
        let mut lines: Vec<String> = vec![CONTEXT_HEADER.to_string()];
        let mut used = estimate_tokens(CONTEXT_HEADER) + estimate_tokens(CONTEXT_FOOTER);
        let mut result = ContextBundle::default();
        let mut overflowed = false;
        let mut critical_count = 0usize;

        for (tier, tier_header) in TIERS {
            let mut header_written = false;
            for record in selected.iter().filter(|r| r.importance == tier) {
                if tier == Importance::Critical && critical_count >= self.config.max_critical {
                    tracing::warn!(
                        memory_id = %record.id,
                        max_critical = self.config.max_critical,
                        "Critical memory cap reached, entry skipped"
                    );
                    result.skipped += 1;
                    continue;
                }

                if !overflowed {
                    let entry = format!("- {}", collapse_whitespace(&record.content));
                    let header_cost = if header_written {
                        0
                    } else {
                        estimate_tokens(tier_header)
                    };
                    let cost = estimate_tokens(&entry) + header_cost;
                    if used + cost <= budget {
                        if !header_written {
                            lines.push(tier_header.to_string());
                            header_written = true;
                        }
                        lines.push(entry);
                        used += cost;
                        result.included += 1;
                        if tier == Importance::Critical {
                            critical_count += 1;
                        }
                        continue;
                    }
                    overflowed = true;
                    tracing::debug!(
                        used,
                        budget,
                        memory_id = %record.id,
                        "Token budget exhausted"
                    );
                }

                if tier == Importance::Critical {
                    if !header_written {
                        lines.push(tier_header.to_string());
                        header_written = true;
                    }
                    lines.push(format!("- {}", self.aggressive(&record.content)));
                    result.forced += 1;
                    critical_count += 1;
                } else {
                    result.skipped += 1;
                }
            }
        }

        result.skipped += selected
            .iter()
            .filter(|r| r.importance == Importance::Low)
            .count();

        if result.included + result.forced == 0 {
            return result;
        }

        lines.push(CONTEXT_FOOTER.to_string());
        result.text = lines.join("\n");
        result.tokens = estimate_tokens(&result.text);
        tracing::debug!(
            included = result.included,
            forced = result.forced,
            skipped = result.skipped,
            tokens = result.tokens,
            "Context bundle built"
        );
        result
    }

    fn aggressive(&self, content: &str) -> String {
        let c = &self.config;
        head_tail(
            &strip_fillers(content),
            c.aggressive_max_chars,
            c.head_chars,
            c.tail_chars,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryCategory, MemoryRecordBuilder};

    fn record(id: &str, content: &str, importance: Importance) -> MemoryRecord {
        MemoryRecordBuilder::new(MemoryCategory::Architecture)
            .id(id)
            .content(content)
            .importance(importance)
            .build()
            .unwrap()
    }

    fn words(n: usize, prefix: &str) -> String {
        (0..n).map(|i| format!("{}{}", prefix, i)).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_estimate_tokens() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("use the repository"), 3);
        assert_eq!(estimate_tokens("禁止"), 3);
        assert_eq!(estimate_tokens("禁止使用 eval"), 7);
        assert_eq!(estimate_tokens("数"), 2);
    }

    #[test]
    fn test_small_selection_is_included_in_full() {
        let selected = vec![
            record("a", "Never use `panic(` in handlers.", Importance::Critical),
            record("b", "Services live in src/services.", Importance::High),
            record("c", "Prefer   small\n functions.", Importance::Medium),
        ];
        let bundle = ContextCompressor::default().bundle(&selected, 2000);

        assert_eq!(bundle.included, 3);
        assert_eq!(bundle.forced, 0);
        assert!(bundle.text.starts_with(CONTEXT_HEADER));
        assert!(bundle.text.ends_with(CONTEXT_FOOTER));
        assert!(bundle.text.contains("[CRITICAL] Must follow\n- Never use `panic(` in handlers."));
        assert!(bundle.text.contains("[HIGH] Important"));
        assert!(bundle.text.contains("- Prefer small functions."));
        assert!(bundle.tokens <= 2000);
    }

    #[test]
    fn test_low_importance_never_included() {
        let selected = vec![
            record("a", "Keep it tidy", Importance::Low),
            record("b", "Use DTOs", Importance::Medium),
        ];
        let bundle = ContextCompressor::default().bundle(&selected, 2000);
        assert!(!bundle.text.contains("tidy"));
        assert_eq!(bundle.skipped, 1);
    }

    #[test]
    fn test_budget_is_respected_without_criticals() {
        let selected: Vec<_> = (0..10)
            .map(|i| record(&format!("h{}", i), &words(40, "w"), Importance::High))
            .collect();
        for budget in [0, 10, 60, 100, 250, 1000] {
            let bundle = ContextCompressor::default().bundle(&selected, budget);
            assert!(bundle.tokens <= budget, "budget {} exceeded: {}", budget, bundle.tokens);
        }
    }

    #[test]
    fn test_overflow_skips_later_tiers() {
        let selected = vec![
            record("h1", &words(30, "a"), Importance::High),
            record("h2", &words(30, "b"), Importance::High),
            record("m1", "short", Importance::Medium),
        ];
        let bundle = ContextCompressor::default().bundle(&selected, 60);
        assert_eq!(bundle.included, 1);
        assert_eq!(bundle.skipped, 2);
        assert!(!bundle.text.contains("short"));
    }

    #[test]
    fn test_criticals_forced_past_budget() {
        let selected: Vec<_> = (0..15)
            .map(|i| record(&format!("c{}", i), &words(300, &format!("r{}x", i)), Importance::Critical))
            .collect();
        let bundle = ContextCompressor::default().bundle(&selected, 500);

        assert_eq!(bundle.included + bundle.forced, 15);
        assert!(bundle.forced >= 14);
        assert_eq!(bundle.text.matches(" ... ").count(), bundle.forced);
        for i in 0..15 {
            assert!(bundle.text.contains(&format!("r{}x0", i)));
        }
    }

    #[test]
    fn test_critical_cap() {
        let compressor = ContextCompressor::new(CompressionConfig {
            max_critical: 3,
            ..Default::default()
        });
        let selected: Vec<_> = (0..5)
            .map(|i| record(&format!("c{}", i), &format!("rule number {}", i), Importance::Critical))
            .collect();
        let bundle = compressor.bundle(&selected, 2000);
        assert_eq!(bundle.included, 3);
        assert_eq!(bundle.skipped, 2);
        assert!(!bundle.text.contains("rule number 3"));
    }

    #[test]
    fn test_markers_are_stable() {
        let selected = vec![record("a", "Use the logger", Importance::High)];
        let compressor = ContextCompressor::default();
        let first = compressor.compress(&selected, 100);
        let second = compressor.compress(&selected, 100);
        assert_eq!(first, second);
        assert_eq!(first.lines().next(), Some(CONTEXT_HEADER));
        assert_eq!(first.lines().last(), Some(CONTEXT_FOOTER));
    }

    #[test]
    fn test_empty_selection_gives_empty_text() {
        assert!(ContextCompressor::default().compress(&[], 2000).is_empty());
    }

    #[test]
    fn test_contains_and_strip_context() {
        let selected = vec![record("a", "Use the logger", Importance::High)];
        let bundle = ContextCompressor::default().compress(&selected, 100);
        let doc = format!("before\n{}\nafter", bundle);

        assert!(contains_context(&doc));
        assert_eq!(strip_context(&doc), "before\nafter");
        assert!(!contains_context(&strip_context(&doc)));
        assert_eq!(strip_context("plain"), "plain");
        assert_eq!(strip_context(&format!("x\n{}\ndangling", CONTEXT_HEADER)), "x\n");
    }
}
