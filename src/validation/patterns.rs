//! Code-shape consistency via normalized signatures
//!
//! A snippet's signature is its first few lines after stripping comments,
//! replacing string and number literals with placeholders and collapsing
//! whitespace. The library counts signatures per language; frequent ones
//! become the baseline new snippets are compared against by normalized edit
//! distance.

use super::diagnostic::{Diagnostic, DiagnosticKind, Severity};
use crate::config::PatternConfig;
use crate::language::{profile_for, IdentifierKind, LanguageProfile};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

const LABEL_CHARS: usize = 60;

static STRING_LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""(?:[^"\\\n]|\\.)*"|'(?:[^'\\\n]|\\.)*'|`(?:[^`\\]|\\.)*`"#)
        .expect("string literal pattern must compile")
});

static NUMBER_LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b\d+(?:\.\d+)?\b").expect("number literal pattern must compile")
});

/// Levenshtein distance over characters.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// `1 - distance / max_len`; two empty strings are identical.
pub fn similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f64 / max_len as f64
}

#[derive(Debug, Clone, Default)]
struct PatternEntry {
    count: usize,
    files: BTreeSet<String>,
    recognized: bool,
}

/// A signature with its statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognizedPattern {
    pub label: String,
    pub signature: String,
    pub count: usize,
    pub files: usize,
}

/// Per-language signature frequency tables
#[derive(Debug, Clone, Default)]
pub struct PatternLibrary {
    config: PatternConfig,
    languages: BTreeMap<String, BTreeMap<String, PatternEntry>>,
}

impl PatternLibrary {
    pub fn new(config: PatternConfig) -> Self {
        Self {
            config,
            languages: BTreeMap::new(),
        }
    }

    /// Normalized signature of a snippet.
    pub fn signature(&self, snippet: &str, language: &str) -> String {
        normalize(snippet, profile_for(language), self.config.signature_lines)
    }

    /// Count one occurrence of a snippet.
    pub fn observe(&mut self, language: &str, file: &str, snippet: &str) {
        let profile = profile_for(language);
        let signature = normalize(snippet, profile, self.config.signature_lines);
        if signature.is_empty() {
            return;
        }
        let entry = self
            .languages
            .entry(profile.name.to_string())
            .or_default()
            .entry(signature)
            .or_default();
        entry.count += 1;
        entry.files.insert(file.to_string());

        let recognized =
            entry.count >= self.config.min_occurrences && entry.files.len() >= self.config.min_files;
        if recognized && !entry.recognized {
            entry.recognized = true;
            tracing::debug!(
                language = profile.name,
                count = entry.count,
                files = entry.files.len(),
                "Code pattern recognized"
            );
        }
    }

    /// Observe every function-shaped snippet in a file. Returns how many.
    pub fn learn_file(&mut self, language: &str, file: &str, text: &str) -> usize {
        let snippets = function_snippets(text, profile_for(language));
        for (_, snippet) in &snippets {
            self.observe(language, file, snippet);
        }
        snippets.len()
    }

    /// Patterns seen often enough in enough files, most frequent first.
    pub fn recognized_patterns(&self, language: &str) -> Vec<RecognizedPattern> {
        self.patterns_where(language, |e| {
            e.count >= self.config.min_occurrences && e.files.len() >= self.config.min_files
        })
    }

    /// Patterns frequent enough to serve as a comparison baseline.
    pub fn common_patterns(&self, language: &str) -> Vec<RecognizedPattern> {
        self.patterns_where(language, |e| e.count >= self.config.common_frequency)
    }

    fn patterns_where(
        &self,
        language: &str,
        keep: impl Fn(&PatternEntry) -> bool,
    ) -> Vec<RecognizedPattern> {
        let Some(table) = self.languages.get(profile_for(language).name) else {
            return Vec::new();
        };
        let mut out: Vec<RecognizedPattern> = table
            .iter()
            .filter(|(_, e)| keep(*e))
            .map(|(signature, e)| RecognizedPattern {
                label: label(signature),
                signature: signature.clone(),
                count: e.count,
                files: e.files.len(),
            })
            .collect();
        out.sort_by(|a, b| b.count.cmp(&a.count));
        out
    }

    /// Best-matching common pattern and its similarity.
    pub fn best_match(&self, language: &str, snippet: &str) -> Option<(RecognizedPattern, f64)> {
        let signature = self.signature(snippet, language);
        if signature.is_empty() {
            return None;
        }
        let mut best: Option<(RecognizedPattern, f64)> = None;
        for pattern in self.common_patterns(language) {
            let sim = similarity(&signature, &pattern.signature);
            if best.as_ref().map_or(true, |(_, s)| sim > *s) {
                best = Some((pattern, sim));
            }
        }
        best
    }

    /// Info diagnostic when the snippet diverges from every common pattern.
    pub fn check(&self, language: &str, snippet: &str) -> Option<Diagnostic> {
        let (pattern, sim) = self.best_match(language, snippet)?;
        if sim >= self.config.similarity_threshold {
            return None;
        }
        Some(Diagnostic::new(
            Severity::Info,
            DiagnosticKind::Pattern,
            format!(
                "Code shape is inconsistent with the common pattern '{}' (similarity {:.2})",
                pattern.label, sim
            ),
        ))
    }

    /// Check every function-shaped snippet in a file.
    pub fn check_file(&self, language: &str, text: &str) -> Vec<Diagnostic> {
        function_snippets(text, profile_for(language))
            .into_iter()
            .filter_map(|(line, snippet)| self.check(language, &snippet).map(|d| d.at(line, 1)))
            .collect()
    }
}

/// Function-shaped snippets: from each function declaration line to the next.
fn function_snippets(text: &str, profile: &LanguageProfile) -> Vec<(usize, String)> {
    let lines: Vec<&str> = text.lines().collect();
    let mut starts: Vec<usize> = profile
        .declarations(text)
        .into_iter()
        .filter(|d| d.kind == IdentifierKind::Function)
        .map(|d| d.line)
        .collect();
    starts.dedup();

    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).map_or(lines.len() + 1, |&next| next);
            let snippet = lines[start - 1..end - 1].join("\n");
            (start, snippet)
        })
        .collect()
}

fn normalize(snippet: &str, profile: &LanguageProfile, max_lines: usize) -> String {
    let without_strings = STRING_LITERAL.replace_all(snippet, "STR");
    let without_numbers = NUMBER_LITERAL.replace_all(&without_strings, "NUM");

    let mut out: Vec<String> = Vec::new();
    let mut in_block = false;
    for raw in without_numbers.lines() {
        let line = strip_comments(raw, profile, &mut in_block);
        let collapsed = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.is_empty() {
            continue;
        }
        out.push(collapsed);
        if out.len() == max_lines {
            break;
        }
    }
    out.join("\n")
}

fn strip_comments(line: &str, profile: &LanguageProfile, in_block: &mut bool) -> String {
    let mut rest = line;
    let mut kept = String::new();
    loop {
        if *in_block {
            let Some((_, close)) = profile.block_comment else {
                *in_block = false;
                continue;
            };
            match rest.find(close) {
                Some(i) => {
                    rest = &rest[i + close.len()..];
                    *in_block = false;
                }
                None => return kept,
            }
        }

        let line_cut = profile
            .line_comments
            .iter()
            .filter_map(|c| rest.find(c))
            .min();
        let block_open = profile
            .block_comment
            .and_then(|(open, _)| rest.find(open).map(|i| (i, open.len())));

        match (line_cut, block_open) {
            (Some(l), Some((b, _))) if l < b => {
                kept.push_str(&rest[..l]);
                return kept;
            }
            (_, Some((b, len))) => {
                kept.push_str(&rest[..b]);
                kept.push(' ');
                rest = &rest[b + len..];
                *in_block = true;
            }
            (Some(l), None) => {
                kept.push_str(&rest[..l]);
                return kept;
            }
            (None, None) => {
                kept.push_str(rest);
                return kept;
            }
        }
    }
}

fn label(signature: &str) -> String {
    let first = signature.lines().next().unwrap_or_default();
    if first.chars().count() <= LABEL_CHARS {
        first.to_string()
    } else {
        let head: String = first.chars().take(LABEL_CHARS).collect();
        format!("{}...", head)
    }
}
