//! Dependency and layered-architecture checks
//!
//! Forbidden-dependency records ("do not import lodash") are matched against
//! the file's import edges. Layer records ("the UI layer must not depend on
//! the database layer", "控制器层不能直接调用数据库层") are applied when the
//! file's path places it in the restricted layer.

use super::diagnostic::{Diagnostic, DiagnosticKind, Severity};
use crate::constraint::Constraint;
use crate::language::ImportEdge;
use crate::memory::MemoryRecord;
use once_cell::sync::Lazy;
use regex::Regex;

/// "X must not depend on Y" between two named layers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerRule {
    pub layer: String,
    pub forbidden: String,
}

static LAYER_RULES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\b([a-z][\w-]*)\s+layers?\s+(?:must\s+not|must\s+never|should\s+not|shouldn't|cannot|can't|may\s+not|never)\s+(?:directly\s+)?(?:depend\s+on|import|call|access|reference|use)\s+(?:the\s+|any\s+)?([a-z][\w-]*)(?:\s+layers?)?",
        r"([\p{Han}A-Za-z]+?)层\s*(?:不能|不得|禁止|不应|不可|不允许)\s*(?:直接)?\s*(?:依赖|调用|引用|导入|访问)\s*([\p{Han}A-Za-z]+?)层",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("layer rule pattern must compile"))
    .collect()
});

/// Canonical layer names and the words that denote them in paths and prose
const LAYER_ALIASES: &[(&str, &[&str])] = &[
    ("controller", &["controller", "controllers", "控制器", "控制"]),
    ("service", &["service", "services", "服务", "业务"]),
    ("repository", &["repository", "repositories", "repo", "dao", "仓储", "数据访问"]),
    ("database", &["database", "db", "数据库", "数据", "持久化"]),
    ("ui", &["ui", "view", "views", "presentation", "界面", "视图", "表现", "展示"]),
    ("domain", &["domain", "领域"]),
    ("infrastructure", &["infrastructure", "infra", "基础设施"]),
    ("model", &["model", "models", "模型"]),
];

/// Layer rules stated in `content`.
pub fn layer_rules(content: &str) -> Vec<LayerRule> {
    let mut out: Vec<LayerRule> = Vec::new();
    for re in LAYER_RULES.iter() {
        for caps in re.captures_iter(content) {
            let (Some(layer), Some(forbidden)) = (caps.get(1), caps.get(2)) else {
                continue;
            };
            let rule = LayerRule {
                layer: canonical_layer(layer.as_str()),
                forbidden: canonical_layer(forbidden.as_str()),
            };
            if rule.layer != rule.forbidden && !out.contains(&rule) {
                out.push(rule);
            }
        }
    }
    out
}

fn canonical_layer(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    LAYER_ALIASES
        .iter()
        .find(|(_, words)| words.contains(&lower.as_str()))
        .map(|(canonical, _)| canonical.to_string())
        .unwrap_or(lower)
}

/// Words that denote a layer in a path, English only.
fn layer_words(layer: &str) -> Vec<String> {
    let mut words = vec![layer.to_string()];
    if let Some((_, aliases)) = LAYER_ALIASES.iter().find(|(c, _)| *c == layer) {
        for alias in aliases.iter().filter(|a| a.is_ascii()) {
            if !words.iter().any(|w| w == alias) {
                words.push(alias.to_string());
            }
        }
    }
    words
}

/// Whether a path or import target belongs to `layer`.
///
/// Short words (under four characters) must equal a whole path segment, with
/// an optional plural `s`; longer words match as substrings.
pub fn in_layer(path: &str, layer: &str) -> bool {
    let lower = path.to_lowercase();
    let segments: Vec<&str> = lower
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|s| !s.is_empty())
        .collect();
    layer_words(layer).iter().any(|word| {
        if word.len() < 4 {
            segments
                .iter()
                .any(|s| *s == word || s.strip_suffix('s') == Some(word.as_str()))
        } else {
            lower.contains(word.as_str())
        }
    })
}

/// Import edges whose target contains a forbidden pattern.
pub fn check_forbidden_imports(
    edges: &[ImportEdge],
    constraints: &[Constraint],
    record: &MemoryRecord,
) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    for constraint in constraints {
        let Constraint::Forbidden { patterns } = constraint else {
            continue;
        };
        for edge in edges {
            if let Some(pattern) = patterns.iter().find(|p| edge.target.contains(p.as_str())) {
                out.push(
                    Diagnostic::new(
                        Severity::Error,
                        DiagnosticKind::Dependency,
                        format!("Forbidden dependency '{}' (matches '{}')", edge.target, pattern),
                    )
                    .at(edge.line, 1)
                    .with_source(record),
                );
            }
        }
    }
    out
}

/// Whether a forbidden constraint names one of the file's import targets.
pub fn covered_by_imports(edges: &[ImportEdge], constraint: &Constraint) -> bool {
    let Constraint::Forbidden { patterns } = constraint else {
        return false;
    };
    patterns
        .iter()
        .any(|p| edges.iter().any(|e| e.target.contains(p.as_str())))
}

/// Import edges that cross a forbidden layer boundary from this file.
pub fn check_layers(
    path: &str,
    edges: &[ImportEdge],
    rules: &[LayerRule],
    record: &MemoryRecord,
) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    for rule in rules.iter().filter(|r| in_layer(path, &r.layer)) {
        for edge in edges.iter().filter(|e| in_layer(&e.target, &rule.forbidden)) {
            out.push(
                Diagnostic::new(
                    Severity::Error,
                    DiagnosticKind::Layer,
                    format!(
                        "Layer violation: {} layer must not depend on {} layer (import '{}')",
                        rule.layer, rule.forbidden, edge.target
                    ),
                )
                .at(edge.line, 1)
                .with_source(record),
            );
        }
    }
    out
}
