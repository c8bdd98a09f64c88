//! Heuristic constraint extraction from natural-language memory content
//!
//! Content is split into sentence-like segments. Each segment is matched
//! against the English and Chinese trigger vocabularies:
//!
//! - a conditional shape ("if X then Y", "when X must Y", "如果X则Y", "当X时Y")
//!   yields a [`Constraint::Conditional`]
//! - otherwise a forbid trigger yields a [`Constraint::Forbidden`]
//! - otherwise a require trigger yields a [`Constraint::Required`]
//!
//! Patterns are the quoted or backticked literals after the trigger when there
//! are any, else the comma/enumeration separated items up to the first clause
//! boundary. Extraction is best-effort: a segment without a trigger, or whose
//! items look like prose rather than code, yields nothing.

use super::types::Constraint;
use crate::text::{collapse_whitespace, is_cjk};
use once_cell::sync::Lazy;
use regex::Regex;

/// Trigger words of one natural language
struct Vocabulary {
    forbid: &'static [&'static str],
    require: &'static [&'static str],
}

const ENGLISH: Vocabulary = Vocabulary {
    forbid: &[
        "must not use", "must not call", "must never use", "must never", "must not",
        "should not use", "should never use", "should not", "shouldn't use", "shouldn't",
        "do not use", "do not call", "do not", "don't use", "don't call", "don't",
        "never use", "never call", "never", "avoid using", "avoid calling", "avoid",
        "cannot use", "can't use", "is not allowed", "are not allowed", "not allowed",
        "forbidden", "prohibited", "disallowed", "is banned", "are banned",
    ],
    require: &[
        "must always use", "must always", "must use", "must call", "must include", "must",
        "always use", "always call", "always", "should always use", "should use",
        "is required", "are required", "required", "is mandatory", "are mandatory",
        "need to use", "needs to use", "make sure to use",
    ],
};

const CHINESE: Vocabulary = Vocabulary {
    forbid: &[
        "禁止使用", "禁止调用", "禁止", "严禁使用", "严禁", "不要使用", "不要调用", "不要",
        "不得使用", "不得", "不能使用", "不能", "不允许使用", "是不允许的", "不允许",
        "不可以使用", "不可以", "不应该使用", "不应该", "不应", "避免使用", "避免", "切勿",
        "被禁止",
    ],
    require: &[
        "必须使用", "必须调用", "是必须的", "必须", "务必使用", "务必", "一定要使用", "一定要",
        "需要使用", "需要", "应该使用", "应该", "应当", "要求使用", "只能使用", "只能",
    ],
};

/// Triggers that usually follow what they govern ("`eval` is forbidden")
const POSTFIX_TRIGGERS: &[&str] = &[
    "forbidden", "prohibited", "disallowed", "is not allowed", "are not allowed", "not allowed",
    "is banned", "are banned", "is required", "are required", "required", "is mandatory",
    "are mandatory", "被禁止", "是不允许的", "不允许", "是必须的",
];

/// Clause boundaries that end an unquoted item list
const STOP_PHRASES: &[&str] = &[
    " in ", " for ", " when ", " because ", " unless ", " inside ", " within ", " outside ",
    " except ", " since ", " instead", " to avoid", " anywhere", " directly", "，而不是",
    "而不是", "而非", "因为", "以免", "否则", "以防",
];

const LEADING_NOISE: &[&str] = &[
    "the use of ", "use of ", "using ", "use ", "calling ", "call ", "importing ", "import ",
    "depending on ", "depend on ", "from ", "the ", "any ", "an ", "a ", "使用", "调用", "导入",
    "引入", "依赖",
];

const CONDITION_LEAD: &[&str] = &[
    "you use ", "you call ", "the code uses ", "code uses ", "a file uses ", "code contains ",
    "you ", "使用了", "用到", "代码中使用", "代码中包含", "包含",
];

const REQUIREMENT_LEAD: &[&str] = &[
    "then ", "it ", "you ", "we ", "must ", "should ", "always ", "also ", "use ", "call ",
    "include ", "add ", "be ", "必须", "需要", "应该", "也", "要", "使用", "调用", "加上", "添加",
];

const KEYWORD_STOPWORDS: &[&str] = &[
    "must", "never", "always", "should", "avoid", "with", "without", "that", "this", "from",
    "have", "when", "then", "only", "into", "than", "each", "every", "used", "using", "uses",
    "make", "sure", "code", "file", "files", "shall", "will", "also", "they", "them", "their",
    "there", "been", "being", "which", "where", "while", "other", "some", "more", "most",
    "such", "after", "before", "about", "over", "under", "allowed", "required", "forbidden",
    "prohibited", "cannot", "need", "needs", "does", "done", "just", "like", "call", "calls",
];

const MAX_ITEM_CHARS: usize = 60;
const MAX_ITEM_WORDS: usize = 4;
const MAX_KEYWORDS: usize = 10;

static QUOTED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"`([^`]+)`|"([^"]+)"|“([^”]+)”|「([^」]+)」|‘([^’]+)’|(?:^|[^\w])'([^'\s][^']*)'"#)
        .expect("quoted literal pattern must compile")
});

static SEPARATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s*(?:,|，|、|;|；|\s+or\s+|\s+and\s+|或者|或|以及|和|及)\s*")
        .expect("separator pattern must compile")
});

/// Import and depend verbs that mark a record as a dependency rule
static DEPENDENCY_VERBS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:import(?:s|ed|ing)?|depend(?:s|ed|ing)?)\b|\brequire\(|依赖|导入|引入|引用")
        .expect("dependency verb pattern must compile")
});

static CONDITIONALS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\b(?:if|when|whenever|once)\s+(.+?)(?:\s*,\s*then\s+|\s+then\s+|\s*,\s*)(.+)$",
        r"(?i)\b(?:if|when|whenever)\s+(.+?)\s+((?:must|should|always|needs? to)\b.*)$",
        r"(?:如果|假如|若是|若|一旦)\s*(.+?)\s*[，,]?\s*(?:那么|则|就)\s*(.+)$",
        r"当\s*(.+?)\s*时\s*[，,]?\s*(.+)$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("conditional pattern must compile"))
    .collect()
});

/// Turns memory content into constraints.
///
/// Implemented by [`ConstraintExtractor`]; the validator depends only on this
/// trait so a stricter rule language can replace the heuristics.
pub trait ConstraintSource: Send + Sync {
    fn constraints(&self, content: &str) -> Vec<Constraint>;
}

/// Trigger-keyword constraint extractor for English and Chinese content
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstraintExtractor;

impl ConstraintSource for ConstraintExtractor {
    fn constraints(&self, content: &str) -> Vec<Constraint> {
        self.extract(content)
    }
}

impl ConstraintExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract every constraint the content states, in segment order.
    pub fn extract(&self, content: &str) -> Vec<Constraint> {
        let mut out: Vec<Constraint> = Vec::new();
        for segment in segments(content) {
            if let Some(c) = extract_segment(segment) {
                if !out.contains(&c) {
                    out.push(c);
                }
            }
        }
        tracing::trace!(constraints = out.len(), "Constraints extracted");
        out
    }

    /// Small keyword set used to decide whether a business rule concerns a file.
    ///
    /// Distinct lowercase ASCII words of four or more characters from the
    /// prose, skipping stopwords and the quoted literals the rule checks for.
    pub fn keywords(&self, content: &str) -> Vec<String> {
        let prose = QUOTED.replace_all(content, " ");
        let mut out: Vec<String> = Vec::new();
        for word in prose.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_')) {
            if out.len() == MAX_KEYWORDS {
                break;
            }
            if word.len() < 4 || word.chars().all(|c| c.is_ascii_digit()) {
                continue;
            }
            let lower = word.to_ascii_lowercase();
            if !KEYWORD_STOPWORDS.contains(&lower.as_str()) && !out.contains(&lower) {
                out.push(lower);
            }
        }
        out
    }

    /// Whether the content talks about importing or depending on something.
    ///
    /// Only the verbs count: "important" or "dependency" do not.
    pub fn is_dependency_rule(&self, content: &str) -> bool {
        DEPENDENCY_VERBS.is_match(content)
    }
}

/// Split on sentence terminators and newlines. Backticked code is never split,
/// and ASCII `.`, `!`, `?` only end a sentence before whitespace or the end.
fn segments(content: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut in_code = false;
    let mut iter = content.char_indices().peekable();

    while let Some((i, c)) = iter.next() {
        if c == '`' {
            in_code = !in_code;
            continue;
        }
        if in_code {
            continue;
        }
        let terminal = match c {
            '\n' | ';' | '。' | '！' | '？' | '；' => true,
            '.' | '!' | '?' => iter.peek().map_or(true, |(_, next)| next.is_whitespace()),
            _ => false,
        };
        if terminal {
            let segment = content[start..i].trim();
            if !segment.is_empty() {
                out.push(segment);
            }
            start = i + c.len_utf8();
        }
    }
    let tail = content[start..].trim();
    if !tail.is_empty() {
        out.push(tail);
    }
    out
}

fn extract_segment(segment: &str) -> Option<Constraint> {
    if let Some(c) = conditional(segment) {
        return Some(c);
    }

    // ASCII lowercasing keeps byte offsets valid for the original segment
    let lower = segment.to_ascii_lowercase();

    let forbid = [&ENGLISH, &CHINESE]
        .iter()
        .filter_map(|v| find_trigger(&lower, v.forbid, false))
        .min_by_key(|&(start, end)| (start, std::cmp::Reverse(end)));
    if let Some(span) = forbid {
        let patterns = trigger_items(segment, &lower, span);
        return (!patterns.is_empty()).then_some(Constraint::Forbidden { patterns });
    }

    let require = [&ENGLISH, &CHINESE]
        .iter()
        .filter_map(|v| find_trigger(&lower, v.require, true))
        .min_by_key(|&(start, end)| (start, std::cmp::Reverse(end)));
    if let Some(span) = require {
        let patterns = trigger_items(segment, &lower, span);
        return (!patterns.is_empty()).then_some(Constraint::Required { patterns });
    }

    None
}

/// A conditional needs a code-like condition and a requirement that is not
/// itself a prohibition; anything else is left to the forbid and require
/// triggers.
fn conditional(segment: &str) -> Option<Constraint> {
    CONDITIONALS.iter().find_map(|re| {
        let caps = re.captures(segment)?;
        let raw_condition = caps.get(1)?.as_str();
        let requirement = caps.get(2)?.as_str();

        if has_forbid_trigger(requirement) {
            return None;
        }
        let condition = items(strip_leading(raw_condition, CONDITION_LEAD))
            .into_iter()
            .next()?;
        if !code_like(raw_condition, &condition) {
            return None;
        }
        let requirement = items(strip_leading(requirement, REQUIREMENT_LEAD));
        if requirement.is_empty() {
            return None;
        }
        Some(Constraint::Conditional {
            condition,
            requirement,
        })
    })
}

fn has_forbid_trigger(text: &str) -> bool {
    let lower = text.to_ascii_lowercase();
    [&ENGLISH, &CHINESE]
        .iter()
        .any(|v| find_trigger(&lower, v.forbid, false).is_some())
}

/// Quoted, or an identifier with code punctuation or inner capitals.
fn code_like(raw: &str, item: &str) -> bool {
    if !quoted_literals(raw).is_empty() {
        return true;
    }
    let punctuated = item
        .chars()
        .any(|c| matches!(c, '(' | '.' | '_' | ':' | '<' | '$' | '/' | '#' | '@'));
    let camel = item.chars().skip(1).any(|c| c.is_ascii_uppercase());
    !item.contains(char::is_whitespace) && (punctuated || camel)
}

/// Earliest trigger occurrence as a byte span; longer triggers win ties.
fn find_trigger(lower: &str, triggers: &[&str], reject_negated: bool) -> Option<(usize, usize)> {
    let mut best: Option<(usize, usize)> = None;
    for trigger in triggers {
        let hit = lower
            .match_indices(trigger)
            .map(|(start, t)| (start, start + t.len()))
            .find(|&(start, end)| {
                on_word_boundary(lower, start, end) && !(reject_negated && negated(lower, start))
            });
        if let Some((start, end)) = hit {
            let better = match best {
                None => true,
                Some((s, e)) => start < s || (start == s && end > e),
            };
            if better {
                best = Some((start, end));
            }
        }
    }
    best
}

/// ASCII triggers must not sit inside a longer word.
fn on_word_boundary(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    let first = text[start..end].chars().next();
    let last = text[start..end].chars().next_back();

    let left_ok = !first.is_some_and(|c| c.is_ascii_alphanumeric())
        || !before.is_some_and(|c| c.is_ascii_alphanumeric());
    let right_ok = !last.is_some_and(|c| c.is_ascii_alphanumeric())
        || !after.is_some_and(|c| c.is_ascii_alphanumeric());
    left_ok && right_ok
}

/// `不需要`, `无需` and friends negate a Chinese require trigger.
fn negated(text: &str, start: usize) -> bool {
    matches!(text[..start].chars().next_back(), Some('不' | '无' | '勿'))
}

fn trigger_items(segment: &str, lower: &str, (start, end): (usize, usize)) -> Vec<String> {
    let after = items(&segment[end..]);
    if !after.is_empty() {
        return after;
    }
    let trigger = &lower[start..end];
    if POSTFIX_TRIGGERS.contains(&trigger) {
        return items(strip_trailing_copula(&segment[..start]));
    }
    Vec::new()
}

fn items(text: &str) -> Vec<String> {
    let quoted = quoted_literals(text);
    if !quoted.is_empty() {
        return quoted;
    }

    let clause = cut_at_stop_phrase(text);
    let mut out: Vec<String> = Vec::new();
    for part in SEPARATOR.split(clause) {
        if let Some(item) = clean_item(part) {
            if !out.contains(&item) {
                out.push(item);
            }
        }
    }
    out
}

fn quoted_literals(text: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for caps in QUOTED.captures_iter(text) {
        let Some(m) = (1..=6).find_map(|i| caps.get(i)) else {
            continue;
        };
        let literal = m.as_str().trim();
        if !literal.is_empty() && !out.iter().any(|l| l == literal) {
            out.push(literal.to_string());
        }
    }
    out
}

fn cut_at_stop_phrase(text: &str) -> &str {
    let lower = text.to_ascii_lowercase();
    let cut = STOP_PHRASES
        .iter()
        .filter_map(|p| lower.find(p))
        .min()
        .unwrap_or(text.len());
    &text[..cut]
}

fn clean_item(raw: &str) -> Option<String> {
    let trimmed = trim_item(raw);
    let mut item = strip_leading(trimmed, LEADING_NOISE).to_string();

    // "eval 函数" -> "eval"
    if item.chars().any(|c| c.is_ascii_alphanumeric()) && item.chars().any(is_cjk) {
        item = item.chars().filter(|c| !is_cjk(*c)).collect();
    }

    let item = collapse_whitespace(trim_item(&item));
    let too_long = item.chars().count() > MAX_ITEM_CHARS
        || item.split_whitespace().count() > MAX_ITEM_WORDS;
    (!item.is_empty() && !too_long).then_some(item)
}

fn trim_item(s: &str) -> &str {
    s.trim_matches(|c: char| {
        c.is_whitespace()
            || matches!(
                c,
                '.' | ',' | ';' | ':' | '!' | '?' | '"' | '\'' | '。' | '，' | '；' | '：' | '！'
                    | '？' | '“' | '”'
            )
    })
}

/// Repeatedly strip leading words from `lead` (matched case-insensitively).
fn strip_leading<'a>(text: &'a str, lead: &[&str]) -> &'a str {
    let mut rest = text.trim_start();
    loop {
        let lower = rest.to_ascii_lowercase();
        match lead.iter().find(|w| lower.starts_with(*w)) {
            Some(w) => rest = rest[w.len()..].trim_start(),
            None => return rest,
        }
    }
}

fn strip_trailing_copula(text: &str) -> &str {
    let mut rest = text.trim_end();
    loop {
        let lower = rest.to_ascii_lowercase();
        let word = [" is", " are", " be", "是", "被", "都"]
            .into_iter()
            .find(|w| lower.ends_with(w));
        match word {
            Some(w) => rest = rest[..rest.len() - w.len()].trim_end(),
            None => return rest,
        }
    }
}
