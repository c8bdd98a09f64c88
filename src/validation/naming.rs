//! Naming-convention checks
//!
//! Conventions come from memory records that read as naming rules
//! ("functions use camelCase, classes use PascalCase", "变量使用驼峰命名") or,
//! when the corpus has none, from the language profile's defaults.

use super::diagnostic::{Diagnostic, DiagnosticKind, Severity};
use crate::language::{CaseStyle, IdentifierKind, LanguageProfile, NamingConventions, NAME_EXCEPTIONS};
use crate::memory::MemoryRecord;

const NAMING_WORDS: &[&str] = &[
    "naming", "named", "camelcase", "camel case", "pascalcase", "pascal case", "snake_case",
    "snake case", "upper_snake", "命名", "驼峰", "下划线",
];

/// Language words that scope a naming rule to one language
const LANGUAGE_WORDS: &[&str] = &[
    "typescript", "javascript", "python", "rust", "golang", "java", "kotlin", "csharp", "c#",
];

/// Conventions plus where they came from
#[derive(Debug, Clone)]
pub struct NamingRule<'a> {
    pub conventions: NamingConventions,
    pub severity: Severity,
    pub record: Option<&'a MemoryRecord>,
}

/// Whether a record is a naming rule (tagged or worded as one).
pub fn is_naming_record(record: &MemoryRecord) -> bool {
    if record.has_tag("naming") || record.has_tag("命名") {
        return true;
    }
    let lower = record.content.to_lowercase();
    NAMING_WORDS.iter().any(|w| lower.contains(w))
}

/// Naming rules that apply to `profile`, falling back to its defaults.
pub fn naming_rules<'a>(corpus: &'a [MemoryRecord], profile: &LanguageProfile) -> Vec<NamingRule<'a>> {
    let rules: Vec<NamingRule<'a>> = corpus
        .iter()
        .filter(|r| is_naming_record(r) && applies_to(r, profile))
        .filter_map(rule_from_record)
        .collect();
    if !rules.is_empty() {
        return rules;
    }
    profile
        .naming
        .clone()
        .map(|conventions| NamingRule {
            conventions,
            severity: Severity::Warning,
            record: None,
        })
        .into_iter()
        .collect()
}

/// Parse conventions out of a naming record; `None` when it names no style.
///
/// Each clause is read on its own: the case style it mentions applies to the
/// identifier kinds it mentions, or to functions and variables when it
/// mentions none. Kinds no clause mentions accept any style.
pub fn rule_from_record(record: &MemoryRecord) -> Option<NamingRule<'_>> {
    let mut conventions = NamingConventions {
        function: Vec::new(),
        type_name: Vec::new(),
        variable: Vec::new(),
        constant: Vec::new(),
    };

    let lower = record.content.to_lowercase();
    for clause in lower.split(|c: char| matches!(c, ',' | ';' | '.' | '\n' | '，' | '；' | '。')) {
        let Some(style) = clause_style(clause) else {
            continue;
        };
        let mut kinds = clause_kinds(clause);
        if kinds.is_empty() {
            kinds = vec![IdentifierKind::Function, IdentifierKind::Variable];
        }
        for kind in kinds {
            let list = match kind {
                IdentifierKind::Function => &mut conventions.function,
                IdentifierKind::Type => &mut conventions.type_name,
                IdentifierKind::Variable => &mut conventions.variable,
                IdentifierKind::Constant => &mut conventions.constant,
            };
            if !list.contains(&style) {
                list.push(style);
            }
        }
    }

    let empty = conventions.function.is_empty()
        && conventions.type_name.is_empty()
        && conventions.variable.is_empty()
        && conventions.constant.is_empty();
    if empty {
        return None;
    }
    Some(NamingRule {
        conventions,
        severity: Severity::for_violation(record.importance),
        record: Some(record),
    })
}

fn clause_style(clause: &str) -> Option<CaseStyle> {
    let has = |words: &[&str]| words.iter().any(|w| clause.contains(w));
    if has(&["pascalcase", "pascal case", "uppercamel", "upper camel", "大驼峰"]) {
        Some(CaseStyle::UpperCamel)
    } else if has(&["upper_snake", "upper snake", "screaming", "全大写"]) {
        Some(CaseStyle::UpperSnake)
    } else if has(&["snake_case", "snake case", "下划线"]) {
        Some(CaseStyle::SnakeCase)
    } else if has(&["camelcase", "camel case", "lowercamel", "驼峰"]) {
        Some(CaseStyle::LowerCamel)
    } else {
        None
    }
}

fn clause_kinds(clause: &str) -> Vec<IdentifierKind> {
    let words: Vec<&str> = clause
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    let word = |list: &[&str]| words.iter().any(|w| list.contains(w));
    let han = |list: &[&str]| list.iter().any(|w| clause.contains(w));

    let mut kinds = Vec::new();
    if word(&["function", "functions", "method", "methods", "func", "fn"]) || han(&["函数", "方法"]) {
        kinds.push(IdentifierKind::Function);
    }
    if word(&["class", "classes", "type", "types", "interface", "interfaces", "struct", "structs", "enum", "enums"])
        || han(&["类", "接口", "结构体", "枚举"])
    {
        kinds.push(IdentifierKind::Type);
    }
    if word(&["variable", "variables", "var", "vars", "parameter", "parameters", "field", "fields"])
        || han(&["变量", "参数", "字段"])
    {
        kinds.push(IdentifierKind::Variable);
    }
    if word(&["constant", "constants", "const"]) || han(&["常量"]) {
        kinds.push(IdentifierKind::Constant);
    }
    kinds
}

/// A rule that names a language applies only to files of that language.
fn applies_to(record: &MemoryRecord, profile: &LanguageProfile) -> bool {
    let lower = record.content.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !(c.is_alphanumeric() || c == '#'))
        .filter(|w| !w.is_empty())
        .collect();
    let mentioned: Vec<&str> = LANGUAGE_WORDS
        .iter()
        .copied()
        .filter(|l| words.contains(l))
        .collect();
    mentioned.is_empty()
        || mentioned
            .iter()
            .any(|l| *l == profile.name || profile.tags.contains(l))
}

/// Check every declaration in `code` against the rules.
///
/// Exception names and single-character names are never flagged; a
/// declaration is reported at most once.
pub fn check_naming(code: &str, profile: &LanguageProfile, rules: &[NamingRule<'_>]) -> Vec<Diagnostic> {
    let declarations = profile.declarations(code);
    let mut out: Vec<Diagnostic> = Vec::new();
    let mut reported: Vec<(usize, String)> = Vec::new();

    for rule in rules {
        for decl in &declarations {
            let name = decl.name.as_str();
            if name.chars().count() <= 1 || NAME_EXCEPTIONS.contains(&name) {
                continue;
            }
            if rule.conventions.accepts(decl.kind, name) {
                continue;
            }
            if reported.iter().any(|(line, n)| *line == decl.line && n == name) {
                continue;
            }
            reported.push((decl.line, name.to_string()));

            let expected = rule
                .conventions
                .for_kind(decl.kind)
                .iter()
                .map(|s| s.label())
                .collect::<Vec<_>>()
                .join(" or ");
            let found = CaseStyle::detect(name).map_or("mixed case", |s| s.label());
            let mut diagnostic = Diagnostic::new(
                rule.severity,
                DiagnosticKind::Naming,
                format!(
                    "{} '{}' should be {} (found {})",
                    decl.kind.label(),
                    name,
                    expected,
                    found
                ),
            )
            .at(decl.line, decl.column);
            if let Some(record) = rule.record {
                diagnostic = diagnostic.with_source(record);
            }
            out.push(diagnostic);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::profile_for;
    use crate::memory::{Importance, MemoryCategory, MemoryRecordBuilder};

    fn record(content: &str, importance: Importance) -> MemoryRecord {
        MemoryRecordBuilder::new(MemoryCategory::CodeStyle)
            .id("n1")
            .content(content)
            .importance(importance)
            .build()
            .unwrap()
    }

    #[test]
    fn test_default_conventions_flag_snake_case_function() {
        let profile = profile_for("typescript");
        let rules = naming_rules(&[], profile);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].severity, Severity::Warning);

        let diags = check_naming("function get_user(id) {\n  return id;\n}\n", profile, &rules);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].line, Some(1));
        assert_eq!(diags[0].column, Some(10));
        assert!(diags[0].message.contains("function 'get_user'"));
        assert!(diags[0].source.is_none());
    }

    #[test]
    fn test_record_rule_per_clause() {
        let r = record(
            "Functions use snake_case, classes use PascalCase.",
            Importance::High,
        );
        let rule = rule_from_record(&r).unwrap();
        assert_eq!(rule.conventions.function, vec![CaseStyle::SnakeCase]);
        assert_eq!(rule.conventions.type_name, vec![CaseStyle::UpperCamel]);
        assert!(rule.conventions.variable.is_empty());
        assert_eq!(rule.severity, Severity::Warning);
    }

    #[test]
    fn test_chinese_naming_record() {
        let r = record("变量和函数使用驼峰命名", Importance::Critical);
        assert!(is_naming_record(&r));
        let rule = rule_from_record(&r).unwrap();
        assert_eq!(rule.conventions.function, vec![CaseStyle::LowerCamel]);
        assert_eq!(rule.conventions.variable, vec![CaseStyle::LowerCamel]);
        assert_eq!(rule.severity, Severity::Error);
    }

    #[test]
    fn test_record_rules_replace_defaults() {
        let corpus = vec![record("Python functions must use snake_case", Importance::Medium)];
        let profile = profile_for("python");
        let rules = naming_rules(&corpus, profile);
        assert_eq!(rules.len(), 1);
        assert!(rules[0].record.is_some());

        let diags = check_naming("def getUser():\n    pass\n", profile, &rules);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].severity, Severity::Info);
        assert_eq!(diags[0].source.as_ref().unwrap().memory_id, "n1");
    }

    #[test]
    fn test_language_scoped_rule_skipped_for_other_languages() {
        let corpus = vec![record("Python functions must use snake_case", Importance::High)];
        let profile = profile_for("typescript");
        let rules = naming_rules(&corpus, profile);
        assert!(rules[0].record.is_none());
    }

    #[test]
    fn test_exceptions_and_single_letters_skipped() {
        let profile = profile_for("typescript");
        let rules = naming_rules(&[], profile);
        let code = "type ID = string;\ninterface T {}\nconst x = 1;\n";
        assert!(check_naming(code, profile, &rules).is_empty());
    }

    #[test]
    fn test_no_defaults_for_generic_profile() {
        assert!(naming_rules(&[], profile_for("cobol")).is_empty());
    }
}
