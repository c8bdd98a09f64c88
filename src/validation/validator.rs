//! Rule validation pipeline
//!
//! Stages, in diagnostic order: constraints, naming, business rules,
//! dependencies and layers, code patterns. Each stage is independent and reads
//! the same corpus snapshot; the result is a pure function of its inputs.

use super::dependency::{check_forbidden_imports, check_layers, covered_by_imports, layer_rules};
use super::diagnostic::{Diagnostic, DiagnosticKind, Severity, ValidationReport};
use super::naming::{check_naming, naming_rules};
use super::patterns::PatternLibrary;
use crate::config::ValidationConfig;
use crate::constraint::{line_col, ConstraintExtractor, ConstraintSource, Violation};
use crate::language::{profile_for, ImportEdge};
use crate::memory::{Importance, MemoryCategory, MemoryRecord};
use std::sync::Arc;

/// Validates source text against a memory corpus
#[derive(Clone)]
pub struct Validator {
    config: ValidationConfig,
    source: Arc<dyn ConstraintSource>,
    extractor: ConstraintExtractor,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}

impl Validator {
    pub fn new(config: ValidationConfig) -> Self {
        Self {
            config,
            source: Arc::new(ConstraintExtractor::new()),
            extractor: ConstraintExtractor::new(),
        }
    }

    /// Replace the constraint source used by the constraint and business stages.
    pub fn with_source(mut self, source: Arc<dyn ConstraintSource>) -> Self {
        self.source = source;
        self
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate `code` without pattern checks.
    pub fn validate(
        &self,
        code: &str,
        path: &str,
        language: &str,
        corpus: &[MemoryRecord],
    ) -> ValidationReport {
        self.validate_with_patterns(code, path, language, corpus, None)
    }

    /// Validate `code`, merging pattern diagnostics when a library is given.
    pub fn validate_with_patterns(
        &self,
        code: &str,
        path: &str,
        language: &str,
        corpus: &[MemoryRecord],
        patterns: Option<&PatternLibrary>,
    ) -> ValidationReport {
        let profile = profile_for(language);
        let edges = profile.imports(code);
        let mut diagnostics = Vec::new();

        if self.config.check_constraints {
            diagnostics.extend(self.check_constraints(code, &edges, corpus));
        }
        if self.config.check_naming {
            let rules = naming_rules(corpus, profile);
            diagnostics.extend(check_naming(code, profile, &rules));
        }
        if self.config.check_business_rules {
            diagnostics.extend(self.check_business_rules(code, corpus));
        }
        if self.config.check_dependencies {
            diagnostics.extend(self.check_dependencies(path, &edges, corpus));
        }
        if self.config.check_patterns {
            if let Some(library) = patterns {
                diagnostics.extend(library.check_file(language, code));
            }
        }

        let report = ValidationReport::from_diagnostics(diagnostics);
        tracing::debug!(
            path,
            language = profile.name,
            errors = report.errors,
            warnings = report.warnings,
            infos = report.infos,
            "Validation complete"
        );
        report
    }

    fn applies(&self, record: &MemoryRecord) -> bool {
        record.importance >= self.config.rule_min_importance
    }

    /// Layer records are left to the layer check entirely. Forbidden
    /// constraints of dependency records are left to the dependency check
    /// when one of their patterns names an import of this file; everything
    /// else is matched against the raw text.
    fn check_constraints(
        &self,
        code: &str,
        edges: &[ImportEdge],
        corpus: &[MemoryRecord],
    ) -> Vec<Diagnostic> {
        let mut out = Vec::new();
        for record in corpus {
            if !self.applies(record)
                || !record.category.carries_code_rules()
                || !layer_rules(&record.content).is_empty()
            {
                continue;
            }
            let dependency_rule = self.config.check_dependencies
                && self.extractor.is_dependency_rule(&record.content);
            for constraint in self.source.constraints(&record.content) {
                if dependency_rule && covered_by_imports(edges, &constraint) {
                    continue;
                }
                if let Some(violation) = constraint.check(code) {
                    let severity = match violation {
                        Violation::RequiredMissing { .. } => Severity::for_missing(record.importance),
                        _ => Severity::for_violation(record.importance),
                    };
                    out.push(diagnostic(
                        severity,
                        DiagnosticKind::Constraint,
                        code,
                        &violation,
                        record,
                    ));
                }
            }
        }
        out
    }

    /// Critical business rules, applied only when the code mentions one of
    /// the rule's keywords.
    fn check_business_rules(&self, code: &str, corpus: &[MemoryRecord]) -> Vec<Diagnostic> {
        let lower = code.to_lowercase();
        let mut out = Vec::new();
        for record in corpus.iter().filter(|r| {
            r.category == MemoryCategory::BusinessRule && r.importance == Importance::Critical
        }) {
            let keywords = self.extractor.keywords(&record.content);
            if !keywords.iter().any(|k| lower.contains(k.as_str())) {
                continue;
            }
            for constraint in self.source.constraints(&record.content) {
                if let Some(violation) = constraint.check(code) {
                    out.push(diagnostic(
                        Severity::Error,
                        DiagnosticKind::BusinessRule,
                        code,
                        &violation,
                        record,
                    ));
                }
            }
        }
        out
    }

    fn check_dependencies(
        &self,
        path: &str,
        edges: &[ImportEdge],
        corpus: &[MemoryRecord],
    ) -> Vec<Diagnostic> {
        if edges.is_empty() {
            return Vec::new();
        }
        let mut out = Vec::new();
        for record in corpus.iter().filter(|r| self.applies(r)) {
            if self.extractor.is_dependency_rule(&record.content) {
                let constraints = self.source.constraints(&record.content);
                out.extend(check_forbidden_imports(edges, &constraints, record));
            }
            let rules = layer_rules(&record.content);
            if !rules.is_empty() {
                out.extend(check_layers(path, edges, &rules, record));
            }
        }
        out
    }
}

fn diagnostic(
    severity: Severity,
    kind: DiagnosticKind,
    code: &str,
    violation: &Violation,
    record: &MemoryRecord,
) -> Diagnostic {
    let message = match kind {
        DiagnosticKind::BusinessRule => format!("Business rule violated: {}", violation.describe()),
        _ => capitalize(&violation.describe()),
    };
    let mut d = Diagnostic::new(severity, kind, message).with_source(record);
    if let Some(offset) = violation.offset() {
        let (line, column) = line_col(code, offset);
        d = d.at(line, column);
    }
    d
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::Constraint;
    use crate::memory::MemoryRecordBuilder;

    fn record(
        id: &str,
        category: MemoryCategory,
        importance: Importance,
        content: &str,
    ) -> MemoryRecord {
        MemoryRecordBuilder::new(category)
            .id(id)
            .content(content)
            .importance(importance)
            .build()
            .unwrap()
    }

    const GO_HANDLER: &str = "package api\n\nfunc handle(err error) {\n\tpanic(err)\n}\n";

    #[test]
    fn test_critical_forbidden_pattern_is_error() {
        let corpus = vec![record(
            "no-panic",
            MemoryCategory::Architecture,
            Importance::Critical,
            "Never use `panic(` in request handlers.",
        )];
        let report = Validator::default().validate(GO_HANDLER, "api/handler.go", "go", &corpus);

        assert!(!report.passed);
        assert_eq!(report.errors, 1);
        let d = &report.diagnostics[0];
        assert_eq!(d.severity, Severity::Error);
        assert_eq!(d.kind, DiagnosticKind::Constraint);
        assert_eq!(d.line, Some(4));
        assert_eq!(d.column, Some(2));
        assert_eq!(d.source.as_ref().unwrap().memory_id, "no-panic");
    }

    #[test]
    fn test_high_forbidden_pattern_is_warning() {
        let corpus = vec![record(
            "no-panic",
            MemoryCategory::Constraint,
            Importance::High,
            "Never use `panic(` in request handlers.",
        )];
        let report = Validator::default().validate(GO_HANDLER, "api/handler.go", "go", &corpus);
        assert!(report.passed);
        assert_eq!(report.warnings, 1);
    }

    #[test]
    fn test_medium_records_below_threshold_are_ignored() {
        let corpus = vec![record(
            "no-panic",
            MemoryCategory::Architecture,
            Importance::Medium,
            "Never use `panic(` in request handlers.",
        )];
        let report = Validator::default().validate(GO_HANDLER, "api/handler.go", "go", &corpus);
        assert!(report.diagnostics.is_empty());

        let lenient = Validator::new(ValidationConfig {
            rule_min_importance: Importance::Low,
            ..Default::default()
        });
        let report = lenient.validate(GO_HANDLER, "api/handler.go", "go", &corpus);
        assert_eq!(report.infos, 1);
    }

    #[test]
    fn test_required_missing_is_softer() {
        let corpus = vec![record(
            "logger",
            MemoryCategory::Architecture,
            Importance::Critical,
            "All handlers must log through `slog.`",
        )];
        let report = Validator::default().validate(GO_HANDLER, "api/handler.go", "go", &corpus);
        assert!(report.passed);
        assert_eq!(report.warnings, 1);
        assert_eq!(report.diagnostics[0].line, None);
    }

    #[test]
    fn test_business_rule_needs_keyword() {
        let corpus = vec![record(
            "refund",
            MemoryCategory::BusinessRule,
            Importance::Critical,
            "Refunds must never call `chargeCard(`",
        )];
        let unrelated = "function chargeCard(card) {}\n";
        let report = Validator::default().validate(unrelated, "billing.js", "javascript", &corpus);
        assert!(report.diagnostics.is_empty());

        let related = "function issueRefunds(order) {\n  chargeCard(order.card);\n}\n";
        let report = Validator::default().validate(related, "refunds.js", "javascript", &corpus);
        assert_eq!(report.errors, 1);
        assert_eq!(report.diagnostics[0].kind, DiagnosticKind::BusinessRule);
        assert_eq!(report.diagnostics[0].line, Some(2));
    }

    #[test]
    fn test_dependency_rules_use_import_edges() {
        let corpus = vec![
            record(
                "lodash",
                MemoryCategory::Architecture,
                Importance::Critical,
                "Do not import lodash",
            ),
            record(
                "layers",
                MemoryCategory::Architecture,
                Importance::High,
                "The controller layer must not depend on the database layer",
            ),
        ];
        let code = "import _ from 'lodash';\nimport { pool } from '../db/pool';\n// lodash mention\n";
        let report = Validator::default().validate(
            code,
            "src/controllers/order.controller.ts",
            "typescript",
            &corpus,
        );
        let kinds: Vec<_> = report.diagnostics.iter().map(|d| d.kind).collect();
        assert_eq!(kinds, vec![DiagnosticKind::Dependency, DiagnosticKind::Layer]);
        assert_eq!(report.errors, 2);
    }

    #[test]
    fn test_lookalike_words_keep_constraint_check() {
        let corpus = vec![record(
            "no-panic",
            MemoryCategory::Architecture,
            Importance::Critical,
            "Never use `panic(` in handlers. This is important.",
        )];
        let report = Validator::default().validate(GO_HANDLER, "api/handler.go", "go", &corpus);
        assert_eq!(report.errors, 1);
        assert_eq!(report.diagnostics[0].kind, DiagnosticKind::Constraint);
    }

    #[test]
    fn test_dependency_rule_without_matching_import_checks_text() {
        let corpus = vec![record(
            "no-require",
            MemoryCategory::Architecture,
            Importance::Critical,
            "Do not import modules with `require(`",
        )];
        let code = "import fs from 'fs';
const cp = require('child_process');
";
        let report = Validator::default().validate(code, "src/run.js", "javascript", &corpus);
        assert_eq!(report.errors, 1);
        assert_eq!(report.diagnostics[0].kind, DiagnosticKind::Constraint);
        assert_eq!(report.diagnostics[0].line, Some(2));
    }

    #[test]
    fn test_when_clause_forbid_is_error() {
        let corpus = vec![record(
            "no-panic",
            MemoryCategory::Architecture,
            Importance::Critical,
            "When handling requests, never use `panic(`.",
        )];
        let report = Validator::default().validate(GO_HANDLER, "api/handler.go", "go", &corpus);
        assert_eq!(report.errors, 1);
        assert_eq!(report.diagnostics[0].line, Some(4));
    }

    #[test]
    fn test_validation_is_deterministic() {
        let corpus = vec![
            record("a", MemoryCategory::Architecture, Importance::Critical, "Never use `eval(`"),
            record("b", MemoryCategory::CodeStyle, Importance::High, "Functions use camelCase"),
        ];
        let code = "function run_it() {\n  eval(x);\n}\nfunction other_one() {}\n";
        let v = Validator::default();
        let first = v.validate(code, "a.js", "javascript", &corpus);
        let second = v.validate(code, "a.js", "javascript", &corpus);
        assert_eq!(first, second);
        assert_eq!(first.diagnostics.len(), 3);
    }

    #[test]
    fn test_stages_can_be_disabled() {
        let corpus = vec![record(
            "a",
            MemoryCategory::Architecture,
            Importance::Critical,
            "Never use `eval(`",
        )];
        let v = Validator::new(ValidationConfig {
            check_constraints: false,
            check_naming: false,
            ..Default::default()
        });
        let report = v.validate("function run_it() { eval(x) }", "a.js", "javascript", &corpus);
        assert!(report.diagnostics.is_empty());
    }

    struct FixedSource;

    impl ConstraintSource for FixedSource {
        fn constraints(&self, _content: &str) -> Vec<Constraint> {
            vec![Constraint::Forbidden {
                patterns: vec!["TODO".to_string()],
            }]
        }
    }

    #[test]
    fn test_custom_constraint_source() {
        let corpus = vec![record(
            "any",
            MemoryCategory::Constraint,
            Importance::Critical,
            "whatever the rule language says",
        )];
        let v = Validator::default().with_source(Arc::new(FixedSource));
        let report = v.validate("// TODO: later\n", "a.rs", "rust", &corpus);
        assert_eq!(report.errors, 1);
    }
}
