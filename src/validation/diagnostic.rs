//! Diagnostic types produced by validation

use crate::memory::{Importance, MemoryRecord};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Characters of record content quoted in a diagnostic source
const EXCERPT_CHARS: usize = 80;

/// Diagnostic severity. Ordered `Info < Warning < Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    /// Severity of a present forbidden pattern (or unmet conditional):
    /// critical → error, high → warning, otherwise info.
    pub fn for_violation(importance: Importance) -> Self {
        match importance {
            Importance::Critical => Self::Error,
            Importance::High => Self::Warning,
            Importance::Medium | Importance::Low => Self::Info,
        }
    }

    /// Severity of a missing required pattern, one step softer.
    pub fn for_missing(importance: Importance) -> Self {
        match importance {
            Importance::Critical => Self::Warning,
            _ => Self::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which validation stage produced a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    Constraint,
    Naming,
    BusinessRule,
    Dependency,
    Layer,
    Pattern,
}

/// Back-reference to the memory record behind a diagnostic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticSource {
    pub memory_id: String,
    pub excerpt: String,
}

impl DiagnosticSource {
    pub fn from_record(record: &MemoryRecord) -> Self {
        Self {
            memory_id: record.id.clone(),
            excerpt: record.excerpt(EXCERPT_CHARS),
        }
    }
}

/// One validation finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub message: String,
    /// 1-based line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// 1-based column
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<DiagnosticSource>,
}

impl Diagnostic {
    pub fn new(severity: Severity, kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            severity,
            kind,
            message: message.into(),
            line: None,
            column: None,
            source: None,
        }
    }

    pub fn at(mut self, line: usize, column: usize) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    pub fn with_source(mut self, record: &MemoryRecord) -> Self {
        self.source = Some(DiagnosticSource::from_record(record));
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.line, self.column) {
            (Some(line), Some(col)) => write!(f, "{}:{}: ", line, col)?,
            (Some(line), None) => write!(f, "{}: ", line)?,
            _ => {}
        }
        write!(f, "{}: {}", self.severity, self.message)?;
        if let Some(source) = &self.source {
            write!(f, " [memory {}]", source.memory_id)?;
        }
        Ok(())
    }
}

/// Aggregate validation result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub diagnostics: Vec<Diagnostic>,
    /// No error-severity diagnostics
    pub passed: bool,
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
    pub summary: String,
}

impl ValidationReport {
    pub fn from_diagnostics(diagnostics: Vec<Diagnostic>) -> Self {
        let count = |s: Severity| diagnostics.iter().filter(|d| d.severity == s).count();
        let errors = count(Severity::Error);
        let warnings = count(Severity::Warning);
        let infos = count(Severity::Info);
        let passed = errors == 0;
        let summary = format!(
            "Validation {}: {} error(s), {} warning(s), {} info",
            if passed { "passed" } else { "failed" },
            errors,
            warnings,
            infos
        );
        Self {
            diagnostics,
            passed,
            errors,
            warnings,
            infos,
            summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_mapping() {
        assert_eq!(Severity::for_violation(Importance::Critical), Severity::Error);
        assert_eq!(Severity::for_violation(Importance::High), Severity::Warning);
        assert_eq!(Severity::for_violation(Importance::Medium), Severity::Info);
        assert_eq!(Severity::for_missing(Importance::Critical), Severity::Warning);
        assert_eq!(Severity::for_missing(Importance::High), Severity::Info);
        assert!(Severity::Error > Severity::Warning);
    }

    #[test]
    fn test_report_summary() {
        let report = ValidationReport::from_diagnostics(vec![
            Diagnostic::new(Severity::Warning, DiagnosticKind::Naming, "a"),
            Diagnostic::new(Severity::Info, DiagnosticKind::Pattern, "b"),
        ]);
        assert!(report.passed);
        assert_eq!(report.summary, "Validation passed: 0 error(s), 1 warning(s), 1 info");

        let failed = ValidationReport::from_diagnostics(vec![Diagnostic::new(
            Severity::Error,
            DiagnosticKind::Constraint,
            "c",
        )]);
        assert!(!failed.passed);
        assert!(failed.summary.starts_with("Validation failed"));
    }

    #[test]
    fn test_display_and_json_shape() {
        let d = Diagnostic::new(Severity::Error, DiagnosticKind::Dependency, "bad import").at(3, 1);
        assert_eq!(d.to_string(), "3:1: error: bad import");

        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["severity"], "error");
        assert_eq!(json["kind"], "dependency");
        assert_eq!(json["line"], 3);
        assert!(json.get("source").is_none());
    }
}
