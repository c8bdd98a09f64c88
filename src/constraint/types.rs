//! Structured constraints derived from memory text
//!
//! [`Constraint`] is the seam between rule extraction and rule checking: the
//! validator only ever sees these three shapes, so the extractor behind them
//! can be replaced without touching validation.

use serde::{Deserialize, Serialize};

/// A machine-checkable rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Constraint {
    /// None of the patterns may appear
    Forbidden { patterns: Vec<String> },
    /// At least one of the patterns must appear
    Required { patterns: Vec<String> },
    /// If `condition` appears, at least one of `requirement` must appear too
    Conditional {
        condition: String,
        requirement: Vec<String>,
    },
}

/// How a constraint was violated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// A forbidden pattern is present at `offset`
    ForbiddenPresent { pattern: String, offset: usize },
    /// None of the required patterns is present
    RequiredMissing { patterns: Vec<String> },
    /// The condition is present at `offset` but no requirement is
    ConditionUnmet {
        condition: String,
        requirement: Vec<String>,
        offset: usize,
    },
}

impl Constraint {
    /// Check `code` by literal substring matching.
    pub fn check(&self, code: &str) -> Option<Violation> {
        match self {
            Self::Forbidden { patterns } => patterns.iter().find_map(|p| {
                code.find(p.as_str()).map(|offset| Violation::ForbiddenPresent {
                    pattern: p.clone(),
                    offset,
                })
            }),
            Self::Required { patterns } => {
                if patterns.is_empty() || patterns.iter().any(|p| code.contains(p.as_str())) {
                    None
                } else {
                    Some(Violation::RequiredMissing {
                        patterns: patterns.clone(),
                    })
                }
            }
            Self::Conditional {
                condition,
                requirement,
            } => {
                let offset = code.find(condition.as_str())?;
                if requirement.iter().any(|r| code.contains(r.as_str())) {
                    None
                } else {
                    Some(Violation::ConditionUnmet {
                        condition: condition.clone(),
                        requirement: requirement.clone(),
                        offset,
                    })
                }
            }
        }
    }
}

impl Violation {
    /// Byte offset into the checked text, when the violation has a location.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::ForbiddenPresent { offset, .. } | Self::ConditionUnmet { offset, .. } => {
                Some(*offset)
            }
            Self::RequiredMissing { .. } => None,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::ForbiddenPresent { pattern, .. } => {
                format!("forbidden pattern '{}' found", pattern)
            }
            Self::RequiredMissing { patterns } => {
                format!("required pattern missing (expected one of: {})", patterns.join(", "))
            }
            Self::ConditionUnmet {
                condition,
                requirement,
                ..
            } => format!(
                "'{}' is used without {}",
                condition,
                requirement
                    .iter()
                    .map(|r| format!("'{}'", r))
                    .collect::<Vec<_>>()
                    .join(" or ")
            ),
        }
    }
}

/// 1-based (line, column) of a byte offset. Columns count characters.
pub fn line_col(text: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(text.len());
    let before = &text[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let column = text[line_start..offset].chars().count() + 1;
    (line, column)
}
