//! Identifier case styles

use serde::{Deserialize, Serialize};
use std::fmt;

/// The four identifier shapes the naming check knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStyle {
    /// `lowerCamel`
    LowerCamel,
    /// `UpperCamel`
    UpperCamel,
    /// `snake_case`
    SnakeCase,
    /// `UPPER_SNAKE_CASE`
    UpperSnake,
}

impl CaseStyle {
    /// Whether `ident` has this shape. Leading `_`/`$` are ignored.
    pub fn matches(&self, ident: &str) -> bool {
        let core = ident.trim_start_matches(['_', '$']);
        let mut chars = core.chars();
        let Some(first) = chars.next() else {
            return true;
        };
        let rest = chars.as_str();

        match self {
            Self::LowerCamel => {
                first.is_ascii_lowercase() && rest.chars().all(|c| c.is_ascii_alphanumeric())
            }
            Self::UpperCamel => {
                first.is_ascii_uppercase()
                    && rest.chars().all(|c| c.is_ascii_alphanumeric())
                    && !is_all_caps(core)
            }
            Self::SnakeCase => {
                first.is_ascii_lowercase()
                    && rest
                        .chars()
                        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
                    && !core.contains("__")
                    && !core.ends_with('_')
            }
            Self::UpperSnake => {
                first.is_ascii_uppercase()
                    && rest
                        .chars()
                        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
                    && !core.contains("__")
                    && !core.ends_with('_')
            }
        }
    }

    /// Best description of an identifier's shape, for messages.
    pub fn detect(ident: &str) -> Option<CaseStyle> {
        let core = ident.trim_start_matches(['_', '$']);
        if core.contains('_') {
            [Self::SnakeCase, Self::UpperSnake]
                .into_iter()
                .find(|s| s.matches(core))
        } else {
            [Self::LowerCamel, Self::UpperCamel, Self::UpperSnake]
                .into_iter()
                .find(|s| s.matches(core))
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::LowerCamel => "camelCase",
            Self::UpperCamel => "PascalCase",
            Self::SnakeCase => "snake_case",
            Self::UpperSnake => "UPPER_SNAKE_CASE",
        }
    }
}

impl fmt::Display for CaseStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Two or more characters and no lowercase letters (`URL`, `ID2`).
fn is_all_caps(s: &str) -> bool {
    s.chars().count() > 1 && !s.chars().any(|c| c.is_ascii_lowercase())
}

/// Kind of declared identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierKind {
    Function,
    Type,
    Variable,
    Constant,
}

impl IdentifierKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Type => "type",
            Self::Variable => "variable",
            Self::Constant => "constant",
        }
    }
}

/// Accepted case styles for each identifier kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingConventions {
    pub function: Vec<CaseStyle>,
    pub type_name: Vec<CaseStyle>,
    pub variable: Vec<CaseStyle>,
    pub constant: Vec<CaseStyle>,
}

impl NamingConventions {
    pub fn for_kind(&self, kind: IdentifierKind) -> &[CaseStyle] {
        match kind {
            IdentifierKind::Function => &self.function,
            IdentifierKind::Type => &self.type_name,
            IdentifierKind::Variable => &self.variable,
            IdentifierKind::Constant => &self.constant,
        }
    }

    pub fn accepts(&self, kind: IdentifierKind, ident: &str) -> bool {
        let styles = self.for_kind(kind);
        styles.is_empty() || styles.iter().any(|s| s.matches(ident))
    }
}

/// Short type names that are never flagged (`T`, `ID`, `URL`, ...).
pub const NAME_EXCEPTIONS: &[&str] = &[
    "T", "K", "V", "E", "U", "R", "ID", "Id", "URL", "URI", "API", "UI", "IO", "DB", "OK", "HTTP",
    "JSON", "XML", "SQL", "UUID", "DTO", "VO",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lower_camel() {
        assert!(CaseStyle::LowerCamel.matches("getUser"));
        assert!(CaseStyle::LowerCamel.matches("user"));
        assert!(CaseStyle::LowerCamel.matches("_private"));
        assert!(!CaseStyle::LowerCamel.matches("get_user"));
        assert!(!CaseStyle::LowerCamel.matches("GetUser"));
    }

    #[test]
    fn test_upper_camel() {
        assert!(CaseStyle::UpperCamel.matches("UserService"));
        assert!(CaseStyle::UpperCamel.matches("A"));
        assert!(!CaseStyle::UpperCamel.matches("USER_ID"));
        assert!(!CaseStyle::UpperCamel.matches("MAXSIZE"));
        assert!(!CaseStyle::UpperCamel.matches("userService"));
    }

    #[test]
    fn test_snake_and_upper_snake() {
        assert!(CaseStyle::SnakeCase.matches("get_user"));
        assert!(CaseStyle::SnakeCase.matches("user2"));
        assert!(!CaseStyle::SnakeCase.matches("getUser"));
        assert!(!CaseStyle::SnakeCase.matches("bad__name"));
        assert!(CaseStyle::UpperSnake.matches("MAX_RETRIES"));
        assert!(!CaseStyle::UpperSnake.matches("Max_Retries"));
    }

    #[test]
    fn test_detect() {
        assert_eq!(CaseStyle::detect("get_user"), Some(CaseStyle::SnakeCase));
        assert_eq!(CaseStyle::detect("getUser"), Some(CaseStyle::LowerCamel));
        assert_eq!(CaseStyle::detect("GetUser"), Some(CaseStyle::UpperCamel));
        assert_eq!(CaseStyle::detect("MAX_SIZE"), Some(CaseStyle::UpperSnake));
        assert_eq!(CaseStyle::detect("Mixed_Case"), None);
    }

    #[test]
    fn test_conventions_accept() {
        let conventions = NamingConventions {
            function: vec![CaseStyle::LowerCamel],
            type_name: vec![CaseStyle::UpperCamel],
            variable: vec![CaseStyle::LowerCamel, CaseStyle::UpperSnake],
            constant: vec![],
        };
        assert!(conventions.accepts(IdentifierKind::Function, "loadUser"));
        assert!(!conventions.accepts(IdentifierKind::Function, "load_user"));
        assert!(conventions.accepts(IdentifierKind::Variable, "MAX_USERS"));
        assert!(conventions.accepts(IdentifierKind::Constant, "anything_goes"));
    }
}
