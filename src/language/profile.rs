//! Per-language lexical profiles
//!
//! One data-driven table replaces per-language branching: each
//! [`LanguageProfile`] holds the declaration, import and comment syntax for a
//! language family plus its default naming conventions. Patterns are applied
//! line by line; capture group 1 is the declared name or import target.

use super::naming::{CaseStyle, IdentifierKind, NamingConventions};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// A declaration found in source text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Declaration {
    pub kind: IdentifierKind,
    pub name: String,
    /// 1-based line
    pub line: usize,
    /// 1-based column (in characters)
    pub column: usize,
}

/// An import/dependency edge out of the current file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportEdge {
    pub target: String,
    /// 1-based line
    pub line: usize,
}

/// Grouped import syntax, e.g. Go's `import ( ... )`
///
/// `entry` only applies to lines between an `open` line and a line starting
/// with `close`.
pub struct ImportBlock {
    pub open: Regex,
    pub entry: Regex,
    pub close: &'static str,
}

/// Lexical profile of one language family
pub struct LanguageProfile {
    /// Canonical name
    pub name: &'static str,
    /// Editor language tags that map to this profile
    pub tags: &'static [&'static str],
    /// File extensions (without dot)
    pub extensions: &'static [&'static str],
    pub line_comments: &'static [&'static str],
    pub block_comment: Option<(&'static str, &'static str)>,
    /// Words that declaration patterns can mistake for names
    pub keywords: &'static [&'static str],
    pub function_patterns: Vec<Regex>,
    pub type_patterns: Vec<Regex>,
    pub variable_patterns: Vec<Regex>,
    pub constant_patterns: Vec<Regex>,
    pub import_patterns: Vec<Regex>,
    pub import_block: Option<ImportBlock>,
    /// Default naming conventions; `None` disables the default naming check
    pub naming: Option<NamingConventions>,
}

impl LanguageProfile {
    fn patterns_for(&self, kind: IdentifierKind) -> &[Regex] {
        match kind {
            IdentifierKind::Function => &self.function_patterns,
            IdentifierKind::Type => &self.type_patterns,
            IdentifierKind::Variable => &self.variable_patterns,
            IdentifierKind::Constant => &self.constant_patterns,
        }
    }

    /// Names declared with the given kind, in source order, de-duplicated.
    pub fn declared_names(&self, text: &str, kind: IdentifierKind) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for decl in self.declarations_of(text, &[kind]) {
            if !names.contains(&decl.name) {
                names.push(decl.name);
            }
        }
        names
    }

    /// All declarations of every kind, ordered by line then kind.
    pub fn declarations(&self, text: &str) -> Vec<Declaration> {
        self.declarations_of(
            text,
            &[
                IdentifierKind::Function,
                IdentifierKind::Type,
                IdentifierKind::Constant,
                IdentifierKind::Variable,
            ],
        )
    }

    fn declarations_of(&self, text: &str, kinds: &[IdentifierKind]) -> Vec<Declaration> {
        let mut out = Vec::new();
        for (index, line) in text.lines().enumerate() {
            if self.is_comment_line(line) {
                continue;
            }
            for &kind in kinds {
                for pattern in self.patterns_for(kind) {
                    let Some(m) = pattern.captures(line).and_then(|c| c.get(1)) else {
                        continue;
                    };
                    let name = m.as_str();
                    if self.keywords.contains(&name) {
                        continue;
                    }
                    let duplicate = out
                        .iter()
                        .any(|d: &Declaration| d.line == index + 1 && d.name == name);
                    if !duplicate {
                        out.push(Declaration {
                            kind,
                            name: name.to_string(),
                            line: index + 1,
                            column: line[..m.start()].chars().count() + 1,
                        });
                    }
                }
            }
        }
        out
    }

    /// Import/dependency edges, in source order.
    pub fn imports(&self, text: &str) -> Vec<ImportEdge> {
        let mut out = Vec::new();
        let mut in_block = false;
        for (index, line) in text.lines().enumerate() {
            if self.is_comment_line(line) {
                continue;
            }
            if let Some(block) = &self.import_block {
                if in_block {
                    if line.trim_start().starts_with(block.close) {
                        in_block = false;
                    } else if let Some(m) = block.entry.captures(line).and_then(|c| c.get(1)) {
                        out.push(ImportEdge {
                            target: m.as_str().to_string(),
                            line: index + 1,
                        });
                    }
                    continue;
                }
                if block.open.is_match(line) {
                    in_block = true;
                    continue;
                }
            }
            for pattern in &self.import_patterns {
                for caps in pattern.captures_iter(line) {
                    if let Some(m) = caps.get(1) {
                        out.push(ImportEdge {
                            target: m.as_str().to_string(),
                            line: index + 1,
                        });
                    }
                }
            }
        }
        out
    }

    pub fn is_comment_line(&self, line: &str) -> bool {
        let trimmed = line.trim_start();
        self.line_comments.iter().any(|c| trimmed.starts_with(c))
            || trimmed.starts_with("/*")
            || trimmed.starts_with('*')
    }
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns.iter().map(|p| compile_one(p)).collect()
}

fn compile_one(pattern: &str) -> Regex {
    Regex::new(pattern).expect("built-in language pattern must compile")
}

const C_LIKE_KEYWORDS: &[&str] = &[
    "if", "for", "while", "switch", "catch", "return", "function", "new", "else", "do", "try",
    "typeof", "await", "super", "this", "constructor",
];

static PROFILES: Lazy<Vec<LanguageProfile>> = Lazy::new(|| {
    vec![
        LanguageProfile {
            name: "typescript",
            tags: &["typescript", "typescriptreact", "ts", "tsx", "javascript", "javascriptreact", "js", "jsx"],
            extensions: &["ts", "tsx", "js", "jsx", "mjs", "cjs"],
            line_comments: &["//"],
            block_comment: Some(("/*", "*/")),
            keywords: C_LIKE_KEYWORDS,
            function_patterns: compile(&[
                r"^\s*(?:export\s+)?(?:default\s+)?(?:async\s+)?function\s*\*?\s*([A-Za-z_$][\w$]*)",
                r"^\s*(?:export\s+)?(?:const|let|var)\s+([A-Za-z_$][\w$]*)\s*(?::[^=]+)?=\s*(?:async\s+)?(?:\([^)]*\)|[A-Za-z_$][\w$]*)\s*(?::[^=]+)?=>",
                r"^\s*(?:(?:public|private|protected|static|readonly|async|override)\s+)*([A-Za-z_$][\w$]*)\s*\([^)]*\)\s*(?::\s*[^{;=]+)?\{",
            ]),
            type_patterns: compile(&[
                r"^\s*(?:export\s+)?(?:default\s+)?(?:declare\s+)?(?:abstract\s+)?(?:class|interface|type|enum)\s+([A-Za-z_$][\w$]*)",
            ]),
            variable_patterns: compile(&[
                r"^\s*(?:export\s+)?(?:let|var|const)\s+([A-Za-z_$][\w$]*)\s*(?::[^=]+)?=",
            ]),
            constant_patterns: Vec::new(),
            import_patterns: compile(&[
                r#"^\s*import\s+(?:type\s+)?(?:[\w*{}\s,$]+\s+from\s+)?['"]([^'"]+)['"]"#,
                r#"^\s*export\s+(?:\*|\{[^}]*\})\s+from\s+['"]([^'"]+)['"]"#,
                r#"\brequire\(\s*['"]([^'"]+)['"]\s*\)"#,
                r#"\bimport\(\s*['"]([^'"]+)['"]\s*\)"#,
            ]),
            import_block: None,
            naming: Some(NamingConventions {
                function: vec![CaseStyle::LowerCamel, CaseStyle::UpperCamel],
                type_name: vec![CaseStyle::UpperCamel],
                variable: vec![CaseStyle::LowerCamel, CaseStyle::UpperCamel, CaseStyle::UpperSnake],
                constant: vec![CaseStyle::UpperSnake, CaseStyle::LowerCamel],
            }),
        },
        LanguageProfile {
            name: "python",
            tags: &["python", "py"],
            extensions: &["py", "pyi"],
            line_comments: &["#"],
            block_comment: None,
            keywords: &["self", "cls"],
            function_patterns: compile(&[r"^\s*(?:async\s+)?def\s+([A-Za-z_]\w*)"]),
            type_patterns: compile(&[r"^\s*class\s+([A-Za-z_]\w*)"]),
            variable_patterns: compile(&[r"^\s*([A-Za-z_]\w*)\s*(?::\s*[^=]+)?=[^=]"]),
            constant_patterns: Vec::new(),
            import_patterns: compile(&[
                r"^\s*import\s+([\w.]+)",
                r"^\s*from\s+([\w.]+)\s+import\b",
            ]),
            import_block: None,
            naming: Some(NamingConventions {
                function: vec![CaseStyle::SnakeCase],
                type_name: vec![CaseStyle::UpperCamel],
                variable: vec![CaseStyle::SnakeCase, CaseStyle::UpperSnake],
                constant: vec![CaseStyle::UpperSnake],
            }),
        },
        LanguageProfile {
            name: "rust",
            tags: &["rust", "rs"],
            extensions: &["rs"],
            line_comments: &["//"],
            block_comment: Some(("/*", "*/")),
            keywords: &["self", "Self", "mut"],
            function_patterns: compile(&[
                r#"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:const\s+)?(?:async\s+)?(?:unsafe\s+)?(?:extern\s+"[^"]*"\s+)?fn\s+([A-Za-z_]\w*)"#,
            ]),
            type_patterns: compile(&[
                r"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:struct|enum|trait|type|union)\s+([A-Za-z_]\w*)",
            ]),
            variable_patterns: compile(&[r"^\s*let\s+(?:mut\s+)?([A-Za-z_]\w*)"]),
            constant_patterns: compile(&[
                r"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:const|static)\s+(?:mut\s+)?([A-Za-z_]\w*)\s*:",
            ]),
            import_patterns: compile(&[
                r"^\s*(?:pub(?:\([^)]*\))?\s+)?use\s+([\w:]+)",
                r"^\s*extern\s+crate\s+(\w+)",
                r"^\s*(?:pub(?:\([^)]*\))?\s+)?mod\s+(\w+)\s*;",
            ]),
            import_block: None,
            naming: Some(NamingConventions {
                function: vec![CaseStyle::SnakeCase],
                type_name: vec![CaseStyle::UpperCamel],
                variable: vec![CaseStyle::SnakeCase],
                constant: vec![CaseStyle::UpperSnake],
            }),
        },
        LanguageProfile {
            name: "go",
            tags: &["go", "golang"],
            extensions: &["go"],
            line_comments: &["//"],
            block_comment: Some(("/*", "*/")),
            keywords: &["err", "ok"],
            function_patterns: compile(&[r"^\s*func\s+(?:\([^)]*\)\s*)?([A-Za-z_]\w*)"]),
            type_patterns: compile(&[r"^\s*type\s+([A-Za-z_]\w*)"]),
            variable_patterns: compile(&[
                r"^\s*([A-Za-z_]\w*)\s*:=",
                r"^\s*var\s+([A-Za-z_]\w*)",
            ]),
            constant_patterns: compile(&[r"^\s*const\s+([A-Za-z_]\w*)"]),
            import_patterns: compile(&[r#"^\s*import\s+(?:[\w.]+\s+)?"([^"]+)""#]),
            import_block: Some(ImportBlock {
                open: compile_one(r"^\s*import\s*\(\s*$"),
                entry: compile_one(r#"^\s*(?:[\w.]+\s+)?"([^"]+)""#),
                close: ")",
            }),
            naming: Some(NamingConventions {
                function: vec![CaseStyle::LowerCamel, CaseStyle::UpperCamel],
                type_name: vec![CaseStyle::LowerCamel, CaseStyle::UpperCamel],
                variable: vec![CaseStyle::LowerCamel, CaseStyle::UpperCamel],
                constant: vec![CaseStyle::LowerCamel, CaseStyle::UpperCamel, CaseStyle::UpperSnake],
            }),
        },
        LanguageProfile {
            name: "java",
            tags: &["java", "kotlin", "kt"],
            extensions: &["java", "kt", "kts"],
            line_comments: &["//"],
            block_comment: Some(("/*", "*/")),
            keywords: C_LIKE_KEYWORDS,
            function_patterns: compile(&[
                r"^\s*(?:(?:public|private|protected|static|final|abstract|synchronized|native|default)\s+)+(?:<[^>]+>\s+)?[\w<>\[\],.? ]+\s+([A-Za-z_$][\w$]*)\s*\(",
                r"^\s*(?:(?:public|private|protected|internal|override|suspend|inline)\s+)*fun\s+(?:<[^>]+>\s+)?([A-Za-z_]\w*)",
            ]),
            type_patterns: compile(&[
                r"^\s*(?:(?:public|private|protected|internal|static|final|abstract|sealed|data|open)\s+)*(?:class|interface|enum|record|object|@interface)\s+([A-Za-z_$][\w$]*)",
            ]),
            variable_patterns: compile(&[
                r"^\s*(?:final\s+)?(?:var|int|long|double|float|boolean|char|byte|short|String|[A-Z][\w]*(?:<[^>]*>)?(?:\[\])?)\s+([A-Za-z_$][\w$]*)\s*=",
                r"^\s*(?:val|var)\s+([A-Za-z_]\w*)",
            ]),
            constant_patterns: compile(&[
                r"^\s*(?:(?:public|private|protected)\s+)?static\s+final\s+[\w<>\[\],?]+\s+([A-Za-z_$][\w$]*)",
                r"^\s*(?:(?:private|internal)\s+)?const\s+val\s+([A-Za-z_]\w*)",
            ]),
            import_patterns: compile(&[r"^\s*import\s+(?:static\s+)?([\w.*]+)"]),
            import_block: None,
            naming: Some(NamingConventions {
                function: vec![CaseStyle::LowerCamel],
                type_name: vec![CaseStyle::UpperCamel],
                variable: vec![CaseStyle::LowerCamel],
                constant: vec![CaseStyle::UpperSnake],
            }),
        },
        LanguageProfile {
            name: "csharp",
            tags: &["csharp", "cs", "c#"],
            extensions: &["cs"],
            line_comments: &["//"],
            block_comment: Some(("/*", "*/")),
            keywords: C_LIKE_KEYWORDS,
            function_patterns: compile(&[
                r"^\s*(?:(?:public|private|protected|internal|static|virtual|override|abstract|async|sealed)\s+)+[\w<>\[\],?. ]+\s+([A-Za-z_]\w*)\s*\(",
            ]),
            type_patterns: compile(&[
                r"^\s*(?:(?:public|private|protected|internal|static|abstract|sealed|partial)\s+)*(?:class|interface|enum|struct|record)\s+([A-Za-z_]\w*)",
            ]),
            variable_patterns: compile(&[
                r"^\s*(?:var|int|long|string|bool|double|float|decimal)\s+([A-Za-z_]\w*)\s*=",
            ]),
            constant_patterns: compile(&[
                r"^\s*(?:(?:public|private|protected|internal)\s+)?const\s+\w+\s+([A-Za-z_]\w*)",
            ]),
            import_patterns: compile(&[r"^\s*using\s+(?:static\s+)?([\w.]+)\s*;"]),
            import_block: None,
            naming: Some(NamingConventions {
                function: vec![CaseStyle::UpperCamel],
                type_name: vec![CaseStyle::UpperCamel],
                variable: vec![CaseStyle::LowerCamel],
                constant: vec![CaseStyle::UpperCamel, CaseStyle::UpperSnake],
            }),
        },
    ]
});

static GENERIC: Lazy<LanguageProfile> = Lazy::new(|| LanguageProfile {
    name: "generic",
    tags: &[],
    extensions: &[],
    line_comments: &["//", "#"],
    block_comment: Some(("/*", "*/")),
    keywords: C_LIKE_KEYWORDS,
    function_patterns: compile(&[
        r"\bfunction\s+([A-Za-z_$][\w$]*)",
        r"\bdef\s+([A-Za-z_]\w*)",
        r"\bfn\s+([A-Za-z_]\w*)",
        r"\bfunc\s+([A-Za-z_]\w*)",
    ]),
    type_patterns: compile(&[r"\b(?:class|interface|struct|enum|trait)\s+([A-Za-z_]\w*)"]),
    variable_patterns: Vec::new(),
    constant_patterns: Vec::new(),
    import_patterns: compile(&[
        r#"^\s*import\s+['"]?([\w./@-]+)"#,
        r#"\brequire\(\s*['"]([^'"]+)['"]"#,
        r"^\s*from\s+([\w.]+)\s+import\b",
        r"^\s*use\s+([\w:]+)",
        r#"^\s*#include\s+[<"]([^>"]+)[>"]"#,
    ]),
    import_block: None,
    naming: None,
});

/// Look up a profile by editor language tag. Unknown tags get the generic profile.
pub fn profile_for(language: &str) -> &'static LanguageProfile {
    let tag = language.trim().to_ascii_lowercase();
    PROFILES
        .iter()
        .find(|p| p.name == tag || p.tags.contains(&tag.as_str()))
        .unwrap_or(&*GENERIC)
}

/// Infer a language tag from a file path's extension.
pub fn language_from_path(path: &str) -> Option<&'static str> {
    let ext = std::path::Path::new(path)
        .extension()?
        .to_str()?
        .to_ascii_lowercase();
    PROFILES
        .iter()
        .find(|p| p.extensions.contains(&ext.as_str()))
        .map(|p| p.name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_lookup() {
        assert_eq!(profile_for("typescriptreact").name, "typescript");
        assert_eq!(profile_for("JavaScript").name, "typescript");
        assert_eq!(profile_for("rust").name, "rust");
        assert_eq!(profile_for("cobol").name, "generic");
    }

    #[test]
    fn test_language_from_path() {
        assert_eq!(language_from_path("src/app/user.service.ts"), Some("typescript"));
        assert_eq!(language_from_path("main.GO"), Some("go"));
        assert_eq!(language_from_path("README"), None);
    }

    #[test]
    fn test_typescript_declarations() {
        let code = "\
export async function loadUser(id: string) {
  const user_name = await fetchName(id);
}
export class UserService {}
interface Props {}
const formatDate = (d: Date) => d.toISOString();
if (ready) {
";
        let profile = profile_for("typescript");
        let functions = profile.declared_names(code, IdentifierKind::Function);
        assert_eq!(functions, vec!["loadUser", "formatDate"]);

        let types = profile.declared_names(code, IdentifierKind::Type);
        assert_eq!(types, vec!["UserService", "Props"]);

        let decls = profile.declarations(code);
        let var = decls.iter().find(|d| d.name == "user_name").unwrap();
        assert_eq!(var.kind, IdentifierKind::Variable);
        assert_eq!(var.line, 2);
        assert_eq!(var.column, 9);
    }

    #[test]
    fn test_arrow_function_reported_once_per_line() {
        let code = "const format_date = (d) => d;\n";
        let decls = profile_for("javascript").declarations(code);
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].kind, IdentifierKind::Function);
    }

    #[test]
    fn test_typescript_imports() {
        let code = "\
import { Injectable } from '@angular/core';
import axios from \"axios\";
import './styles.css';
const fs = require('fs');
// import nope from 'commented';
";
        let targets: Vec<_> = profile_for("typescript")
            .imports(code)
            .into_iter()
            .map(|e| e.target)
            .collect();
        assert_eq!(targets, vec!["@angular/core", "axios", "./styles.css", "fs"]);
    }

    #[test]
    fn test_python_declarations_and_imports() {
        let code = "\
import os
from app.repository import UserRepo
class UserService:
    def getUser(self, user_id):
        MAX_TRIES = 3
";
        let profile = profile_for("python");
        assert_eq!(profile.declared_names(code, IdentifierKind::Function), vec!["getUser"]);
        assert_eq!(profile.declared_names(code, IdentifierKind::Type), vec!["UserService"]);
        let targets: Vec<_> = profile.imports(code).into_iter().map(|e| e.target).collect();
        assert_eq!(targets, vec!["os", "app.repository"]);
    }

    #[test]
    fn test_go_imports_only_inside_import_block() {
        let code = "\
package api

import \"errors\"

import (
\t\"fmt\"
\tlog \"github.com/sirupsen/logrus\"
\t_ \"net/http/pprof\"
)

func mode() string {
\treturn \"unsafe\"
}
";
        let edges = profile_for("go").imports(code);
        let found: Vec<_> = edges.iter().map(|e| (e.target.as_str(), e.line)).collect();
        assert_eq!(
            found,
            vec![
                ("errors", 3),
                ("fmt", 6),
                ("github.com/sirupsen/logrus", 7),
                ("net/http/pprof", 8),
            ]
        );
    }

    #[test]
    fn test_go_string_literal_is_not_an_import() {
        let code = "func mode() string {\n\treturn \"unsafe\"\n}\n";
        assert!(profile_for("go").imports(code).is_empty());
    }

    #[test]
    fn test_rust_declarations() {
        let code = "\
use crate::db::Pool;
pub struct OrderService;
pub async fn place_order() {}
const MAX_ITEMS: usize = 10;
";
        let profile = profile_for("rust");
        let decls = profile.declarations(code);
        assert!(decls.iter().any(|d| d.name == "OrderService" && d.kind == IdentifierKind::Type));
        assert!(decls.iter().any(|d| d.name == "place_order" && d.kind == IdentifierKind::Function));
        assert!(decls.iter().any(|d| d.name == "MAX_ITEMS" && d.kind == IdentifierKind::Constant));
        assert_eq!(profile.imports(code)[0].target, "crate::db::Pool");
    }

    #[test]
    fn test_keywords_are_not_declarations() {
        let code = "  if (x) {\n  for (const a of b) {\n  render() {\n";
        let names = profile_for("typescript").declared_names(code, IdentifierKind::Function);
        assert_eq!(names, vec!["render"]);
    }

    #[test]
    fn test_generic_profile_has_no_naming_defaults() {
        assert!(profile_for("unknown").naming.is_none());
        let names = profile_for("unknown").declared_names("function doThing() {}", IdentifierKind::Function);
        assert_eq!(names, vec!["doThing"]);
    }
}
