//! Shallow feature extraction from source files
//!
//! Turns raw text, a path and a language tag into a [`FeatureSet`]: declared
//! function and type names, import targets and matched domain keywords. No
//! parsing happens here; the language profile's line patterns do the work.
//! Every list is capped so later scoring stays cheap.

use crate::language::{profile_for, IdentifierKind};
use serde::Serialize;
use std::path::Path;

/// Fixed vocabulary of domain keywords looked for in text and paths
pub const DOMAIN_KEYWORDS: &[&str] = &[
    "api", "handler", "controller", "service", "repository", "model", "view", "component",
    "router", "route", "middleware", "cache", "auth", "login", "session", "token", "user",
    "account", "payment", "order", "cart", "product", "invoice", "database", "query", "migration",
    "schema", "config", "logger", "event", "queue", "worker", "job", "test", "util", "helper",
    "validator", "dto", "entity", "store", "state", "hook", "request", "response", "client",
    "server", "socket", "upload", "email", "notification", "permission", "admin",
];

/// Default cap on each feature list
pub const DEFAULT_MAX_ENTRIES: usize = 20;

/// Shallow lexical summary of one source file
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureSet {
    pub file_path: String,
    pub file_name: String,
    pub directory: String,
    pub language: String,
    pub functions: Vec<String>,
    pub types: Vec<String>,
    pub imports: Vec<String>,
    pub keywords: Vec<String>,
    #[serde(skip)]
    pub text: String,
}

impl FeatureSet {
    /// Functions, types and keywords longer than three characters, lowercased.
    pub fn feature_words(&self) -> Vec<String> {
        let mut words: Vec<String> = Vec::new();
        for word in self
            .functions
            .iter()
            .chain(&self.types)
            .chain(&self.keywords)
            .filter(|w| w.chars().count() > 3)
        {
            let lower = word.to_lowercase();
            if !words.contains(&lower) {
                words.push(lower);
            }
        }
        words
    }
}

/// Builds [`FeatureSet`]s
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    max_entries: usize,
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

impl FeatureExtractor {
    pub fn new(max_entries: usize) -> Self {
        Self {
            max_entries: max_entries.max(1),
        }
    }

    /// Extract features from in-memory text.
    pub fn extract(&self, text: &str, path: &str, language: &str) -> FeatureSet {
        let mut features = self.path_features(path, language);
        let profile = profile_for(language);

        features.functions = cap(
            profile.declared_names(text, IdentifierKind::Function),
            self.max_entries,
        );
        features.types = cap(
            profile.declared_names(text, IdentifierKind::Type),
            self.max_entries,
        );

        let mut imports: Vec<String> = Vec::new();
        for edge in profile.imports(text) {
            if !imports.contains(&edge.target) {
                imports.push(edge.target);
            }
        }
        features.imports = cap(imports, self.max_entries);

        let lower_text = text.to_lowercase();
        let mut keywords = features.keywords;
        for &kw in DOMAIN_KEYWORDS {
            if lower_text.contains(kw) && !keywords.iter().any(|k| k == kw) {
                keywords.push(kw.to_string());
            }
        }
        features.keywords = cap(keywords, self.max_entries);
        features.text = text.to_string();

        tracing::trace!(
            path,
            functions = features.functions.len(),
            types = features.types.len(),
            imports = features.imports.len(),
            keywords = features.keywords.len(),
            "Features extracted"
        );

        features
    }

    /// Read a file and extract its features.
    ///
    /// Unreadable or binary files degrade to path-derived keywords; this never
    /// fails the caller.
    pub fn extract_file(&self, path: &Path, language: &str) -> FeatureSet {
        let shown = path.to_string_lossy().to_string();
        match std::fs::read(path) {
            Ok(bytes) if !bytes.contains(&0) => match String::from_utf8(bytes) {
                Ok(text) => self.extract(&text, &shown, language),
                Err(_) => {
                    tracing::debug!(path = %shown, "File is not UTF-8, using path features");
                    self.path_features(&shown, language)
                }
            },
            Ok(_) => {
                tracing::debug!(path = %shown, "Binary file, using path features");
                self.path_features(&shown, language)
            }
            Err(e) => {
                tracing::debug!(path = %shown, error = %e, "File unreadable, using path features");
                self.path_features(&shown, language)
            }
        }
    }

    /// Features derived from the path alone.
    pub fn path_features(&self, path: &str, language: &str) -> FeatureSet {
        let normalized = path.replace('\\', "/");
        let (directory, file_name) = match normalized.rsplit_once('/') {
            Some((dir, name)) => (dir.to_string(), name.to_string()),
            None => (String::new(), normalized.clone()),
        };

        let segments = split_path_words(&normalized);
        let mut keywords: Vec<String> = Vec::new();
        for &kw in DOMAIN_KEYWORDS {
            let hit = segments
                .iter()
                .any(|s| s == kw || s.strip_suffix('s') == Some(kw));
            if hit {
                keywords.push(kw.to_string());
            }
        }

        FeatureSet {
            file_path: normalized,
            file_name,
            directory,
            language: language.to_string(),
            keywords: cap(keywords, self.max_entries),
            ..Default::default()
        }
    }
}

/// Split a path into lowercase words on separators and camelCase humps.
fn split_path_words(path: &str) -> Vec<String> {
    let mut words = Vec::new();
    for part in path.split(|c: char| !c.is_alphanumeric()) {
        let mut current = String::new();
        let mut prev_lower = false;
        for c in part.chars() {
            if c.is_uppercase() && prev_lower && !current.is_empty() {
                words.push(std::mem::take(&mut current).to_lowercase());
            }
            prev_lower = c.is_lowercase() || c.is_ascii_digit();
            current.push(c);
        }
        if !current.is_empty() {
            words.push(current.to_lowercase());
        }
    }
    words
}

fn cap(mut items: Vec<String>, max: usize) -> Vec<String> {
    items.truncate(max);
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "\
import { Injectable } from '@nestjs/common';
import { UserRepository } from './user.repository';

@Injectable()
export class UserService {
  async findUser(id: string) {
    return this.cache.get(id);
  }
}
";

    #[test]
    fn test_extract_typescript_features() {
        let extractor = FeatureExtractor::default();
        let features = extractor.extract(SAMPLE, "src/users/user.service.ts", "typescript");

        assert_eq!(features.file_name, "user.service.ts");
        assert_eq!(features.directory, "src/users");
        assert_eq!(features.types, vec!["UserService"]);
        assert_eq!(features.functions, vec!["findUser"]);
        assert_eq!(features.imports, vec!["@nestjs/common", "./user.repository"]);
        assert!(features.keywords.contains(&"service".to_string()));
        assert!(features.keywords.contains(&"cache".to_string()));
        assert!(features.keywords.contains(&"user".to_string()));
    }

    #[test]
    fn test_lists_are_capped() {
        let code: String = (0..50).map(|i| format!("function fn{}() {{}}\n", i)).collect();
        let features = FeatureExtractor::new(20).extract(&code, "a.js", "javascript");
        assert_eq!(features.functions.len(), 20);
        assert_eq!(features.functions[0], "fn0");
    }

    #[test]
    fn test_path_features() {
        let features = FeatureExtractor::default()
            .path_features("src\\controllers\\PaymentController.ts", "typescript");
        assert_eq!(features.file_path, "src/controllers/PaymentController.ts");
        assert_eq!(features.file_name, "PaymentController.ts");
        assert!(features.keywords.contains(&"controller".to_string()));
        assert!(features.keywords.contains(&"payment".to_string()));
        assert!(features.functions.is_empty());
    }

    #[test]
    fn test_unreadable_file_falls_back_to_path() {
        let features = FeatureExtractor::default().extract_file(
            Path::new("/definitely/missing/auth/session_handler.py"),
            "python",
        );
        assert!(features.text.is_empty());
        assert!(features.keywords.contains(&"auth".to_string()));
        assert!(features.keywords.contains(&"handler".to_string()));
    }

    #[test]
    fn test_binary_file_falls_back_to_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.bin");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(&[0x00, 0x9f, 0x92, 0x96]).unwrap();

        let features = FeatureExtractor::default().extract_file(&path, "generic");
        assert!(features.functions.is_empty());
        assert!(features.keywords.contains(&"cache".to_string()));
    }

    #[test]
    fn test_feature_words() {
        let features = FeatureSet {
            functions: vec!["findUser".to_string(), "get".to_string()],
            types: vec!["UserService".to_string()],
            keywords: vec!["user".to_string(), "api".to_string(), "cache".to_string()],
            ..Default::default()
        };
        assert_eq!(
            features.feature_words(),
            vec!["finduser", "userservice", "user", "cache"]
        );
    }
}
