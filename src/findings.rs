//! Finding and session types shared across the scan pipeline.

use crate::rules::LanguagePolicy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Severity of a finding. A closed two-value set with a fixed total order:
/// `Critical` sorts before `Warning`, so derived `Ord` gives the report
/// ordering directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Critical,
    Warning,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::Warning => "WARNING",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single reported issue for one file, produced by the analysis
/// capability and owned by the dispatcher until handed to the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub file_path: String,
    pub issue: String,
    pub severity: Severity,
    pub explanation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_hint: Option<u32>,
}

/// Ephemeral per-invocation aggregate. Created once per scan, mutated by
/// the dispatcher, consumed by the report, then discarded. No globals.
#[derive(Debug)]
pub struct ScanSession {
    /// Absolute path to the repository root being scanned.
    pub repo_root: PathBuf,
    /// Identifier the cache is keyed by (URL or local path).
    pub repo_id: String,
    /// Extension-keyed policy map from the rule registry.
    pub rules: HashMap<String, Arc<LanguagePolicy>>,
    /// Changed files awaiting dispatch, repo-relative.
    pub changed: Vec<String>,
    /// Accumulated findings from the capability.
    pub findings: Vec<Finding>,
    /// Cache hits: unchanged since the last run, not re-analyzed.
    pub skipped_unchanged: Vec<String>,
    /// Files never analyzed: out of scope, no applicable rule, or failed.
    pub unanalyzed: Vec<String>,
}

impl ScanSession {
    pub fn new(
        repo_root: PathBuf,
        repo_id: String,
        rules: HashMap<String, Arc<LanguagePolicy>>,
        changed: Vec<String>,
        skipped_unchanged: Vec<String>,
        unanalyzed: Vec<String>,
    ) -> Self {
        Self {
            repo_root,
            repo_id,
            rules,
            changed,
            findings: Vec::new(),
            skipped_unchanged,
            unanalyzed,
        }
    }

    /// Resolve the policy for a repo-relative path by its lower-cased
    /// extension (including the leading dot).
    pub fn policy_for(&self, file_path: &str) -> Option<&Arc<LanguagePolicy>> {
        let ext = file_extension(file_path)?;
        self.rules.get(&ext)
    }
}

/// Lower-cased dotted extension of a path (`"src/a.PY"` -> `".py"`).
/// Dotfiles like `.env` have no extension.
pub fn file_extension(path: &str) -> Option<String> {
    let name = path.rsplit('/').next()?;
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }
    Some(format!(".{}", ext.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering_critical_first() {
        assert!(Severity::Critical < Severity::Warning);
        let mut v = vec![Severity::Warning, Severity::Critical, Severity::Warning];
        v.sort();
        assert_eq!(
            v,
            vec![Severity::Critical, Severity::Warning, Severity::Warning]
        );
    }

    #[test]
    fn test_severity_serde_uppercase() {
        assert_eq!(
            serde_json::to_string(&Severity::Critical).unwrap(),
            "\"CRITICAL\""
        );
        let s: Severity = serde_json::from_str("\"WARNING\"").unwrap();
        assert_eq!(s, Severity::Warning);
    }

    #[test]
    fn test_file_extension_lowercased() {
        assert_eq!(file_extension("src/FILE.JS"), Some(".js".to_string()));
        assert_eq!(file_extension("a/b/c.py"), Some(".py".to_string()));
    }

    #[test]
    fn test_file_extension_dotfile_and_bare() {
        assert_eq!(file_extension(".env"), None);
        assert_eq!(file_extension("Makefile"), None);
        assert_eq!(file_extension("dir/.gitignore"), None);
    }

    #[test]
    fn test_finding_deserializes_without_optionals() {
        let raw = r#"{"file_path":"a.py","issue":"eval","severity":"CRITICAL","explanation":"x"}"#;
        let f: Finding = serde_json::from_str(raw).unwrap();
        assert!(f.recommendation.is_none());
        assert!(f.line_hint.is_none());
    }
}
