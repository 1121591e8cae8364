//! Analysis capability boundary.
//!
//! The actual vulnerability reasoning lives behind this trait; the core
//! treats it strictly as a contract: source text and policy text go in
//! verbatim, an ordered sequence of findings comes back as structured
//! text. Schema violations are a first-class, recoverable error kind.

pub mod openai;

use crate::findings::{Finding, Severity};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

pub use openai::OpenAiCapability;

/// Per-file request handed to the capability. The policy instructions are
/// passed through uninterpreted.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisRequest<'a> {
    pub repo_root: &'a Path,
    /// Repo-relative POSIX path of the file under analysis.
    pub file_path: &'a str,
    pub language: &'a str,
    pub instructions: &'a str,
}

#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("Failed to read source file: {path}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Analysis API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Malformed capability response: {0}")]
    MalformedResponse(String),
}

/// External collaborator that inspects source text and returns findings.
#[async_trait]
pub trait AnalysisCapability: Send + Sync {
    async fn analyze(
        &self,
        request: AnalysisRequest<'_>,
    ) -> std::result::Result<Vec<Finding>, CapabilityError>;
}

#[derive(Debug, Deserialize)]
struct RawFinding {
    issue: String,
    severity: String,
    explanation: String,
    #[serde(default)]
    recommendation: Option<String>,
    #[serde(default)]
    line_hint: Option<u32>,
}

/// Validating parser for the capability's response text.
///
/// Accepts a JSON array of finding objects, optionally wrapped in a
/// Markdown code fence. Every finding is tagged with the originating
/// `file_path`; anything outside the schema (including an unknown
/// severity) is rejected as `MalformedResponse`.
pub fn parse_findings(
    raw: &str,
    file_path: &str,
) -> std::result::Result<Vec<Finding>, CapabilityError> {
    let body = strip_code_fence(raw);

    let raw_findings: Vec<RawFinding> = serde_json::from_str(body)
        .map_err(|e| CapabilityError::MalformedResponse(format!("expected a JSON array: {e}")))?;

    raw_findings
        .into_iter()
        .map(|f| {
            let severity = parse_severity(&f.severity)?;
            Ok(Finding {
                file_path: file_path.to_string(),
                issue: f.issue,
                severity,
                explanation: f.explanation,
                recommendation: f.recommendation,
                line_hint: f.line_hint,
            })
        })
        .collect()
}

fn parse_severity(raw: &str) -> std::result::Result<Severity, CapabilityError> {
    match raw.to_uppercase().as_str() {
        "CRITICAL" => Ok(Severity::Critical),
        "WARNING" => Ok(Severity::Warning),
        other => Err(CapabilityError::MalformedResponse(format!(
            "unknown severity '{other}', expected CRITICAL or WARNING"
        ))),
    }
}

/// Models are asked for bare JSON but often fence it anyway.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_findings() {
        let raw = r#"[
            {"issue": "Use of eval", "severity": "CRITICAL", "explanation": "RCE risk",
             "recommendation": "Remove eval", "line_hint": 12},
            {"issue": "Weak hash", "severity": "WARNING", "explanation": "MD5 used"}
        ]"#;

        let findings = parse_findings(raw, "src/app.py").unwrap();
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].file_path, "src/app.py");
        assert_eq!(findings[0].severity, Severity::Critical);
        assert_eq!(findings[0].line_hint, Some(12));
        assert_eq!(findings[1].severity, Severity::Warning);
        assert!(findings[1].recommendation.is_none());
    }

    #[test]
    fn test_parse_empty_array() {
        assert!(parse_findings("[]", "a.py").unwrap().is_empty());
    }

    #[test]
    fn test_parse_fenced_json() {
        let raw = "```json\n[{\"issue\": \"x\", \"severity\": \"WARNING\", \"explanation\": \"y\"}]\n```";
        let findings = parse_findings(raw, "a.py").unwrap();
        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn test_findings_tagged_with_originating_path() {
        let raw = r#"[{"issue": "x", "severity": "WARNING", "explanation": "y"}]"#;
        let findings = parse_findings(raw, "lib/util.js").unwrap();
        assert_eq!(findings[0].file_path, "lib/util.js");
    }

    #[test]
    fn test_unknown_severity_rejected() {
        let raw = r#"[{"issue": "x", "severity": "INFO", "explanation": "y"}]"#;
        let err = parse_findings(raw, "a.py").unwrap_err();
        assert!(matches!(err, CapabilityError::MalformedResponse(_)));
        assert!(err.to_string().contains("INFO"));
    }

    #[test]
    fn test_non_array_rejected() {
        let err = parse_findings("I found no issues.", "a.py").unwrap_err();
        assert!(matches!(err, CapabilityError::MalformedResponse(_)));

        let err = parse_findings(r#"{"findings": []}"#, "a.py").unwrap_err();
        assert!(matches!(err, CapabilityError::MalformedResponse(_)));
    }

    #[test]
    fn test_severity_accepted_case_insensitively() {
        let raw = r#"[{"issue": "x", "severity": "critical", "explanation": "y"}]"#;
        let findings = parse_findings(raw, "a.py").unwrap();
        assert_eq!(findings[0].severity, Severity::Critical);
    }
}
