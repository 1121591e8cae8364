//! Error types for ai-audit.
//!
//! Fatal errors (configuration, source acquisition, report writing) abort
//! the run. Rule-directory and per-file analysis failures are recovered
//! where they occur and never reach this level.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to load rules from {path}: {message}")]
    RuleLoad { path: String, message: String },

    #[error(
        "Conflicting rule for extension '{extension}': declared by both '{first}' and '{second}'"
    )]
    RuleConflict {
        extension: String,
        first: String,
        second: String,
    },

    #[error("Failed to acquire source {target}: {message}")]
    SourceAcquisition { target: String, message: String },

    #[error("Failed to write report to {path}")]
    ReportWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write cache to {path}")]
    CacheWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read file: {path}")]
    ReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse YAML: {path}")]
    YamlParse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for operations using AuditError.
pub type Result<T> = std::result::Result<T, AuditError>;
