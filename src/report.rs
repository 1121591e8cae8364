//! Markdown report rendering and writing.
//!
//! Findings are grouped by file (sorted for determinism), ordered
//! CRITICAL before WARNING within a file, and rendered as tables.
//! Trailing sections list cache hits and unanalyzed files.

use crate::error::{AuditError, Result};
use crate::findings::Finding;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const REPORT_SUFFIX: &str = "-security-report.md";

/// Destination path derived deterministically from the repository name.
pub fn report_path(reports_dir: &Path, repo_name: &str) -> PathBuf {
    reports_dir.join(format!("{repo_name}{REPORT_SUFFIX}"))
}

pub fn render_report(findings: &[Finding], skipped_unchanged: &[String], unanalyzed: &[String]) -> String {
    let mut out = String::from(
        "# Security Analysis Report\n\nThis report details the security issues found by the analysis agent.\n",
    );

    if findings.is_empty() && skipped_unchanged.is_empty() {
        out.push_str("\n**No security vulnerabilities were found in the analyzed files.**\n");
    } else if findings.is_empty() {
        out.push_str(
            "\n**No new security vulnerabilities were found. All files passed the cache check.**\n",
        );
    } else {
        let mut by_file: BTreeMap<&str, Vec<&Finding>> = BTreeMap::new();
        for finding in findings {
            by_file.entry(&finding.file_path).or_default().push(finding);
        }

        for (file_path, mut file_findings) in by_file {
            // Stable: equal severities keep their capability-reported order.
            file_findings.sort_by_key(|f| f.severity);

            out.push_str(&format!("\n---\n\n### File: `{file_path}`\n\n"));
            out.push_str("| Severity | Issue | Explanation | Recommendation | Approx Line |\n");
            out.push_str("|----------|-------|-------------|----------------|-------------|\n");
            for f in file_findings {
                let recommendation = f.recommendation.as_deref().unwrap_or("-");
                let line = f
                    .line_hint
                    .map(|l| l.to_string())
                    .unwrap_or_else(|| "N/A".to_string());
                out.push_str(&format!(
                    "| {} | {} | {} | {} | {} |\n",
                    f.severity,
                    cell(&f.issue),
                    cell(&f.explanation),
                    cell(recommendation),
                    line
                ));
            }
        }
    }

    if !skipped_unchanged.is_empty() {
        out.push_str(
            "\n---\n\n### Skipped Files (Unchanged)\n\nThe following files were not analyzed in this run because their content has not changed since the last analysis:\n\n",
        );
        out.push_str(&bullet_list(skipped_unchanged));
    }

    if !unanalyzed.is_empty() {
        out.push_str(
            "\n---\n\n### Unanalyzed Files\n\nThe following files were not analyzed because no rule applies to them or they are excluded by configuration:\n\n",
        );
        out.push_str(&bullet_list(unanalyzed));
    }

    out
}

/// Write the report, creating parent directories as needed.
pub fn write_report(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| AuditError::ReportWrite {
            path: path.display().to_string(),
            source: e,
        })?;
    }
    fs::write(path, content).map_err(|e| AuditError::ReportWrite {
        path: path.display().to_string(),
        source: e,
    })
}

/// Make free text safe inside a Markdown table cell.
fn cell(text: &str) -> String {
    text.replace('\n', " ").replace('|', "\\|")
}

fn bullet_list(files: &[String]) -> String {
    let mut sorted: Vec<&String> = files.iter().collect();
    sorted.sort();
    sorted
        .iter()
        .map(|f| format!("- `{f}`"))
        .collect::<Vec<_>>()
        .join("\n")
}
