//! Scan orchestration.
//!
//! Ties the pipeline together: configuration → rules → source acquisition
//! → indexing → cache diff → dispatch → report → cache persistence.
//! Everything flows through one per-invocation session; nothing is global.

use crate::cache::ScanCache;
use crate::capability::AnalysisCapability;
use crate::cli::Cli;
use crate::config::Config;
use crate::dispatcher::run_dispatch;
use crate::error::{AuditError, Result};
use crate::findings::{ScanSession, Severity};
use crate::indexer::build_file_index;
use crate::remote::{DEFAULT_REPOS_DIR, acquire_repo};
use crate::report::{render_report, report_path, write_report};
use crate::rules::load_rules;
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Counts for the final summary line.
#[derive(Debug)]
pub struct ScanOutcome {
    pub report_path: PathBuf,
    pub finding_count: usize,
    pub analyzed: usize,
    pub skipped_unchanged: usize,
    pub unanalyzed: usize,
}

pub async fn run_scan(cli: &Cli, capability: Arc<dyn AnalysisCapability>) -> Result<ScanOutcome> {
    let config = Config::load(&cli.config)?;
    let whitelist = config.whitelisted_extensions();
    if whitelist.is_empty() {
        return Err(AuditError::Config(format!(
            "no whitelisted extensions in {}; nothing to analyze",
            cli.config.display()
        )));
    }

    let rules = load_rules(&cli.rules_dir, Some(&whitelist))?;
    if rules.is_empty() {
        return Err(AuditError::Config(format!(
            "no rules under {} match the whitelisted extensions",
            cli.rules_dir.display()
        )));
    }
    eprintln!(
        "{} language rule(s) loaded according to the whitelist.",
        rules.len()
    );
    for ext in &whitelist {
        if !rules.contains_key(ext) {
            warn!(extension = %ext, "whitelisted extension has no rule");
            eprintln!("Warning: extension '{ext}' is whitelisted but no rule was found for it.");
        }
    }

    let (repo_root, repo_id) = resolve_source(cli)?;
    let repo_name = repo_root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "repository".to_string());
    let destination = report_path(&cli.reports_dir, &repo_name);

    let index = build_file_index(
        &repo_root,
        &whitelist,
        &config.blacklist.directories,
        &config.blacklist.files,
    );
    info!(
        in_scope = index.in_scope.len(),
        out_of_scope = index.out_of_scope.len(),
        "file index built"
    );

    if index.in_scope.is_empty() {
        eprintln!("No files with whitelisted extensions were found in the repository.");
        let report = render_report(&[], &[], &index.out_of_scope);
        write_report(&destination, &report)?;
        return Ok(ScanOutcome {
            report_path: destination,
            finding_count: 0,
            analyzed: 0,
            skipped_unchanged: 0,
            unanalyzed: index.out_of_scope.len(),
        });
    }

    let mut cache = ScanCache::load(&cli.cache_file);
    let diff = cache.diff(&repo_id, &repo_root, &index.in_scope);
    info!(
        changed = diff.changed.len(),
        unchanged = diff.unchanged.len(),
        "change detection complete"
    );

    let changed_count = diff.changed.len();
    let mut session = ScanSession::new(
        repo_root,
        repo_id.clone(),
        rules,
        diff.changed,
        diff.unchanged,
        index.out_of_scope,
    );
    let unanalyzed_before_dispatch = session.unanalyzed.len();

    run_dispatch(&mut session, capability, cli.concurrency.max(1)).await;

    let report = render_report(
        &session.findings,
        &session.skipped_unchanged,
        &session.unanalyzed,
    );
    write_report(&destination, &report)?;

    // The cache reflects current on-disk state for every surviving
    // candidate, analyzed or not. Persisted once, after the report.
    cache.set_repo(&repo_id, diff.updated);
    if let Err(e) = cache.save(&cli.cache_file) {
        warn!(error = %e, "failed to persist cache");
        eprintln!("Warning: {e}");
    }

    let failed_or_ruleless = session.unanalyzed.len() - unanalyzed_before_dispatch;
    let outcome = ScanOutcome {
        report_path: destination,
        finding_count: session.findings.len(),
        analyzed: changed_count - failed_or_ruleless,
        skipped_unchanged: session.skipped_unchanged.len(),
        unanalyzed: session.unanalyzed.len(),
    };
    print_summary(&session, &outcome);
    Ok(outcome)
}

fn resolve_source(cli: &Cli) -> Result<(PathBuf, String)> {
    match (&cli.url, &cli.directory) {
        (Some(url), _) => {
            let root = acquire_repo(url, Path::new(DEFAULT_REPOS_DIR))?;
            Ok((root, url.clone()))
        }
        (None, Some(dir)) => {
            if !dir.is_dir() {
                return Err(AuditError::SourceAcquisition {
                    target: dir.display().to_string(),
                    message: "directory does not exist".to_string(),
                });
            }
            let root = dir
                .canonicalize()
                .map_err(|e| AuditError::SourceAcquisition {
                    target: dir.display().to_string(),
                    message: e.to_string(),
                })?;
            let repo_id = root.display().to_string();
            Ok((root, repo_id))
        }
        (None, None) => Err(AuditError::Config(
            "either --url or --directory is required".to_string(),
        )),
    }
}

fn print_summary(session: &ScanSession, outcome: &ScanOutcome) {
    if session.findings.is_empty() && session.skipped_unchanged.is_empty() {
        eprintln!(
            "{}",
            "Clean scan: no security issues found.".green().bold()
        );
    } else if session.findings.is_empty() {
        eprintln!(
            "{}",
            "Nothing new: all files passed the cache check.".green()
        );
    } else {
        let critical = session
            .findings
            .iter()
            .filter(|f| f.severity == Severity::Critical)
            .count();
        let warning = session.findings.len() - critical;
        eprintln!(
            "{}",
            format!(
                "Issues found: {} ({} critical, {} warning)",
                session.findings.len(),
                critical,
                warning
            )
            .red()
            .bold()
        );
    }
    eprintln!(
        "Analyzed: {} | Skipped (unchanged): {} | Unanalyzed: {}",
        outcome.analyzed, outcome.skipped_unchanged, outcome.unanalyzed
    );
}
