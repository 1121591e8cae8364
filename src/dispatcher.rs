//! Per-file dispatch to the analysis capability.
//!
//! Iterates the session's changed files, resolves each file's language
//! policy, and invokes the capability. Per-file failures (transport,
//! malformed responses) are logged and isolate to that file; the session
//! always runs to completion.

use crate::capability::{AnalysisCapability, AnalysisRequest, CapabilityError};
use crate::findings::{Finding, ScanSession};
use crate::progress::DispatchProgress;
use crate::rules::LanguagePolicy;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Dispatch every changed file at most once. Findings and unanalyzed
/// files land in `session`.
///
/// `concurrency` is the maximum number of outstanding capability calls;
/// 1 (the default) keeps the base sequential behavior with a single
/// suspension point per file.
pub async fn run_dispatch(
    session: &mut ScanSession,
    capability: Arc<dyn AnalysisCapability>,
    concurrency: usize,
) {
    let files = dedup(&session.changed);
    let progress = DispatchProgress::from_env(files.len());

    // Files without a policy never reach the capability. This is the
    // common case for whitelisted extensions with no rule directory.
    let mut work: Vec<(String, Arc<LanguagePolicy>)> = Vec::new();
    for file in files {
        match session.policy_for(&file) {
            Some(policy) => work.push((file, Arc::clone(policy))),
            None => {
                debug!(file = %file, "no policy for extension, leaving unanalyzed");
                progress.file_done(&file);
                session.unanalyzed.push(file);
            }
        }
    }

    if concurrency <= 1 {
        for (file, policy) in work {
            let request = AnalysisRequest {
                repo_root: &session.repo_root,
                file_path: &file,
                language: &policy.language,
                instructions: &policy.instructions,
            };
            info!(file = %file, language = %policy.language, "analyzing");
            let result = capability.analyze(request).await;
            progress.file_done(&file);
            record(session, file, result);
        }
    } else {
        let semaphore = Arc::new(Semaphore::new(concurrency));
        let mut tasks = JoinSet::new();
        for (file, policy) in work {
            let capability = Arc::clone(&capability);
            let semaphore = Arc::clone(&semaphore);
            let repo_root = session.repo_root.clone();
            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("dispatch semaphore closed");
                info!(file = %file, language = %policy.language, "analyzing");
                let request = AnalysisRequest {
                    repo_root: &repo_root,
                    file_path: &file,
                    language: &policy.language,
                    instructions: &policy.instructions,
                };
                let result = capability.analyze(request).await;
                (file, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((file, result)) => {
                    progress.file_done(&file);
                    record(session, file, result);
                }
                Err(e) => warn!(error = %e, "analysis task failed to complete"),
            }
        }
    }

    progress.finish();
}

fn record(session: &mut ScanSession, file: String, result: Result<Vec<Finding>, CapabilityError>) {
    match result {
        Ok(findings) => {
            if findings.is_empty() {
                info!(file = %file, "no issues found");
            } else {
                info!(file = %file, count = findings.len(), "issues found");
            }
            session.findings.extend(findings);
        }
        Err(e) => {
            warn!(file = %file, error = %e, "analysis failed, leaving unanalyzed");
            session.unanalyzed.push(file);
        }
    }
}

fn dedup(files: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    files
        .iter()
        .filter(|f| seen.insert(f.as_str()))
        .cloned()
        .collect()
}
