//! Remote repository acquisition.
//!
//! Thin git subprocess glue: a URL maps to `<base_dir>/<repo_name>`. An
//! existing checkout is reset to the remote state of its default branch;
//! otherwise the repository is cloned. Failures here are fatal for the
//! invocation.

use crate::error::{AuditError, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::info;

pub const DEFAULT_REPOS_DIR: &str = "repos";

/// Derive the checkout directory name from a repository URL.
pub fn repo_name_from_url(url: &str) -> String {
    let name = url.trim_end_matches('/').rsplit('/').next().unwrap_or(url);
    name.strip_suffix(".git").unwrap_or(name).to_string()
}

/// Clone `url` under `base_dir`, or refresh an existing checkout.
pub fn acquire_repo(url: &str, base_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(base_dir).map_err(|e| AuditError::SourceAcquisition {
        target: url.to_string(),
        message: format!("cannot create {}: {e}", base_dir.display()),
    })?;

    let repo_path = base_dir.join(repo_name_from_url(url));

    if repo_path.exists() {
        info!(path = %repo_path.display(), "repository exists, resetting to remote state");
        run_git(url, &repo_path, &["fetch", "origin"])?;
        run_git(url, &repo_path, &["reset", "--hard", "origin/HEAD"])?;
        run_git(url, &repo_path, &["clean", "-fdx"])?;
    } else {
        info!(url = %url, "cloning repository");
        run_git(url, base_dir, &["clone", url])?;
    }

    Ok(repo_path)
}

fn run_git(url: &str, cwd: &Path, args: &[&str]) -> Result<()> {
    let output = Command::new("git")
        .args(args)
        .current_dir(cwd)
        .output()
        .map_err(|e| AuditError::SourceAcquisition {
            target: url.to_string(),
            message: if e.kind() == std::io::ErrorKind::NotFound {
                "git command not found".to_string()
            } else {
                e.to_string()
            },
        })?;

    if !output.status.success() {
        return Err(AuditError::SourceAcquisition {
            target: url.to_string(),
            message: format!(
                "git {} failed: {}",
                args.first().unwrap_or(&""),
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_name_from_url() {
        assert_eq!(
            repo_name_from_url("https://github.com/user/my-repo"),
            "my-repo"
        );
        assert_eq!(
            repo_name_from_url("https://github.com/user/my-repo.git"),
            "my-repo"
        );
        assert_eq!(
            repo_name_from_url("https://github.com/user/my-repo/"),
            "my-repo"
        );
    }

    #[test]
    fn test_acquire_repo_bad_url_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        // Either git is missing or the clone fails; both are fatal
        // source-acquisition errors.
        let err = acquire_repo("file:///nonexistent/repo-xyz", dir.path()).unwrap_err();
        assert!(matches!(err, AuditError::SourceAcquisition { .. }));
    }
}
