//! Repository file indexing.
//!
//! Walks the tree once, prunes blacklisted directory names at any depth,
//! drops blacklisted basenames, and classifies the survivors by whether
//! their lower-cased extension is whitelisted. Pruned paths appear in
//! neither output list.

use crate::findings::file_extension;
use std::collections::HashSet;
use std::path::Path;
use tracing::warn;
use walkdir::WalkDir;

/// Candidate set produced by one traversal. Paths are repo-relative,
/// forward-slash normalized, and sorted.
#[derive(Debug, Default)]
pub struct FileIndex {
    /// Whitelisted extension: eligible for analysis.
    pub in_scope: Vec<String>,
    /// Everything else that survived the blacklists.
    pub out_of_scope: Vec<String>,
}

pub fn build_file_index(
    root: &Path,
    allowed_exts: &HashSet<String>,
    ignored_dirs: &HashSet<String>,
    ignored_files: &HashSet<String>,
) -> FileIndex {
    let mut index = FileIndex::default();

    let walker = WalkDir::new(root).into_iter().filter_entry(|entry| {
        // Pruning a directory here excludes its entire subtree, which
        // covers blacklisted names at every nesting depth. The root
        // itself (depth 0) is never pruned.
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return true;
        }
        !matches_name(entry.path(), ignored_dirs)
    });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable path");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        // A blacklisted directory name also excludes a regular file that
        // happens to carry it.
        if matches_name(entry.path(), ignored_files) || matches_name(entry.path(), ignored_dirs) {
            continue;
        }

        let rel = relative_posix(entry.path(), root);
        match file_extension(&rel) {
            Some(ext) if allowed_exts.contains(&ext) => index.in_scope.push(rel),
            _ => index.out_of_scope.push(rel),
        }
    }

    index.in_scope.sort();
    index.out_of_scope.sort();
    index
}

fn matches_name(path: &Path, names: &HashSet<String>) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| names.contains(n))
}

/// Repo-relative path with forward slashes, for platform-independent
/// comparison and reporting.
fn relative_posix(path: &Path, root: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
