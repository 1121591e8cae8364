//! Content-hash change cache.
//!
//! Persisted as a single JSON document keyed by repository identifier,
//! each value a flat path-to-SHA-256 table. Loaded once at run start and
//! written back once after the report; a crash mid-run loses that run's
//! hash updates by design.

use crate::error::{AuditError, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::io::Read;
use std::path::Path;
use tracing::warn;

pub const DEFAULT_CACHE_FILE: &str = ".ai-audit-cache.json";

const HASH_CHUNK_SIZE: usize = 8192;

/// Result of diffing a candidate set against the cached hashes.
#[derive(Debug, Default)]
pub struct CacheDiff {
    /// New or modified files, to be dispatched.
    pub changed: Vec<String>,
    /// Cache hits, skipped this run.
    pub unchanged: Vec<String>,
    /// Fresh digest for every surviving candidate, changed and unchanged
    /// alike. The caller persists this table.
    pub updated: HashMap<String, String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ScanCache {
    #[serde(flatten)]
    repos: HashMap<String, HashMap<String, String>>,
}

impl ScanCache {
    /// Load the cache from disk. A missing or malformed file yields an
    /// empty cache; the scan then treats every candidate as changed.
    pub fn load(path: &Path) -> Self {
        let Ok(content) = fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str(&content) {
            Ok(cache) => cache,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "discarding malformed cache file");
                Self::default()
            }
        }
    }

    /// Write the whole cache back, overwriting the previous document.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| AuditError::CacheWrite {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Replace the hash table for one repository.
    pub fn set_repo(&mut self, repo_id: &str, hashes: HashMap<String, String>) {
        self.repos.insert(repo_id.to_string(), hashes);
    }

    pub fn repo(&self, repo_id: &str) -> Option<&HashMap<String, String>> {
        self.repos.get(repo_id)
    }

    /// Separate `candidates` into changed and unchanged relative to the
    /// stored hashes for `repo_id`. Pure with respect to the cache: the
    /// stored table is never mutated here. Candidates missing from disk
    /// are dropped silently, treated as deletions.
    pub fn diff(&self, repo_id: &str, root: &Path, candidates: &[String]) -> CacheDiff {
        let empty = HashMap::new();
        let previous = self.repos.get(repo_id).unwrap_or(&empty);
        let mut diff = CacheDiff::default();

        for rel in candidates {
            let path = root.join(rel);
            if !path.exists() {
                continue;
            }
            let current = match hash_file(&path) {
                Ok(hash) => hash,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to hash file, skipping");
                    continue;
                }
            };
            diff.updated.insert(rel.clone(), current.clone());

            if previous.get(rel) == Some(&current) {
                diff.unchanged.push(rel.clone());
            } else {
                diff.changed.push(rel.clone());
            }
        }

        diff
    }
}

/// SHA-256 of the whole file content, streamed in fixed-size chunks.
pub fn hash_file(path: &Path) -> std::io::Result<String> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; HASH_CHUNK_SIZE];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_hash_stability() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a.py", "print('hello')");
        let first = hash_file(&dir.path().join("a.py")).unwrap();
        let second = hash_file(&dir.path().join("a.py")).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
    }

    #[test]
    fn test_hash_changes_with_content() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a.py", "v1");
        let first = hash_file(&dir.path().join("a.py")).unwrap();
        touch(dir.path(), "a.py", "v2");
        let second = hash_file(&dir.path().join("a.py")).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_diff_new_file_is_changed() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a.py", "code");

        let cache = ScanCache::default();
        let diff = cache.diff("repo", dir.path(), &["a.py".to_string()]);
        assert_eq!(diff.changed, vec!["a.py"]);
        assert!(diff.unchanged.is_empty());
        assert!(diff.updated.contains_key("a.py"));
    }

    #[test]
    fn test_diff_unchanged_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a.py", "code");
        let hash = hash_file(&dir.path().join("a.py")).unwrap();

        let mut cache = ScanCache::default();
        cache.set_repo("repo", HashMap::from([("a.py".to_string(), hash.clone())]));

        let diff = cache.diff("repo", dir.path(), &["a.py".to_string()]);
        assert!(diff.changed.is_empty());
        assert_eq!(diff.unchanged, vec!["a.py"]);
        // Updated table still carries a fresh digest for the cache hit.
        assert_eq!(diff.updated.get("a.py"), Some(&hash));
    }

    #[test]
    fn test_diff_modified_file_is_changed() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a.py", "old");

        let mut cache = ScanCache::default();
        cache.set_repo(
            "repo",
            HashMap::from([("a.py".to_string(), "deadbeef".to_string())]),
        );

        let diff = cache.diff("repo", dir.path(), &["a.py".to_string()]);
        assert_eq!(diff.changed, vec!["a.py"]);
    }

    #[test]
    fn test_diff_missing_file_dropped_silently() {
        let dir = TempDir::new().unwrap();

        let cache = ScanCache::default();
        let diff = cache.diff("repo", dir.path(), &["gone.py".to_string()]);
        assert!(diff.changed.is_empty());
        assert!(diff.unchanged.is_empty());
        assert!(diff.updated.is_empty());
    }

    #[test]
    fn test_diff_does_not_mutate_cache() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a.py", "code");

        let mut cache = ScanCache::default();
        cache.set_repo(
            "repo",
            HashMap::from([("old.py".to_string(), "cafe".to_string())]),
        );

        let _ = cache.diff("repo", dir.path(), &["a.py".to_string()]);
        let table = cache.repo("repo").unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("old.py"), Some(&"cafe".to_string()));
    }

    #[test]
    fn test_diff_is_scoped_per_repository() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a.py", "code");
        let hash = hash_file(&dir.path().join("a.py")).unwrap();

        let mut cache = ScanCache::default();
        cache.set_repo("other-repo", HashMap::from([("a.py".to_string(), hash)]));

        // The hash matches, but under a different repository id.
        let diff = cache.diff("this-repo", dir.path(), &["a.py".to_string()]);
        assert_eq!(diff.changed, vec!["a.py"]);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let cache_path = dir.path().join("cache.json");

        let mut cache = ScanCache::default();
        cache.set_repo(
            "https://github.com/user/repo",
            HashMap::from([("a.py".to_string(), "abc123".to_string())]),
        );
        cache.save(&cache_path).unwrap();

        let loaded = ScanCache::load(&cache_path);
        assert_eq!(
            loaded
                .repo("https://github.com/user/repo")
                .unwrap()
                .get("a.py"),
            Some(&"abc123".to_string())
        );
    }

    #[test]
    fn test_load_missing_or_malformed_yields_empty() {
        let dir = TempDir::new().unwrap();
        assert!(ScanCache::load(&dir.path().join("nope.json"))
            .repo("any")
            .is_none());

        let bad = dir.path().join("bad.json");
        fs::write(&bad, "{not json").unwrap();
        assert!(ScanCache::load(&bad).repo("any").is_none());
    }
}
