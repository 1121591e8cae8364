//! Rule registry: per-language scan policies loaded from a rules directory.
//!
//! Layout: one subdirectory per language under the rules root, each holding
//! a `config.yaml` descriptor (language name + extension list) and a
//! `prompt.md` policy body. A subdirectory missing either file is skipped;
//! that language is simply unavailable for the run.

use crate::error::{AuditError, Result};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

const DESCRIPTOR_FILE: &str = "config.yaml";
const PROMPT_FILE: &str = "prompt.md";

/// Immutable per-language scan policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguagePolicy {
    pub language: String,
    /// Lower-cased dotted extensions this policy covers.
    pub extensions: Vec<String>,
    /// Free-text instructions passed verbatim to the analysis capability.
    pub instructions: String,
}

#[derive(Debug, Deserialize)]
struct PolicyDescriptor {
    language: Option<String>,
    #[serde(default)]
    extensions: Vec<String>,
}

/// Load policies from `rules_dir`, keyed by lower-cased extension.
///
/// If `allowed` is given, only extensions present in that set are
/// registered. Subdirectories are visited in sorted order, and an
/// extension claimed by two different languages is a hard error rather
/// than a silent last-wins.
pub fn load_rules(
    rules_dir: &Path,
    allowed: Option<&HashSet<String>>,
) -> Result<HashMap<String, Arc<LanguagePolicy>>> {
    let mut rules_map: HashMap<String, Arc<LanguagePolicy>> = HashMap::new();
    if !rules_dir.is_dir() {
        return Ok(rules_map);
    }

    let mut lang_dirs: Vec<_> = fs::read_dir(rules_dir)
        .map_err(|e| AuditError::RuleLoad {
            path: rules_dir.display().to_string(),
            message: e.to_string(),
        })?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    lang_dirs.sort();

    for lang_dir in lang_dirs {
        let descriptor_path = lang_dir.join(DESCRIPTOR_FILE);
        let prompt_path = lang_dir.join(PROMPT_FILE);

        if !descriptor_path.exists() || !prompt_path.exists() {
            debug!(dir = %lang_dir.display(), "skipping rule directory without descriptor or prompt");
            continue;
        }

        let descriptor_raw =
            fs::read_to_string(&descriptor_path).map_err(|e| AuditError::ReadError {
                path: descriptor_path.display().to_string(),
                source: e,
            })?;
        let descriptor: PolicyDescriptor =
            serde_yaml::from_str(&descriptor_raw).map_err(|e| AuditError::YamlParse {
                path: descriptor_path.display().to_string(),
                source: e,
            })?;

        let instructions = fs::read_to_string(&prompt_path)
            .map_err(|e| AuditError::ReadError {
                path: prompt_path.display().to_string(),
                source: e,
            })?
            .trim()
            .to_string();

        let language = descriptor.language.unwrap_or_else(|| {
            lang_dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        });

        let policy = Arc::new(LanguagePolicy {
            extensions: descriptor
                .extensions
                .iter()
                .map(|e| e.to_lowercase())
                .collect(),
            language,
            instructions,
        });

        for ext in &policy.extensions {
            if let Some(allowed) = allowed {
                if !allowed.contains(ext) {
                    continue;
                }
            }
            if let Some(existing) = rules_map.get(ext) {
                if existing.language != policy.language {
                    return Err(AuditError::RuleConflict {
                        extension: ext.clone(),
                        first: existing.language.clone(),
                        second: policy.language.clone(),
                    });
                }
                continue;
            }
            rules_map.insert(ext.clone(), Arc::clone(&policy));
        }
    }

    Ok(rules_map)
}
