use clap::{ArgGroup, Parser};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "ai-audit",
    version,
    about = "Incremental LLM-assisted security scanner",
    long_about = "ai-audit indexes a repository, skips files whose content hash is unchanged \
since the last run, analyzes changed files with per-language security policies, and writes \
a severity-ordered Markdown report."
)]
#[command(group(ArgGroup::new("source").required(true).args(["url", "directory"])))]
pub struct Cli {
    /// URL of the git repository to scan (e.g. https://github.com/user/repo)
    #[arg(long)]
    pub url: Option<String>,

    /// Local path to an already cloned repository
    #[arg(long)]
    pub directory: Option<PathBuf>,

    /// Directory holding per-language rule subdirectories
    #[arg(long, default_value = "rules")]
    pub rules_dir: PathBuf,

    /// Scan configuration file (whitelist/blacklist)
    #[arg(long, default_value = "ai-audit.yaml")]
    pub config: PathBuf,

    /// Directory the report is written to
    #[arg(long, default_value = "reports")]
    pub reports_dir: PathBuf,

    /// Content-hash cache file
    #[arg(long, default_value = ".ai-audit-cache.json")]
    pub cache_file: PathBuf,

    /// Maximum number of outstanding analysis calls
    #[arg(long, default_value_t = 1)]
    pub concurrency: usize,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}
