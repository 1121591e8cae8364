pub mod cache;
pub mod capability;
pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod findings;
pub mod indexer;
pub mod progress;
pub mod remote;
pub mod report;
pub mod rules;
pub mod run;

pub use cache::{CacheDiff, ScanCache};
pub use capability::{AnalysisCapability, AnalysisRequest, CapabilityError, OpenAiCapability};
pub use cli::Cli;
pub use config::Config;
pub use error::{AuditError, Result};
pub use findings::{Finding, ScanSession, Severity};
pub use indexer::{FileIndex, build_file_index};
pub use rules::{LanguagePolicy, load_rules};
pub use run::{ScanOutcome, run_scan};
