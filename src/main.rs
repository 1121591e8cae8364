use ai_audit::capability::OpenAiCapability;
use ai_audit::{Cli, run_scan};
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "ai_audit=debug"
    } else {
        "ai_audit=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with_writer(std::io::stderr)
        .init();

    let capability = match OpenAiCapability::from_env() {
        Ok(capability) => Arc::new(capability),
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match run_scan(&cli, capability).await {
        Ok(outcome) => {
            println!(
                "Report generated at: {}",
                outcome.report_path.display()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
