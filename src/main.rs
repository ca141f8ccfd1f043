//! `site-extractor` binary

mod cli;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};

use cli::Cli;

/// Conventional exit status after SIGINT
const INTERRUPTED: u8 = 130;

// One invocation is strictly sequential, so a single-threaded runtime is enough
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    site_extractor::logging::init(cli.verbosity(), cli.json_logs)
        .context("failed to initialise logging")?;

    let mut pipeline = match cli.pipeline() {
        Ok(pipeline) => pipeline,
        Err(e) => {
            error!(error = %e, "invalid invocation");
            eprintln!("Error: {e}");
            return Ok(ExitCode::from(e.kind().exit_code()));
        }
    };

    // Dropping the pipeline future on Ctrl-C tears down any browser it started
    let outcome = tokio::select! {
        result = pipeline.run() => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };

    match outcome {
        Some(Ok(report)) => {
            for problem in &report.errors {
                warn!("{problem}");
            }
            info!(
                matched = report.matched_count,
                written = report.written_count,
                "extraction finished"
            );
            println!(
                "Wrote {} items to {}",
                report.written_count,
                pipeline.output().path().display()
            );
            Ok(ExitCode::SUCCESS)
        }
        Some(Err(e)) => {
            eprintln!("Error: {e}");
            Ok(ExitCode::from(e.kind().exit_code()))
        }
        None => {
            warn!("interrupted");
            Ok(ExitCode::from(INTERRUPTED))
        }
    }
}
