use anyhow::Context;
use clap::Parser;
use futures::FutureExt;
use screenshot_batch::{setup_logging, usage_exit_status, ChromeLauncher, Cli, CliRunner};
use std::panic::AssertUnwindSafe;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let args = match Cli::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(usage_exit_status(&e));
        }
    };

    if let Err(e) = setup_logging(args.verbose) {
        eprintln!("Failed to initialize logging: {e}");
    }

    info!("Starting screenshot-batch v{}", env!("CARGO_PKG_VERSION"));

    match AssertUnwindSafe(run(args)).catch_unwind().await {
        Ok(Ok(code)) => code,
        Ok(Err(e)) => {
            error!("Run failed: {:#}", e);
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
        Err(_) => {
            error!("Run aborted by an unexpected panic");
            eprintln!("Error: run aborted unexpectedly");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Cli) -> anyhow::Result<ExitCode> {
    let runner = CliRunner::prepare(&args).await?;
    let launcher = Arc::new(ChromeLauncher::new(&runner.config));

    println!(
        "Capturing {} screenshot(s) into {}",
        runner.tasks.len(),
        runner.config.output_dir.display()
    );

    let report = runner.run(launcher).await;

    println!();
    println!("{}", report.summary);

    if args.json {
        let json = report.to_json().context("Failed to render JSON report")?;
        println!("{json}");
    }

    Ok(ExitCode::from(report.summary.exit_code()))
}
