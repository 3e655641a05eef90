//! entstore-check
//!
//! Runs the conformance battery against a reference adapter and exits
//! non-zero when any case fails.

use clap::Parser;
use entstore_check::{CheckConfig, init_logging, render, run};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CheckConfig::parse();
    init_logging(&config.log_level);

    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(1);
    }

    let format = config
        .report_format()
        .map_err(|e| anyhow::anyhow!("Invalid report format: {}", e))?;

    let report = run(&config).await?;
    println!("{}", render(&report, format)?);

    if report.is_success() {
        info!(
            passed = report.passed(),
            skipped = report.skipped(),
            "Conformance battery passed"
        );
        Ok(())
    } else {
        warn!(failed = report.failed(), "Conformance battery failed");
        std::process::exit(2);
    }
}
