//! # Harvest
//!
//! Enumerates subdomains of the given root domains through every configured
//! data source and prints one `name,domain,source` line per discovery to
//! stdout. Logs go to stderr.

use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use harvest_runtime::cli::Cli;
use harvest_runtime::container::RuntimeConfig;
use harvest_runtime::{cancel_on_shutdown, HarvestRuntime};
use harvest_telemetry::{init_telemetry, TelemetryConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let mut telemetry = TelemetryConfig::from_env();
    if cli.json {
        telemetry.json_logs = true;
    }
    init_telemetry(telemetry).context("Failed to initialize logging")?;

    // Load configuration
    let config = RuntimeConfig::from_cli(&cli).context("Invalid configuration")?;

    let runtime = HarvestRuntime::new(config)?;
    tokio::spawn(cancel_on_shutdown(
        runtime.cancel_token(),
        runtime.deadline(),
    ));

    let report = runtime.run().await?;
    runtime.shutdown();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for discovery in &report.discoveries {
        writeln!(
            out,
            "{},{},{}",
            discovery.name, discovery.domain, discovery.source
        )
        .context("Failed to write results")?;
    }
    out.flush().context("Failed to write results")?;

    info!(
        discoveries = report.discoveries.len(),
        "Results written to stdout"
    );
    Ok(())
}
