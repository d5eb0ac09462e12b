//! scan-measure - Main Entry Point
//!
//! Takes one scan directory, runs every active registered model over its
//! point-cloud artifacts, and prints the measurement report as JSON.

use anyhow::Result;
use clap::Parser;
use scan_measure::{cli::Cli, config::AppConfig, pipeline, report};
use tracing::info;

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        // Fatal path: message to stderr, no report on stdout.
        eprintln!("error: {:#}", err);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    if let Some(registry) = cli.registry {
        config.models.registry = registry;
    }

    // Logs go to stderr so stdout carries nothing but the report.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!(
        scan_dir = %cli.scan_dir.display(),
        registry = %config.models.registry.display(),
        "Starting measurement run"
    );

    let scan_report = pipeline::run_scan(&cli.scan_dir, &config)?;
    let rendered = report::render_json(&scan_report, !cli.compact)?;
    println!("{}", rendered);

    Ok(())
}
