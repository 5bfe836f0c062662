//! wiretap entry point.
//!
//! Registers with every RTU gateway given on the command line and logs
//! their event streams until Ctrl+C.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use rtu_wiretap::app_state::AppState;
use rtu_wiretap::config::WiretapConfig;
use rtu_wiretap::domain::SystemClock;
use rtu_wiretap::service::FleetSupervisor;
use rtu_wiretap::shutdown;
use rtu_wiretap::stream::EndpointHandshake;

/// Monitor RTU gateway event streams and write them to daily log files.
#[derive(Debug, Parser)]
#[command(name = "wiretap", author, version, about, long_about = None)]
struct Cli {
    /// RTU addresses to monitor
    #[arg(required = true, value_name = "RTU_ADDR")]
    addrs: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = WiretapConfig::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.log_json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!("Welcome to wiretap");
    tracing::info!("Monitoring the event streams of the RTUs given and writing them to log files");
    tracing::info!("Press Ctrl+C to exit");

    let output_dir = config.output_dir.clone();
    let handshake = EndpointHandshake::new(&config)?;
    let state = AppState::build(config, Arc::new(SystemClock)).await?;
    tracing::info!(dir = %output_dir.display(), "writing wiretap files");

    let (trigger, signal) = shutdown::channel();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Ctrl+C pressed, shutting down");
                trigger.fire();
            }
            Err(e) => tracing::error!(error = %e, "cannot listen for Ctrl+C"),
        }
    });

    let report = FleetSupervisor::new(state, handshake)
        .run(&cli.addrs, signal)
        .await;

    if report.is_clean() {
        tracing::info!("Exiting");
        Ok(ExitCode::SUCCESS)
    } else {
        tracing::error!(
            failed = report.failed_count(),
            handshake_failures = report.has_handshake_failures(),
            "one or more devices failed"
        );
        Ok(ExitCode::FAILURE)
    }
}
