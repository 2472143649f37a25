use std::process;

use clap::Parser;
use tracing::{error, info, warn};

use logship_cli::cli::LogshipCli;
use logship_cli::error::CliError;
use logship_cli::{logging, metrics_server, resolve_config, shipper};
use logship_publisher::{DynPublisher, build_publisher};

#[tokio::main]
async fn main() {
    let cli = LogshipCli::parse();

    if let Err(e) = run(cli).await {
        error!(error = %e, "logship failed");
        eprintln!("logship: {e}");
        process::exit(e.exit_code());
    }
}

async fn run(cli: LogshipCli) -> Result<(), CliError> {
    let config = resolve_config(&cli).await?;

    if cli.validate {
        println!("configuration is valid");
        return Ok(());
    }

    logging::init_tracing(&config.general).map_err(|e| CliError::Setup(e.to_string()))?;

    info!(
        output = %config.publisher.output,
        parser = %config.publisher.parser,
        "logship starting"
    );

    if config.metrics.enabled {
        metrics_server::install_metrics_recorder(&config.metrics)
            .map_err(|e| CliError::Setup(e.to_string()))?;
    }

    let mut publisher = build_publisher(&config)?;
    let reader = shipper::open_input(cli.input_path().map(|p| p.as_path())).await?;

    let shipped = shipper::ship(
        reader,
        publisher.as_mut(),
        cli.chunk_lines,
        shutdown_signal(),
    )
    .await;

    // Flush what was already submitted even if reading failed.
    let closed = publisher.close().await;

    let stats = shipped?;
    closed?;

    info!(
        lines = stats.lines,
        chunks = stats.chunks,
        interrupted = stats.interrupted,
        "logship finished, all events flushed"
    );
    Ok(())
}

/// Resolves on Ctrl-C. Never resolves if the handler cannot be installed.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c, shutdown only on EOF");
        std::future::pending::<()>().await;
    }
}
