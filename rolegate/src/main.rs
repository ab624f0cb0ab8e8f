use clap::Parser;
use rolegate::{Application, Config, telemetry};
use tracing::{info, warn};

/// Resolves once the process is asked to stop.
async fn shutdown_requested() {
    let reason = wait_for_signal().await;
    info!("{reason}, draining open connections");
}

#[cfg(unix)]
async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => tokio::select! {
            reason = interrupted() => reason,
            _ = sigterm.recv() => "Received SIGTERM",
        },
        Err(e) => {
            warn!("Cannot listen for SIGTERM ({e}), only Ctrl+C stops the server");
            interrupted().await
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> &'static str {
    interrupted().await
}

async fn interrupted() -> &'static str {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
    "Received Ctrl+C"
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = rolegate::config::Args::parse();

    // Load and validate configuration (users, rules, hashing parameters)
    let config = Config::load(&args)?;

    if args.validate {
        println!("Configuration is valid.");
        return Ok(());
    }

    telemetry::init_telemetry(config.log_format)?;
    tracing::debug!("{:?}", args);

    let shutdown = shutdown_requested();
    Application::new(config)?.serve(shutdown).await
}
