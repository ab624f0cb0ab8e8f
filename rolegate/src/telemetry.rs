//! Tracing subscriber setup.
//!
//! Log levels are controlled with the standard `RUST_LOG` environment variable (default `info`).
//! Set `RUST_LOG=rolegate=debug` to see each access decision and the stored password hashes of
//! the seed users at startup. Plaintext passwords are never logged.

use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::LogFormat;

/// Initialize the global tracing subscriber with console output in the requested format.
pub fn init_telemetry(format: LogFormat) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match format {
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .try_init()?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
                .try_init()?;
        }
    }

    info!("Telemetry initialized ({:?} output)", format);
    Ok(())
}
