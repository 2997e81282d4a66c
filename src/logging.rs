//! Logging configuration using the tracing ecosystem.
//!
//! Logs go to a daily rotating file so that stdout and stderr carry only
//! the JSON results and error reports.

use std::path::PathBuf;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

/// Default log filter if `RUST_LOG` is not set.
const DEFAULT_LOG_FILTER: &str = "atlassian_gateway=info,warn";

/// Filter used with `--debug` when `RUST_LOG` is not set.
const DEBUG_LOG_FILTER: &str = "atlassian_gateway=debug,warn";

/// Initialize the logging system.
///
/// Logs are stored under the platform local data directory, in
/// `atlgate/logs/`. `RUST_LOG` overrides the level.
///
/// # Errors
///
/// Returns an error if the log directory cannot be determined or created,
/// or a global subscriber is already set.
pub fn init(debug: bool) -> anyhow::Result<()> {
    let log_dir = get_log_directory()?;
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "atlgate.log");

    let subscriber = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .with(filter(debug));

    tracing::subscriber::set_global_default(subscriber)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "atlgate starting up");
    tracing::debug!(log_dir = %log_dir.display(), "Log directory");

    Ok(())
}

fn filter(debug: bool) -> EnvFilter {
    let default = if debug {
        DEBUG_LOG_FILTER
    } else {
        DEFAULT_LOG_FILTER
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Returns the platform local data directory with `atlgate/logs` appended.
fn get_log_directory() -> anyhow::Result<PathBuf> {
    let base_dir = dirs::data_local_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine local data directory"))?;

    Ok(base_dir.join("atlgate").join("logs"))
}

/// Initialize logging, falling back to stderr under `--debug` when the log
/// file cannot be set up. Without `--debug` a failure leaves logging off.
///
/// Returns whether file logging is active.
pub fn init_with_fallback(debug: bool) -> bool {
    let err = match init(debug) {
        Ok(()) => return true,
        Err(e) => e,
    };

    if debug {
        let fallback = tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .with_env_filter(filter(true))
            .try_init();
        if fallback.is_ok() {
            tracing::warn!("File logging unavailable, logging to stderr: {}", err);
        }
    }
    false
}

/// Log a clean exit.
pub fn shutdown(exit_code: u8) {
    tracing::info!(exit_code, "atlgate shutting down");
}
