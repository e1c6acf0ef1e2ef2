//! Logging configuration using tracing

use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::Result;
use crate::types::Role;

/// Initialize the logging subsystem
///
/// Logs are written to `~/.local/share/solo/logs/`, never to stdout: a caller
/// prints query replies there.
/// Log level is controlled by the `SOLO_LOG` environment variable.
///
/// # Examples
/// ```bash
/// SOLO_LOG=debug solo --play-pause
/// SOLO_LOG=solo_transport=trace solo movie.mkv
/// ```
pub fn init() -> Result<()> {
    let log_dir = get_log_directory()?;
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "solo.log");

    // Default to info, allow override via SOLO_LOG
    let env_filter =
        EnvFilter::try_from_env("SOLO_LOG").unwrap_or_else(|_| EnvFilter::new("solo=info,warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true)
                .with_timer(fmt::time::ChronoLocal::new(
                    "%Y-%m-%d %H:%M:%S%.3f".to_string(),
                )),
        )
        .init();

    tracing::debug!("Log directory: {}", log_dir.display());

    Ok(())
}

/// Write the startup banner once the process knows its role.
pub fn log_startup(role: Role, pid: u32) {
    tracing::info!("═══════════════════════════════════════════════════════");
    tracing::info!("solo starting as {} (pid {})", role, pid);
    tracing::info!("═══════════════════════════════════════════════════════");
}

/// Get the log directory path
fn get_log_directory() -> Result<PathBuf> {
    let base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    Ok(base.join("solo").join("logs"))
}

