use std::fs;

use kiln_core::ReplConfig;
use kiln_infrastructure::KilnPaths;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "KILN_LOG";

/// Installs a file-backed subscriber so logs never mix with the prompt.
///
/// Returns the writer guard, which must outlive the read loop. Logging is
/// skipped when the log directory cannot be resolved or created.
pub fn init(config: &ReplConfig) -> Option<WorkerGuard> {
    let log_dir = KilnPaths::logs_dir().ok()?;
    fs::create_dir_all(&log_dir).ok()?;

    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let file_appender = tracing_appender::rolling::daily(&log_dir, "kiln.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .ok()?;

    tracing::info!("Logging to {}", log_dir.display());
    Some(guard)
}
