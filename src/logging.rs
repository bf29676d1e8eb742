use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config;

const LOG_FILE_BASENAME: &str = "superconductor-bridge.log";
const LOG_DIR_ENV: &str = "SUPERCONDUCTOR_BRIDGE_LOG_PATH";
const LOG_RETENTION: Duration = Duration::from_secs(60 * 60 * 24 * 7);

/// Used when `RUST_LOG` is unset; the HTTP stack is chatty at info
const DEFAULT_FILTER: &str = "info,reqwest=warn,hyper=warn,hyper_util=warn";

/// Subsystem for macOS unified logging (os_log).
#[cfg(target_os = "macos")]
const OSLOG_SUBSYSTEM: &str = "dev.superconductor.bridge";

/// Log to a daily file, stderr and (on macOS) os_log
///
/// stdout is left to the console host. The returned guard flushes the file
/// writer when dropped.
pub fn init_logging() -> Result<WorkerGuard> {
    let log_dir = resolve_log_dir()?;
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory: {:?}", log_dir))?;
    let pruned = prune_old_logs(&log_dir, LOG_RETENTION);

    let file_appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_BASENAME);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    #[cfg(target_os = "macos")]
    let platform_layer = Some(tracing_oslog::OsLogger::new(OSLOG_SUBSYSTEM, "default"));
    #[cfg(not(target_os = "macos"))]
    let platform_layer: Option<tracing_subscriber::layer::Identity> = None;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(platform_layer)
        .init();

    info!("Logging to {:?}", log_dir);
    if pruned > 0 {
        debug!("Removed {} log files older than {:?}", pruned, LOG_RETENTION);
    }

    Ok(guard)
}

fn resolve_log_dir() -> Result<PathBuf> {
    if let Ok(override_path) = std::env::var(LOG_DIR_ENV) {
        return Ok(PathBuf::from(override_path));
    }

    let dirs = config::project_dirs()?;
    // Linux keeps logs under XDG state, elsewhere next to local data
    let base = dirs.state_dir().unwrap_or_else(|| dirs.data_local_dir());
    Ok(base.join("logs"))
}

/// Delete our rotated log files older than `max_age`; returns how many went
fn prune_old_logs(log_dir: &Path, max_age: Duration) -> usize {
    let Some(cutoff) = SystemTime::now().checked_sub(max_age) else {
        return 0;
    };
    let Ok(entries) = std::fs::read_dir(log_dir) else {
        return 0;
    };

    entries
        .flatten()
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with(LOG_FILE_BASENAME))
        })
        .filter(|entry| {
            entry
                .metadata()
                .and_then(|metadata| metadata.modified())
                .is_ok_and(|modified| modified < cutoff)
        })
        .filter(|entry| std::fs::remove_file(entry.path()).is_ok())
        .count()
}
