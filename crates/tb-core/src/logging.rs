//! Logging initialization using the `tracing` ecosystem.
//!
//! Console output is always on. When a log directory is given, a second
//! layer writes to a daily-rotating file through a non-blocking writer so the
//! polling loop never waits on disk I/O. `RUST_LOG` overrides the level.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the global tracing subscriber.
///
/// Call once at program start. The returned guard flushes the file writer
/// when dropped and must be held for the life of the process.
///
/// # Parameters
///
/// - `log_level`: default level if `RUST_LOG` env var is not set (e.g. `"info"`)
/// - `log_dir`: optional directory for daily-rotating log files
/// - `module_name`: used as the log file prefix (e.g. `"trade_bridge"`)
pub fn init_logging(log_level: &str, log_dir: Option<&str>, module_name: &str) -> Option<WorkerGuard> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let console_layer = fmt::layer().with_target(true).with_thread_names(true).with_ansi(true);

    let Some(dir) = log_dir else {
        tracing_subscriber::registry().with(env_filter).with(console_layer).init();
        return None;
    };

    if let Err(e) = std::fs::create_dir_all(dir) {
        eprintln!("cannot create log directory {dir}: {e}; logging to console only");
        tracing_subscriber::registry().with(env_filter).with(console_layer).init();
        return None;
    }

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, module_name));
    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_thread_names(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();
    Some(guard)
}
