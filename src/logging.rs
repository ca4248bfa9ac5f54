//! Logger initialization (spec.md §6 `log_config`). Grounded on the
//! teacher's `tracing`/`tracing-subscriber` usage throughout
//! `sveitser-espresso-network` (e.g. `config.logging.init()` in
//! `staking-cli/src/bin/staking-cli.rs`), with `tracing-appender` added for
//! the rolling file sink the original Go `lumberjack`-backed logger
//! provides.
//!
//! `tracing-appender`'s rolling writer rotates on a time interval and a
//! file count, not on a byte size, so `max_file_size_in_mb` is accepted and
//! validated (see [`crate::config::LogConfig`]) but not enforced here — no
//! crate in the teacher's stack does size-based rotation, and hand-rolling
//! one would be exactly the "bare-stdlib substitute" the project rules rule
//! out.

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogConfig;

/// Holds the non-blocking file writer's flush guard alive for the process
/// lifetime. Dropping it would silently stop the file sink.
pub struct LoggerGuard {
    _file_guard: Option<WorkerGuard>,
}

pub fn init(cfg: &LogConfig) -> Result<LoggerGuard> {
    let filter = EnvFilter::try_new(&cfg.level)
        .or_else(|_| EnvFilter::try_new("info"))
        .context("building log level filter")?;

    let registry = tracing_subscriber::registry().with(filter);

    let (file_layer, file_guard) = if cfg.use_file_logger {
        let directory = std::path::Path::new(&cfg.filename)
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| std::path::Path::new("."));
        let file_name = std::path::Path::new(&cfg.filename)
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_else(|| "relayer.log".to_string());

        let appender = tracing_appender::rolling::Builder::new()
            .rotation(tracing_appender::rolling::Rotation::DAILY)
            .filename_prefix(file_name)
            .max_log_files(cfg.max_backups_of_log_files)
            .build(directory)
            .context("building rolling file appender")?;
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        let layer = fmt::layer().with_writer(non_blocking).with_ansi(false);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    let console_layer = if cfg.use_console_logger {
        Some(fmt::layer())
    } else {
        None
    };

    registry.with(file_layer).with(console_layer).try_init().ok();

    Ok(LoggerGuard {
        _file_guard: file_guard,
    })
}
