//! Logging configuration using tracing
//!
//! The terminal UI owns stdout, so logs go to a daily rolling file under
//! `<data_local_dir>/neonchat/logs/`. The filter comes from `NEONCHAT_LOG`:
//!
//! ```bash
//! NEONCHAT_LOG=debug neonchat
//! NEONCHAT_LOG=neonchat::session=trace neonchat
//! ```

use anyhow::Result;
use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_ENV: &str = "NEONCHAT_LOG";
const DEFAULT_FILTER: &str = "neonchat=info,warn";

pub fn init() -> Result<()> {
    let log_dir = log_directory();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "neonchat.log");

    let env_filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true)
                .with_timer(fmt::time::ChronoLocal::new(
                    "%Y-%m-%d %H:%M:%S%.3f".to_string(),
                )),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))?;

    tracing::info!(log_dir = %log_dir.display(), "neonchat starting");
    Ok(())
}

pub fn log_directory() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("neonchat").join("logs")
}
