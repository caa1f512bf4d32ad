//! Logging bootstrap for the procstat binary.
//!
//! Logs go to stderr through a non-blocking writer so stdout carries only the
//! CSV report. Keep the returned guard alive until exit or buffered lines are
//! lost.

use std::env;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const DEBUG_LOG_ENV: &str = "PROCSTAT_DEBUG_LOG";

pub fn init(quiet: bool) -> WorkerGuard {
    let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());
    tracing_subscriber::fmt()
        .with_env_filter(filter(quiet))
        .with_writer(writer)
        .with_target(false)
        .init();
    guard
}

fn filter(quiet: bool) -> EnvFilter {
    if debug_enabled() {
        EnvFilter::new("debug")
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

fn debug_enabled() -> bool {
    env::var(DEBUG_LOG_ENV)
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false)
}
