//! procstat: thread scheduling-state sampler.
//!
//! Samples the state of every thread of a live process at a fixed interval
//! and prints one CSV row per state transition when the run ends.
//!
//! ## Usage
//!
//! ```bash
//! procstat [-q] [-s SLEEP_MS] [-t SECONDS] PID > transitions.csv
//! ```
//!
//! Progress goes to stderr; stdout carries only the report.

mod logging;

use clap::Parser;
use procstat_core::config::{DEFAULT_MAX_THREADS, DEFAULT_MAX_TIME_SECS, DEFAULT_SLEEP_MS};
use procstat_core::proc_source::DEFAULT_PROC_ROOT;
use procstat_core::{Poller, ProcFs, ProcstatError, RunSummary, SamplerConfig, SystemClock};
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "procstat")]
#[command(about = "Sample the scheduling state of every thread of a process")]
#[command(version)]
struct Cli {
    /// Suppress progress output (the report is still printed)
    #[arg(short, long)]
    quiet: bool,

    /// Sleep between samples in milliseconds; 0 samples as fast as possible
    #[arg(short = 's', long = "sleep", value_name = "SLEEP_MS", default_value_t = DEFAULT_SLEEP_MS)]
    sleep_ms: u64,

    /// Stop sampling after this many seconds
    #[arg(short = 't', long = "time", value_name = "SECONDS", default_value_t = DEFAULT_MAX_TIME_SECS)]
    max_time_secs: u64,

    /// Maximum number of threads considered per sample
    #[arg(long, value_name = "COUNT", default_value_t = DEFAULT_MAX_THREADS)]
    max_threads: usize,

    /// procfs mount point
    #[arg(long, value_name = "DIR", default_value = DEFAULT_PROC_ROOT, hide = true)]
    proc_root: PathBuf,

    /// Target process ID
    #[arg(value_name = "PID", value_parser = clap::value_parser!(u32).range(1..))]
    pid: u32,
}

impl Cli {
    fn config(&self) -> SamplerConfig {
        SamplerConfig {
            quiet: self.quiet,
            sleep_ms: self.sleep_ms,
            max_time_secs: self.max_time_secs,
            max_threads: self.max_threads,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = cli.config();
    let _logging_guard = logging::init(config.quiet);

    match run(cli.pid, config, ProcFs::new(cli.proc_root)) {
        Ok(summary) => {
            tracing::debug!(
                transitions = summary.transitions,
                collected = summary.collected_samples,
                "Report written"
            );
            ExitCode::SUCCESS
        }
        Err(err @ ProcstatError::ProcessNotFound { .. }) => {
            tracing::error!(pid = cli.pid, error = %err, "Invalid target process");
            ExitCode::FAILURE
        }
        Err(err) => {
            tracing::error!(pid = cli.pid, error = %err, "procstat failed");
            ExitCode::FAILURE
        }
    }
}

fn run(pid: u32, config: SamplerConfig, source: ProcFs) -> Result<RunSummary, ProcstatError> {
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut poller = Poller::new(pid, config, source, SystemClock);
    poller.run(&mut out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_match_sampler_defaults() {
        let cli = Cli::try_parse_from(["procstat", "1234"]).unwrap();
        assert_eq!(cli.pid, 1234);
        assert_eq!(cli.config(), SamplerConfig::default());
        assert_eq!(cli.proc_root, PathBuf::from("/proc"));
    }

    #[test]
    fn short_flags_build_config() {
        let cli = Cli::try_parse_from(["procstat", "-q", "-s", "0", "-t", "3", "99"]).unwrap();
        let config = cli.config();
        assert!(config.quiet);
        assert_eq!(config.sleep_ms, 0);
        assert_eq!(config.max_time_secs, 3);
        assert_eq!(cli.pid, 99);
    }

    #[test]
    fn invalid_arguments_are_rejected() {
        for args in [
            vec!["procstat"],
            vec!["procstat", "0"],
            vec!["procstat", "abc"],
            vec!["procstat", "-x", "12"],
            vec!["procstat", "12", "-s"],
            vec!["procstat", "-t", "ten", "12"],
        ] {
            assert!(Cli::try_parse_from(&args).is_err(), "accepted {args:?}");
        }
    }
}
