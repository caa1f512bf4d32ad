//! The sampling loop.
//!
//! A run reconciles the thread set and samples every thread once per tick
//! until the sample budget or the time ceiling is exhausted, then writes the
//! transition report.

use crate::clock::Clock;
use crate::config::SamplerConfig;
use crate::encoder::TransitionEncoder;
use crate::error::Result;
use crate::proc_source::{CpuTimes, ProcSource};
use crate::thread_set::ThreadSet;
use std::io::Write;
use tracing::{debug, info, warn};

const PROGRESS_INTERVAL_MS: i64 = 2000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadSummary {
    pub tid: u32,
    pub name: String,
    pub alive: bool,
    pub first_tick: Option<usize>,
}

/// What a finished run observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub pid: u32,
    pub max_samples: usize,
    pub collected_samples: usize,
    pub elapsed_ms: i64,
    pub main_thread_name: String,
    /// Discovered threads in discovery order, main thread excluded.
    pub threads: Vec<ThreadSummary>,
    pub transitions: usize,
    /// System-wide CPU time spent during the run, when available.
    pub cpu: Option<CpuTimes>,
}

impl RunSummary {
    fn from_set(set: &ThreadSet, collected_samples: usize, elapsed_ms: i64) -> Self {
        Self {
            pid: set.pid(),
            max_samples: set.max_samples(),
            collected_samples,
            elapsed_ms,
            main_thread_name: set.main_thread().name().to_string(),
            threads: set
                .threads()
                .iter()
                .map(|thread| ThreadSummary {
                    tid: thread.tid(),
                    name: thread.name().to_string(),
                    alive: thread.is_alive(),
                    first_tick: thread.first_tick(),
                })
                .collect(),
            transitions: 0,
            cpu: None,
        }
    }

    fn log(&self) {
        info!(
            pid = self.pid,
            threads = self.threads.len(),
            main_thread = %self.main_thread_name,
            "Thread count"
        );
        for (index, thread) in self.threads.iter().enumerate() {
            info!(
                index,
                tid = thread.tid,
                name = %thread.name,
                alive = thread.alive,
                "Thread"
            );
        }
        info!(
            collected = self.collected_samples,
            max = self.max_samples,
            elapsed_ms = self.elapsed_ms,
            "Collected samples"
        );
        if let Some(cpu) = self.cpu {
            info!(
                user = cpu.user,
                nice = cpu.nice,
                system = cpu.system,
                "System CPU jiffies during run"
            );
        }
    }
}

#[derive(Debug)]
pub struct Poller<S: ProcSource, C: Clock> {
    pid: u32,
    config: SamplerConfig,
    source: S,
    clock: C,
}

impl<S: ProcSource, C: Clock> Poller<S, C> {
    pub fn new(pid: u32, config: SamplerConfig, source: S, clock: C) -> Self {
        Self {
            pid,
            config,
            source,
            clock,
        }
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Samples the target until the budget runs out and writes the CSV report to `out`.
    ///
    /// Fails before writing anything if the target cannot be listed at start.
    /// A target that exits mid-run is not an error: its threads turn dead.
    pub fn run<W: Write + ?Sized>(&mut self, out: &mut W) -> Result<RunSummary> {
        let max_samples = self.config.max_samples();
        let ceiling_ms = i64::try_from(self.config.ceiling_ms()).unwrap_or(i64::MAX);
        let sleep_interval = self.config.sleep_interval();
        info!(
            pid = self.pid,
            time_secs = self.config.max_time_secs,
            sleep_ms = self.config.sleep_ms,
            max_samples,
            "Sampling started"
        );

        let start_time = self.clock.now_millis();
        let cpu_before = self.source.read_cpu_times();

        let mut set = ThreadSet::new(self.pid, max_samples, self.config.max_threads);
        set.reconcile(&self.source)?;

        let mut target_gone = false;
        let mut progress_index = 0;
        let mut progress_time = start_time;
        let mut tick = 0;
        while tick < max_samples {
            let now = self.clock.now_millis();
            if now - start_time >= ceiling_ms {
                info!(tick, "Time limit exceeded, stopping");
                break;
            }

            if tick > 0 {
                if let Err(err) = set.reconcile(&self.source) {
                    if !target_gone {
                        warn!(pid = self.pid, tick, error = %err, "Target process disappeared");
                        target_gone = true;
                    }
                    debug!(tick, error = %err, "Reconciliation failed");
                } else {
                    target_gone = false;
                }
            }
            set.sample_all(&self.source, &self.clock, tick)?;
            tick += 1;

            if now - progress_time >= PROGRESS_INTERVAL_MS {
                info!(
                    samples = tick - progress_index,
                    elapsed_ms = now - progress_time,
                    "Collected samples"
                );
                progress_time = now;
                progress_index = tick;
            }

            if let Some(interval) = sleep_interval {
                self.clock.sleep(interval);
            }
        }

        let collected_samples = tick;
        let elapsed_ms = self.clock.now_millis() - start_time;
        let mut summary = RunSummary::from_set(&set, collected_samples, elapsed_ms);
        summary.cpu = cpu_before
            .zip(self.source.read_cpu_times())
            .map(|(before, after)| after.saturating_sub(&before));
        summary.log();

        summary.transitions = TransitionEncoder::new().write_csv(out, &set, collected_samples)?;
        Ok(summary)
    }
}
