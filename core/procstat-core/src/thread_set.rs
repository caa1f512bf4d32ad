//! The set of threads tracked for one target process.
//!
//! The main thread (tid == target pid) is always present. Other threads are
//! discovered by reconciliation, appended in discovery order, and never
//! removed: a thread that disappears keeps its slot and records dead samples.

use crate::clock::Clock;
use crate::error::{ProcstatError, Result};
use crate::proc_source::ProcSource;
use crate::thread::TrackedThread;
use std::collections::HashMap;

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Ids reported by the OS, before capacity truncation.
    pub listed: usize,
    /// Ids seen for the first time, in the order they were added.
    pub new_tids: Vec<u32>,
    /// Ids ignored because the listing exceeded the thread capacity.
    pub dropped: usize,
}

#[derive(Debug)]
pub struct ThreadSet {
    pid: u32,
    max_samples: usize,
    max_threads: usize,
    main_thread: TrackedThread,
    threads: Vec<TrackedThread>,
    index: HashMap<u32, usize>,
}

impl ThreadSet {
    pub fn new(pid: u32, max_samples: usize, max_threads: usize) -> Self {
        Self {
            pid,
            max_samples,
            max_threads,
            main_thread: TrackedThread::new(pid, max_samples),
            threads: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn max_samples(&self) -> usize {
        self.max_samples
    }

    /// Number of discovered threads, excluding the main thread.
    pub fn count(&self) -> usize {
        self.threads.len()
    }

    pub fn main_thread(&self) -> &TrackedThread {
        &self.main_thread
    }

    /// Discovered threads in discovery order.
    pub fn threads(&self) -> &[TrackedThread] {
        &self.threads
    }

    /// Main thread first, then discovered threads in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &TrackedThread> + '_ {
        std::iter::once(&self.main_thread).chain(self.threads.iter())
    }

    pub fn contains(&self, tid: u32) -> bool {
        self.index.contains_key(&tid)
    }

    pub fn get(&self, tid: u32) -> Option<&TrackedThread> {
        if tid == self.pid {
            return Some(&self.main_thread);
        }
        self.index.get(&tid).map(|&slot| &self.threads[slot])
    }

    /// Refreshes liveness of known threads and appends newly listed ones.
    ///
    /// Fails only when the OS listing for the process is unavailable.
    pub fn reconcile<S>(&mut self, source: &S) -> Result<ReconcileReport>
    where
        S: ProcSource + ?Sized,
    {
        for thread in &mut self.threads {
            thread.set_alive(false);
        }

        let mut listed = source
            .list_thread_ids(self.pid)
            .map_err(|err| ProcstatError::ProcessNotFound {
                pid: self.pid,
                source: err,
            })?;

        let mut report = ReconcileReport {
            listed: listed.len(),
            ..ReconcileReport::default()
        };
        if listed.len() > self.max_threads {
            report.dropped = listed.len() - self.max_threads;
            listed.truncate(self.max_threads);
            tracing::debug!(
                pid = self.pid,
                dropped = report.dropped,
                max_threads = self.max_threads,
                "Thread listing exceeds capacity, ignoring extra ids"
            );
        }

        for tid in listed {
            if tid == self.pid {
                continue;
            }
            match self.index.get(&tid) {
                Some(&slot) => self.threads[slot].set_alive(true),
                None if !report.new_tids.contains(&tid) => report.new_tids.push(tid),
                None => {}
            }
        }

        if !report.new_tids.is_empty() {
            tracing::info!(
                count = report.new_tids.len(),
                tids = ?report.new_tids,
                "New threads"
            );
            self.threads.reserve(report.new_tids.len());
            for &tid in &report.new_tids {
                self.index.insert(tid, self.threads.len());
                self.threads.push(TrackedThread::new(tid, self.max_samples));
            }
        }

        Ok(report)
    }

    /// Records one sample per tracked thread at `tick`.
    ///
    /// Dead threads get a synthetic dead sample so every timeline stays dense.
    pub fn sample_all<S, C>(&mut self, source: &S, clock: &C, tick: usize) -> Result<()>
    where
        S: ProcSource + ?Sized,
        C: Clock + ?Sized,
    {
        if tick >= self.max_samples {
            return Err(ProcstatError::SampleOverflow {
                index: tick,
                max_samples: self.max_samples,
            });
        }
        let dead_time = clock.now_millis();

        self.main_thread.sample(source, clock, tick)?;
        for thread in &mut self.threads {
            if thread.is_alive() {
                thread.sample(source, clock, tick)?;
            } else {
                thread.record_dead(tick, dead_time)?;
            }
        }
        Ok(())
    }
}
