//! One tracked OS thread and its per-tick sample buffer.

use crate::clock::Clock;
use crate::error::{ProcstatError, Result};
use crate::proc_source::ProcSource;
use crate::status::parse_status_line;

/// State code recorded for a thread that could not be observed.
pub const DEAD_STATE: char = 'X';

/// One observation of a thread's scheduling state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub timestamp_ms: i64,
    pub state: char,
}

/// A thread being sampled.
///
/// `samples` holds one slot per tick of the run. Slots for ticks before the
/// thread was discovered stay empty.
#[derive(Debug, Clone)]
pub struct TrackedThread {
    tid: u32,
    name: Option<String>,
    alive: bool,
    first_tick: Option<usize>,
    samples: Vec<Option<Sample>>,
}

impl TrackedThread {
    pub fn new(tid: u32, max_samples: usize) -> Self {
        Self {
            tid,
            name: None,
            alive: true,
            first_tick: None,
            samples: vec![None; max_samples],
        }
    }

    pub fn tid(&self) -> u32 {
        self.tid
    }

    /// Name from the first successful read; empty until then.
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub(crate) fn set_alive(&mut self, alive: bool) {
        self.alive = alive;
    }

    pub fn first_tick(&self) -> Option<usize> {
        self.first_tick
    }

    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    pub fn sample_at(&self, tick: usize) -> Option<&Sample> {
        self.samples.get(tick).and_then(Option::as_ref)
    }

    /// Samples recorded so far, in tick order, starting at the first tick.
    pub fn recorded(&self) -> impl Iterator<Item = (usize, &Sample)> + '_ {
        self.samples
            .iter()
            .enumerate()
            .filter_map(|(tick, slot)| slot.as_ref().map(|sample| (tick, sample)))
    }

    /// Reads the thread's status and records it at `tick`.
    ///
    /// An unreadable or malformed status marks the thread dead and records
    /// [`DEAD_STATE`]. Sampling past the buffer is an accounting bug and fails
    /// the run.
    pub fn sample<S, C>(&mut self, source: &S, clock: &C, tick: usize) -> Result<()>
    where
        S: ProcSource + ?Sized,
        C: Clock + ?Sized,
    {
        self.check_capacity(tick)?;
        let timestamp_ms = clock.now_millis();

        let Some(record) = source
            .read_status_line(self.tid)
            .as_deref()
            .and_then(parse_status_line)
        else {
            self.alive = false;
            tracing::debug!(tid = self.tid, tick, "Read failed, marking thread dead");
            self.store(tick, timestamp_ms, DEAD_STATE);
            return Ok(());
        };

        if record.pid != self.tid {
            tracing::debug!(
                tid = self.tid,
                reported = record.pid,
                "Status line reports a different id"
            );
        }
        if self.name.is_none() {
            self.name = Some(record.name);
        }
        self.store(tick, timestamp_ms, record.state);
        Ok(())
    }

    /// Records a dead sample without touching the OS.
    pub fn record_dead(&mut self, tick: usize, timestamp_ms: i64) -> Result<()> {
        self.check_capacity(tick)?;
        self.store(tick, timestamp_ms, DEAD_STATE);
        Ok(())
    }

    fn check_capacity(&self, tick: usize) -> Result<()> {
        if tick >= self.samples.len() {
            return Err(ProcstatError::SampleOverflow {
                index: tick,
                max_samples: self.samples.len(),
            });
        }
        Ok(())
    }

    fn store(&mut self, tick: usize, timestamp_ms: i64, state: char) {
        self.first_tick.get_or_insert(tick);
        self.samples[tick] = Some(Sample {
            timestamp_ms,
            state,
        });
    }
}
