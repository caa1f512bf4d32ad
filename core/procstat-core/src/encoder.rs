//! Run-length encoding of per-thread state timelines into transition records.
//!
//! Each thread carries an open interval (state, start tick, start timestamp).
//! When a later sample has a different state the interval is closed and one
//! record is emitted. The first state of a thread only opens an interval, and
//! the interval still open at the end of the run is never emitted.
//!
//! Records are produced tick by tick (main thread first, then discovered
//! threads in discovery order), so output for different threads interleaves.

use crate::error::{ProcstatError, Result};
use crate::thread::TrackedThread;
use crate::thread_set::ThreadSet;
use std::convert::Infallible;
use std::io::Write;

pub const CSV_HEADER: &str = "tid,name,state,new_state,start,end,samples";

/// One closed interval of constant state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition<'a> {
    pub tid: u32,
    pub name: &'a str,
    pub state: char,
    pub new_state: char,
    pub start_ms: i64,
    pub end_ms: i64,
    /// Ticks spent in `state`.
    pub samples: usize,
}

impl Transition<'_> {
    pub fn write_csv<W: Write + ?Sized>(&self, out: &mut W) -> std::io::Result<()> {
        writeln!(
            out,
            "{},{},{},{},{},{},{}",
            self.tid,
            self.name,
            self.state,
            self.new_state,
            self.start_ms,
            self.end_ms,
            self.samples
        )
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct DiffCursor {
    prev_index: usize,
    prev_state: Option<char>,
    prev_timestamp: i64,
}

impl DiffCursor {
    fn advance<'a>(&mut self, thread: &'a TrackedThread, tick: usize) -> Option<Transition<'a>> {
        let sample = thread.sample_at(tick)?;
        if self.prev_state == Some(sample.state) {
            return None;
        }

        let transition = self.prev_state.map(|state| Transition {
            tid: thread.tid(),
            name: thread.name(),
            state,
            new_state: sample.state,
            start_ms: self.prev_timestamp,
            end_ms: sample.timestamp_ms,
            samples: tick - self.prev_index,
        });

        self.prev_state = Some(sample.state);
        self.prev_timestamp = sample.timestamp_ms;
        self.prev_index = tick;
        transition
    }
}

/// Walks a [`ThreadSet`] and emits its state transitions.
///
/// Cursors are rebuilt on every pass, so encoding never depends on earlier
/// passes over the same set.
#[derive(Debug, Default)]
pub struct TransitionEncoder {
    cursors: Vec<DiffCursor>,
}

impl TransitionEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Visits every transition among the first `collected` ticks, in output order.
    ///
    /// Stops at the first error returned by `visit`.
    pub fn for_each<'a, E, F>(
        &mut self,
        set: &'a ThreadSet,
        collected: usize,
        mut visit: F,
    ) -> std::result::Result<(), E>
    where
        F: FnMut(Transition<'a>) -> std::result::Result<(), E>,
    {
        self.cursors.clear();
        self.cursors.resize(set.count() + 1, DiffCursor::default());

        let collected = collected.min(set.max_samples());
        for tick in 0..collected {
            for (cursor, thread) in self.cursors.iter_mut().zip(set.iter()) {
                if let Some(transition) = cursor.advance(thread, tick) {
                    visit(transition)?;
                }
            }
        }
        Ok(())
    }

    pub fn encode<'a>(&mut self, set: &'a ThreadSet, collected: usize) -> Vec<Transition<'a>> {
        let mut transitions = Vec::new();
        let visited = self.for_each(set, collected, |transition| {
            transitions.push(transition);
            Ok::<(), Infallible>(())
        });
        match visited {
            Ok(()) => transitions,
            Err(never) => match never {},
        }
    }

    /// Writes the CSV header and one line per transition; returns the record count.
    pub fn write_csv<W: Write + ?Sized>(
        &mut self,
        out: &mut W,
        set: &ThreadSet,
        collected: usize,
    ) -> Result<usize> {
        writeln!(out, "{CSV_HEADER}")
            .map_err(|err| ProcstatError::io("Failed to write report header", err))?;

        let mut written = 0;
        self.for_each(set, collected, |transition| {
            transition
                .write_csv(out)
                .map_err(|err| ProcstatError::io("Failed to write transition", err))?;
            written += 1;
            Ok::<(), ProcstatError>(())
        })?;

        out.flush()
            .map_err(|err| ProcstatError::io("Failed to flush report", err))?;
        Ok(written)
    }
}
