//! # procstat-core
//!
//! Sampling engine for procstat: watches every thread of a live process,
//! records one scheduling-state sample per thread per tick, and encodes the
//! resulting timelines as run-length state transitions.
//!
//! ## Design Principles
//!
//! - **Synchronous**: one logical thread of control, no async runtime.
//! - **Single writer**: the [`ThreadSet`] owns every sample buffer; threads are
//!   addressed by index, never by long-lived reference.
//! - **Loss-aware**: a thread that cannot be read is recorded as dead for that
//!   tick instead of leaving a gap.
//! - **Pluggable OS access**: `/proc` is reached through [`ProcSource`] and time
//!   through [`Clock`], so the engine runs against fakes in tests.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use procstat_core::{Poller, ProcFs, SamplerConfig, SystemClock};
//!
//! let config = SamplerConfig::default();
//! let mut poller = Poller::new(pid, config, ProcFs::default(), SystemClock);
//! let summary = poller.run(&mut std::io::stdout().lock())?;
//! ```

pub mod clock;
pub mod config;
pub mod encoder;
pub mod error;
pub mod poller;
pub mod proc_source;
pub mod status;
pub mod thread;
pub mod thread_set;

pub use clock::{Clock, SystemClock};
pub use config::SamplerConfig;
pub use encoder::{Transition, TransitionEncoder, CSV_HEADER};
pub use error::{ProcstatError, Result};
pub use poller::{Poller, RunSummary, ThreadSummary};
pub use proc_source::{CpuTimes, ProcFs, ProcSource};
pub use status::{parse_status_line, StatusRecord};
pub use thread::{Sample, TrackedThread, DEAD_STATE};
pub use thread_set::{ReconcileReport, ThreadSet};
