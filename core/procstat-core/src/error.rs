//! Error types for procstat-core operations.

/// All errors that can end a sampling run.
///
/// Per-thread read failures are not errors: they are absorbed into the dead
/// state for the tick in which they happen.
#[derive(Debug, thiserror::Error)]
pub enum ProcstatError {
    // ─────────────────────────────────────────────────────────────────────
    // Target Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Process {pid} not found or unreadable: {source}")]
    ProcessNotFound {
        pid: u32,
        #[source]
        source: std::io::Error,
    },

    // ─────────────────────────────────────────────────────────────────────
    // Invariant Violations
    // ─────────────────────────────────────────────────────────────────────
    #[error("Buffer overrun: max samples {max_samples}, tried to sample index {index}")]
    SampleOverflow { index: usize, max_samples: usize },

    // ─────────────────────────────────────────────────────────────────────
    // I/O Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience type alias for Results using ProcstatError.
pub type Result<T> = std::result::Result<T, ProcstatError>;

impl ProcstatError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        ProcstatError::Io {
            context: context.into(),
            source,
        }
    }
}
