//! Sampler configuration.
//!
//! One immutable value built by the CLI and handed to the [`Poller`](crate::Poller);
//! nothing here is process-wide.

use std::time::Duration;

pub const DEFAULT_SLEEP_MS: u64 = 10;
pub const DEFAULT_MAX_TIME_SECS: u64 = 10;
/// Upper bound on thread ids considered per reconciliation.
pub const DEFAULT_MAX_THREADS: usize = 255;
/// Estimated samples per millisecond when sleeping is disabled.
pub const MAX_FREQUENCY_SAMPLES_PER_MS: u64 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplerConfig {
    /// Suppress progress output. Applied by the logging filter; does not
    /// affect the report.
    pub quiet: bool,
    /// Sleep between ticks; zero samples as fast as possible.
    pub sleep_ms: u64,
    /// Overall time ceiling for the run.
    pub max_time_secs: u64,
    /// Thread ids beyond this many in one listing are ignored.
    pub max_threads: usize,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            quiet: false,
            sleep_ms: DEFAULT_SLEEP_MS,
            max_time_secs: DEFAULT_MAX_TIME_SECS,
            max_threads: DEFAULT_MAX_THREADS,
        }
    }
}

impl SamplerConfig {
    pub fn ceiling_ms(&self) -> u64 {
        self.max_time_secs.saturating_mul(1000)
    }

    /// Number of sample slots each thread gets.
    ///
    /// Floor division, so a run whose timing drifts can execute more ticks
    /// than this; the loop bound keeps sampling inside the budget.
    pub fn max_samples(&self) -> usize {
        let samples = if self.sleep_ms == 0 {
            self.ceiling_ms().saturating_mul(MAX_FREQUENCY_SAMPLES_PER_MS)
        } else {
            self.ceiling_ms() / self.sleep_ms
        };
        usize::try_from(samples).unwrap_or(usize::MAX)
    }

    pub fn sleep_interval(&self) -> Option<Duration> {
        (self.sleep_ms > 0).then(|| Duration::from_millis(self.sleep_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_budget_is_thousand_samples() {
        let config = SamplerConfig::default();
        assert_eq!(config.ceiling_ms(), 10_000);
        assert_eq!(config.max_samples(), 1_000);
        assert_eq!(config.sleep_interval(), Some(Duration::from_millis(10)));
    }

    #[test]
    fn zero_sleep_uses_high_frequency_estimate() {
        let config = SamplerConfig {
            sleep_ms: 0,
            max_time_secs: 1,
            ..SamplerConfig::default()
        };
        assert_eq!(config.max_samples(), 3_000);
        assert_eq!(config.sleep_interval(), None);
    }

    #[test]
    fn budget_floors_uneven_intervals() {
        let config = SamplerConfig {
            sleep_ms: 3,
            max_time_secs: 1,
            ..SamplerConfig::default()
        };
        assert_eq!(config.max_samples(), 333);
    }

    #[test]
    fn interval_longer_than_ceiling_yields_empty_budget() {
        let config = SamplerConfig {
            sleep_ms: 5_000,
            max_time_secs: 1,
            ..SamplerConfig::default()
        };
        assert_eq!(config.max_samples(), 0);
    }
}
