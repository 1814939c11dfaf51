//! Log Summary - structured telemetry extracted from a training log

use serde::{Deserialize, Serialize};

/// Timing and validation telemetry of one completed run.
///
/// Immutable once computed. Times are in seconds; `prep_time` and
/// `final_time` are relative to the start of the run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogSummary {
    start_time: f64,
    prep_time: f64,
    final_time: f64,
    total_epochs: usize,
    epoch_durations: Vec<i64>,
    valid_metrics: Vec<f64>,
}

impl LogSummary {
    pub(crate) fn new(
        start_time: f64,
        prep_time: f64,
        final_time: f64,
        epoch_durations: Vec<i64>,
        valid_metrics: Vec<f64>,
    ) -> Self {
        Self {
            start_time,
            prep_time,
            final_time,
            total_epochs: epoch_durations.len(),
            epoch_durations,
            valid_metrics,
        }
    }

    /// Absolute start of the run, in fractional epoch seconds.
    #[must_use]
    pub const fn start_time(&self) -> f64 {
        self.start_time
    }

    /// Seconds from run start to the end of the preparation phase.
    #[must_use]
    pub const fn prep_time(&self) -> f64 {
        self.prep_time
    }

    /// Seconds from run start to the last clocked log line.
    #[must_use]
    pub const fn final_time(&self) -> f64 {
        self.final_time
    }

    /// Number of epochs observed.
    #[must_use]
    pub const fn total_epochs(&self) -> usize {
        self.total_epochs
    }

    /// Whole seconds spent in each epoch, in log order.
    #[must_use]
    pub fn epoch_durations(&self) -> &[i64] {
        &self.epoch_durations
    }

    /// Validation readings, in log order.
    #[must_use]
    pub fn valid_metrics(&self) -> &[f64] {
        &self.valid_metrics
    }

    /// Seconds spent after preparation.
    #[must_use]
    pub fn training_time(&self) -> f64 {
        self.final_time - self.prep_time
    }
}
