//! Single-pass line scanner
//!
//! Every line is checked against all rules in a fixed order: the runtime
//! clock first, so markers on the same line see that line's clock.

use super::{LineRules, LogSummary};
use crate::timecodec::{duration_seconds, epoch_seconds, parse_absolute, parse_clock};
use crate::{Error, Result};
use chrono::{DateTime, TimeDelta, Utc};

/// Where the scan stands relative to the two one-shot markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No start stamp seen yet.
    AwaitingStart,
    /// Start stamp seen, preparation still running.
    AwaitingPrep,
    /// Preparation finished; epoch boundaries are being recorded.
    InEpochs,
}

/// Stateful scanner over the lines of one log.
#[derive(Debug)]
pub struct Scanner<'r> {
    rules: &'r LineRules,
    start_time: Option<DateTime<Utc>>,
    current_runtime: TimeDelta,
    final_time: TimeDelta,
    prep_time: Option<TimeDelta>,
    boundaries: Vec<TimeDelta>,
    valid_metrics: Vec<f64>,
    lines_seen: usize,
}

impl<'r> Scanner<'r> {
    /// Create a scanner that applies `rules`.
    #[must_use]
    pub fn new(rules: &'r LineRules) -> Self {
        Self {
            rules,
            start_time: None,
            current_runtime: TimeDelta::zero(),
            final_time: TimeDelta::zero(),
            prep_time: None,
            boundaries: Vec::new(),
            valid_metrics: Vec::new(),
            lines_seen: 0,
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        if self.prep_time.is_some() {
            Phase::InEpochs
        } else if self.start_time.is_some() {
            Phase::AwaitingPrep
        } else {
            Phase::AwaitingStart
        }
    }

    /// Epoch boundaries recorded so far, prep boundary first.
    #[must_use]
    pub fn boundaries(&self) -> &[TimeDelta] {
        &self.boundaries
    }

    /// Feed one line.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedTime`] if a matched clock or start stamp
    /// cannot be decoded.
    pub fn feed(&mut self, line: &str) -> Result<()> {
        self.lines_seen += 1;

        if let Some(clock) = self.rules.match_runtime(line) {
            self.current_runtime = parse_clock(clock)?;
            self.final_time = self.current_runtime;
        }

        if self.start_time.is_none() {
            if let Some(stamp) = self.rules.match_start(line) {
                self.start_time = Some(parse_absolute(stamp)?);
                tracing::debug!(line = self.lines_seen, stamp, "start marker");
            }
        }

        if self.prep_time.is_none() && self.rules.is_prep_marker(line) {
            self.prep_time = Some(self.current_runtime);
            self.boundaries.push(self.current_runtime);
            tracing::debug!(
                line = self.lines_seen,
                runtime = self.current_runtime.num_seconds(),
                "preparation marker"
            );
        }

        if self.rules.is_epoch_boundary(line) {
            if self.phase() == Phase::InEpochs {
                self.boundaries.push(self.current_runtime);
            } else {
                tracing::debug!(line = self.lines_seen, "epoch marker before preparation ignored");
            }
        }

        if let Some(raw) = self.rules.match_valid_metric(line) {
            match raw.parse::<f64>() {
                Ok(value) => self.valid_metrics.push(value),
                Err(_) => {
                    tracing::warn!(line = self.lines_seen, raw, "unparseable validation reading");
                }
            }
        }

        Ok(())
    }

    /// Close the scan and build the summary.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingStartMarker`] or
    /// [`Error::MissingPreparationMarker`] when the respective marker never
    /// appeared.
    pub fn finish(self) -> Result<LogSummary> {
        let start_time = self.start_time.ok_or(Error::MissingStartMarker)?;
        let prep_time = self.prep_time.ok_or(Error::MissingPreparationMarker)?;

        let epoch_durations: Vec<i64> = self
            .boundaries
            .windows(2)
            .map(|pair| (pair[1] - pair[0]).num_seconds())
            .collect();

        Ok(LogSummary::new(
            epoch_seconds(start_time),
            duration_seconds(prep_time),
            duration_seconds(self.final_time),
            epoch_durations,
            self.valid_metrics,
        ))
    }
}
