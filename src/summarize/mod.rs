//! Training-log summarization
//!
//! Turns the free-form log of a finished run into a [`LogSummary`]:
//! wall-clock anchor, preparation time, per-epoch durations, total runtime
//! and the sequence of validation readings.
//!
//! ## Line rules
//!
//! ```text
//! START TIME: 2024-01-01 00:00:00.000000        -> start_time (first only)
//! [00:00:05] |Trainer| use single lr: 0.001      -> runtime, prep_time, first boundary
//! [00:00:15] |BaseLego| [epoch 1] GAUC 0.600     -> runtime, validation reading
//! [00:00:20] |BaseLego| [epoch 2] loss 0.4213    -> runtime, epoch boundary
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use evaltrack::summarize::LogSummarizer;
//!
//! let log = "START TIME: 2024-01-01 00:00:00.000000\n\
//!            [00:00:05] |Trainer| use single lr: 0.001\n\
//!            [00:00:20] |BaseLego| [epoch 1] loss 0.41\n";
//!
//! let summary = LogSummarizer::new().summarize(log).unwrap();
//! assert_eq!(summary.epoch_durations(), &[15]);
//! ```

mod log_summary;
mod rules;
mod scanner;

pub use log_summary::LogSummary;
pub use rules::{
    LineRules, LineRulesBuilder, DEFAULT_EPOCH_PATTERN, DEFAULT_PREP_MARKER,
    DEFAULT_RUNTIME_PATTERN, DEFAULT_START_PATTERN, DEFAULT_VALID_PATTERN,
};
pub use scanner::{Phase, Scanner};

use crate::Result;

/// Summarizes whole logs with a fixed rule set.
#[derive(Debug, Clone, Default)]
pub struct LogSummarizer {
    rules: LineRules,
}

impl LogSummarizer {
    /// Summarizer with the default trainer rules.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Summarizer with custom rules.
    #[must_use]
    pub const fn with_rules(rules: LineRules) -> Self {
        Self { rules }
    }

    /// Rules in use.
    #[must_use]
    pub const fn rules(&self) -> &LineRules {
        &self.rules
    }

    /// Summarize newline-delimited log text.
    ///
    /// # Errors
    ///
    /// See [`LogSummarizer::summarize_lines`].
    pub fn summarize(&self, log_text: &str) -> Result<LogSummary> {
        self.summarize_lines(log_text.lines())
    }

    /// Summarize a sequence of lines in one left-to-right pass.
    ///
    /// # Errors
    ///
    /// - [`crate::Error::MalformedTime`] if a matched clock or stamp is undecodable
    /// - [`crate::Error::MissingStartMarker`] if no start stamp was found
    /// - [`crate::Error::MissingPreparationMarker`] if no preparation marker was found
    pub fn summarize_lines<I, S>(&self, lines: I) -> Result<LogSummary>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut scanner = Scanner::new(&self.rules);
        for line in lines {
            scanner.feed(line.as_ref())?;
        }
        scanner.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn scenario_lines() -> Vec<&'static str> {
        vec![
            "START TIME: 2024-01-01 00:00:00.000000",
            "[00:00:05] |Trainer| use single lr: 0.001",
            "[00:00:05] |BaseLego| [epoch 1] start training",
            "[00:00:15] |BaseLego| [epoch 1] GAUC 0.600",
            "[00:00:20] |BaseLego| [epoch 2] loss 0.4213",
        ]
    }

    #[test]
    fn test_reference_scenario() {
        let summary = LogSummarizer::new()
            .summarize_lines(scenario_lines())
            .unwrap();

        assert!((summary.start_time() - 1_704_067_200.0).abs() < 1e-6);
        assert!((summary.prep_time() - 5.0).abs() < f64::EPSILON);
        assert!((summary.final_time() - 20.0).abs() < f64::EPSILON);
        assert_eq!(summary.epoch_durations(), &[15]);
        assert_eq!(summary.total_epochs(), 1);
        assert_eq!(summary.valid_metrics(), &[0.6]);
    }

    #[test]
    fn test_bare_epoch_tag_counts_every_tagged_line() {
        let rules = LineRules::builder()
            .epoch_pattern(r"\[epoch (\d+)\]")
            .build()
            .unwrap();
        let summary = LogSummarizer::with_rules(rules)
            .summarize_lines(scenario_lines())
            .unwrap();

        // banner, validation and loss lines all become boundaries
        assert_eq!(summary.epoch_durations(), &[0, 10, 5]);
        assert_eq!(summary.total_epochs(), 3);
    }

    #[test]
    fn test_repeated_boundaries_are_not_deduplicated() {
        let log = "START TIME: 2024-01-01 00:00:00.000000\n\
                   [00:00:02] use single lr\n\
                   [00:00:10] [epoch 1] loss 0.5\n\
                   [00:00:10] [epoch 1] loss 0.5\n\
                   [00:00:30] [epoch 2] loss 0.4\n";
        let summary = LogSummarizer::new().summarize(log).unwrap();
        assert_eq!(summary.epoch_durations(), &[8, 0, 20]);
        assert_eq!(summary.total_epochs(), 3);
    }

    #[test]
    fn test_only_first_start_marker_counts() {
        let log = "START TIME: 2024-01-01 00:00:00.000000\n\
                   START TIME: 2025-01-01 00:00:00.000000\n\
                   [00:00:01] use single lr\n";
        let summary = LogSummarizer::new().summarize(log).unwrap();
        assert!((summary.start_time() - 1_704_067_200.0).abs() < 1e-6);
    }

    #[test]
    fn test_validation_independent_of_epochs() {
        let log = "START TIME: 2024-01-01 00:00:00.000000\n\
                   [00:00:01] use single lr\n\
                   [00:00:04] [epoch 1] GAUC 0.51\n\
                   [00:00:05] [epoch 1] GAUC 0.52\n\
                   [00:00:06] [epoch 1] GAUC 0.53\n";
        let summary = LogSummarizer::new().summarize(log).unwrap();
        assert_eq!(summary.total_epochs(), 0);
        assert!(summary.epoch_durations().is_empty());
        assert_eq!(summary.valid_metrics(), &[0.51, 0.52, 0.53]);
        assert!((summary.final_time() - 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_missing_start_marker() {
        let log = "[00:00:01] use single lr\n[00:00:04] [epoch 1] loss 0.3\n";
        let err = LogSummarizer::new().summarize(log).unwrap_err();
        assert!(matches!(err, Error::MissingStartMarker));
    }

    #[test]
    fn test_missing_prep_marker() {
        let log = "START TIME: 2024-01-01 00:00:00.000000\n[00:00:04] [epoch 1] loss 0.3\n";
        let err = LogSummarizer::new().summarize(log).unwrap_err();
        assert!(matches!(err, Error::MissingPreparationMarker));
    }

    #[test]
    fn test_empty_log() {
        let err = LogSummarizer::new().summarize("").unwrap_err();
        assert!(matches!(err, Error::MissingStartMarker));
    }

    #[test]
    fn test_idempotent() {
        let summarizer = LogSummarizer::new();
        let a = summarizer.summarize_lines(scenario_lines()).unwrap();
        let b = summarizer.summarize_lines(scenario_lines()).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }
}
