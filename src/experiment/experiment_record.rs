//! Experiment Record - one seeded replicate of an evaluation

use crate::aggregate::Performance;
use crate::summarize::{LogSummarizer, LogSummary};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a replicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// Replicate is created but no process has registered yet.
    Pending,
    /// A training process registered its PID.
    Running,
    /// Log and performance were uploaded. Terminal.
    Completed,
}

/// Experiment Record represents a single seeded run of an evaluation.
///
/// A replicate is completed exactly once: completion stores the raw log
/// and the final metrics and cannot be repeated. The log summary is derived
/// from the stored log at most once unless recomputation is forced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExperimentRecord {
    session: String,
    signature: String,
    seed: i64,
    status: RunStatus,
    pid: Option<u32>,
    log: Option<String>,
    performance: Option<Performance>,
    summary: Option<LogSummary>,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl ExperimentRecord {
    /// Create a new replicate in Pending status.
    ///
    /// # Arguments
    ///
    /// * `session` - Unique token addressing the replicate
    /// * `signature` - Signature of the parent evaluation
    /// * `seed` - Random seed, unique within the evaluation
    #[must_use]
    pub fn new(session: impl Into<String>, signature: impl Into<String>, seed: i64) -> Self {
        Self {
            session: session.into(),
            signature: signature.into(),
            seed,
            status: RunStatus::Pending,
            pid: None,
            log: None,
            performance: None,
            summary: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Get the session token.
    #[must_use]
    pub fn session(&self) -> &str {
        &self.session
    }

    /// Get the parent evaluation signature.
    #[must_use]
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Get the seed.
    #[must_use]
    pub const fn seed(&self) -> i64 {
        self.seed
    }

    /// Get the current status.
    #[must_use]
    pub const fn status(&self) -> RunStatus {
        self.status
    }

    /// Whether the replicate has been completed.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == RunStatus::Completed
    }

    /// Get the registered process ID, if any.
    #[must_use]
    pub const fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Get the uploaded log, if completed.
    #[must_use]
    pub fn log(&self) -> Option<&str> {
        self.log.as_deref()
    }

    /// Get the uploaded performance, if completed.
    #[must_use]
    pub const fn performance(&self) -> Option<&Performance> {
        self.performance.as_ref()
    }

    /// Get the cached log summary, if computed.
    #[must_use]
    pub const fn summary(&self) -> Option<&LogSummary> {
        self.summary.as_ref()
    }

    /// Get the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Get the completion timestamp, if completed.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Record the PID of the training process.
    ///
    /// A completed replicate keeps its status.
    pub fn register(&mut self, pid: u32) {
        self.pid = Some(pid);
        if self.status == RunStatus::Pending {
            self.status = RunStatus::Running;
        }
    }

    /// Complete the replicate with its log and final metrics.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyCompleted`] if the replicate was completed
    /// before; the stored log and performance are left untouched.
    pub fn complete(&mut self, log: impl Into<String>, performance: Performance) -> Result<()> {
        if self.is_completed() {
            return Err(Error::AlreadyCompleted {
                session: self.session.clone(),
            });
        }
        self.log = Some(log.into());
        self.performance = Some(performance);
        self.status = RunStatus::Completed;
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    /// Summarize the stored log, reusing a cached summary if present.
    ///
    /// # Errors
    ///
    /// - [`Error::NoPerformanceData`] if no performance was recorded
    /// - any summarization error; the cached summary stays absent
    pub fn summarize(&mut self, summarizer: &LogSummarizer) -> Result<&LogSummary> {
        let summary = match self.summary.take() {
            Some(cached) => cached,
            None => self.build_summary(summarizer)?,
        };
        Ok(self.summary.insert(summary))
    }

    /// Recompute the summary even if one is cached.
    ///
    /// On failure the previously cached summary, if any, is kept.
    ///
    /// # Errors
    ///
    /// Same as [`ExperimentRecord::summarize`].
    pub fn resummarize(&mut self, summarizer: &LogSummarizer) -> Result<&LogSummary> {
        let summary = self.build_summary(summarizer)?;
        Ok(self.summary.insert(summary))
    }

    fn build_summary(&self, summarizer: &LogSummarizer) -> Result<LogSummary> {
        if self.performance.as_ref().map_or(true, Performance::is_empty) {
            return Err(Error::NoPerformanceData {
                session: self.session.clone(),
            });
        }
        summarizer.summarize(self.log.as_deref().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = "START TIME: 2024-01-01 00:00:00.000000\n\
                       [00:00:05] |Trainer| use single lr: 0.001\n\
                       [00:00:20] |BaseLego| [epoch 1] loss 0.41\n";

    fn completed() -> ExperimentRecord {
        let mut exp = ExperimentRecord::new("session-1", "sig-1", 2024);
        exp.complete(LOG, Performance::from_pairs([("GAUC", 0.7)]))
            .unwrap();
        exp
    }

    #[test]
    fn test_status_default() {
        let exp = ExperimentRecord::new("session-1", "sig-1", 1);
        assert_eq!(exp.status(), RunStatus::Pending);
        assert!(!exp.is_completed());
    }

    #[test]
    fn test_lifecycle() {
        let mut exp = ExperimentRecord::new("session-1", "sig-1", 1);
        exp.register(4242);
        assert_eq!(exp.status(), RunStatus::Running);
        assert_eq!(exp.pid(), Some(4242));

        exp.complete("log", Performance::from_pairs([("mrr", 0.3)]))
            .unwrap();
        assert!(exp.is_completed());
        assert!(exp.completed_at().is_some());

        exp.register(1);
        assert_eq!(exp.status(), RunStatus::Completed);
    }

    #[test]
    fn test_complete_twice_is_an_error() {
        let mut exp = completed();
        let err = exp
            .complete("other log", Performance::from_pairs([("GAUC", 0.99)]))
            .unwrap_err();
        assert!(matches!(err, Error::AlreadyCompleted { .. }));
        assert_eq!(exp.log(), Some(LOG));
        assert_eq!(exp.performance().unwrap().get("gauc"), Some(0.7));
    }

    #[test]
    fn test_summarize_requires_performance() {
        let mut exp = ExperimentRecord::new("session-1", "sig-1", 1);
        let err = exp.summarize(&LogSummarizer::new()).unwrap_err();
        assert!(matches!(err, Error::NoPerformanceData { .. }));
        assert!(exp.summary().is_none());
    }

    #[test]
    fn test_summarize_caches() {
        let mut exp = completed();
        let summarizer = LogSummarizer::new();
        let first = exp.summarize(&summarizer).unwrap().clone();
        assert_eq!(first.epoch_durations(), &[15]);

        // A summarizer that could not parse the log proves no rescan happens.
        let strict = LogSummarizer::with_rules(
            crate::summarize::LineRules::builder()
                .prep_marker("never present")
                .build()
                .unwrap(),
        );
        let second = exp.summarize(&strict).unwrap();
        assert_eq!(&first, second);
        assert!(exp.resummarize(&strict).is_err());
        assert_eq!(exp.summary(), Some(&first));
    }

    #[test]
    fn test_failed_summary_left_absent() {
        let mut exp = ExperimentRecord::new("session-1", "sig-1", 1);
        exp.complete("no markers here", Performance::from_pairs([("gauc", 0.5)]))
            .unwrap();
        assert!(exp.summarize(&LogSummarizer::new()).is_err());
        assert!(exp.summary().is_none());
    }
}
