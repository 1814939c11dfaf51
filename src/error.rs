//! Error types for evaltrack
//!
//! Summarization errors abort a single call only; aggregation and ranking
//! never raise on missing data (they score it as zero instead).

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// evaltrack error types
#[derive(Error, Debug)]
pub enum Error {
    /// The log never contains the absolute `START TIME:` line
    #[error("log has no start-time marker\nThe run cannot be anchored to wall-clock time")]
    MissingStartMarker,

    /// The log never contains the preparation-end marker
    #[error("log has no preparation marker\nEpoch durations are undefined without it")]
    MissingPreparationMarker,

    /// A matched time substring could not be decomposed
    #[error("malformed time '{input}': {reason}")]
    MalformedTime {
        /// Offending substring
        input: String,
        /// What went wrong while decomposing it
        reason: String,
    },

    /// Summarization requested for an experiment without recorded performance
    #[error("experiment {session} has no recorded performance\nOnly completed experiments can be summarized")]
    NoPerformanceData {
        /// Session of the experiment
        session: String,
    },

    /// Completing an experiment twice
    #[error("experiment {session} is already completed")]
    AlreadyCompleted {
        /// Session of the experiment
        session: String,
    },

    /// Unknown evaluation signature
    #[error("evaluation not found: {0}")]
    EvaluationNotFound(String),

    /// Unknown experiment session, or unknown (signature, seed) pair
    #[error("experiment not found: {0}")]
    ExperimentNotFound(String),

    /// Unknown tag name
    #[error("tag not found: {0}")]
    TagNotFound(String),

    /// Signature or command already taken by another evaluation
    #[error("evaluation creation failed: {0}")]
    EvaluationConflict(String),

    /// Launch command does not follow `prog script --key value ...`
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// Evaluation configuration lacks a field the ranking needs
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Performance payload is not a flat metric -> number object
    #[error("invalid performance payload: {0}")]
    InvalidPerformance(String),

    /// Caller supplied an unusable argument
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the error came out of log parsing (as opposed to record lookup).
    #[must_use]
    pub const fn is_summarization_error(&self) -> bool {
        matches!(
            self,
            Self::MissingStartMarker
                | Self::MissingPreparationMarker
                | Self::MalformedTime { .. }
                | Self::NoPerformanceData { .. }
        )
    }
}
