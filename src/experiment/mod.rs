//! Experiment Tracking Records
//!
//! This module holds the records behind the tracking service and the
//! in-memory keyed store that owns them.
//!
//! ## Schema Overview
//!
//! ```text
//! EvaluationRecord (1) ──< ExperimentRecord (N) [one per seed]
//!        │                        │
//!        │                        └── LogSummary (0..1) [cached]
//!        └──< TagRecord (M:N)
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use evaltrack::aggregate::Performance;
//! use evaltrack::experiment::ExperimentStore;
//!
//! let store = ExperimentStore::new();
//! store.create_evaluation(
//!     "dcn-books",
//!     "python trainer.py --data config/books.yaml --model config/dcn.yaml",
//!     "{}",
//! )?;
//!
//! // A trainer claims seed 2024 and later uploads its results
//! let replicate = store.create_or_get_experiment("dcn-books", 2024)?;
//! store.complete_experiment(
//!     replicate.session(),
//!     "START TIME: 2024-01-01 00:00:00.000000\n[00:00:05] use single lr\n",
//!     Performance::from_json(r#"{"GAUC": 0.71}"#)?,
//! )?;
//! assert_eq!(store.completed_experiments("dcn-books").len(), 1);
//! # Ok::<(), evaltrack::Error>(())
//! ```

mod evaluation_record;
mod experiment_record;
mod store;
mod tag_record;

pub use evaluation_record::{EvaluationRecord, EvaluationRecordBuilder, DATASET_SUFFIX};
pub use experiment_record::{ExperimentRecord, RunStatus};
pub use store::{
    BatchReport, ExperimentStore, StoreSnapshot, MAX_SIGNATURE_LENGTH, MAX_TAG_LENGTH,
    SESSION_LENGTH,
};
pub use tag_record::TagRecord;
