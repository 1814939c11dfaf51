//! # evaltrack: Experiment Tracking Core
//!
//! **Version**: 0.1.0
//!
//! evaltrack turns the raw output of recommendation-model training runs into
//! leaderboards. Every configuration (an *evaluation*) is trained several
//! times under different seeds (its *replicates*); evaltrack summarizes each
//! replicate's log, aggregates metrics across replicates and ranks the
//! configurations per dataset.
//!
//! ## Data Flow
//!
//! ```text
//! log text ──► LogSummarizer ──► LogSummary (cached on the replicate)
//!
//! replicate performance ──► aggregate / score ──► RankEngine ──► RankingReport
//!                                                                  └── table
//! ```
//!
//! ## Example Usage
//!
//! ```rust
//! use evaltrack::aggregate::Performance;
//! use evaltrack::config::RankingOptions;
//! use evaltrack::experiment::ExperimentStore;
//! use evaltrack::rank::RankEngine;
//!
//! let store = ExperimentStore::new();
//! store.create_evaluation(
//!     "dcn-books",
//!     "python trainer.py --data config/books.yaml --model config/dcnv2.yaml",
//!     "{}",
//! )?;
//! for seed in 0..5 {
//!     let replicate = store.create_or_get_experiment("dcn-books", seed)?;
//!     store.complete_experiment(
//!         replicate.session(),
//!         "",
//!         Performance::from_pairs([("GAUC", 0.7), ("MRR", 0.3), ("NDCG@1", 0.2), ("NDCG@5", 0.4)]),
//!     )?;
//! }
//!
//! let report = RankEngine::new(RankingOptions::default())?.rank(&store.candidates());
//! assert_eq!(report.get("books").unwrap().entries[0].model, "DCNv2");
//! # Ok::<(), evaltrack::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod aggregate;
pub mod catalog;
pub mod command;
pub mod config;
pub mod error;
pub mod experiment;
pub mod export;
pub mod rank;
pub mod summarize;
pub mod timecodec;

pub use error::{Error, Result};
