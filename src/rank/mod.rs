//! Per-dataset leaderboards
//!
//! ## Pipeline
//!
//! ```text
//! Candidate (evaluation + completed replicates)
//!     │
//!     ├── replicate threshold ──► drop (too few seeds)
//!     ├── dataset identity    ──► drop (unresolvable / filtered out)
//!     ▼
//! score (flattened mean, 0 on missing metric)
//!     │
//!     ▼
//! group by dataset (encounter order) ──► top-k per group ──► RankingReport
//!                                                              │
//!                                                              └── to_table()
//! ```
//!
//! Datasets with no admitted evaluation are absent from the report.

mod table;
mod topk;

pub use topk::select_top_k;

use crate::aggregate::{AggregatedPerformance, MetricStats, Performance};
use crate::catalog::model_name;
use crate::config::RankingOptions;
use crate::experiment::EvaluationRecord;
use crate::Result;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// An evaluation offered for ranking together with the performance of its
/// completed replicates.
#[derive(Debug, Clone)]
pub struct Candidate {
    evaluation: EvaluationRecord,
    replicates: Vec<Performance>,
}

impl Candidate {
    /// Pair an evaluation with its completed replicates.
    #[must_use]
    pub const fn new(evaluation: EvaluationRecord, replicates: Vec<Performance>) -> Self {
        Self {
            evaluation,
            replicates,
        }
    }

    /// The evaluation.
    #[must_use]
    pub const fn evaluation(&self) -> &EvaluationRecord {
        &self.evaluation
    }

    /// Performance of each completed replicate.
    #[must_use]
    pub fn replicates(&self) -> &[Performance] {
        &self.replicates
    }
}

/// One leaderboard slot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankedEntry {
    /// 1-based position within the dataset
    pub rank: usize,
    /// Evaluation signature
    pub signature: String,
    /// Dataset key
    pub dataset: String,
    /// Model identifier as derived from the evaluation
    pub model_key: String,
    /// Display name of the model
    pub model: String,
    /// Ranking score
    pub score: f64,
    /// Completed replicates aggregated
    pub replicates: usize,
    /// Mean and std of each requested metric the replicates recorded
    pub performance: BTreeMap<String, MetricStats>,
}

/// Leaderboard of one dataset, best first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatasetRanking {
    /// Dataset key
    pub dataset: String,
    /// At most `top_k` entries
    pub entries: Vec<RankedEntry>,
}

/// Leaderboards of every dataset with at least one admitted evaluation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankingReport {
    metrics: Vec<String>,
    top_k: usize,
    datasets: Vec<DatasetRanking>,
}

impl RankingReport {
    /// Metrics scored and displayed, in display order.
    #[must_use]
    pub fn metrics(&self) -> &[String] {
        &self.metrics
    }

    /// Entries requested per dataset.
    #[must_use]
    pub const fn top_k(&self) -> usize {
        self.top_k
    }

    /// Dataset leaderboards in order of first appearance.
    #[must_use]
    pub fn datasets(&self) -> &[DatasetRanking] {
        &self.datasets
    }

    /// Leaderboard of one dataset.
    #[must_use]
    pub fn get(&self, dataset: &str) -> Option<&DatasetRanking> {
        self.datasets.iter().find(|d| d.dataset == dataset)
    }

    /// Whether no dataset qualified.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }

    /// Render as table markup: one column group per rank, one row per
    /// dataset, `mean ± std` cells scaled by 100.
    #[must_use]
    pub fn to_table(&self) -> String {
        table::render(self)
    }
}

/// Ranks candidates into per-dataset leaderboards.
///
/// # Examples
///
/// ```rust
/// use evaltrack::aggregate::Performance;
/// use evaltrack::config::RankingOptions;
/// use evaltrack::experiment::EvaluationRecord;
/// use evaltrack::rank::{Candidate, RankEngine};
///
/// let options = RankingOptions {
///     replicate_threshold: 2,
///     metrics: vec!["gauc".to_string()],
///     ..RankingOptions::default()
/// };
/// let engine = RankEngine::new(options)?;
///
/// let evaluation = EvaluationRecord::new(
///     "dcn-books",
///     "python trainer.py --data config/books.yaml --model config/dcnv2.yaml",
/// );
/// let runs = vec![
///     Performance::from_pairs([("GAUC", 0.70)]),
///     Performance::from_pairs([("GAUC", 0.72)]),
/// ];
/// let report = engine.rank(&[Candidate::new(evaluation, runs)]);
///
/// let books = report.get("books").unwrap();
/// assert_eq!(books.entries[0].model, "DCNv2");
/// # Ok::<(), evaltrack::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct RankEngine {
    options: RankingOptions,
}

impl RankEngine {
    /// Create an engine; metric and dataset names are lower-cased.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidInput`] if the options fail validation.
    pub fn new(options: RankingOptions) -> Result<Self> {
        let options = options.normalized();
        options.validate()?;
        Ok(Self { options })
    }

    /// Options in effect.
    #[must_use]
    pub const fn options(&self) -> &RankingOptions {
        &self.options
    }

    /// Build the leaderboards.
    ///
    /// Never fails: evaluations whose dataset or model cannot be resolved
    /// are skipped with a warning.
    #[must_use]
    pub fn rank(&self, candidates: &[Candidate]) -> RankingReport {
        let metrics = &self.options.metrics;

        // dataset -> (candidate index, score), both in encounter order
        let mut index: FxHashMap<String, usize> = FxHashMap::default();
        let mut groups: Vec<(String, Vec<(usize, f64)>)> = Vec::new();

        for (position, candidate) in candidates.iter().enumerate() {
            let signature = candidate.evaluation.signature();
            let replicates = candidate.replicates.len();
            if replicates < self.options.replicate_threshold {
                debug!(
                    signature,
                    replicates,
                    threshold = self.options.replicate_threshold,
                    "below replicate threshold"
                );
                continue;
            }

            let dataset = match candidate.evaluation.dataset() {
                Ok(dataset) => dataset,
                Err(e) => {
                    warn!(signature, error = %e, "skipping evaluation without dataset");
                    continue;
                }
            };
            if !self.options.admits_dataset(&dataset) {
                debug!(signature, dataset = %dataset, "dataset filtered out");
                continue;
            }

            let score = crate::aggregate::score(&candidate.replicates, metrics);
            debug!(signature, dataset = %dataset, score, "admitted");

            let slot = *index.entry(dataset.clone()).or_insert_with(|| {
                groups.push((dataset, Vec::new()));
                groups.len() - 1
            });
            groups[slot].1.push((position, score));
        }

        let datasets = groups
            .into_iter()
            .map(|(dataset, members)| {
                let scores: Vec<f64> = members.iter().map(|(_, score)| *score).collect();
                // top_k >= 1 is guaranteed by validation
                let kept = select_top_k(&scores, self.options.top_k).unwrap_or_default();
                let entries = kept
                    .into_iter()
                    .enumerate()
                    .map(|(rank, member)| {
                        let (position, _) = members[member];
                        self.entry(rank + 1, &dataset, &candidates[position])
                    })
                    .collect();
                DatasetRanking { dataset, entries }
            })
            .collect();

        RankingReport {
            metrics: metrics.clone(),
            top_k: self.options.top_k,
            datasets,
        }
    }

    fn entry(&self, rank: usize, dataset: &str, candidate: &Candidate) -> RankedEntry {
        let evaluation = &candidate.evaluation;
        let model_key = evaluation.model().unwrap_or_else(|e| {
            warn!(signature = evaluation.signature(), error = %e, "model unresolved");
            evaluation.signature().to_string()
        });
        let aggregated = AggregatedPerformance::compute(&candidate.replicates, &self.options.metrics);

        RankedEntry {
            rank,
            signature: evaluation.signature().to_string(),
            dataset: dataset.to_string(),
            model: model_name(&model_key),
            model_key,
            score: aggregated.score,
            replicates: aggregated.replicates,
            performance: aggregated.metrics,
        }
    }
}
