//! Cross-replicate aggregation
//!
//! Replicates are repeated runs of one configuration under different seeds.
//! Aggregation reports, per metric, the mean and the sample standard
//! deviation (divisor `n - 1`) across the replicates that recorded it.
//!
//! ## Scoring
//!
//! The ranking score is a single flattened mean over every required metric
//! of every replicate. If any replicate lacks any required metric the score
//! is exactly `0.0`, so incomplete configurations sink below complete ones.
//!
//! ```rust
//! use evaltrack::aggregate::{score, Performance};
//!
//! let runs = vec![
//!     Performance::from_pairs([("GAUC", 0.70), ("MRR", 0.30)]),
//!     Performance::from_pairs([("GAUC", 0.72), ("MRR", 0.32)]),
//! ];
//! let metrics = vec!["gauc".to_string(), "mrr".to_string()];
//! assert!((score(&runs, &metrics) - 0.51).abs() < 1e-9);
//! ```

mod performance;

pub use performance::Performance;

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeMap;

/// Mean and sample standard deviation of one metric across replicates.
///
/// `std` is `NaN` when fewer than two replicates recorded the metric.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MetricStats {
    /// Arithmetic mean
    pub mean: f64,
    /// Sample standard deviation
    pub std: f64,
    /// Number of replicates that recorded the metric
    pub count: usize,
}

impl MetricStats {
    /// Compute stats over readings.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_values(values: &[f64]) -> Self {
        let count = values.len();
        if count == 0 {
            return Self {
                mean: f64::NAN,
                std: f64::NAN,
                count,
            };
        }

        let n = count as f64;
        let mean = values.iter().sum::<f64>() / n;
        let std = if count < 2 {
            f64::NAN
        } else {
            (values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
        };

        Self { mean, std, count }
    }
}

/// Aggregated view of one configuration's replicates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AggregatedPerformance {
    /// Replicates aggregated
    pub replicates: usize,
    /// Per-metric stats keyed by lower-case metric name
    pub metrics: BTreeMap<String, MetricStats>,
    /// Ranking score, see [`score`]
    pub score: f64,
}

impl AggregatedPerformance {
    /// Aggregate `replicates`, keeping and scoring only `metrics`.
    #[must_use]
    pub fn compute<P: Borrow<Performance>>(replicates: &[P], metrics: &[String]) -> Self {
        Self {
            replicates: replicates.len(),
            metrics: aggregate(replicates, Some(metrics)),
            score: score(replicates, metrics),
        }
    }

    /// Stats for a metric, any case.
    #[must_use]
    pub fn get(&self, metric: &str) -> Option<&MetricStats> {
        self.metrics.get(&metric.to_lowercase())
    }
}

/// Per-metric mean and std across replicates.
///
/// With `wanted` given, only those metrics (matched case-insensitively) are
/// kept; otherwise every metric seen in any replicate is. A metric's stats
/// use only the replicates that recorded it. No replicates yields an empty
/// map.
#[must_use]
pub fn aggregate<P: Borrow<Performance>>(
    replicates: &[P],
    wanted: Option<&[String]>,
) -> BTreeMap<String, MetricStats> {
    let wanted: Option<Vec<String>> =
        wanted.map(|names| names.iter().map(|name| name.to_lowercase()).collect());

    let mut readings: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for replicate in replicates {
        let replicate: &Performance = replicate.borrow();
        for (name, value) in replicate.iter() {
            if wanted
                .as_ref()
                .map_or(true, |keep| keep.iter().any(|k| k == name))
            {
                readings.entry(name.to_string()).or_default().push(value);
            }
        }
    }

    readings
        .into_iter()
        .map(|(name, values)| (name, MetricStats::from_values(&values)))
        .collect()
}

/// Ranking score over the `required` metrics.
///
/// Returns `0.0` when there are no replicates, no required metrics, or any
/// replicate lacks any required metric. Otherwise the mean of all
/// `replicates x required` readings.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn score<P: Borrow<Performance>>(replicates: &[P], required: &[String]) -> f64 {
    if replicates.is_empty() || required.is_empty() {
        return 0.0;
    }

    let mut sum = 0.0;
    let mut count = 0_usize;
    for replicate in replicates {
        let replicate: &Performance = replicate.borrow();
        for metric in required {
            let Some(value) = replicate.get(metric) else {
                return 0.0;
            };
            sum += value;
            count += 1;
        }
    }

    sum / count as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_metric_stats_sample_std() {
        let stats = MetricStats::from_values(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((stats.mean - 5.0).abs() < 1e-12);
        // population std is 2.0, sample std is sqrt(32/7)
        assert!((stats.std - (32.0_f64 / 7.0).sqrt()).abs() < 1e-12);
        assert_eq!(stats.count, 8);
    }

    #[test]
    fn test_metric_stats_single_value_std_is_nan() {
        let stats = MetricStats::from_values(&[0.7]);
        assert!((stats.mean - 0.7).abs() < f64::EPSILON);
        assert!(stats.std.is_nan());
    }

    #[test]
    fn test_aggregate_all_metrics_any_case() {
        let runs = vec![
            Performance::from_pairs([("GAUC", 0.6), ("MRR", 0.2)]),
            Performance::from_pairs([("gauc", 0.8)]),
        ];
        let agg = aggregate(&runs, None);
        assert_eq!(agg.len(), 2);
        assert!((agg["gauc"].mean - 0.7).abs() < 1e-12);
        assert_eq!(agg["gauc"].count, 2);
        assert_eq!(agg["mrr"].count, 1);
    }

    #[test]
    fn test_aggregate_with_filter() {
        let runs = vec![
            Performance::from_pairs([("gauc", 0.6), ("mrr", 0.2)]),
            Performance::from_pairs([("gauc", 0.8), ("mrr", 0.4)]),
        ];
        let wanted = names(&["GAUC"]);
        let agg = aggregate(&runs, Some(wanted.as_slice()));
        assert_eq!(agg.keys().collect::<Vec<_>>(), vec!["gauc"]);
    }

    #[test]
    fn test_aggregate_empty() {
        let runs: Vec<Performance> = Vec::new();
        assert!(aggregate(&runs, None).is_empty());
        assert!(score(&runs, &names(&["gauc"])).abs() < f64::EPSILON);
    }

    #[test]
    fn test_score_is_flattened_mean() {
        let runs = vec![
            Performance::from_pairs([("gauc", 0.9), ("mrr", 0.1)]),
            Performance::from_pairs([("gauc", 0.7), ("mrr", 0.3)]),
        ];
        let s = score(&runs, &names(&["gauc", "mrr"]));
        assert!((s - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_score_zero_when_any_replicate_incomplete() {
        let runs = vec![
            Performance::from_pairs([("gauc", 0.99)]),
            Performance::from_pairs([("gauc", 0.99)]),
            Performance::from_pairs([("mrr", 0.99)]),
        ];
        assert!(score(&runs, &names(&["gauc"])) == 0.0);
    }

    #[test]
    fn test_compute_bundles_stats_and_score() {
        let runs = vec![
            Performance::from_pairs([("GAUC", 0.7), ("loss", 0.3)]),
            Performance::from_pairs([("GAUC", 0.7), ("loss", 0.2)]),
        ];
        let agg = AggregatedPerformance::compute(&runs, &names(&["gauc"]));
        assert_eq!(agg.replicates, 2);
        assert!(agg.get("GAUC").is_some());
        assert!(agg.get("loss").is_none());
        assert!((agg.score - 0.7).abs() < 1e-12);
    }
}
