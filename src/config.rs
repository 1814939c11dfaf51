//! Ranking configuration
//!
//! Defaults follow the leaderboard export: at least 5 completed replicates,
//! the four catalogued metrics, the twelve catalogued datasets, top-1, and a
//! structured (non-table) result. Every field can be overridden from the
//! environment:
//!
//! | Variable | Meaning |
//! |----------|---------|
//! | `EVALTRACK_REPLICATE_THRESHOLD` | minimum completed replicates |
//! | `EVALTRACK_METRICS` | comma-separated metric names |
//! | `EVALTRACK_DATASETS` | comma-separated dataset keys, `*` for all |
//! | `EVALTRACK_TOP_K` | entries kept per dataset |
//! | `EVALTRACK_RETURN_TABLE` | `1`/`true` to render a table |

use crate::catalog::{default_datasets, default_metrics};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Default minimum number of completed replicates.
pub const DEFAULT_REPLICATE_THRESHOLD: usize = 5;

/// Default number of entries per dataset.
pub const DEFAULT_TOP_K: usize = 1;

/// Options for [`crate::rank::RankEngine`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingOptions {
    /// Evaluations with fewer completed replicates are not ranked
    pub replicate_threshold: usize,
    /// Metrics that are scored and displayed, in display order
    pub metrics: Vec<String>,
    /// Datasets to rank; `None` ranks every dataset
    pub datasets: Option<Vec<String>>,
    /// Entries kept per dataset
    pub top_k: usize,
    /// Render a table instead of returning the structured report
    pub return_table: bool,
}

impl Default for RankingOptions {
    fn default() -> Self {
        Self {
            replicate_threshold: DEFAULT_REPLICATE_THRESHOLD,
            metrics: default_metrics(),
            datasets: Some(default_datasets()),
            top_k: DEFAULT_TOP_K,
            return_table: false,
        }
    }
}

impl RankingOptions {
    /// Defaults overridden by `EVALTRACK_*` environment variables.
    ///
    /// # Errors
    ///
    /// See [`RankingOptions::from_lookup`].
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for the
    /// `EVALTRACK_*` keys.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if a value does not parse or the
    /// result fails [`RankingOptions::validate`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut options = Self::default();

        if let Some(raw) = lookup("EVALTRACK_REPLICATE_THRESHOLD") {
            options.replicate_threshold = parse_number("EVALTRACK_REPLICATE_THRESHOLD", &raw)?;
        }
        if let Some(raw) = lookup("EVALTRACK_METRICS") {
            options.metrics = parse_list(&raw);
        }
        if let Some(raw) = lookup("EVALTRACK_DATASETS") {
            options.datasets = if raw.trim() == "*" {
                None
            } else {
                Some(parse_list(&raw))
            };
        }
        if let Some(raw) = lookup("EVALTRACK_TOP_K") {
            options.top_k = parse_number("EVALTRACK_TOP_K", &raw)?;
        }
        if let Some(raw) = lookup("EVALTRACK_RETURN_TABLE") {
            options.return_table = parse_flag("EVALTRACK_RETURN_TABLE", &raw)?;
        }

        let options = options.normalized();
        options.validate()?;
        Ok(options)
    }

    /// Lower-case metric and dataset names and drop duplicates, keeping the
    /// first occurrence.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.metrics = dedup_lowercase(self.metrics);
        self.datasets = self.datasets.map(dedup_lowercase);
        self
    }

    /// Check the options can drive a ranking.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for a zero threshold, zero `top_k`,
    /// an empty metric list, or an empty dataset filter.
    pub fn validate(&self) -> Result<()> {
        if self.replicate_threshold == 0 {
            return Err(Error::InvalidInput(
                "replicate threshold must be at least 1".to_string(),
            ));
        }
        if self.top_k == 0 {
            return Err(Error::InvalidInput("top_k must be at least 1".to_string()));
        }
        if self.metrics.is_empty() {
            return Err(Error::InvalidInput("no metrics selected".to_string()));
        }
        if self.datasets.as_ref().is_some_and(Vec::is_empty) {
            return Err(Error::InvalidInput("no datasets selected".to_string()));
        }
        Ok(())
    }

    /// Whether a dataset passes the filter.
    #[must_use]
    pub fn admits_dataset(&self, dataset: &str) -> bool {
        self.datasets
            .as_ref()
            .map_or(true, |keep| keep.iter().any(|d| d == dataset))
    }
}

/// Split a comma-separated list, trimming blanks and dropping empty items.
#[must_use]
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn dedup_lowercase(items: Vec<String>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let item = item.to_lowercase();
        if !seen.contains(&item) {
            seen.push(item);
        }
    }
    seen
}

fn parse_number(key: &str, raw: &str) -> Result<usize> {
    raw.trim()
        .parse()
        .map_err(|e| Error::InvalidInput(format!("{key}={raw}: {e}")))
}

fn parse_flag(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" | "" => Ok(false),
        _ => Err(Error::InvalidInput(format!("{key}={raw}: expected a boolean"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let options = RankingOptions::default();
        assert_eq!(options.replicate_threshold, 5);
        assert_eq!(options.top_k, 1);
        assert_eq!(options.metrics.len(), 4);
        assert_eq!(options.datasets.as_ref().map(Vec::len), Some(12));
        assert!(!options.return_table);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_from_lookup_overrides() {
        let options = RankingOptions::from_lookup(lookup_from(&[
            ("EVALTRACK_REPLICATE_THRESHOLD", "3"),
            ("EVALTRACK_METRICS", "GAUC, mrr,gauc"),
            ("EVALTRACK_DATASETS", "books,Yelp"),
            ("EVALTRACK_TOP_K", "2"),
            ("EVALTRACK_RETURN_TABLE", "1"),
        ]))
        .unwrap();

        assert_eq!(options.replicate_threshold, 3);
        assert_eq!(options.metrics, vec!["gauc", "mrr"]);
        assert_eq!(
            options.datasets,
            Some(vec!["books".to_string(), "yelp".to_string()])
        );
        assert_eq!(options.top_k, 2);
        assert!(options.return_table);
    }

    #[test]
    fn test_wildcard_datasets() {
        let options =
            RankingOptions::from_lookup(lookup_from(&[("EVALTRACK_DATASETS", "*")])).unwrap();
        assert!(options.datasets.is_none());
        assert!(options.admits_dataset("anything"));
    }

    #[test]
    fn test_invalid_values() {
        assert!(RankingOptions::from_lookup(lookup_from(&[("EVALTRACK_TOP_K", "0")])).is_err());
        assert!(RankingOptions::from_lookup(lookup_from(&[("EVALTRACK_TOP_K", "two")])).is_err());
        assert!(RankingOptions::from_lookup(lookup_from(&[("EVALTRACK_METRICS", " , ")])).is_err());
        assert!(
            RankingOptions::from_lookup(lookup_from(&[("EVALTRACK_RETURN_TABLE", "maybe")]))
                .is_err()
        );
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let options: RankingOptions = serde_json::from_str(r#"{"top_k": 3}"#).unwrap();
        assert_eq!(options.top_k, 3);
        assert_eq!(options.replicate_threshold, 5);
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(parse_list("a, b,,c "), vec!["a", "b", "c"]);
        assert!(parse_list("").is_empty());
    }
}
