//! Performance - metric readings of one replicate

use crate::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Final metric readings of one completed run.
///
/// Metric names are case-insensitive: they are lower-cased on the way in,
/// so `GAUC`, `gauc` and `Gauc` address the same reading.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(transparent)]
pub struct Performance {
    metrics: BTreeMap<String, f64>,
}

impl<'de> Deserialize<'de> for Performance {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = BTreeMap::<String, f64>::deserialize(deserializer)?;
        Ok(raw.into_iter().collect())
    }
}

impl FromIterator<(String, f64)> for Performance {
    fn from_iter<T: IntoIterator<Item = (String, f64)>>(iter: T) -> Self {
        Self {
            metrics: iter
                .into_iter()
                .map(|(name, value)| (name.to_lowercase(), value))
                .collect(),
        }
    }
}

impl Performance {
    /// Empty performance.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(name, value)` pairs.
    #[must_use]
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, f64)>) -> Self {
        pairs
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect()
    }

    /// Parse a JSON object of metric name -> number, as uploaded by trainers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPerformance`] if the text is not a JSON object
    /// or a value is not a number.
    pub fn from_json(text: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| Error::InvalidPerformance(e.to_string()))?;
        let object = value
            .as_object()
            .ok_or_else(|| Error::InvalidPerformance("expected a JSON object".to_string()))?;

        object
            .iter()
            .map(|(name, reading)| {
                reading
                    .as_f64()
                    .map(|v| (name.clone(), v))
                    .ok_or_else(|| {
                        Error::InvalidPerformance(format!("metric '{name}' is not a number"))
                    })
            })
            .collect()
    }

    /// Reading for a metric, any case.
    #[must_use]
    pub fn get(&self, metric: &str) -> Option<f64> {
        self.metrics.get(&metric.to_lowercase()).copied()
    }

    /// Whether a reading exists for a metric, any case.
    #[must_use]
    pub fn contains(&self, metric: &str) -> bool {
        self.metrics.contains_key(&metric.to_lowercase())
    }

    /// Set a reading.
    pub fn insert(&mut self, metric: &str, value: f64) {
        self.metrics.insert(metric.to_lowercase(), value);
    }

    /// Iterate readings in metric-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.metrics.iter().map(|(name, value)| (name.as_str(), *value))
    }

    /// Number of readings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    /// Whether no readings were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_case_insensitive() {
        let perf = Performance::from_pairs([("GAUC", 0.7), ("nDCG@1", 0.3)]);
        assert_eq!(perf.get("gauc"), Some(0.7));
        assert_eq!(perf.get("Gauc"), Some(0.7));
        assert!(perf.contains("NDCG@1"));
        assert_eq!(perf.len(), 2);
    }

    #[test]
    fn test_from_json() {
        let perf = Performance::from_json(r#"{"GAUC": 0.71, "MRR": 0.4}"#).unwrap();
        assert_eq!(perf.get("gauc"), Some(0.71));
        assert_eq!(perf.get("mrr"), Some(0.4));
    }

    #[test]
    fn test_from_json_rejects_non_numbers() {
        assert!(matches!(
            Performance::from_json(r#"{"GAUC": "high"}"#),
            Err(Error::InvalidPerformance(_))
        ));
        assert!(Performance::from_json("[0.7]").is_err());
        assert!(Performance::from_json("not json").is_err());
    }

    #[test]
    fn test_deserialize_lowercases() {
        let perf: Performance = serde_json::from_str(r#"{"MRR": 0.5}"#).unwrap();
        assert_eq!(perf.iter().next(), Some(("mrr", 0.5)));
    }
}
