//! Export scenarios over a record store
//!
//! | Scenario | Output |
//! |----------|--------|
//! | `top_rank_models_per_datasets` | [`RankingReport`], or its table when `return_table` is set |
//! | `total_running_hours` | training hours across summarized replicates |
//!
//! The `get_`-prefixed spellings are accepted as aliases.

use crate::config::RankingOptions;
use crate::experiment::ExperimentStore;
use crate::rank::{RankEngine, RankingReport};
use crate::{Error, Result};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::info;

/// A named export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scenario {
    /// Per-dataset leaderboards
    TopRankModelsPerDatasets,
    /// Total training hours
    TotalRunningHours,
}

impl Scenario {
    /// Canonical scenario name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::TopRankModelsPerDatasets => "top_rank_models_per_datasets",
            Self::TotalRunningHours => "total_running_hours",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Scenario {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().trim_start_matches("get_") {
            "top_rank_models_per_datasets" => Ok(Self::TopRankModelsPerDatasets),
            "total_running_hours" => Ok(Self::TotalRunningHours),
            other => Err(Error::InvalidInput(format!("unknown export scenario: {other}"))),
        }
    }
}

/// Result of an export.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum ExportOutput {
    /// Structured leaderboards
    Ranking(RankingReport),
    /// Rendered leaderboard table
    Table(String),
    /// Total training hours
    RunningHours(f64),
}

/// Run a scenario against the store.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if the ranking options fail validation.
pub fn export(
    store: &ExperimentStore,
    scenario: Scenario,
    options: &RankingOptions,
) -> Result<ExportOutput> {
    info!(scenario = scenario.name(), "export requested");
    match scenario {
        Scenario::TopRankModelsPerDatasets => {
            let engine = RankEngine::new(options.clone())?;
            let report = engine.rank(&store.candidates());
            if engine.options().return_table {
                Ok(ExportOutput::Table(report.to_table()))
            } else {
                Ok(ExportOutput::Ranking(report))
            }
        }
        Scenario::TotalRunningHours => Ok(ExportOutput::RunningHours(store.total_running_hours())),
    }
}

/// Parse a scenario name and run it.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] for an unknown scenario or invalid options.
pub fn export_named(
    store: &ExperimentStore,
    scenario: &str,
    options: &RankingOptions,
) -> Result<ExportOutput> {
    export(store, scenario.parse()?, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_names() {
        assert_eq!(
            "get_top_rank_models_per_datasets".parse::<Scenario>().unwrap(),
            Scenario::TopRankModelsPerDatasets
        );
        assert_eq!(
            "total_running_hours".parse::<Scenario>().unwrap(),
            Scenario::TotalRunningHours
        );
        assert_eq!(Scenario::TotalRunningHours.to_string(), "total_running_hours");
        assert!("leaderboard".parse::<Scenario>().is_err());
    }

    #[test]
    fn test_export_empty_store() {
        let store = ExperimentStore::new();
        let options = RankingOptions::default();

        let hours = export(&store, Scenario::TotalRunningHours, &options).unwrap();
        assert_eq!(hours, ExportOutput::RunningHours(0.0));

        let ranking = export(&store, Scenario::TopRankModelsPerDatasets, &options).unwrap();
        match ranking {
            ExportOutput::Ranking(report) => assert!(report.is_empty()),
            other => panic!("expected ranking, got {other:?}"),
        }
    }

    #[test]
    fn test_export_table_toggle() {
        let store = ExperimentStore::new();
        let options = RankingOptions {
            return_table: true,
            ..RankingOptions::default()
        };
        let output = export_named(&store, "top_rank_models_per_datasets", &options).unwrap();
        match output {
            ExportOutput::Table(table) => assert!(table.starts_with("Dataset & ")),
            other => panic!("expected table, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_scenario() {
        let store = ExperimentStore::new();
        let err = export_named(&store, "nope", &RankingOptions::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
