//! evaltrack command-line entry point
//!
//! ```text
//! evaltrack summarize <log-file>
//! evaltrack export <snapshot.json> [scenario]
//! evaltrack resummarize <snapshot.json> [--force]
//! ```
//!
//! Ranking options come from `EVALTRACK_*` environment variables, log
//! verbosity from `RUST_LOG` (default `info`). Logs go to stderr, results to
//! stdout.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use evaltrack::config::RankingOptions;
use evaltrack::experiment::ExperimentStore;
use evaltrack::export::{export_named, ExportOutput};
use evaltrack::summarize::LogSummarizer;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "evaltrack")]
#[command(about = "Training-log summaries and cross-replicate leaderboards")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Summarize one training log and print it as JSON
    Summarize {
        /// Path to the log file
        log: PathBuf,
    },

    /// Run an export scenario over a store snapshot
    Export {
        /// Path to the JSON snapshot
        snapshot: PathBuf,

        /// top_rank_models_per_datasets or total_running_hours
        #[arg(default_value = "top_rank_models_per_datasets")]
        scenario: String,
    },

    /// Summarize every completed replicate and write the snapshot back
    Resummarize {
        /// Path to the JSON snapshot
        snapshot: PathBuf,

        /// Recompute cached summaries
        #[arg(short, long)]
        force: bool,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn summarize(log_path: &Path) -> Result<()> {
    let text = std::fs::read_to_string(log_path)
        .with_context(|| format!("reading log {}", log_path.display()))?;
    let summary = LogSummarizer::new()
        .summarize(&text)
        .with_context(|| format!("summarizing {}", log_path.display()))?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn export(snapshot: &Path, scenario: &str) -> Result<()> {
    let store = ExperimentStore::load_json(snapshot)
        .with_context(|| format!("loading snapshot {}", snapshot.display()))?;
    let options = RankingOptions::from_env().context("reading EVALTRACK_* options")?;
    info!(
        evaluations = store.evaluation_count(),
        experiments = store.experiment_count(),
        "snapshot loaded"
    );

    match export_named(&store, scenario, &options)? {
        ExportOutput::Table(table) => println!("{table}"),
        other => println!("{}", serde_json::to_string_pretty(&other)?),
    }
    Ok(())
}

fn resummarize(snapshot: &Path, force: bool) -> Result<()> {
    let store = ExperimentStore::load_json(snapshot)
        .with_context(|| format!("loading snapshot {}", snapshot.display()))?;
    let report = store.resummarize_all(&LogSummarizer::new(), force);
    for (session, error) in &report.failed {
        eprintln!("{session}: {error}");
    }
    store
        .save_json(snapshot)
        .with_context(|| format!("writing snapshot {}", snapshot.display()))?;
    println!(
        "summarized {} cached {} skipped {} failed {}",
        report.summarized.len(),
        report.cached.len(),
        report.skipped.len(),
        report.failed.len()
    );
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Command::Summarize { log } => summarize(&log),
        Command::Export { snapshot, scenario } => export(&snapshot, &scenario),
        Command::Resummarize { snapshot, force } => resummarize(&snapshot, force),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_summarize() {
        let cli = Cli::try_parse_from(["evaltrack", "summarize", "run.log"]).unwrap();
        assert!(matches!(cli.command, Command::Summarize { log } if log == Path::new("run.log")));
    }

    #[test]
    fn test_parse_export_default_scenario() {
        let cli = Cli::try_parse_from(["evaltrack", "export", "snap.json"]).unwrap();
        match cli.command {
            Command::Export { snapshot, scenario } => {
                assert_eq!(snapshot, Path::new("snap.json"));
                assert_eq!(scenario, "top_rank_models_per_datasets");
            }
            other => panic!("unexpected command {other:?}"),
        }

        let cli =
            Cli::try_parse_from(["evaltrack", "export", "snap.json", "total_running_hours"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Export { scenario, .. } if scenario == "total_running_hours"
        ));
    }

    #[test]
    fn test_parse_resummarize_force_anywhere() {
        for args in [
            vec!["evaltrack", "resummarize", "snap.json", "--force"],
            vec!["evaltrack", "resummarize", "-f", "snap.json"],
        ] {
            let cli = Cli::try_parse_from(args).unwrap();
            assert!(matches!(cli.command, Command::Resummarize { force: true, .. }));
        }

        let cli = Cli::try_parse_from(["evaltrack", "resummarize", "snap.json"]).unwrap();
        assert!(matches!(cli.command, Command::Resummarize { force: false, .. }));
    }

    #[test]
    fn test_rejects_bad_arguments() {
        assert!(Cli::try_parse_from(["evaltrack", "export", "--force", "snap.json"]).is_err());
        assert!(Cli::try_parse_from(["evaltrack", "summarize"]).is_err());
        assert!(Cli::try_parse_from(["evaltrack", "leaderboard"]).is_err());
    }

    #[test]
    fn test_help_is_available() {
        let err = Cli::try_parse_from(["evaltrack", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }
}
