//! Experiment Store - in-memory keyed storage for tracking records
//!
//! Evaluations are keyed by signature (and uniquely by command),
//! replicates by session token (and uniquely by `(signature, seed)`),
//! tags by name. All maps are `DashMap`s so bulk summarization can fan out
//! across threads without an outer lock.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{EvaluationRecord, ExperimentRecord, TagRecord};
use crate::aggregate::Performance;
use crate::rank::Candidate;
use crate::summarize::{LogSummarizer, LogSummary};
use crate::{Error, Result};

/// Longest accepted evaluation signature.
pub const MAX_SIGNATURE_LENGTH: usize = 10;

/// Longest accepted tag name.
pub const MAX_TAG_LENGTH: usize = 50;

/// Length of generated session tokens.
pub const SESSION_LENGTH: usize = 32;

/// In-memory store for evaluations, replicates and tags.
#[derive(Debug, Default)]
pub struct ExperimentStore {
    evaluations: DashMap<String, EvaluationRecord>,
    commands: DashMap<String, String>,
    experiments: DashMap<String, ExperimentRecord>,
    replicates: DashMap<(String, i64), String>,
    tags: DashMap<String, TagRecord>,
    next_sequence: AtomicU64,
}

/// Serializable image of a store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSnapshot {
    /// Evaluations in insertion order
    pub evaluations: Vec<EvaluationRecord>,
    /// Replicates grouped by evaluation, by seed
    pub experiments: Vec<ExperimentRecord>,
    /// Tags by name
    pub tags: Vec<TagRecord>,
}

/// Outcome of a bulk summarization pass.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Sessions summarized during this pass
    pub summarized: Vec<String>,
    /// Sessions whose cached summary was reused
    pub cached: Vec<String>,
    /// Sessions without recorded performance (not completed yet)
    pub skipped: Vec<String>,
    /// Sessions whose log could not be summarized
    pub failed: Vec<(String, Error)>,
}

enum BatchOutcome {
    Summarized,
    Cached,
    Skipped,
    Failed(Error),
}

impl ExperimentStore {
    /// Create a new empty experiment store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the store is empty (no evaluations, replicates, or tags).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.evaluations.is_empty() && self.experiments.is_empty() && self.tags.is_empty()
    }

    /// Get the number of evaluations in the store.
    #[must_use]
    pub fn evaluation_count(&self) -> usize {
        self.evaluations.len()
    }

    /// Get the number of replicates in the store.
    #[must_use]
    pub fn experiment_count(&self) -> usize {
        self.experiments.len()
    }

    // ------------------------------------------------------------------
    // Evaluations
    // ------------------------------------------------------------------

    /// Add a new evaluation.
    ///
    /// `configuration` is the JSON document the trainer was launched with.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] for an empty or over-long signature
    /// - [`Error::Json`] if the configuration is not JSON
    /// - [`Error::EvaluationConflict`] if the signature or command is taken
    pub fn create_evaluation(
        &self,
        signature: &str,
        command: &str,
        configuration: &str,
    ) -> Result<EvaluationRecord> {
        validate_signature(signature)?;
        let configuration: serde_json::Value = serde_json::from_str(configuration)?;
        let record = EvaluationRecord::builder(signature, command)
            .configuration(configuration)
            .build();
        self.insert_evaluation(record)
    }

    /// Get the evaluation with this signature, creating it if absent.
    ///
    /// # Errors
    ///
    /// Same as [`ExperimentStore::create_evaluation`] when creating.
    pub fn create_or_get_evaluation(
        &self,
        signature: &str,
        command: &str,
        configuration: &str,
    ) -> Result<EvaluationRecord> {
        if let Some(existing) = self.evaluations.get(signature) {
            return Ok(existing.clone());
        }
        self.create_evaluation(signature, command, configuration)
    }

    /// Insert a prepared evaluation record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EvaluationConflict`] if the signature or command is taken.
    pub fn insert_evaluation(&self, mut record: EvaluationRecord) -> Result<EvaluationRecord> {
        match self.evaluations.entry(record.signature().to_string()) {
            Entry::Occupied(_) => Err(Error::EvaluationConflict(format!(
                "signature {} already exists",
                record.signature()
            ))),
            Entry::Vacant(slot) => {
                match self.commands.entry(record.command().to_string()) {
                    Entry::Occupied(owner) => {
                        return Err(Error::EvaluationConflict(format!(
                            "command already registered by {}",
                            owner.get()
                        )));
                    }
                    Entry::Vacant(command_slot) => {
                        command_slot.insert(record.signature().to_string());
                    }
                }
                record.set_sequence(self.next_sequence.fetch_add(1, Ordering::Relaxed));
                tracing::debug!(signature = record.signature(), "evaluation created");
                slot.insert(record.clone());
                Ok(record)
            }
        }
    }

    /// Check if an evaluation exists.
    #[must_use]
    pub fn evaluation_exists(&self, signature: &str) -> bool {
        self.evaluations.contains_key(signature)
    }

    /// Get an evaluation by signature.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EvaluationNotFound`] for an unknown signature.
    pub fn get_evaluation(&self, signature: &str) -> Result<EvaluationRecord> {
        self.evaluations
            .get(signature)
            .map(|record| record.clone())
            .ok_or_else(|| Error::EvaluationNotFound(signature.to_string()))
    }

    /// All evaluations in insertion order.
    #[must_use]
    pub fn evaluations(&self) -> Vec<EvaluationRecord> {
        let mut records: Vec<EvaluationRecord> =
            self.evaluations.iter().map(|r| r.value().clone()).collect();
        records.sort_by_key(EvaluationRecord::sequence);
        records
    }

    /// Delete an evaluation together with its replicates and tag links.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EvaluationNotFound`] for an unknown signature.
    pub fn delete_evaluation(&self, signature: &str) -> Result<()> {
        let (_, record) = self
            .evaluations
            .remove(signature)
            .ok_or_else(|| Error::EvaluationNotFound(signature.to_string()))?;
        self.commands.remove(record.command());

        let sessions: Vec<String> = self
            .experiments
            .iter()
            .filter(|exp| exp.signature() == signature)
            .map(|exp| exp.session().to_string())
            .collect();
        for session in &sessions {
            if let Some((_, exp)) = self.experiments.remove(session) {
                self.replicates
                    .remove(&(signature.to_string(), exp.seed()));
            }
        }

        for mut tag in self.tags.iter_mut() {
            tag.remove_evaluation(signature);
        }

        tracing::info!(signature, replicates = sessions.len(), "evaluation deleted");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Replicates
    // ------------------------------------------------------------------

    /// Get the replicate of an evaluation for a seed, creating it if absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EvaluationNotFound`] for an unknown signature.
    pub fn create_or_get_experiment(&self, signature: &str, seed: i64) -> Result<ExperimentRecord> {
        if !self.evaluation_exists(signature) {
            return Err(Error::EvaluationNotFound(signature.to_string()));
        }

        match self.replicates.entry((signature.to_string(), seed)) {
            Entry::Occupied(slot) => self.get_experiment(slot.get()),
            Entry::Vacant(slot) => {
                let session = self.fresh_session();
                let record = ExperimentRecord::new(session.clone(), signature, seed);
                self.experiments.insert(session.clone(), record.clone());
                // delete_evaluation may have run since the check above
                if !self.evaluation_exists(signature) {
                    self.experiments.remove(&session);
                    return Err(Error::EvaluationNotFound(signature.to_string()));
                }
                slot.insert(session);
                tracing::debug!(signature, seed, "replicate created");
                Ok(record)
            }
        }
    }

    fn fresh_session(&self) -> String {
        let mut rng = rand::thread_rng();
        loop {
            let session: String = (&mut rng)
                .sample_iter(&Alphanumeric)
                .take(SESSION_LENGTH)
                .map(char::from)
                .collect();
            if !self.experiments.contains_key(&session) {
                return session;
            }
        }
    }

    /// Get a replicate by session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ExperimentNotFound`] for an unknown session.
    pub fn get_experiment(&self, session: &str) -> Result<ExperimentRecord> {
        self.experiments
            .get(session)
            .map(|record| record.clone())
            .ok_or_else(|| Error::ExperimentNotFound(session.to_string()))
    }

    /// Look a replicate up by session, or else by signature and seed.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] if neither a session nor a signature/seed pair is given
    /// - [`Error::ExperimentNotFound`] if nothing matches
    pub fn find_experiment(
        &self,
        signature: Option<&str>,
        seed: Option<i64>,
        session: Option<&str>,
    ) -> Result<ExperimentRecord> {
        if let Some(session) = session {
            return self.get_experiment(session);
        }
        let (Some(signature), Some(seed)) = (signature, seed) else {
            return Err(Error::InvalidInput(
                "need a session, or a signature and a seed".to_string(),
            ));
        };
        let session = self
            .replicates
            .get(&(signature.to_string(), seed))
            .map(|s| s.value().clone())
            .ok_or_else(|| Error::ExperimentNotFound(format!("{signature} seed {seed}")))?;
        self.get_experiment(&session)
    }

    /// Completed replicates of an evaluation, by seed.
    #[must_use]
    pub fn completed_experiments(&self, signature: &str) -> Vec<ExperimentRecord> {
        let mut records: Vec<ExperimentRecord> = self
            .experiments
            .iter()
            .filter(|exp| exp.signature() == signature && exp.is_completed())
            .map(|exp| exp.value().clone())
            .collect();
        records.sort_by_key(ExperimentRecord::seed);
        records
    }

    /// Record the PID of the process running a replicate.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ExperimentNotFound`] for an unknown session.
    pub fn register_pid(&self, session: &str, pid: u32) -> Result<ExperimentRecord> {
        let mut record = self
            .experiments
            .get_mut(session)
            .ok_or_else(|| Error::ExperimentNotFound(session.to_string()))?;
        record.register(pid);
        Ok(record.clone())
    }

    /// Complete a replicate with its raw log and final metrics.
    ///
    /// # Errors
    ///
    /// - [`Error::ExperimentNotFound`] for an unknown session
    /// - [`Error::AlreadyCompleted`] if the replicate was completed before
    pub fn complete_experiment(
        &self,
        session: &str,
        log: impl Into<String>,
        performance: Performance,
    ) -> Result<ExperimentRecord> {
        let mut record = self
            .experiments
            .get_mut(session)
            .ok_or_else(|| Error::ExperimentNotFound(session.to_string()))?;
        record.complete(log, performance)?;
        tracing::info!(
            session,
            signature = record.signature(),
            seed = record.seed(),
            "replicate completed"
        );
        Ok(record.clone())
    }

    // ------------------------------------------------------------------
    // Summaries
    // ------------------------------------------------------------------

    /// Summarize one replicate's log, reusing its cached summary.
    ///
    /// # Errors
    ///
    /// - [`Error::ExperimentNotFound`] for an unknown session
    /// - any error of [`ExperimentRecord::summarize`]
    pub fn summarize_experiment(
        &self,
        session: &str,
        summarizer: &LogSummarizer,
    ) -> Result<LogSummary> {
        let mut record = self
            .experiments
            .get_mut(session)
            .ok_or_else(|| Error::ExperimentNotFound(session.to_string()))?;
        record.summarize(summarizer).cloned()
    }

    /// Summarize every replicate, isolating failures per replicate.
    ///
    /// With `force` cached summaries are recomputed; otherwise they are
    /// reused. Runs in parallel when the `rayon` feature is enabled.
    pub fn resummarize_all(&self, summarizer: &LogSummarizer, force: bool) -> BatchReport {
        let mut sessions: Vec<String> = self.experiments.iter().map(|e| e.key().clone()).collect();
        sessions.sort();

        let summarize_one = |session: String| -> (String, BatchOutcome) {
            let Some(mut record) = self.experiments.get_mut(&session) else {
                return (session, BatchOutcome::Skipped);
            };
            let had_summary = record.summary().is_some();
            let outcome = if had_summary && !force {
                BatchOutcome::Cached
            } else {
                let result = if force {
                    record.resummarize(summarizer).map(|_| ())
                } else {
                    record.summarize(summarizer).map(|_| ())
                };
                match result {
                    Ok(()) => BatchOutcome::Summarized,
                    Err(Error::NoPerformanceData { .. }) => BatchOutcome::Skipped,
                    Err(e) => BatchOutcome::Failed(e),
                }
            };
            drop(record);
            (session, outcome)
        };

        #[cfg(feature = "rayon")]
        let outcomes: Vec<(String, BatchOutcome)> = {
            use rayon::prelude::*;
            sessions.into_par_iter().map(summarize_one).collect()
        };
        #[cfg(not(feature = "rayon"))]
        let outcomes: Vec<(String, BatchOutcome)> =
            sessions.into_iter().map(summarize_one).collect();

        let mut report = BatchReport::default();
        for (session, outcome) in outcomes {
            match outcome {
                BatchOutcome::Summarized => report.summarized.push(session),
                BatchOutcome::Cached => report.cached.push(session),
                BatchOutcome::Skipped => report.skipped.push(session),
                BatchOutcome::Failed(e) => {
                    tracing::warn!(session = session.as_str(), error = %e, "summarization failed");
                    report.failed.push((session, e));
                }
            }
        }

        tracing::info!(
            summarized = report.summarized.len(),
            cached = report.cached.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "bulk summarization finished"
        );
        report
    }

    /// Hours spent training (after preparation) across summarized replicates
    /// of existing evaluations.
    #[must_use]
    pub fn total_running_hours(&self) -> f64 {
        let seconds: f64 = self
            .experiments
            .iter()
            .filter(|exp| self.evaluation_exists(exp.signature()))
            .filter_map(|exp| exp.summary().map(LogSummary::training_time))
            .sum();
        seconds / 3600.0
    }

    /// Ranking candidates: every evaluation with its completed replicates'
    /// performance, in insertion order.
    #[must_use]
    pub fn candidates(&self) -> Vec<Candidate> {
        let mut per_evaluation: BTreeMap<String, Vec<(i64, Performance)>> = BTreeMap::new();
        for exp in self.experiments.iter() {
            if let (true, Some(performance)) = (exp.is_completed(), exp.performance()) {
                per_evaluation
                    .entry(exp.signature().to_string())
                    .or_default()
                    .push((exp.seed(), performance.clone()));
            }
        }

        self.evaluations()
            .into_iter()
            .map(|evaluation| {
                let mut replicates = per_evaluation
                    .remove(evaluation.signature())
                    .unwrap_or_default();
                replicates.sort_by_key(|(seed, _)| *seed);
                Candidate::new(
                    evaluation,
                    replicates.into_iter().map(|(_, perf)| perf).collect(),
                )
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // Tags
    // ------------------------------------------------------------------

    /// Get the tag with this name, creating it if absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for an empty or over-long name.
    pub fn create_or_get_tag(&self, name: &str) -> Result<TagRecord> {
        if name.is_empty() || name.chars().count() > MAX_TAG_LENGTH {
            return Err(Error::InvalidInput(format!(
                "tag name must be 1..={MAX_TAG_LENGTH} characters"
            )));
        }
        Ok(self
            .tags
            .entry(name.to_string())
            .or_insert_with(|| TagRecord::new(name))
            .clone())
    }

    /// Get a tag by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TagNotFound`] for an unknown name.
    pub fn get_tag(&self, name: &str) -> Result<TagRecord> {
        self.tags
            .get(name)
            .map(|tag| tag.clone())
            .ok_or_else(|| Error::TagNotFound(name.to_string()))
    }

    /// Attach an evaluation to a tag.
    ///
    /// # Errors
    ///
    /// - [`Error::TagNotFound`] for an unknown tag
    /// - [`Error::EvaluationNotFound`] for an unknown signature
    pub fn tag_evaluation(&self, name: &str, signature: &str) -> Result<TagRecord> {
        if !self.evaluation_exists(signature) {
            return Err(Error::EvaluationNotFound(signature.to_string()));
        }
        let mut tag = self
            .tags
            .get_mut(name)
            .ok_or_else(|| Error::TagNotFound(name.to_string()))?;
        tag.add_evaluation(signature);
        Ok(tag.clone())
    }

    /// Delete a tag.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TagNotFound`] for an unknown name.
    pub fn remove_tag(&self, name: &str) -> Result<()> {
        self.tags
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| Error::TagNotFound(name.to_string()))
    }

    /// Names of the tags an evaluation carries, sorted.
    #[must_use]
    pub fn evaluation_tags(&self, signature: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .tags
            .iter()
            .filter(|tag| tag.contains(signature))
            .map(|tag| tag.name().to_string())
            .collect();
        names.sort();
        names
    }

    // ------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------

    /// Capture the store contents.
    #[must_use]
    pub fn snapshot(&self) -> StoreSnapshot {
        let evaluations = self.evaluations();
        let mut experiments: Vec<ExperimentRecord> = Vec::with_capacity(self.experiments.len());
        for evaluation in &evaluations {
            let mut replicates: Vec<ExperimentRecord> = self
                .experiments
                .iter()
                .filter(|exp| exp.signature() == evaluation.signature())
                .map(|exp| exp.value().clone())
                .collect();
            replicates.sort_by_key(ExperimentRecord::seed);
            experiments.extend(replicates);
        }
        let mut tags: Vec<TagRecord> = self.tags.iter().map(|t| t.value().clone()).collect();
        tags.sort_by(|a, b| a.name().cmp(b.name()));

        StoreSnapshot {
            evaluations,
            experiments,
            tags,
        }
    }

    /// Rebuild a store from a snapshot.
    ///
    /// # Errors
    ///
    /// - [`Error::EvaluationConflict`] on duplicate signatures or commands
    /// - [`Error::EvaluationNotFound`] for a replicate or tag of an unknown evaluation
    /// - [`Error::InvalidInput`] for a duplicated session or `(signature, seed)`
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Result<Self> {
        let store = Self::new();
        for evaluation in snapshot.evaluations {
            store.insert_evaluation(evaluation)?;
        }
        for exp in snapshot.experiments {
            if !store.evaluation_exists(exp.signature()) {
                return Err(Error::EvaluationNotFound(exp.signature().to_string()));
            }
            let key = (exp.signature().to_string(), exp.seed());
            if store.replicates.contains_key(&key) || store.experiments.contains_key(exp.session())
            {
                return Err(Error::InvalidInput(format!(
                    "duplicate replicate {} seed {}",
                    exp.signature(),
                    exp.seed()
                )));
            }
            store.replicates.insert(key, exp.session().to_string());
            store.experiments.insert(exp.session().to_string(), exp);
        }
        for tag in snapshot.tags {
            if let Some(unknown) = tag
                .evaluations()
                .iter()
                .find(|signature| !store.evaluation_exists(signature))
            {
                return Err(Error::EvaluationNotFound(unknown.clone()));
            }
            store.tags.insert(tag.name().to_string(), tag);
        }
        Ok(store)
    }

    /// Write a JSON snapshot to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] or [`Error::Json`] if writing fails.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref())?;
        serde_json::to_writer_pretty(BufWriter::new(file), &self.snapshot())?;
        Ok(())
    }

    /// Load a store from a JSON snapshot at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] or [`Error::Json`] if reading fails, or any
    /// error of [`ExperimentStore::from_snapshot`].
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let snapshot: StoreSnapshot = serde_json::from_reader(BufReader::new(file))?;
        Self::from_snapshot(snapshot)
    }
}

fn validate_signature(signature: &str) -> Result<()> {
    if signature.is_empty() || signature.chars().count() > MAX_SIGNATURE_LENGTH {
        return Err(Error::InvalidInput(format!(
            "signature must be 1..={MAX_SIGNATURE_LENGTH} characters"
        )));
    }
    Ok(())
}
