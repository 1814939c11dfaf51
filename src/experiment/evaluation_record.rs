//! Evaluation Record - one named training configuration

use crate::command::{argument_stem, parse_command};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Corpus-type qualifier some dataset names carry (`AutomotiveRB`).
pub const DATASET_SUFFIX: &str = "rb";

/// Evaluation Record represents a configuration that is run repeatedly.
///
/// This is the root entity of the tracking schema: each evaluation owns
/// zero or more replicate experiments, one per seed. It is keyed by a short
/// signature and, uniquely, by the command that launches it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvaluationRecord {
    signature: String,
    command: String,
    configuration: Value,
    comment: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    sequence: u64,
}

impl EvaluationRecord {
    /// Create a new evaluation record with an empty configuration.
    ///
    /// # Arguments
    ///
    /// * `signature` - Short unique key
    /// * `command` - Launch command, unique across evaluations
    #[must_use]
    pub fn new(signature: impl Into<String>, command: impl Into<String>) -> Self {
        Self::builder(signature, command).build()
    }

    /// Create a builder for constructing an evaluation record with optional fields.
    #[must_use]
    pub fn builder(
        signature: impl Into<String>,
        command: impl Into<String>,
    ) -> EvaluationRecordBuilder {
        EvaluationRecordBuilder::new(signature, command)
    }

    /// Get the signature.
    #[must_use]
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Get the launch command.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Get the configuration document.
    #[must_use]
    pub const fn configuration(&self) -> &Value {
        &self.configuration
    }

    /// Get the free-text comment.
    #[must_use]
    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// Get the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Insertion position within its store.
    #[must_use]
    pub const fn sequence(&self) -> u64 {
        self.sequence
    }

    pub(crate) fn set_sequence(&mut self, sequence: u64) {
        self.sequence = sequence;
    }

    /// Keyword arguments of the launch command.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCommand`] if the command is malformed.
    pub fn command_args(&self) -> Result<Map<String, Value>> {
        parse_command(&self.command)
    }

    /// Dataset key, e.g. `automotive`.
    ///
    /// Read from `data.name` in the configuration (lower-cased, with
    /// [`DATASET_SUFFIX`] stripped), falling back to the file stem of the
    /// command's `--data` argument.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if neither source names a dataset.
    pub fn dataset(&self) -> Result<String> {
        self.identity("data").map(|name| {
            name.strip_suffix(DATASET_SUFFIX)
                .map_or_else(|| name.clone(), str::to_string)
        })
    }

    /// Model key, e.g. `dcn_id`.
    ///
    /// Read from `model.name` in the configuration (lower-cased), falling
    /// back to the file stem of the command's `--model` argument.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if neither source names a model.
    pub fn model(&self) -> Result<String> {
        self.identity("model")
    }

    fn identity(&self, section: &str) -> Result<String> {
        if let Some(name) = self
            .configuration
            .get(section)
            .and_then(|s| s.get("name"))
            .and_then(Value::as_str)
        {
            return Ok(name.to_lowercase());
        }

        let args = self.command_args()?;
        argument_stem(&args, section).ok_or_else(|| {
            Error::InvalidConfiguration(format!(
                "evaluation {} names no {section} (neither {section}.name nor --{section})",
                self.signature
            ))
        })
    }
}

/// Builder for `EvaluationRecord`.
#[derive(Debug)]
pub struct EvaluationRecordBuilder {
    signature: String,
    command: String,
    configuration: Value,
    comment: String,
    created_at: DateTime<Utc>,
}

impl EvaluationRecordBuilder {
    /// Create a new builder with required fields.
    #[must_use]
    pub fn new(signature: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            signature: signature.into(),
            command: command.into(),
            configuration: Value::Object(Map::new()),
            comment: String::new(),
            created_at: Utc::now(),
        }
    }

    /// Set the configuration document.
    #[must_use]
    pub fn configuration(mut self, configuration: Value) -> Self {
        self.configuration = configuration;
        self
    }

    /// Set a free-text comment.
    #[must_use]
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Set a custom creation timestamp (useful for deserialization/testing).
    #[must_use]
    pub const fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Build the `EvaluationRecord`.
    #[must_use]
    pub fn build(self) -> EvaluationRecord {
        EvaluationRecord {
            signature: self.signature,
            command: self.command,
            configuration: self.configuration,
            comment: self.comment,
            created_at: self.created_at,
            sequence: 0,
        }
    }
}
