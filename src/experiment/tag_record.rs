//! Tag Record - named grouping of evaluations

use serde::{Deserialize, Serialize};

/// Tag Record groups evaluations under a name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TagRecord {
    name: String,
    evaluations: Vec<String>,
}

impl TagRecord {
    /// Create an empty tag.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            evaluations: Vec::new(),
        }
    }

    /// Get the tag name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Signatures of tagged evaluations, in tagging order.
    #[must_use]
    pub fn evaluations(&self) -> &[String] {
        &self.evaluations
    }

    /// Whether the evaluation carries this tag.
    #[must_use]
    pub fn contains(&self, signature: &str) -> bool {
        self.evaluations.iter().any(|s| s == signature)
    }

    /// Attach an evaluation; attaching twice is a no-op.
    pub fn add_evaluation(&mut self, signature: &str) {
        if !self.contains(signature) {
            self.evaluations.push(signature.to_string());
        }
    }

    /// Detach an evaluation.
    pub fn remove_evaluation(&mut self, signature: &str) {
        self.evaluations.retain(|s| s != signature);
    }
}
