//! Line-matching rules for the summarizer

use crate::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;

/// Absolute start stamp, e.g. `START TIME: 2024-01-01 00:00:00.000000`.
pub const DEFAULT_START_PATTERN: &str =
    r"START TIME: (\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}\.\d{6})";

/// Bracketed runtime clock at the head of a line, e.g. `[00:12:34]`.
pub const DEFAULT_RUNTIME_PATTERN: &str = r"^\[(\d+:\d{2}:\d{2})\]";

/// Emitted once the per-batch learning rate is finalized.
pub const DEFAULT_PREP_MARKER: &str = "use single lr";

/// End-of-epoch training report, e.g. `[epoch 3] loss 0.4213`.
///
/// The trainer tags every line emitted during an epoch with `[epoch N]`,
/// including the `start training` banner and validation readings, so only
/// the `loss` report marks the end of an epoch. Use
/// [`LineRulesBuilder::epoch_pattern`] to count other lines.
pub const DEFAULT_EPOCH_PATTERN: &str = r"\[epoch (\d+)\] loss";

/// Epoch-scoped validation reading, e.g. `[epoch 3] GAUC 0.6512`.
pub const DEFAULT_VALID_PATTERN: &str = r"\[epoch \d+\] GAUC (\d+(?:\.\d+)?)";

static DEFAULT_RULES: Lazy<LineRules> = Lazy::new(|| LineRules {
    start: Regex::new(DEFAULT_START_PATTERN).expect("default start pattern compiles"),
    runtime: Regex::new(DEFAULT_RUNTIME_PATTERN).expect("default runtime pattern compiles"),
    prep_marker: DEFAULT_PREP_MARKER.to_string(),
    epoch: Regex::new(DEFAULT_EPOCH_PATTERN).expect("default epoch pattern compiles"),
    valid_metric: Regex::new(DEFAULT_VALID_PATTERN).expect("default valid pattern compiles"),
});

/// The five match rules evaluated against every log line.
///
/// Rules are independent: one line may hit several of them. The start,
/// runtime and validation rules must expose their value in capture group 1.
#[derive(Debug, Clone)]
pub struct LineRules {
    start: Regex,
    runtime: Regex,
    prep_marker: String,
    epoch: Regex,
    valid_metric: Regex,
}

impl Default for LineRules {
    fn default() -> Self {
        DEFAULT_RULES.clone()
    }
}

impl LineRules {
    /// Start a builder seeded with the default rules.
    #[must_use]
    pub fn builder() -> LineRulesBuilder {
        LineRulesBuilder::default()
    }

    /// Captured absolute stamp, if the line carries the start marker.
    #[must_use]
    pub fn match_start<'l>(&self, line: &'l str) -> Option<&'l str> {
        capture_one(&self.start, line)
    }

    /// Captured `HH:MM:SS` clock, if the line opens with one.
    #[must_use]
    pub fn match_runtime<'l>(&self, line: &'l str) -> Option<&'l str> {
        capture_one(&self.runtime, line)
    }

    /// Whether the line carries the preparation-end marker.
    #[must_use]
    pub fn is_prep_marker(&self, line: &str) -> bool {
        line.contains(self.prep_marker.as_str())
    }

    /// Whether the line marks an epoch boundary.
    #[must_use]
    pub fn is_epoch_boundary(&self, line: &str) -> bool {
        self.epoch.is_match(line)
    }

    /// Captured validation reading, if the line carries one.
    #[must_use]
    pub fn match_valid_metric<'l>(&self, line: &'l str) -> Option<&'l str> {
        capture_one(&self.valid_metric, line)
    }

    /// The literal preparation marker.
    #[must_use]
    pub fn prep_marker(&self) -> &str {
        &self.prep_marker
    }
}

fn capture_one<'l>(re: &Regex, line: &'l str) -> Option<&'l str> {
    re.captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Builder for [`LineRules`].
#[derive(Debug, Clone)]
pub struct LineRulesBuilder {
    start: String,
    runtime: String,
    prep_marker: String,
    epoch: String,
    valid_metric: String,
}

impl Default for LineRulesBuilder {
    fn default() -> Self {
        Self {
            start: DEFAULT_START_PATTERN.to_string(),
            runtime: DEFAULT_RUNTIME_PATTERN.to_string(),
            prep_marker: DEFAULT_PREP_MARKER.to_string(),
            epoch: DEFAULT_EPOCH_PATTERN.to_string(),
            valid_metric: DEFAULT_VALID_PATTERN.to_string(),
        }
    }
}

impl LineRulesBuilder {
    /// Pattern for the absolute start stamp (group 1 = stamp).
    #[must_use]
    pub fn start_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.start = pattern.into();
        self
    }

    /// Pattern for the runtime clock (group 1 = `HH:MM:SS`).
    #[must_use]
    pub fn runtime_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.runtime = pattern.into();
        self
    }

    /// Literal preparation-end marker.
    #[must_use]
    pub fn prep_marker(mut self, marker: impl Into<String>) -> Self {
        self.prep_marker = marker.into();
        self
    }

    /// Pattern for epoch boundaries.
    #[must_use]
    pub fn epoch_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.epoch = pattern.into();
        self
    }

    /// Pattern for validation readings (group 1 = value).
    #[must_use]
    pub fn valid_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.valid_metric = pattern.into();
        self
    }

    /// Compile the rules.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if a pattern does not compile, a
    /// capturing rule has no capture group, or the preparation marker is
    /// empty.
    pub fn build(self) -> Result<LineRules> {
        if self.prep_marker.is_empty() {
            return Err(Error::InvalidInput(
                "preparation marker must not be empty".to_string(),
            ));
        }
        Ok(LineRules {
            start: compile("start", &self.start, true)?,
            runtime: compile("runtime", &self.runtime, true)?,
            prep_marker: self.prep_marker,
            epoch: compile("epoch", &self.epoch, false)?,
            valid_metric: compile("validation", &self.valid_metric, true)?,
        })
    }
}

fn compile(rule: &str, pattern: &str, needs_capture: bool) -> Result<Regex> {
    let re = Regex::new(pattern)
        .map_err(|e| Error::InvalidInput(format!("{rule} pattern does not compile: {e}")))?;
    // captures_len counts the implicit whole-match group
    if needs_capture && re.captures_len() < 2 {
        return Err(Error::InvalidInput(format!(
            "{rule} pattern needs a capture group"
        )));
    }
    Ok(re)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rules_match_trainer_lines() {
        let rules = LineRules::default();
        assert_eq!(
            rules.match_start("START TIME: 2024-01-01 00:00:00.000000"),
            Some("2024-01-01 00:00:00.000000")
        );
        assert_eq!(
            rules.match_runtime("[01:02:03] |Trainer| hello"),
            Some("01:02:03")
        );
        assert!(rules.is_prep_marker("[00:00:05] |Trainer| use single lr: 0.001"));
        assert!(rules.is_epoch_boundary("[00:00:20] |BaseLego| [epoch 2] loss 0.41"));
        assert_eq!(
            rules.match_valid_metric("[00:00:15] |BaseLego| [epoch 1] GAUC 0.600"),
            Some("0.600")
        );
    }

    #[test]
    fn test_runtime_only_at_line_head() {
        let rules = LineRules::default();
        assert!(rules.match_runtime("note [00:00:05] later").is_none());
        assert!(rules.match_runtime("[INFO] not a clock").is_none());
    }

    #[test]
    fn test_validation_line_is_not_a_boundary() {
        let rules = LineRules::default();
        assert!(!rules.is_epoch_boundary("[00:00:15] |BaseLego| [epoch 1] GAUC 0.600"));
    }

    #[test]
    fn test_only_loss_report_is_a_boundary() {
        let rules = LineRules::default();
        assert!(!rules.is_epoch_boundary("[00:00:05] |BaseLego| [epoch 1] start training"));
        assert!(!rules.is_epoch_boundary("[00:00:20] |BaseLego| [epoch 2] ..."));
        assert!(rules.is_epoch_boundary("[00:00:20] |BaseLego| [epoch 2] loss 0.4213"));
    }

    #[test]
    fn test_builder_overrides() {
        let rules = LineRules::builder()
            .prep_marker("warmup done")
            .valid_pattern(r"val_acc=(\d+\.\d+)")
            .build()
            .unwrap();
        assert!(rules.is_prep_marker("... warmup done ..."));
        assert_eq!(rules.match_valid_metric("val_acc=0.91"), Some("0.91"));
        assert_eq!(rules.prep_marker(), "warmup done");
    }

    #[test]
    fn test_builder_rejects_missing_capture_group() {
        let err = LineRules::builder()
            .valid_pattern(r"GAUC \d+")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("capture group"));
    }

    #[test]
    fn test_builder_rejects_bad_regex() {
        assert!(LineRules::builder().epoch_pattern("[epoch").build().is_err());
        assert!(LineRules::builder().prep_marker("").build().is_err());
    }
}
