//! Launch-command parsing
//!
//! Evaluations are keyed by the command that launched them, e.g.
//!
//! ```text
//! python trainer.py --data config/recbench/automotive.yaml --model config/model/dcn_id.yaml --lr 0.001
//! ```
//!
//! The interpreter and script are skipped; everything after them must be
//! `--key value` pairs. Values are coerced to JSON scalars.

use crate::{Error, Result};
use serde_json::{Map, Number, Value};
use std::path::Path;

/// Parse a launch command into its keyword arguments.
///
/// # Errors
///
/// Returns [`Error::InvalidCommand`] if an argument position expects a
/// `--key` and finds anything else, or a trailing key has no value.
///
/// # Examples
///
/// ```rust
/// use evaltrack::command::parse_command;
///
/// let args = parse_command("python trainer.py --batch_size 5000 --fast_eval false").unwrap();
/// assert_eq!(args["batch_size"], 5000);
/// assert_eq!(args["fast_eval"], false);
/// ```
pub fn parse_command(command: &str) -> Result<Map<String, Value>> {
    let mut kwargs = Map::new();
    let mut key: Option<&str> = None;

    for arg in command.split(' ').skip(2) {
        if let Some(k) = key.take() {
            kwargs.insert(k.to_string(), coerce(arg));
        } else {
            let k = arg.strip_prefix("--").ok_or_else(|| {
                Error::InvalidCommand(format!("expected --key, found '{arg}'"))
            })?;
            key = Some(k);
        }
    }

    if let Some(k) = key {
        return Err(Error::InvalidCommand(format!("--{k} has no value")));
    }

    Ok(kwargs)
}

fn coerce(value: &str) -> Value {
    if value == "null" {
        return Value::Null;
    }
    let digits = value.strip_prefix('-').unwrap_or(value);
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(int) = value.parse::<i64>() {
            return Value::from(int);
        }
    }
    if value.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if value.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if let Some(float) = value.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(float);
    }
    Value::String(value.to_string())
}

/// File stem of a path-valued argument, lower-cased
/// (`config/model/DCN_id.yaml` -> `dcn_id`).
#[must_use]
pub fn argument_stem(kwargs: &Map<String, Value>, key: &str) -> Option<String> {
    let path = kwargs.get(key)?.as_str()?;
    Path::new(path)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_lowercase)
}
