//! `${VAR}` expansion for test-info documents
//!
//! Lets credentials stay out of the YAML file: `password: ${SMB_PASS}` takes
//! the value of `SMB_PASS`. Expansion runs on the parsed document's string
//! scalars, so a value is used verbatim whatever YAML syntax it contains.
//! Comments are gone by then and never expanded.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_yaml::Value;
use std::env;

use crate::config::ConfigError;

static ENV_VAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid pattern"));

/// Substitute environment variable references in a single string.
///
/// Returns an error listing every variable that is referenced but unset.
pub fn substitute_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut missing = Vec::new();
    let output = expand(input, &mut missing);
    missing_error(missing)?;
    Ok(output)
}

/// Substitute environment variable references in every string scalar of a
/// parsed document. Mapping keys are left alone.
pub fn expand_env_in_value(value: &mut Value) -> Result<(), ConfigError> {
    let mut missing = Vec::new();
    expand_value(value, &mut missing);
    missing_error(missing)
}

fn expand_value(value: &mut Value, missing: &mut Vec<String>) {
    match value {
        Value::String(s) => {
            if ENV_VAR_PATTERN.is_match(s) {
                *s = expand(s, missing);
            }
        }
        Value::Sequence(items) => {
            for item in items {
                expand_value(item, missing);
            }
        }
        Value::Mapping(map) => {
            for item in map.values_mut() {
                expand_value(item, missing);
            }
        }
        Value::Tagged(tagged) => expand_value(&mut tagged.value, missing),
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

fn expand(input: &str, missing: &mut Vec<String>) -> String {
    ENV_VAR_PATTERN
        .replace_all(input, |caps: &Captures<'_>| {
            let name = &caps[1];
            match env::var(name) {
                Ok(value) => value,
                Err(_) => {
                    if !missing.iter().any(|m| m == name) {
                        missing.push(name.to_string());
                    }
                    String::new()
                }
            }
        })
        .into_owned()
}

fn missing_error(missing: Vec<String>) -> Result<(), ConfigError> {
    if missing.is_empty() {
        return Ok(());
    }
    Err(ConfigError::ValidationError(format!(
        "Missing environment variables: {}",
        missing.join(", ")
    )))
}
