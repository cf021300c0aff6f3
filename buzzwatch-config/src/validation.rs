//! Custom validation functions for configuration.
//!
//! Provides shared validation logic used across multiple configuration modules.

use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;
use tracing_subscriber::EnvFilter;
use validator::{Validate, ValidationError};

use crate::alerts::RuleConfig;

lazy_static! {
    // Kafka's legal topic characters and length limit.
    static ref TOPIC_RE: Regex = Regex::new(r"^[A-Za-z0-9._-]{1,249}$").expect("static regex");
}

/// Validate that a topic name is legal for the broker.
pub fn validate_topic(topic: &str) -> Result<(), ValidationError> {
    if topic == "." || topic == ".." || !TOPIC_RE.is_match(topic) {
        return Err(ValidationError::new("invalid_topic"));
    }
    Ok(())
}

/// Validate `auto.offset.reset`.
pub fn validate_offset_reset(value: &str) -> Result<(), ValidationError> {
    match value {
        "earliest" | "latest" | "none" => Ok(()),
        _ => Err(ValidationError::new("invalid_offset_reset")),
    }
}

/// Validate the default log filter with the same parser the logger uses.
///
/// Anything `EnvFilter` accepts is allowed: `info`,
/// `info,buzzwatch_engine=debug`, a bare target, span filters.
pub fn validate_log_level(directive: &str) -> Result<(), ValidationError> {
    if directive.trim().is_empty() || EnvFilter::try_new(directive).is_err() {
        return Err(ValidationError::new("invalid_log_level"));
    }
    Ok(())
}

/// Validate the rule set: each rule valid, names unique, at least one predicate field.
pub fn validate_rules(rules: &[RuleConfig]) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for rule in rules {
        if rule.validate().is_err() {
            return Err(ValidationError::new("invalid_rule"));
        }
        if rule.author.is_none() && rule.message.is_none() {
            return Err(ValidationError::new("rule_without_predicate"));
        }
        if !seen.insert(rule.name.as_str()) {
            return Err(ValidationError::new("duplicate_rule_name"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_names() {
        assert!(validate_topic("buzz_topic").is_ok());
        assert!(validate_topic("events.v1-raw").is_ok());
        assert!(validate_topic("").is_err());
        assert!(validate_topic("..").is_err());
        assert!(validate_topic("has space").is_err());
    }

    #[test]
    fn log_levels() {
        assert!(validate_log_level("info").is_ok());
        assert!(validate_log_level("WARN").is_ok());
        assert!(validate_log_level("info,buzzwatch_engine=debug").is_ok());
        assert!(validate_log_level("buzzwatch_engine").is_ok());
        assert!(validate_log_level("warn,buzzwatch_engine[processor]=trace").is_ok());
        assert!(validate_log_level("buzzwatch_engine=loud").is_err());
        assert!(validate_log_level("").is_err());
    }
}
