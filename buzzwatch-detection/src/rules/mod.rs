//! ## buzzwatch-detection::rules
//! **Exact field matching over decoded events**
//!
//! A rule is a conjunction of `field == value` tests. Comparison is byte-exact:
//! case-sensitive, no trimming, no normalization. The point is to catch one
//! verbatim phrase, not anything that resembles it.
//!
//! Evaluation is pure. A [`Firing`] only describes what matched; writing the
//! alert is the sink's job.

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use buzzwatch_config::RuleConfig;
use buzzwatch_core::{Event, StreamPosition};
use thiserror::Error;
use tracing::trace;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DetectionError {
    #[error("Rule '{0}' has no predicate")]
    EmptyPredicate(String),
    #[error("Duplicate rule name: {0}")]
    DuplicateRule(String),
}

/// Event field a predicate inspects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Author,
    Message,
}

impl Field {
    #[inline]
    fn value<'a>(&self, event: &'a Event) -> &'a str {
        match self {
            Field::Author => event.author(),
            Field::Message => event.message(),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Author => f.write_str("author"),
            Field::Message => f.write_str("message"),
        }
    }
}

/// `field == expected`, compared exactly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldPredicate {
    pub field: Field,
    pub expected: String,
}

impl FieldPredicate {
    pub fn new(field: Field, expected: impl Into<String>) -> Self {
        Self {
            field,
            expected: expected.into(),
        }
    }

    #[inline]
    pub fn holds(&self, event: &Event) -> bool {
        self.field.value(event) == self.expected
    }
}

/// What to do when a rule matches: append a row to this CSV file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlertAction {
    pub csv_path: PathBuf,
}

/// A named predicate/action pair. Built once at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DetectionRule {
    name: String,
    predicates: Vec<FieldPredicate>,
    action: AlertAction,
}

impl DetectionRule {
    pub fn new(
        name: impl Into<String>,
        predicates: Vec<FieldPredicate>,
        action: AlertAction,
    ) -> Result<Self, DetectionError> {
        let name = name.into();
        if predicates.is_empty() {
            return Err(DetectionError::EmptyPredicate(name));
        }
        Ok(Self {
            name,
            predicates,
            action,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// All predicates hold.
    #[inline]
    pub fn matches(&self, event: &Event) -> bool {
        self.predicates.iter().all(|p| p.holds(event))
    }
}

impl TryFrom<&RuleConfig> for DetectionRule {
    type Error = DetectionError;

    fn try_from(config: &RuleConfig) -> Result<Self, Self::Error> {
        let mut predicates = Vec::with_capacity(2);
        if let Some(author) = &config.author {
            predicates.push(FieldPredicate::new(Field::Author, author.clone()));
        }
        if let Some(message) = &config.message {
            predicates.push(FieldPredicate::new(Field::Message, message.clone()));
        }
        DetectionRule::new(
            config.name.clone(),
            predicates,
            AlertAction {
                csv_path: config.csv_path.clone(),
            },
        )
    }
}

/// One rule match for one event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Firing {
    pub rule: String,
    pub action: AlertAction,
    pub author: String,
    pub message: String,
    /// Where the triggering record came from, attached by the caller.
    pub position: Option<StreamPosition>,
}

impl Firing {
    pub fn with_position(mut self, position: StreamPosition) -> Self {
        self.position = Some(position);
        self
    }
}

/// Evaluate `rules` in order; one firing per matching rule.
pub fn evaluate(event: &Event, rules: &[DetectionRule]) -> Vec<Firing> {
    rules
        .iter()
        .filter(|rule| rule.matches(event))
        .map(|rule| {
            trace!(rule = rule.name(), "Rule matched");
            Firing {
                rule: rule.name.clone(),
                action: rule.action.clone(),
                author: event.author().to_string(),
                message: event.message().to_string(),
                position: None,
            }
        })
        .collect()
}

/// The static, ordered rule set.
#[derive(Debug, Default)]
pub struct PatternDetector {
    rules: Vec<DetectionRule>,
}

impl PatternDetector {
    pub fn new(rules: Vec<DetectionRule>) -> Result<Self, DetectionError> {
        let mut names = HashSet::new();
        for rule in &rules {
            if !names.insert(rule.name()) {
                return Err(DetectionError::DuplicateRule(rule.name().to_string()));
            }
        }
        Ok(Self { rules })
    }

    /// Build from configuration, keeping the configured order.
    pub fn from_config(configs: &[RuleConfig]) -> Result<Self, DetectionError> {
        let rules = configs
            .iter()
            .map(DetectionRule::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(rules)
    }

    #[inline]
    pub fn evaluate(&self, event: &Event) -> Vec<Firing> {
        evaluate(event, &self.rules)
    }
}
