//! Detection rule configuration.
//!
//! Each rule names the exact field values it matches and the CSV file its
//! firings are appended to. Rules are read once at startup.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

use crate::validation;

/// Alerting configuration.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct AlertsConfig {
    /// Rules in evaluation order.
    #[validate(custom(function = validation::validate_rules))]
    #[serde(default = "default_rules")]
    pub rules: Vec<RuleConfig>,
}

/// A single exact-match rule.
#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq, Eq)]
pub struct RuleConfig {
    /// Unique rule name, used in logs and in the alert record.
    #[validate(length(min = 1, max = 64))]
    pub name: String,

    /// Required `author` value, if any.
    #[serde(default)]
    pub author: Option<String>,

    /// Required `message` value, if any.
    #[serde(default)]
    pub message: Option<String>,

    /// Append-only CSV file receiving one row per firing.
    pub csv_path: PathBuf,
}

impl RuleConfig {
    /// The rule shipped by default: Bob claiming his passion.
    pub fn bob_lies() -> Self {
        Self {
            name: "bob-lies".into(),
            author: Some("Bob".into()),
            message: Some("Data Engineering is my passion".into()),
            csv_path: PathBuf::from("data/bob_lies.csv"),
        }
    }
}

fn default_rules() -> Vec<RuleConfig> {
    vec![RuleConfig::bob_lies()]
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            rules: default_rules(),
        }
    }
}
