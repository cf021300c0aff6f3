//! Observability configuration.
//!
//! Log verbosity and the optional log file next to stderr output.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

use crate::validation;

/// Telemetry configuration.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct TelemetryConfig {
    /// Default filter directive, used when `RUST_LOG` is unset.
    #[validate(custom(function = validation::validate_log_level))]
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Directory for an additional plain-text log file. Disabled when absent.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// File name inside `log_dir`.
    #[validate(length(min = 1))]
    #[serde(default = "default_log_file")]
    pub log_file: String,

    /// Colourise stderr output.
    #[serde(default = "default_true")]
    pub ansi: bool,
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_file() -> String {
    "buzzwatch.log".into()
}

fn default_true() -> bool {
    true
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_dir: None,
            log_file: default_log_file(),
            ansi: default_true(),
        }
    }
}
