//! # Buzzwatch Configuration System
//!
//! Layered configuration for the buzzwatch stream consumer.
//!
//! ## Features
//! - **Unified Configuration**: one struct drives the stream source, the record bus,
//!   the detection rules and telemetry
//! - **Validation**: runtime validation of every parameter before the consumer starts
//! - **Environment Awareness**: YAML overrides per environment, plus the legacy flat
//!   `BUZZ_*` / `KAFKA_*` variables used by existing deployments

#![warn(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

mod alerts;
mod core;
mod error;
mod stream;
mod telemetry;
mod validation;

pub use alerts::{AlertsConfig, RuleConfig};
pub use core::{BusConfig, CoreConfig};
pub use error::ConfigError;
pub use stream::StreamConfig;
pub use telemetry::TelemetryConfig;

/// Base configuration file, relative to the working directory.
pub const BASE_CONFIG_PATH: &str = "config/buzzwatch.yaml";

/// Flat variables understood for compatibility with older deployments,
/// with the nested key each one feeds.
const LEGACY_ENV: [(&str, &str); 3] = [
    ("BUZZ_TOPIC", "stream.topic"),
    ("BUZZ_CONSUMER_GROUP_ID", "stream.group_id"),
    ("KAFKA_BROKER_ADDRESS", "stream.brokers"),
];

/// Top‑level configuration container for all buzzwatch components.
#[derive(Debug, Serialize, Deserialize, Validate, Default, Clone)]
pub struct BuzzConfig {
    /// Broker connection and polling behaviour.
    #[validate(nested)]
    #[serde(default)]
    pub stream: StreamConfig,

    /// In-process plumbing between poller and processor.
    #[validate(nested)]
    #[serde(default)]
    pub core: CoreConfig,

    /// Detection rules and their alert record targets.
    #[validate(nested)]
    #[serde(default)]
    pub alerts: AlertsConfig,

    /// Logging configuration.
    #[validate(nested)]
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl BuzzConfig {
    /// Load configuration from default files and environment.
    ///
    /// Hierarchy:
    /// 1. Default Values
    /// 2. `config/buzzwatch.yaml` - Base settings. If missing, defaults are used.
    /// 3. `config/<environment>.yaml` - Environment‑specific overrides (`BUZZWATCH_ENV`).
    /// 4. `BUZZ_TOPIC`, `BUZZ_CONSUMER_GROUP_ID`, `KAFKA_BROKER_ADDRESS`.
    /// 5. `BUZZWATCH_*` environment variables, nested with `__`.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(BuzzConfig::default()));

        if Path::new(BASE_CONFIG_PATH).exists() {
            figment = figment.merge(Yaml::file(BASE_CONFIG_PATH));
        }

        let env = std::env::var("BUZZWATCH_ENV").unwrap_or_else(|_| "production".into());
        let env_file = format!("config/{}.yaml", env);
        if Path::new(&env_file).exists() {
            figment = figment.merge(Yaml::file(env_file));
        }

        Self::extract(figment)
    }

    /// Load configuration from a specific file, still honouring environment overrides.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(PathBuf::from(path)));
        }

        let figment =
            Figment::from(Serialized::defaults(BuzzConfig::default())).merge(Yaml::file(path));
        Self::extract(figment)
    }

    fn extract(figment: Figment) -> Result<Self, ConfigError> {
        figment
            .merge(legacy_env())
            .merge(Env::prefixed("BUZZWATCH_").ignore(&["ENV"]).split("__"))
            .extract()
            .map_err(ConfigError::from)
            .and_then(|config: Self| {
                config.validate()?;
                Ok(config)
            })
    }
}

fn legacy_env() -> Env {
    let keys: Vec<&str> = LEGACY_ENV.iter().map(|(var, _)| *var).collect();
    Env::raw().only(&keys).map(|var| {
        LEGACY_ENV
            .iter()
            .find(|(name, _)| var == *name)
            .map(|(_, key)| (*key).into())
            .unwrap_or_else(|| var.as_str().to_owned().into())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn full_config_validation() {
        let config = BuzzConfig::default();
        config.validate().expect("Default config should validate");
    }

    #[test]
    fn defaults_without_files_or_env() {
        Jail::expect_with(|_jail| {
            let config = BuzzConfig::load().expect("defaults load");
            assert_eq!(config.stream.topic, "unknown_topic");
            assert_eq!(config.stream.group_id, "default_group");
            assert_eq!(config.alerts.rules.len(), 1);
            Ok(())
        });
    }

    #[test]
    fn legacy_variables_override_defaults() {
        Jail::expect_with(|jail| {
            jail.set_env("BUZZ_TOPIC", "buzz_live");
            jail.set_env("BUZZ_CONSUMER_GROUP_ID", "fintel_group");
            jail.set_env("KAFKA_BROKER_ADDRESS", "broker-1:9092");
            let config = BuzzConfig::load().expect("load");
            assert_eq!(config.stream.topic, "buzz_live");
            assert_eq!(config.stream.group_id, "fintel_group");
            assert_eq!(config.stream.brokers, "broker-1:9092");
            Ok(())
        });
    }

    #[test]
    fn environment_override() {
        Jail::expect_with(|jail| {
            jail.set_env("BUZZ_TOPIC", "legacy_topic");
            jail.set_env("BUZZWATCH_STREAM__TOPIC", "nested_topic");
            jail.set_env("BUZZWATCH_CORE__BUS__CAPACITY", "64");
            let config = BuzzConfig::load().expect("load");
            assert_eq!(config.stream.topic, "nested_topic");
            assert_eq!(config.core.bus.capacity, 64);
            Ok(())
        });
    }

    #[test]
    fn environment_file_layers_over_base_file() {
        Jail::expect_with(|jail| {
            std::fs::create_dir("config").expect("create config dir");
            jail.create_file(
                "config/buzzwatch.yaml",
                "stream:\n  topic: base_topic\n  poll_timeout_ms: 500\n",
            )?;
            jail.create_file("config/staging.yaml", "stream:\n  topic: staging_topic\n")?;
            jail.set_env("BUZZWATCH_ENV", "staging");
            let config = BuzzConfig::load().expect("load");
            assert_eq!(config.stream.topic, "staging_topic");
            assert_eq!(config.stream.poll_timeout_ms, 500);
            Ok(())
        });
    }

    #[test]
    fn rules_from_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "custom.yaml",
                r#"
alerts:
  rules:
    - name: eve-python
      author: Eve
      message: "I love Python!"
      csv_path: out/eve.csv
"#,
            )?;
            let config = BuzzConfig::load_from_path("custom.yaml").expect("load");
            assert_eq!(config.alerts.rules.len(), 1);
            let rule = &config.alerts.rules[0];
            assert_eq!(rule.name, "eve-python");
            assert_eq!(rule.author.as_deref(), Some("Eve"));
            assert_eq!(rule.csv_path, PathBuf::from("out/eve.csv"));
            Ok(())
        });
    }

    #[test]
    fn missing_file_is_reported() {
        Jail::expect_with(|_jail| {
            let err = BuzzConfig::load_from_path("nope.yaml").unwrap_err();
            assert!(matches!(err, ConfigError::FileNotFound(_)));
            Ok(())
        });
    }

    #[test]
    fn invalid_values_fail_validation() {
        Jail::expect_with(|jail| {
            jail.set_env("BUZZWATCH_STREAM__TOPIC", "bad topic!");
            let err = BuzzConfig::load().unwrap_err();
            assert!(matches!(err, ConfigError::Validation(_)));
            assert!(err.to_string().contains("topic"));
            Ok(())
        });
    }
}
