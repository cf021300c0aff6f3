//! Stream source configuration.
//!
//! Everything the Kafka consumer needs to subscribe and poll:
//! - Broker addresses, topic and consumer group
//! - Poll cadence (bounded wait and batch size)
//! - Offset handling delegated to the broker

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

use crate::validation;

/// Stream source configuration.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct StreamConfig {
    /// Comma separated `host:port` list handed to `bootstrap.servers`.
    #[validate(length(min = 1))]
    #[serde(default = "default_brokers")]
    pub brokers: String,

    /// Topic to subscribe to.
    #[validate(custom(function = validation::validate_topic))]
    #[serde(default = "default_topic")]
    pub topic: String,

    /// Consumer group identity.
    #[validate(length(min = 1, max = 255))]
    #[serde(default = "default_group_id")]
    pub group_id: String,

    /// Upper bound on a single blocking poll (milliseconds).
    #[validate(range(min = 1, max = 60_000))]
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_ms: u64,

    /// Maximum records gathered into one poll batch.
    #[validate(range(min = 1, max = 10_000))]
    #[serde(default = "default_max_records")]
    pub max_records: usize,

    /// Where to start when the group has no committed offset.
    #[validate(custom(function = validation::validate_offset_reset))]
    #[serde(default = "default_offset_reset")]
    pub auto_offset_reset: String,

    /// Let the client commit consumed offsets in the background.
    #[serde(default = "default_true")]
    pub enable_auto_commit: bool,

    /// Group session timeout (milliseconds).
    #[validate(range(min = 1_000, max = 300_000))]
    #[serde(default = "default_session_timeout")]
    pub session_timeout_ms: u64,

    /// Budget for the startup metadata probe (milliseconds).
    #[validate(range(min = 100, max = 120_000))]
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,

    /// Additional librdkafka properties, passed through verbatim.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

fn default_brokers() -> String {
    "localhost:9092".into()
}

fn default_topic() -> String {
    "unknown_topic".into()
}

fn default_group_id() -> String {
    "default_group".into()
}

fn default_poll_timeout() -> u64 {
    1000
}

fn default_max_records() -> usize {
    100
}

fn default_offset_reset() -> String {
    "earliest".into()
}

fn default_true() -> bool {
    true
}

fn default_session_timeout() -> u64 {
    6000
}

fn default_connect_timeout() -> u64 {
    10_000
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            brokers: default_brokers(),
            topic: default_topic(),
            group_id: default_group_id(),
            poll_timeout_ms: default_poll_timeout(),
            max_records: default_max_records(),
            auto_offset_reset: default_offset_reset(),
            enable_auto_commit: default_true(),
            session_timeout_ms: default_session_timeout(),
            connect_timeout_ms: default_connect_timeout(),
            properties: BTreeMap::new(),
        }
    }
}
