use std::io;
use std::path::PathBuf;

use buzzwatch_core::events::EventError;
use buzzwatch_detection::DetectionError;
use rdkafka::error::KafkaError;
use thiserror::Error;
use tokio::task::JoinError;

/// The stream source failed while running. Ends the run through `Draining`.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Kafka transport failure: {0}")]
    Kafka(#[from] KafkaError),

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Stream source disconnected: {0}")]
    Disconnected(String),
}

/// Anything that prevents reaching `Running`. Fatal.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("Invalid record bus: {0}")]
    Bus(#[from] EventError),

    #[error("Invalid detection rules: {0}")]
    Rules(#[from] DetectionError),

    #[error("Failed to create Kafka consumer: {0}")]
    Client(#[source] KafkaError),

    #[error("Brokers at {brokers} unreachable: {source}")]
    Unreachable {
        brokers: String,
        #[source]
        source: KafkaError,
    },

    #[error("Failed to subscribe to topic '{topic}': {source}")]
    Subscribe {
        topic: String,
        #[source]
        source: KafkaError,
    },

    #[error("Failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Setup failed: {0}")]
    Setup(#[from] SetupError),

    #[error("Pipeline task failed: {0}")]
    Task(#[from] JoinError),
}
