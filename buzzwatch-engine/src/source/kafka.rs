use std::time::Duration;

use buzzwatch_config::StreamConfig;
use buzzwatch_core::{RawRecord, StreamPosition};
use bytes::Bytes;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{BaseConsumer, Consumer};
use rdkafka::error::KafkaError;
use rdkafka::message::{BorrowedMessage, Message};
use tracing::{debug, info, instrument, warn};

use super::{Poll, StreamSource};
use crate::{SetupError, TransportError};

/// Group member of a single Kafka topic.
///
/// Offsets belong to the consumer group; with auto commit enabled a restart
/// resumes after the last committed record.
pub struct KafkaSource {
    consumer: BaseConsumer,
    topic: String,
    /// Error seen after part of a batch was already collected.
    pending: Option<KafkaError>,
}

impl KafkaSource {
    /// Create the consumer, check that the brokers answer, then subscribe.
    #[instrument(skip_all, fields(brokers = %config.brokers, topic = %config.topic))]
    pub fn connect(config: &StreamConfig) -> Result<Self, SetupError> {
        let mut client = ClientConfig::new();
        client
            .set("bootstrap.servers", &config.brokers)
            .set("group.id", &config.group_id)
            .set("auto.offset.reset", &config.auto_offset_reset)
            .set("enable.auto.commit", config.enable_auto_commit.to_string())
            .set("session.timeout.ms", config.session_timeout_ms.to_string());
        for (key, value) in &config.properties {
            debug!(key = %key, "Passing through client property");
            client.set(key, value);
        }

        let consumer: BaseConsumer = client.create().map_err(SetupError::Client)?;

        let metadata = consumer
            .fetch_metadata(
                Some(&config.topic),
                Duration::from_millis(config.connect_timeout_ms),
            )
            .map_err(|source| SetupError::Unreachable {
                brokers: config.brokers.clone(),
                source,
            })?;
        let partitions = metadata
            .topics()
            .iter()
            .find(|t| t.name() == config.topic)
            .map_or(0, |t| t.partitions().len());
        if partitions == 0 {
            warn!("Topic has no partitions yet, waiting for assignment");
        }

        consumer
            .subscribe(&[config.topic.as_str()])
            .map_err(|source| SetupError::Subscribe {
                topic: config.topic.clone(),
                source,
            })?;

        info!(
            group_id = %config.group_id,
            partitions,
            "Subscribed to topic"
        );
        Ok(Self {
            consumer,
            topic: config.topic.clone(),
            pending: None,
        })
    }
}

fn to_raw_record(message: &BorrowedMessage<'_>) -> RawRecord {
    let position = StreamPosition::new(message.topic(), message.partition(), message.offset());
    match message.payload() {
        Some(payload) => RawRecord::new(Bytes::copy_from_slice(payload), position),
        None => RawRecord::tombstone(position),
    }
}

impl StreamSource for KafkaSource {
    fn poll(&mut self, timeout: Duration, max_records: usize) -> Result<Poll, TransportError> {
        if let Some(error) = self.pending.take() {
            return Err(error.into());
        }

        let mut records = Vec::new();
        // Only the first message is waited for; the rest of the batch is
        // whatever the client already has buffered.
        let mut wait = timeout;
        while records.len() < max_records {
            match self.consumer.poll(wait) {
                None => break,
                Some(Ok(message)) => {
                    records.push(to_raw_record(&message));
                    wait = Duration::ZERO;
                }
                Some(Err(KafkaError::PartitionEOF(partition))) => {
                    debug!(partition, "Reached end of partition");
                    wait = Duration::ZERO;
                }
                Some(Err(error)) if records.is_empty() => return Err(error.into()),
                Some(Err(error)) => {
                    self.pending = Some(error);
                    break;
                }
            }
        }

        if records.is_empty() {
            Ok(Poll::Idle)
        } else {
            Ok(Poll::Records(records))
        }
    }

    fn close(&mut self) {
        self.consumer.unsubscribe();
        info!(topic = %self.topic, "Kafka consumer closed");
    }
}
