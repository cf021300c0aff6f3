//! Consumption loop: `Starting → Running → Draining → Stopped`, or `Faulted`.
//!
//! A poller on a blocking thread feeds a bounded bus; a processor on a second
//! blocking thread drains it through the [`PipelineState`], since alert rows
//! are written with plain file I/O. The shutdown flag is read at the top of
//! every poll cycle only, so a batch that was polled is always fully queued
//! and processed.

use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use buzzwatch_config::{BuzzConfig, StreamConfig};
use buzzwatch_core::events::{bounded, BusConsumer, BusProducer};
use buzzwatch_core::RawRecord;
use buzzwatch_telemetry::MetricsRecorder;
use tokio::sync::watch;
use tokio::task::spawn_blocking;
use tracing::{debug, error, info, info_span, instrument, trace, warn, Span};

use super::pipeline::{PipelineState, RecordOutcome, Tally};
use crate::source::{FileSource, KafkaSource, Poll, StreamSource};
use crate::{EngineError, SetupError, TransportError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    Starting,
    Running,
    Draining,
    Stopped,
    Faulted,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Shared stop flag. Triggering it moves a running consumer to `Draining`.
#[derive(Clone, Debug, Default)]
pub struct ShutdownSignal(Arc<AtomicBool>);

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Final report of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub state: RunState,
    pub records_polled: u64,
    pub tally: Tally,
    /// Distinct authors seen.
    pub authors: usize,
    pub transport_error: Option<String>,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: polled={} decoded={} skipped={} firings={} sink_failures={} authors={}",
            self.state,
            self.records_polled,
            self.tally.events_decoded,
            self.tally.decode_failures,
            self.tally.firings,
            self.tally.sink_failures,
            self.authors,
        )?;
        if let Some(error) = &self.transport_error {
            write!(f, " transport_error=\"{error}\"")?;
        }
        Ok(())
    }
}

struct PollerExit {
    records_polled: u64,
    transport_error: Option<TransportError>,
}

/// Owns one consumer lifecycle at a time. State starts fresh on every run.
pub struct ConsumerRuntime {
    config: Arc<BuzzConfig>,
    metrics: MetricsRecorder,
    shutdown: ShutdownSignal,
    state: watch::Sender<RunState>,
}

impl ConsumerRuntime {
    pub fn new(config: BuzzConfig) -> Self {
        let (state, _) = watch::channel(RunState::Starting);
        Self {
            config: Arc::new(config),
            metrics: MetricsRecorder::new(),
            shutdown: ShutdownSignal::new(),
            state,
        }
    }

    /// Handle for signal handlers.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    pub fn state(&self) -> RunState {
        *self.state.borrow()
    }

    /// Consume the configured Kafka topic until shutdown or transport failure.
    pub async fn run_kafka(&self) -> Result<RunSummary, EngineError> {
        let stream = self.config.stream.clone();
        self.run(move || KafkaSource::connect(&stream)).await
    }

    /// Feed a JSON-lines file through the same pipeline.
    pub async fn run_replay(&self, path: PathBuf) -> Result<RunSummary, EngineError> {
        self.run(move || FileSource::open(&path)).await
    }

    /// Run one full lifecycle against the source produced by `connect`.
    ///
    /// `connect` runs on a blocking thread; it may wait on the network.
    #[instrument(skip_all, fields(topic = %self.config.stream.topic))]
    pub async fn run<S, F>(&self, connect: F) -> Result<RunSummary, EngineError>
    where
        S: StreamSource,
        F: FnOnce() -> Result<S, SetupError> + Send + 'static,
    {
        self.transition(RunState::Starting);
        let (pipeline, source, producer, consumer) = match self.start(connect).await {
            Ok(parts) => parts,
            Err(e) => {
                error!("Consumer failed to start: {e}");
                self.transition(RunState::Faulted);
                return Err(e);
            }
        };

        self.transition(RunState::Running);
        let processor = spawn_blocking({
            let span = info_span!("processor");
            move || {
                let _entered = span.enter();
                process_records(pipeline, consumer)
            }
        });
        let poller = spawn_blocking({
            let shutdown = self.shutdown.clone();
            let stream = self.config.stream.clone();
            let metrics = self.metrics.clone();
            let span = Span::current();
            move || {
                let _entered = span.enter();
                poll_records(source, producer, &shutdown, &stream, &metrics)
            }
        });

        let exit = poller.await;
        self.transition(RunState::Draining);
        let pipeline = processor.await;
        self.transition(RunState::Stopped);

        let exit = exit?;
        let pipeline = pipeline?;

        let summary = RunSummary {
            state: RunState::Stopped,
            records_polled: exit.records_polled,
            tally: pipeline.tally(),
            authors: pipeline.aggregator().authors(),
            transport_error: exit.transport_error.map(|e| e.to_string()),
        };
        info!(authors = ?pipeline.aggregator().snapshot(), "Final author counts");
        match self.metrics.gather_metrics() {
            Ok(text) => debug!("Pipeline metrics:\n{text}"),
            Err(e) => warn!("Failed to render metrics: {e}"),
        }
        info!("Consumer stopped. {summary}");
        Ok(summary)
    }

    async fn start<S, F>(
        &self,
        connect: F,
    ) -> Result<(PipelineState, S, BusProducer<RawRecord>, BusConsumer<RawRecord>), EngineError>
    where
        S: StreamSource,
        F: FnOnce() -> Result<S, SetupError> + Send + 'static,
    {
        debug!(
            group_id = %self.config.stream.group_id,
            brokers = %self.config.stream.brokers,
            "Starting consumer"
        );
        let pipeline = PipelineState::new(&self.config, self.metrics.clone())?;
        let (producer, consumer) =
            bounded(self.config.core.bus.capacity).map_err(SetupError::from)?;
        let source = spawn_blocking(connect).await??;
        Ok((pipeline, source, producer, consumer))
    }

    fn transition(&self, next: RunState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            info!(from = %previous, to = %next, "Consumer state changed");
        }
    }
}

/// Poll until shutdown, exhaustion or a transport error. Always closes the source.
fn poll_records<S: StreamSource>(
    mut source: S,
    producer: BusProducer<RawRecord>,
    shutdown: &ShutdownSignal,
    stream: &StreamConfig,
    metrics: &MetricsRecorder,
) -> PollerExit {
    let timeout = Duration::from_millis(stream.poll_timeout_ms);
    let mut records_polled = 0u64;

    let transport_error = 'poll: loop {
        if shutdown.is_triggered() {
            info!("Shutdown requested, stopping intake");
            break None;
        }
        match source.poll(timeout, stream.max_records) {
            Ok(Poll::Records(records)) => {
                trace!(count = records.len(), "Polled batch");
                for record in records {
                    records_polled += 1;
                    metrics.records_polled.inc();
                    if producer.send_blocking(record).is_err() {
                        warn!("Processor went away, stopping intake");
                        break 'poll None;
                    }
                }
            }
            Ok(Poll::Idle) => trace!("No records within poll timeout"),
            Ok(Poll::Exhausted) => {
                info!("Stream source exhausted");
                break None;
            }
            Err(e) => {
                error!("Stream transport failed: {e}");
                break Some(e);
            }
        }
    };

    source.close();
    PollerExit {
        records_polled,
        transport_error,
    }
}

/// Drain the bus in FIFO order until the poller drops its end.
fn process_records(mut pipeline: PipelineState, mut consumer: BusConsumer<RawRecord>) -> PipelineState {
    while let Some(record) = consumer.recv_blocking() {
        match pipeline.process_record(&record) {
            RecordOutcome::Skipped(e) => {
                error!(position = %record.position, "Skipping record: {e}");
            }
            RecordOutcome::Processed {
                firings: 0, ..
            } => {}
            RecordOutcome::Processed {
                author,
                firings,
                sink_failures,
                ..
            } => debug!(
                position = %record.position,
                author = %author,
                firings,
                sink_failures,
                "Record raised alerts"
            ),
        }
    }
    pipeline
}
