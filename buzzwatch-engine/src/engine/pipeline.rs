//! Per-record pipeline: decode, aggregate, detect, alert.

use buzzwatch_config::BuzzConfig;
use buzzwatch_core::{decode, Aggregator, DecodeError, RawRecord};
use buzzwatch_detection::PatternDetector;
use buzzwatch_telemetry::{AlertSink, MetricsRecorder};
use tracing::{error, info};

use crate::SetupError;

/// Running totals for one run, reported in the summary.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub events_decoded: u64,
    pub decode_failures: u64,
    pub firings: u64,
    pub sink_failures: u64,
}

/// What happened to one record.
#[derive(Debug)]
pub enum RecordOutcome {
    /// Undecodable; nothing downstream saw it.
    Skipped(DecodeError),
    Processed {
        author: String,
        /// The author's count after this event.
        author_count: u64,
        firings: usize,
        /// Firings whose alert row could not be written.
        sink_failures: usize,
    },
}

/// Everything the processor owns. Built at `Starting`, dropped at `Stopped`.
#[derive(Debug)]
pub struct PipelineState {
    aggregator: Aggregator,
    detector: PatternDetector,
    sink: AlertSink,
    metrics: MetricsRecorder,
    tally: Tally,
}

impl PipelineState {
    pub fn new(config: &BuzzConfig, metrics: MetricsRecorder) -> Result<Self, SetupError> {
        let detector = PatternDetector::from_config(&config.alerts.rules)?;
        Ok(Self {
            aggregator: Aggregator::new(),
            detector,
            sink: AlertSink::new(),
            metrics,
            tally: Tally::default(),
        })
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    pub fn sink(&self) -> &AlertSink {
        &self.sink
    }

    pub fn tally(&self) -> Tally {
        self.tally
    }

    pub fn process_record(&mut self, record: &RawRecord) -> RecordOutcome {
        let _timer = self.metrics.processing_latency.start_timer();

        let event = match decode(record.payload.as_deref()) {
            Ok(event) => event,
            Err(error) => {
                self.metrics.decode_failures.inc();
                self.tally.decode_failures += 1;
                return RecordOutcome::Skipped(error);
            }
        };
        self.metrics.events_decoded.inc();
        self.tally.events_decoded += 1;

        let author_count = self.aggregator.update(&event);
        info!(
            position = %record.position,
            "Message from {} counted, total for author: {}",
            event.author(),
            author_count
        );

        let firings = self.detector.evaluate(&event);
        let mut sink_failures = 0;
        for firing in &firings {
            self.metrics.firings.inc();
            self.tally.firings += 1;
            let firing = firing.clone().with_position(record.position.clone());
            if let Err(e) = self.sink.record(&firing) {
                self.metrics.sink_failures.inc();
                self.tally.sink_failures += 1;
                sink_failures += 1;
                error!(position = %record.position, "{e}");
            }
        }

        RecordOutcome::Processed {
            author: event.author().to_string(),
            author_count,
            firings: firings.len(),
            sink_failures,
        }
    }
}
