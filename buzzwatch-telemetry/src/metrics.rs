//! ## buzzwatch-telemetry::metrics
//! **Prometheus counters for the consumption loop**
//!
//! Pipeline throughput and failure counts only. Author counts and alert
//! sequence numbers are not exported.

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, Registry, TextEncoder};

#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    pub registry: Registry,
    pub records_polled: IntCounter,
    pub events_decoded: IntCounter,
    pub decode_failures: IntCounter,
    pub firings: IntCounter,
    pub sink_failures: IntCounter,
    pub processing_latency: Histogram,
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRecorder {
    /// # Panics
    /// Only if the static metric definitions below are invalid.
    pub fn new() -> Self {
        Self::try_new().expect("static metric definitions are valid")
    }

    fn try_new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        let counter = |name: &str, help: &str| -> Result<IntCounter, prometheus::Error> {
            let counter = IntCounter::new(name, help)?;
            registry.register(Box::new(counter.clone()))?;
            Ok(counter)
        };

        let records_polled = counter("buzzwatch_records_polled_total", "Records read from the stream")?;
        let events_decoded = counter("buzzwatch_events_decoded_total", "Records decoded into events")?;
        let decode_failures = counter("buzzwatch_decode_failures_total", "Records skipped as undecodable")?;
        let firings = counter("buzzwatch_firings_total", "Detection rule firings")?;
        let sink_failures = counter("buzzwatch_sink_failures_total", "Alert rows that could not be written")?;

        let processing_latency = Histogram::with_opts(
            HistogramOpts::new(
                "buzzwatch_record_processing_seconds",
                "Decode, aggregate, detect and alert time per record",
            )
            .buckets(vec![0.000_01, 0.000_1, 0.001, 0.01, 0.1]),
        )?;
        registry.register(Box::new(processing_latency.clone()))?;

        Ok(Self {
            registry,
            records_polled,
            events_decoded,
            decode_failures,
            firings,
            sink_failures,
            processing_latency,
        })
    }

    /// Text exposition format of every registered metric.
    pub fn gather_metrics(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::<u8>::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
