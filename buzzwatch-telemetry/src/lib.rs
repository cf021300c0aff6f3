//! # Buzzwatch Telemetry and Alerting
//!
//! Crate for logging, metrics, and the durable alert sink.

pub mod alerts;
pub mod logging;
pub mod metrics;

pub use alerts::{Ack, AlertSink, SinkError};
pub use logging::EventLogger;
pub use metrics::MetricsRecorder;
