//! # buzzwatch-engine
//!
//! Stream sources and the consumption runtime that drives records through
//! decoding, aggregation, detection and alerting.

pub mod engine;
mod error;
pub mod source;

pub use engine::{ConsumerRuntime, PipelineState, RecordOutcome, RunState, RunSummary, ShutdownSignal, Tally};
pub use error::{EngineError, SetupError, TransportError};
pub use source::{FileSource, KafkaSource, Poll, StreamSource};
