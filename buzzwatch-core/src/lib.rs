//! # buzzwatch-core
//!
//! Foundation layer for the buzzwatch stream consumer: the record and event
//! types, best-effort decoding, per-author aggregation and the bounded bus
//! that joins the poller to the processor.
//!
//! ### Key Submodules:
//! - `events`: raw records, decoded events and the bounded record bus
//! - `aggregate`: author occurrence counts

pub mod aggregate;
pub mod error;
pub mod events;

pub use aggregate::Aggregator;
pub use error::DecodeError;
pub use events::{decode, Event, RawRecord, StreamPosition, UNKNOWN_AUTHOR};
