//! ## buzzwatch-engine::source
//! Where records come from.
//!
//! A [`StreamSource`] is polled from a dedicated blocking thread, so `poll` may
//! block for up to `timeout`. Sources are constructed already connected; any
//! failure to get there is a [`SetupError`](crate::SetupError).

mod file;
mod kafka;

use std::time::Duration;

use buzzwatch_core::RawRecord;

use crate::TransportError;

pub use file::FileSource;
pub use kafka::KafkaSource;

/// Result of one poll cycle.
#[derive(Debug)]
pub enum Poll {
    /// At least one record, in source order.
    Records(Vec<RawRecord>),
    /// Nothing arrived within the timeout.
    Idle,
    /// A finite source has nothing left.
    Exhausted,
}

pub trait StreamSource: Send + 'static {
    /// Wait at most `timeout` for records and return no more than `max_records`.
    fn poll(&mut self, timeout: Duration, max_records: usize) -> Result<Poll, TransportError>;

    /// Release the underlying connection or file. Called exactly once, also
    /// after errors.
    fn close(&mut self);
}
