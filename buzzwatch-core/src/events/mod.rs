//! ## buzzwatch-core::events
//! Records as delivered by the stream source, events as understood by the
//! pipeline, and the bus carrying records between the two halves of the loop.

pub mod bus;
mod event;
mod record;

pub use bus::{bounded, BusConsumer, BusProducer, EventError};
pub use event::{decode, Event, UNKNOWN_AUTHOR};
pub use record::{RawRecord, StreamPosition};
