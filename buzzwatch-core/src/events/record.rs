//! Raw stream records and their position markers.

use std::fmt;

use bytes::Bytes;

/// Where a record sits in the source stream.
///
/// Owned by the stream source; the pipeline only reads it for logging.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StreamPosition {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
}

impl StreamPosition {
    pub fn new(topic: impl Into<String>, partition: i32, offset: i64) -> Self {
        Self {
            topic: topic.into(),
            partition,
            offset,
        }
    }
}

impl fmt::Display for StreamPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]@{}", self.topic, self.partition, self.offset)
    }
}

/// One record exactly as the stream source yielded it.
#[derive(Clone, Debug)]
pub struct RawRecord {
    /// Record value; `None` for tombstones.
    pub payload: Option<Bytes>,

    pub position: StreamPosition,
}

impl RawRecord {
    #[inline]
    pub fn new(payload: impl Into<Bytes>, position: StreamPosition) -> Self {
        Self {
            payload: Some(payload.into()),
            position,
        }
    }

    #[inline]
    pub fn tombstone(position: StreamPosition) -> Self {
        Self {
            payload: None,
            position,
        }
    }
}
