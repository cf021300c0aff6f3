use thiserror::Error;

/// A payload that could not be turned into an [`Event`](crate::Event).
///
/// Every variant keeps the offending payload (lossily rendered as UTF-8) so the
/// record can be diagnosed from the log line alone.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Empty payload")]
    Empty,

    #[error("Payload is not valid UTF-8: {source}; raw: {raw}")]
    Utf8 {
        raw: String,
        #[source]
        source: std::str::Utf8Error,
    },

    #[error("Invalid JSON message: {source}; raw: {raw}")]
    Json {
        raw: String,
        #[source]
        source: serde_json::Error,
    },
}

impl DecodeError {
    /// The raw payload that failed to decode.
    pub fn raw(&self) -> &str {
        match self {
            DecodeError::Empty => "",
            DecodeError::Utf8 { raw, .. } | DecodeError::Json { raw, .. } => raw,
        }
    }
}
