//! Decoded events and the best-effort JSON decoder.

use serde_json::{Map, Value};

use crate::error::DecodeError;

/// Author recorded for events that carry no `author` field.
pub const UNKNOWN_AUTHOR: &str = "unknown";

/// One decoded message. Immutable once built.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    author: String,
    message: String,
    /// Fields other than `author` and `message`, kept as received.
    extra: Map<String, Value>,
}

impl Event {
    pub fn new(author: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            message: message.into(),
            extra: Map::new(),
        }
    }

    #[inline]
    pub fn author(&self) -> &str {
        &self.author
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[inline]
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }
}

/// Take `key` out of the object. Absent and `null` are both `None`.
fn take_string(
    fields: &mut Map<String, Value>,
    key: &str,
) -> Result<Option<String>, serde_json::Error> {
    match fields.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value).map(Some),
    }
}

/// Decode one record payload.
///
/// Missing or `null` `author` becomes [`UNKNOWN_AUTHOR`], a missing `message`
/// becomes the empty string. Anything that is not a UTF-8 JSON object with
/// string-typed `author`/`message` is a [`DecodeError`]. A repeated key keeps
/// its last value.
pub fn decode(payload: Option<&[u8]>) -> Result<Event, DecodeError> {
    let bytes = match payload {
        Some(bytes) if !bytes.is_empty() => bytes,
        _ => return Err(DecodeError::Empty),
    };

    let text = std::str::from_utf8(bytes).map_err(|source| DecodeError::Utf8 {
        raw: String::from_utf8_lossy(bytes).into_owned(),
        source,
    })?;

    let json_error = |source| DecodeError::Json {
        raw: text.to_string(),
        source,
    };
    let mut fields = serde_json::from_str::<Map<String, Value>>(text).map_err(json_error)?;
    let author = take_string(&mut fields, "author").map_err(json_error)?;
    let message = take_string(&mut fields, "message").map_err(json_error)?;

    Ok(Event {
        author: author.unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
        message: message.unwrap_or_default(),
        extra: fields,
    })
}
