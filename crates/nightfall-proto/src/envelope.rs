//! JSON `{event, data}` envelope framing.
//!
//! The envelope is the only structure the transport layer understands. The
//! event name routes the payload; payload decoding happens later at the
//! router boundary so the transport never needs per-event knowledge.

use serde::Deserialize;
use serde_json::Value;

use crate::error::ProtocolError;

/// Maximum accepted size of an incoming text frame in bytes.
///
/// Frames above this limit close the offending connection.
pub const MAX_FRAME_SIZE: usize = 64 * 1024;

/// A decoded wire envelope: event name plus untyped payload.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    /// Event name (e.g. `join-room`)
    pub event: String,
    /// Event payload; absent for bare events like `heartbeat`
    #[serde(default)]
    pub data: Option<Value>,
}

impl Envelope {
    /// Parse a raw text frame into an envelope.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::FrameTooLarge`] if the frame exceeds
    ///   [`MAX_FRAME_SIZE`]
    /// - [`ProtocolError::Malformed`] if the frame is not a JSON envelope
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        if text.len() > MAX_FRAME_SIZE {
            return Err(ProtocolError::FrameTooLarge { size: text.len(), max: MAX_FRAME_SIZE });
        }
        Ok(serde_json::from_str(text)?)
    }

    /// Take the payload, substituting an empty object when absent.
    ///
    /// Events without payloads (`heartbeat`, `ping`) decode their unit
    /// payloads from the empty object.
    #[must_use]
    pub fn into_data(self) -> Value {
        self.data.unwrap_or_else(|| Value::Object(serde_json::Map::new()))
    }
}

/// Serialize an outgoing envelope, injecting the event timestamp.
///
/// Every server-emitted envelope carries `data.timestamp` (ms since epoch)
/// in addition to its event-specific payload.
///
/// # Errors
///
/// - [`ProtocolError::Encode`] if the payload is not a JSON object
pub fn compose(event: &'static str, mut data: Value, timestamp_ms: u64) -> Result<String, ProtocolError> {
    match data {
        Value::Object(ref mut map) => {
            map.insert("timestamp".to_string(), Value::from(timestamp_ms));
        },
        _ => {
            return Err(ProtocolError::Encode {
                event,
                source: serde::ser::Error::custom("payload must serialize to a JSON object"),
            });
        },
    }

    let envelope = serde_json::json!({ "event": event, "data": data });
    serde_json::to_string(&envelope).map_err(|source| ProtocolError::Encode { event, source })
}
