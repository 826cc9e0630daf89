//! Protocol error taxonomy.
//!
//! Splits transport-level failures (malformed JSON, oversized frames) that
//! close the connection from router-level rejections (unknown event, payload
//! that does not match the event's schema) that drop the message.

use thiserror::Error;

/// Errors produced while decoding or encoding wire envelopes.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Frame is not valid JSON or not an object envelope.
    ///
    /// Transport error: the offending connection is closed.
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Frame exceeds the maximum accepted size.
    ///
    /// Transport error: the offending connection is closed.
    #[error("frame too large: {size} bytes (max {max})")]
    FrameTooLarge {
        /// Size of the rejected frame
        size: usize,
        /// Maximum accepted frame size
        max: usize,
    },

    /// Envelope is well-formed but the event name is not recognized.
    ///
    /// Rejected at the router boundary; the message is dropped.
    #[error("unknown event: {0:?}")]
    UnknownEvent(String),

    /// Payload does not match the schema for its event name.
    #[error("invalid payload for {event:?}: {source}")]
    InvalidPayload {
        /// Event name the payload was decoded for
        event: &'static str,
        /// Underlying deserialization error
        source: serde_json::Error,
    },

    /// A server event failed to serialize.
    #[error("failed to encode {event:?}: {source}")]
    Encode {
        /// Event name that failed to serialize
        event: &'static str,
        /// Underlying serialization error
        source: serde_json::Error,
    },
}
