//! Error types for the protocol layer.
//!
//! Each crate in Lobbyforge defines its own error enum. When you see a
//! `ProtocolError`, you know the problem is in the shape of a message
//! (bytes that aren't an event, or a room code that can't exist), not
//! in networking or room management.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning an event into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into an event).
    ///
    /// Common causes: malformed JSON, an unknown event name, missing
    /// required fields, or wrong data types.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A room code that is not 4 ASCII letters or digits.
    ///
    /// Carries the raw input so logs show what the client actually sent.
    #[error("invalid room code: {0:?}")]
    InvalidRoomCode(String),
}
