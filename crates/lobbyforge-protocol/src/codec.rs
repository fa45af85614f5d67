//! Codec trait and implementations for turning events into frames.
//!
//! A "codec" (coder/decoder) converts between Rust types and raw bytes.
//! The server's connection handler doesn't care HOW events are
//! serialized; it holds something that implements [`Codec`] and calls
//! `encode` on the way out and `decode` on the way in.
//!
//! Browsers and game engines on the other end of the socket speak JSON,
//! so [`JsonCodec`] is the only implementation today.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// ## Trait bounds explained
///
/// - `Send + Sync` → one codec value is shared by every connection task,
///   and Tokio may run those tasks on any worker thread.
/// - `'static` → the codec owns everything it needs, so it can live
///   inside long-running spawned tasks.
///
/// ## Generic methods
///
/// `encode<T: Serialize>` and `decode<T: DeserializeOwned>` work with
/// ANY serde type, not just the event enums. `DeserializeOwned` means the
/// decoded value doesn't borrow from the input frame, so the frame
/// buffer can be dropped right after decoding.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or
    /// don't describe a `T` (for events: unknown name, missing field).
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// Every frame is one UTF-8 JSON document, so the WebSocket transport
/// sends encoded events as text frames and you can read traffic in
/// browser DevTools as-is.
///
/// This is behind the `json` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use lobbyforge_protocol::{ClientEvent, Codec, JsonCodec, RoomCode, ServerEvent};
///
/// let codec = JsonCodec;
///
/// // What a peer sends when it wants in:
/// let frame = br#"{"event":"ROOM_JOIN_REQUEST","data":{"roomCode":"abcd","nickname":"ada"}}"#;
/// let event: ClientEvent = codec.decode(frame).unwrap();
/// assert_eq!(
///     event,
///     ClientEvent::RoomJoinRequest {
///         room_code: "abcd".into(),
///         nickname: "ada".into(),
///     }
/// );
///
/// // What the server answers with:
/// let ack = ServerEvent::PlayerJoinedAck {
///     room_code: RoomCode::parse("abcd").unwrap(),
///     nickname: "ada".into(),
/// };
/// let bytes = codec.encode(&ack).unwrap();
/// assert_eq!(
///     bytes,
///     br#"{"event":"PLAYER_JOINED_ACK","data":{"roomCode":"ABCD","nickname":"ada"}}"#
/// );
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
