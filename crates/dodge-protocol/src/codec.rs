//! Codec trait and the JSON implementation.
//!
//! A codec turns one message into the bytes of one frame and back. The
//! framing itself (the 4-byte length prefix) belongs to the transport;
//! the codec only ever sees complete payloads.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// Encodes values to frame payloads and decodes them back.
///
/// `Send + Sync + 'static` because the codec lives in shared server state
/// touched from every connection task.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into a frame payload.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if the value can't be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes a frame payload.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if the bytes are not valid UTF-8
    /// JSON or don't match `T`.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] that speaks flat UTF-8 JSON objects via `serde_json`.
///
/// ```rust
/// use dodge_protocol::{ClientCommand, Codec, JsonCodec};
///
/// let cmd: ClientCommand = JsonCodec
///     .decode(br#"{"cmd":"INPUT","left":true,"right":false,"up":false}"#)
///     .unwrap();
/// assert_eq!(cmd, ClientCommand::Input { left: true, right: false, up: false });
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ClientCommand, ServerMessage};

    #[test]
    fn test_decode_rejects_non_utf8() {
        let err = JsonCodec.decode::<ClientCommand>(&[0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, ProtocolError::Decode(_)));
    }

    #[test]
    fn test_encode_welcome_is_flat_object() {
        let msg = ServerMessage::Welcome {
            id: crate::PlayerId(0xab),
            seed: 7,
            tick_hz: 60,
            snapshot_hz: 20,
        };
        let bytes = JsonCodec.encode(&msg).unwrap();
        let text = std::str::from_utf8(&bytes).unwrap();
        assert!(text.starts_with('{'));
        assert!(text.contains(r#""cmd":"WELCOME""#));
        assert!(text.contains(r#""id":"000000ab""#));
    }
}
