use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::{CodecError, Result};

/// Default control buffer capacity: 64 KiB, matching the VIV driver contract.
pub const DEFAULT_CAPACITY: usize = 64 * 1024;

/// Converts structured messages to and from the fixed-capacity control buffer.
///
/// The codec never touches a device; it only polices the capacity invariant
/// so the channel can fail fast before any kernel call happens.
#[derive(Debug, Clone, Copy)]
pub struct MessageCodec {
    capacity: usize,
}

impl MessageCodec {
    /// Create a codec for a buffer of the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self { capacity }
    }

    /// The buffer capacity this codec enforces.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Serialize a message to JSON bytes.
    ///
    /// Encoding is deterministic: the same logical message always yields
    /// byte-identical output, so callers can reason about exact sizes.
    /// Fails with [`CodecError::PayloadTooLarge`] when the serialized length
    /// is greater than or equal to the capacity; the content must always
    /// leave room for at least one NUL delimiter.
    pub fn encode<T: Serialize>(&self, message: &T) -> Result<Vec<u8>> {
        let payload = serde_json::to_vec(message)?;
        if payload.len() >= self.capacity {
            return Err(CodecError::PayloadTooLarge {
                size: payload.len(),
                capacity: self.capacity,
            });
        }
        debug!(len = payload.len(), capacity = self.capacity, "encoded message");
        Ok(payload)
    }

    /// Parse a message out of the (zero-padded) control buffer.
    ///
    /// Content ends at the first NUL byte. Missing required fields surface
    /// as [`CodecError::Malformed`] just like unparseable bytes do; the
    /// buffer is not self-describing enough to tell the cases apart.
    pub fn decode<T: DeserializeOwned>(&self, buf: &[u8]) -> Result<T> {
        let content = trim_padding(buf);
        if content.is_empty() {
            return Err(CodecError::Empty);
        }
        debug!(len = content.len(), "decoding message content");
        serde_json::from_slice(content).map_err(CodecError::Malformed)
    }
}

impl Default for MessageCodec {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// Zero-fill `buf` and copy `payload` into its front.
///
/// The full zero-fill matters: a previous, longer message would otherwise
/// leave trailing bytes past the new payload and corrupt the read-back parse.
///
/// # Panics
/// Panics if `payload` does not fit in `buf`; callers must have run the
/// capacity check first.
pub fn fill(payload: &[u8], buf: &mut [u8]) {
    buf.fill(0);
    buf[..payload.len()].copy_from_slice(payload);
}

/// The content portion of a zero-padded buffer: everything before the first
/// NUL byte, or the whole slice if no NUL is present.
pub fn trim_padding(buf: &[u8]) -> &[u8] {
    match buf.iter().position(|&b| b == 0) {
        Some(end) => &buf[..end],
        None => buf,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encode_decode_roundtrip() {
        let codec = MessageCodec::default();
        let message = json!({"id": "ae.g.en", "streamid": 0});

        let payload = codec.encode(&message).unwrap();
        let mut buf = vec![0u8; codec.capacity()];
        fill(&payload, &mut buf);

        let parsed: serde_json::Value = codec.decode(&buf).unwrap();
        assert_eq!(parsed, message);
    }

    #[test]
    fn test_encode_is_deterministic() {
        let codec = MessageCodec::default();
        let message = json!({"id": "wb.s.cfg", "streamid": 0, "wb.gains": {"red": 1.2}});

        let first = codec.encode(&message).unwrap();
        let second = codec.encode(&message).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_size_boundary() {
        let capacity = 64;
        let codec = MessageCodec::new(capacity);

        // A JSON string of N characters serializes to N + 2 bytes.
        let fits = json!("a".repeat(capacity - 3));
        let payload = codec.encode(&fits).unwrap();
        assert_eq!(payload.len(), capacity - 1);

        let too_big = json!("a".repeat(capacity - 2));
        let result = codec.encode(&too_big);
        assert!(matches!(
            result,
            Err(CodecError::PayloadTooLarge { size, capacity: 64 }) if size == 64
        ));
    }

    #[test]
    fn test_decode_stops_at_padding() {
        let codec = MessageCodec::new(64);
        let mut buf = vec![0u8; 64];
        let content = br#"{"enable":true}"#;
        buf[..content.len()].copy_from_slice(content);
        // Garbage past the NUL padding start must be ignored.
        buf[40] = b'}';

        let parsed: serde_json::Value = codec.decode(&buf).unwrap();
        assert_eq!(parsed, json!({"enable": true}));
    }

    #[test]
    fn test_decode_empty_buffer() {
        let codec = MessageCodec::new(64);
        let buf = vec![0u8; 64];
        let result: Result<serde_json::Value> = codec.decode(&buf);
        assert!(matches!(result, Err(CodecError::Empty)));
    }

    #[test]
    fn test_decode_malformed_content() {
        let codec = MessageCodec::new(64);
        let mut buf = vec![0u8; 64];
        buf[..9].copy_from_slice(b"not json!");
        let result: Result<serde_json::Value> = codec.decode(&buf);
        assert!(matches!(result, Err(CodecError::Malformed(_))));
    }

    #[test]
    fn test_decode_missing_field_is_malformed() {
        #[derive(serde::Deserialize)]
        struct EnableReply {
            #[allow(dead_code)]
            enable: bool,
        }

        let codec = MessageCodec::new(64);
        let mut buf = vec![0u8; 64];
        let content = br#"{"id":"ae.g.en"}"#;
        buf[..content.len()].copy_from_slice(content);

        let result: Result<EnableReply> = codec.decode(&buf);
        assert!(matches!(result, Err(CodecError::Malformed(_))));
    }

    #[test]
    fn test_fill_clears_stale_bytes() {
        let mut buf = vec![0xFFu8; 32];
        fill(b"short", &mut buf);
        assert_eq!(&buf[..5], b"short");
        assert!(buf[5..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_trim_padding_without_nul() {
        assert_eq!(trim_padding(b"{}"), b"{}");
    }
}
