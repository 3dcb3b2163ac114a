//! Transport-level packet framing.
//!
//! Wire format:
//! ```text
//! ┌───────────┬──────────────┬──────────────────┐
//! │ Size (1B) │ MsgType (1B) │ Payload          │
//! │ = 1 + len │              │ (Size - 1 bytes) │
//! └───────────┴──────────────┴──────────────────┘
//! ```
//!
//! The size field counts the message-type byte, so an empty payload frames
//! as `[0x01, msg_type]`. Payload-shape validation belongs to the codecs;
//! this layer only checks that a buffer is long enough to carry a header.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{ProtoError, Result};

/// Packet header: size (1) + message type (1).
pub const HEADER_SIZE: usize = 2;

/// Largest payload the one-byte size field can carry.
pub const MAX_PAYLOAD: usize = u8::MAX as usize - 1;

/// Wrap a message type and payload into a transport-level packet.
pub fn frame(msg_type: u8, payload: &[u8]) -> Result<Bytes> {
    if payload.len() > MAX_PAYLOAD {
        return Err(ProtoError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD,
        });
    }
    let mut buf = BytesMut::with_capacity(HEADER_SIZE + payload.len());
    buf.put_u8((payload.len() + 1) as u8);
    buf.put_u8(msg_type);
    buf.put_slice(payload);
    Ok(buf.freeze())
}

/// Split a transport-level packet into its message type and payload.
///
/// Exact inverse of [`frame`] over the set of valid inputs. Fails with
/// [`ProtoError::MalformedPacket`] when the buffer cannot hold a header.
pub fn unframe(buffer: &[u8]) -> Result<(u8, Bytes)> {
    if buffer.len() < HEADER_SIZE {
        return Err(ProtoError::MalformedPacket { len: buffer.len() });
    }
    let msg_type = buffer[1];
    Ok((msg_type, Bytes::copy_from_slice(&buffer[HEADER_SIZE..])))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_unframe_roundtrip() {
        let payload = [0xF4, 0x01, 0xF4, 0x01];
        let packet = frame(0x24, &payload).unwrap();

        assert_eq!(packet.len(), HEADER_SIZE + payload.len());
        assert_eq!(packet[0], payload.len() as u8 + 1);
        assert_eq!(packet[1], 0x24);

        let (msg_type, decoded) = unframe(&packet).unwrap();
        assert_eq!(msg_type, 0x24);
        assert_eq!(decoded.as_ref(), payload);
    }

    #[test]
    fn empty_payload_frames_to_header_only() {
        let packet = frame(0x16, &[]).unwrap();
        assert_eq!(packet.as_ref(), &[0x01, 0x16]);

        let (msg_type, payload) = unframe(&packet).unwrap();
        assert_eq!(msg_type, 0x16);
        assert!(payload.is_empty());
    }

    #[test]
    fn roundtrip_across_payload_lengths() {
        for len in 0..=32usize {
            let payload: Vec<u8> = (0..len as u8).collect();
            let packet = frame(0x42, &payload).unwrap();
            let (msg_type, decoded) = unframe(&packet).unwrap();
            assert_eq!(msg_type, 0x42);
            assert_eq!(decoded.as_ref(), payload.as_slice());
        }
    }

    #[test]
    fn short_buffer_is_malformed() {
        let err = unframe(&[0x01]).unwrap_err();
        assert!(matches!(err, ProtoError::MalformedPacket { len: 1 }));

        let err = unframe(&[]).unwrap_err();
        assert!(matches!(err, ProtoError::MalformedPacket { len: 0 }));
    }

    #[test]
    fn oversized_payload_rejected() {
        let payload = vec![0u8; MAX_PAYLOAD + 1];
        let err = frame(0x42, &payload).unwrap_err();
        assert!(matches!(err, ProtoError::PayloadTooLarge { .. }));
    }

    #[test]
    fn max_payload_accepted() {
        let payload = vec![0xAB; MAX_PAYLOAD];
        let packet = frame(0x42, &payload).unwrap();
        assert_eq!(packet[0], 0xFF);
        let (_, decoded) = unframe(&packet).unwrap();
        assert_eq!(decoded.len(), MAX_PAYLOAD);
    }
}
