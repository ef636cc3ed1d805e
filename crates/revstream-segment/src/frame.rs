//! Record Framing
//!
//! Every appended value is wrapped in a fixed-width frame before it reaches
//! the segment:
//!
//! ```text
//! +----------+----------------+------------------+
//! | tag (4B) | length (4B BE) | payload (length) |
//! +----------+----------------+------------------+
//! ```
//!
//! The frame is what makes revisions computable without a round trip: a
//! successful append of `len` payload bytes at offset `o` commits the next
//! revision at exactly `o + len + FRAME_OVERHEAD`. The client relies on
//! [`revision_after`] being the only way offsets are derived.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{Error, Result};

/// Tag identifying a framed event record.
pub const EVENT_MAGIC: [u8; 4] = *b"EVNT";

/// Fixed per-record framing width: 4-byte tag plus 4-byte length prefix.
pub const FRAME_OVERHEAD: u64 = 8;

/// Maximum serialized payload accepted for a single event (8 MiB).
pub const MAX_EVENT_SIZE: usize = 8 * 1024 * 1024;

/// Offset of the record boundary after appending `payload_len` bytes at
/// `offset`.
pub fn revision_after(offset: u64, payload_len: usize) -> u64 {
    offset + payload_len as u64 + FRAME_OVERHEAD
}

/// A decoded frame: the payload and the authoritative post-read offset.
#[derive(Debug)]
pub struct DecodedFrame {
    pub payload: Bytes,
    pub next_offset: u64,
}

/// Wrap a payload in a frame.
///
/// Size limits are enforced when the pending event is constructed, before
/// the payload reaches the framing layer.
pub fn encode(payload: &[u8]) -> Bytes {
    debug_assert!(payload.len() <= MAX_EVENT_SIZE);
    let mut buf = BytesMut::with_capacity(FRAME_OVERHEAD as usize + payload.len());
    buf.put_slice(&EVENT_MAGIC);
    buf.put_u32(payload.len() as u32);
    buf.put_slice(payload);
    buf.freeze()
}

/// Decode the frame starting at absolute `offset` within `data`.
///
/// `data` must span the segment from absolute offset 0.
pub fn decode_at(data: &[u8], offset: u64) -> Result<DecodedFrame> {
    let start = usize::try_from(offset)
        .map_err(|_| Error::InvalidFrame(format!("offset {offset} is not addressable")))?;
    let rest = data.get(start..).ok_or_else(|| {
        Error::InvalidFrame(format!("offset {offset} is past the end of the segment"))
    })?;
    if rest.len() < FRAME_OVERHEAD as usize {
        return Err(Error::InvalidFrame(format!(
            "frame header at offset {offset} extends past the end of the segment"
        )));
    }

    let mut cursor = rest;
    let mut tag = [0u8; 4];
    cursor.copy_to_slice(&mut tag);
    if tag != EVENT_MAGIC {
        return Err(Error::InvalidFrame(format!(
            "unexpected frame tag {tag:?} at offset {offset}"
        )));
    }

    let len = cursor.get_u32() as usize;
    if len > MAX_EVENT_SIZE {
        return Err(Error::InvalidFrame(format!(
            "frame at offset {offset} declares {len} payload bytes"
        )));
    }
    if cursor.len() < len {
        return Err(Error::InvalidFrame(format!(
            "frame body at offset {offset} extends past the end of the segment"
        )));
    }

    Ok(DecodedFrame {
        payload: Bytes::copy_from_slice(&cursor[..len]),
        next_offset: revision_after(offset, len),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // ---------------------------------------------------------------
    // revision_after
    // ---------------------------------------------------------------

    #[test]
    fn test_revision_after_formula() {
        assert_eq!(revision_after(0, 0), FRAME_OVERHEAD);
        assert_eq!(revision_after(0, 5), 5 + FRAME_OVERHEAD);
        assert_eq!(revision_after(100, 32), 100 + 32 + FRAME_OVERHEAD);
    }

    // ---------------------------------------------------------------
    // encode / decode round-trip
    // ---------------------------------------------------------------

    #[test]
    fn test_roundtrip() {
        let frame = encode(b"hello");
        assert_eq!(frame.len() as u64, revision_after(0, 5));

        let decoded = decode_at(&frame, 0).expect("decode");
        assert_eq!(decoded.payload, Bytes::from_static(b"hello"));
        assert_eq!(decoded.next_offset, revision_after(0, 5));
    }

    #[test]
    fn test_roundtrip_empty_payload() {
        let frame = encode(b"");
        let decoded = decode_at(&frame, 0).expect("decode");
        assert!(decoded.payload.is_empty());
        assert_eq!(decoded.next_offset, FRAME_OVERHEAD);
    }

    #[test]
    fn test_roundtrip_binary_payload() {
        let payload = [0u8, 255, 1, 254, 2, 253];
        let frame = encode(&payload);
        let decoded = decode_at(&frame, 0).expect("decode");
        assert_eq!(decoded.payload.as_ref(), payload);
    }

    #[test]
    fn test_decode_second_frame() {
        let mut log = Vec::new();
        log.extend_from_slice(&encode(b"first"));
        let second_at = log.len() as u64;
        log.extend_from_slice(&encode(b"second"));

        let decoded = decode_at(&log, second_at).expect("decode");
        assert_eq!(decoded.payload, Bytes::from_static(b"second"));
        assert_eq!(decoded.next_offset, log.len() as u64);
    }

    // ---------------------------------------------------------------
    // Malformed frames
    // ---------------------------------------------------------------

    #[test]
    fn test_decode_bad_tag() {
        let mut frame = encode(b"x").to_vec();
        frame[0] = b'?';
        let err = decode_at(&frame, 0).unwrap_err();
        assert!(matches!(err, Error::InvalidFrame(_)));
    }

    #[test]
    fn test_decode_offset_past_end() {
        let frame = encode(b"x");
        let err = decode_at(&frame, frame.len() as u64 + 10).unwrap_err();
        assert!(matches!(err, Error::InvalidFrame(_)));
    }

    #[test]
    fn test_decode_truncated_header() {
        let frame = encode(b"payload");
        let err = decode_at(&frame[..4], 0).unwrap_err();
        assert!(matches!(err, Error::InvalidFrame(_)));
    }

    #[test]
    fn test_decode_truncated_body() {
        let frame = encode(b"payload");
        let err = decode_at(&frame[..frame.len() - 2], 0).unwrap_err();
        assert!(matches!(err, Error::InvalidFrame(_)));
    }
}
