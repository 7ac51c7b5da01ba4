//! Type-tagged, length-prefixed frames over any `Read`/`Write` stream.
//!
//! Each frame is: `[u8 type][u32 big-endian length][payload]`. The length
//! counts payload bytes only, never the header.

use std::io::{Read, Write};

use crate::stream::ByteStream;
use crate::{Error, MessageType, Result};

/// Size of the `type | length` header.
pub const HEADER_LEN: usize = 5;

/// Largest payload a frame can declare.
///
/// Peers read the length field as a signed 32-bit integer, so the top bit
/// is never set on a valid frame.
pub const MAX_PAYLOAD: usize = 0x7fff_ffff;

/// One complete protocol message.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(clippy::exhaustive_structs)]
pub struct Frame {
    /// Message type tag.
    pub kind: MessageType,
    /// Opaque payload bytes.
    pub payload: Vec<u8>,
}

/// Writes `kind` and `payload` as one frame in a single logical write.
pub fn send<W: Write>(w: &mut W, kind: MessageType, payload: &[u8]) -> Result<()> {
    let len = encode_len(payload.len())?;
    let mut buf = Vec::with_capacity(HEADER_LEN + payload.len());
    buf.push(kind.as_u8());
    buf.extend_from_slice(&len);
    buf.extend_from_slice(payload);
    ByteStream::new(w).write(&buf)
}

/// Reads one whole frame from `r`.
///
/// Short reads anywhere in the frame fail with [`Error::TruncatedStream`];
/// an unknown tag or a negative length fails with
/// [`Error::ProtocolViolation`].
pub fn receive<R: Read>(r: &mut R) -> Result<Frame> {
    let mut stream = ByteStream::new(r);
    let header = stream.read(HEADER_LEN)?;
    let kind = MessageType::try_from(header[0])?;
    let len = decode_len([header[1], header[2], header[3], header[4]])?;
    let payload = stream.read(len)?;
    Ok(Frame { kind, payload })
}

/// Encodes a payload length for the wire.
fn encode_len(len: usize) -> Result<[u8; 4]> {
    i32::try_from(len)
        .map(i32::to_be_bytes)
        .map_err(|_| Error::PayloadTooLarge(len))
}

/// Decodes a wire length, rejecting values with the sign bit set.
fn decode_len(bytes: [u8; 4]) -> Result<usize> {
    let len = i32::from_be_bytes(bytes);
    usize::try_from(len)
        .map_err(|_| Error::ProtocolViolation(format!("negative payload length {len}")))
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;
    use crate::stream::tests::Trickle;

    fn framed(kind: MessageType, payload: &[u8]) -> Vec<u8> {
        let mut buf = Vec::new();
        send(&mut buf, kind, payload).unwrap();
        buf
    }

    #[test]
    fn header_layout() {
        let buf = framed(MessageType::End, &[3]);
        assert_eq!(buf, [0x05, 0, 0, 0, 1, 3]);
    }

    #[test]
    fn empty_payload_is_header_only() {
        let buf = framed(MessageType::DrawInProcess, b"");
        assert_eq!(buf, [0x08, 0, 0, 0, 0]);
        let frame = receive(&mut buf.as_slice()).unwrap();
        assert!(frame.payload.is_empty());
    }

    #[test]
    fn roundtrip_every_tag_and_boundary_sizes() {
        for kind in MessageType::ALL {
            for size in [0usize, 1, 255, 256, 4096, 65_535] {
                #[allow(clippy::cast_possible_truncation)]
                let payload: Vec<u8> = (0..size).map(|i| i as u8).collect();
                let buf = framed(kind, &payload);
                assert_eq!(buf.len(), HEADER_LEN + size);

                let frame = receive(&mut io::Cursor::new(&buf)).unwrap();
                assert_eq!(frame.kind, kind);
                assert_eq!(frame.payload, payload);
            }
        }
    }

    #[test]
    fn roundtrip_over_trickling_transport() {
        let payload = b"agency\x1fname".repeat(50);
        let mut out = Trickle::new(Vec::new(), 3);
        send(&mut out, MessageType::MultipleBet, &payload).unwrap();

        let mut input = Trickle::new(out.written, 2);
        let frame = receive(&mut input).unwrap();
        assert_eq!(frame.kind, MessageType::MultipleBet);
        assert_eq!(frame.payload, payload);
    }

    #[test]
    fn consecutive_frames_are_read_one_at_a_time() {
        let mut buf = framed(MessageType::BetAck, b"OK");
        buf.extend(framed(MessageType::Result, b"1\x1e2"));

        let mut cursor = io::Cursor::new(&buf);
        assert_eq!(receive(&mut cursor).unwrap().kind, MessageType::BetAck);
        let second = receive(&mut cursor).unwrap();
        assert_eq!(second.kind, MessageType::Result);
        assert_eq!(second.payload, b"1\x1e2");
    }

    #[test]
    fn every_truncation_point_is_rejected() {
        let buf = framed(MessageType::Result, b"111222333\x1e444555666");
        for k in 0..buf.len() {
            let err = receive(&mut &buf[..k]).unwrap_err();
            assert!(
                matches!(err, Error::TruncatedStream { .. }),
                "cut at {k}: {err:?}"
            );
        }
    }

    #[test]
    fn huge_declared_length_fails_as_truncated() {
        let header = [0x07, 0x7f, 0xff, 0xff, 0xff];
        let err = receive(&mut &header[..]).unwrap_err();
        assert!(matches!(
            err,
            Error::TruncatedStream {
                expected: MAX_PAYLOAD,
                received: 0
            }
        ));
    }

    #[test]
    fn rejects_negative_length() {
        let header = [0x04, 0x80, 0, 0, 0];
        let err = receive(&mut &header[..]).unwrap_err();
        assert!(matches!(err, Error::ProtocolViolation(_)));
    }

    #[test]
    fn rejects_unknown_tag() {
        let header = [0x2a, 0, 0, 0, 0];
        let err = receive(&mut &header[..]).unwrap_err();
        assert!(matches!(err, Error::ProtocolViolation(_)));
    }

    #[test]
    fn rejects_oversized_payload_length() {
        assert!(matches!(
            encode_len(MAX_PAYLOAD + 1),
            Err(Error::PayloadTooLarge(n)) if n == MAX_PAYLOAD + 1
        ));
        assert_eq!(encode_len(MAX_PAYLOAD).unwrap(), [0x7f, 0xff, 0xff, 0xff]);
    }
}
