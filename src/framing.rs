//! Varint length-prefixed frame codec.
//!
//! One frame on the wire is:
//!
//! ```text
//! ┌──────────────────┬──────────────────┐
//! │ varint(len)      │ payload          │
//! │ 1-10 bytes LEB128│ exactly len bytes│
//! └──────────────────┴──────────────────┘
//! ```
//!
//! The prefix is an unsigned LEB128 varint (7 payload bits per byte, high
//! bit marks continuation). There is no checksum, version byte, or message
//! type tag — framing is purely length-delimiting. Both endpoints enforce
//! the same [`MAX_MESSAGE_SIZE`] cap so oversized frames are rejected
//! identically on either side.
//!
//! # Example
//!
//! ```
//! use peerwire::framing::encode_frame;
//!
//! let frame = encode_frame(b"hello");
//! assert_eq!(frame, [&[5u8][..], b"hello"].concat());
//! ```

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Result, WireError};

/// Maximum payload size of a single frame (4 MiB).
///
/// Shared, protocol-wide constant: the peer applies the same cap, so a
/// frame above it is never written and is rejected on read.
pub const MAX_MESSAGE_SIZE: usize = 1 << 22;

/// Maximum encoded length of the varint prefix (u64, 7 bits per byte).
pub const MAX_VARINT_LEN: usize = 10;

/// Encode `value` as an unsigned LEB128 varint into `buf`, returning the
/// number of bytes written.
pub fn encode_varint(mut value: u64, buf: &mut [u8; MAX_VARINT_LEN]) -> usize {
    let mut i = 0;
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        buf[i] = byte;
        i += 1;
        if value == 0 {
            return i;
        }
    }
}

/// Build a complete frame as a single byte vector.
///
/// Does not apply the size cap; callers sending frames go through
/// [`write_frame`], which does.
pub fn encode_frame(payload: &[u8]) -> Vec<u8> {
    let mut prefix = [0u8; MAX_VARINT_LEN];
    let n = encode_varint(payload.len() as u64, &mut prefix);

    let mut buf = Vec::with_capacity(n + payload.len());
    buf.extend_from_slice(&prefix[..n]);
    buf.extend_from_slice(payload);
    buf
}

/// Write one length-prefixed frame to `writer` and flush it.
///
/// Rejects payloads above [`MAX_MESSAGE_SIZE`] with
/// [`WireError::MessageTooLarge`] before any byte reaches the stream.
/// The frame is emitted as one contiguous buffer, so a failed size check
/// never leaves a partial prefix on the wire.
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    if payload.len() > MAX_MESSAGE_SIZE {
        return Err(WireError::MessageTooLarge {
            size: payload.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }

    let frame = encode_frame(payload);
    writer.write_all(&frame).await.map_err(WireError::Write)?;
    writer.flush().await.map_err(WireError::Write)?;
    Ok(())
}

/// Read one length-prefixed frame from `reader`.
///
/// Returns the payload bytes exactly as they appear on the wire (still
/// compressed if the peer compresses).
///
/// # Errors
///
/// - [`WireError::PeerClosed`] — clean EOF before the first prefix byte.
/// - [`WireError::MalformedFrame`] — EOF inside the prefix or payload,
///   or a varint longer than [`MAX_VARINT_LEN`] bytes.
/// - [`WireError::MessageTooLarge`] — declared length above the cap; the
///   payload is not read.
pub async fn read_frame<R>(reader: &mut R) -> Result<Bytes>
where
    R: AsyncRead + Unpin,
{
    let len = read_varint(reader).await?;

    if len > MAX_MESSAGE_SIZE as u64 {
        return Err(WireError::MessageTooLarge {
            size: len as usize,
            max: MAX_MESSAGE_SIZE,
        });
    }

    let mut payload = vec![0u8; len as usize];
    reader.read_exact(&mut payload).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            WireError::MalformedFrame(format!(
                "stream closed mid-frame, expected {} payload bytes",
                len
            ))
        } else {
            WireError::Read(e)
        }
    })?;

    Ok(Bytes::from(payload))
}

/// Read the unsigned LEB128 length prefix byte-by-byte.
async fn read_varint<R>(reader: &mut R) -> Result<u64>
where
    R: AsyncRead + Unpin,
{
    let mut value: u64 = 0;
    let mut shift = 0u32;

    for i in 0..MAX_VARINT_LEN {
        let byte = match reader.read_u8().await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                if i == 0 {
                    return Err(WireError::PeerClosed);
                }
                return Err(WireError::MalformedFrame(
                    "stream closed inside length prefix".to_string(),
                ));
            }
            Err(e) => return Err(WireError::Read(e)),
        };

        value |= u64::from(byte & 0x7F) << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
        shift += 7;
    }

    Err(WireError::MalformedFrame(
        "length prefix exceeds 10 bytes".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn varint_bytes(value: u64) -> Vec<u8> {
        let mut buf = [0u8; MAX_VARINT_LEN];
        let n = encode_varint(value, &mut buf);
        buf[..n].to_vec()
    }

    #[test]
    fn test_varint_single_byte_values() {
        assert_eq!(varint_bytes(0), vec![0x00]);
        assert_eq!(varint_bytes(1), vec![0x01]);
        assert_eq!(varint_bytes(127), vec![0x7F]);
    }

    #[test]
    fn test_varint_multi_byte_values() {
        assert_eq!(varint_bytes(128), vec![0x80, 0x01]);
        assert_eq!(varint_bytes(300), vec![0xAC, 0x02]);
        assert_eq!(varint_bytes(u64::MAX).len(), 10);
    }

    #[test]
    fn test_encode_frame_exact_bytes() {
        // varint(5) || "hello"
        let frame = encode_frame(b"hello");
        assert_eq!(frame, vec![0x05, b'h', b'e', b'l', b'l', b'o']);
    }

    #[test]
    fn test_encode_frame_empty_payload() {
        assert_eq!(encode_frame(b""), vec![0x00]);
    }

    #[test]
    fn test_encode_frame_two_byte_prefix() {
        let payload = vec![0xAB; 300];
        let frame = encode_frame(&payload);
        assert_eq!(&frame[..2], &[0xAC, 0x02]);
        assert_eq!(frame.len(), 2 + 300);
    }

    #[tokio::test]
    async fn test_write_read_roundtrip() {
        let mut wire = Cursor::new(Vec::new());
        write_frame(&mut wire, b"ping").await.unwrap();

        let mut cursor = Cursor::new(wire.into_inner());
        let payload = read_frame(&mut cursor).await.unwrap();
        assert_eq!(&payload[..], b"ping");
    }

    #[tokio::test]
    async fn test_write_rejects_oversize_before_any_byte() {
        let payload = vec![0u8; MAX_MESSAGE_SIZE + 1];
        let mut wire = Cursor::new(Vec::new());

        let err = write_frame(&mut wire, &payload).await.unwrap_err();
        assert!(matches!(err, WireError::MessageTooLarge { .. }));
        assert!(wire.into_inner().is_empty());
    }

    #[tokio::test]
    async fn test_write_accepts_exactly_max() {
        let payload = vec![0u8; MAX_MESSAGE_SIZE];
        let mut wire = Cursor::new(Vec::new());
        write_frame(&mut wire, &payload).await.unwrap();

        let mut cursor = Cursor::new(wire.into_inner());
        let read = read_frame(&mut cursor).await.unwrap();
        assert_eq!(read.len(), MAX_MESSAGE_SIZE);
    }

    #[tokio::test]
    async fn test_read_rejects_oversize_declared_length() {
        let wire = varint_bytes(MAX_MESSAGE_SIZE as u64 + 1);
        let mut cursor = Cursor::new(wire);

        let err = read_frame(&mut cursor).await.unwrap_err();
        assert!(matches!(err, WireError::MessageTooLarge { .. }));
    }

    #[tokio::test]
    async fn test_read_clean_eof_is_peer_closed() {
        let mut cursor = Cursor::new(Vec::<u8>::new());
        let err = read_frame(&mut cursor).await.unwrap_err();
        assert!(matches!(err, WireError::PeerClosed));
    }

    #[tokio::test]
    async fn test_read_eof_inside_prefix_is_malformed() {
        // Continuation bit set, then nothing.
        let mut cursor = Cursor::new(vec![0x80]);
        let err = read_frame(&mut cursor).await.unwrap_err();
        assert!(matches!(err, WireError::MalformedFrame(_)));
    }

    #[tokio::test]
    async fn test_read_eof_inside_payload_is_malformed() {
        // Prefix declares 10 bytes, only 3 follow.
        let mut wire = varint_bytes(10);
        wire.extend_from_slice(b"abc");
        let mut cursor = Cursor::new(wire);

        let err = read_frame(&mut cursor).await.unwrap_err();
        assert!(matches!(err, WireError::MalformedFrame(_)));
    }

    #[tokio::test]
    async fn test_read_overlong_varint_is_malformed() {
        let mut cursor = Cursor::new(vec![0x80; 11]);
        let err = read_frame(&mut cursor).await.unwrap_err();
        assert!(matches!(err, WireError::MalformedFrame(_)));
    }

    #[tokio::test]
    async fn test_read_two_frames_back_to_back() {
        let mut wire = Cursor::new(Vec::new());
        write_frame(&mut wire, b"first").await.unwrap();
        write_frame(&mut wire, b"second").await.unwrap();

        let mut cursor = Cursor::new(wire.into_inner());
        assert_eq!(&read_frame(&mut cursor).await.unwrap()[..], b"first");
        assert_eq!(&read_frame(&mut cursor).await.unwrap()[..], b"second");
    }

    #[tokio::test]
    async fn test_read_empty_frame() {
        let mut wire = Cursor::new(Vec::new());
        write_frame(&mut wire, b"").await.unwrap();

        let mut cursor = Cursor::new(wire.into_inner());
        let payload = read_frame(&mut cursor).await.unwrap();
        assert!(payload.is_empty());
    }
}
