//! Payload compression adapter.
//!
//! The transform runs strictly before framing on send and strictly after
//! framing on receive, so the wire always carries framed, already-compressed
//! bytes and the length prefix measures the compressed size.
//!
//! Peers must agree out-of-band on the algorithm in effect for a stream;
//! [`CompressionAlgo::id`] / [`CompressionAlgo::from_id`] give each variant
//! a stable numeric id for that negotiation.
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use peerwire::compression::{compress, decompress, CompressionAlgo};
//!
//! let payload = Bytes::from_static(b"hello hello hello hello");
//! let packed = compress(payload.clone(), CompressionAlgo::Zlib).unwrap();
//! let unpacked = decompress(packed, CompressionAlgo::Zlib).unwrap();
//! assert_eq!(unpacked, payload);
//! ```

use std::io::{Read, Write};

use bytes::Bytes;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::{Result, WireError};

/// Compression algorithm applied symmetrically on both ends of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionAlgo {
    /// Pass bytes through unchanged.
    #[default]
    None,
    /// Zlib (RFC 1950) via flate2.
    Zlib,
}

impl CompressionAlgo {
    /// Stable numeric id for out-of-band negotiation.
    #[inline]
    pub fn id(self) -> u8 {
        match self {
            CompressionAlgo::None => 0,
            CompressionAlgo::Zlib => 1,
        }
    }

    /// Resolve a negotiated numeric id.
    ///
    /// An id this build does not recognize is a distinct error from
    /// runtime corruption, so callers can report a negotiation mismatch
    /// instead of a damaged stream.
    pub fn from_id(id: u8) -> Result<Self> {
        match id {
            0 => Ok(CompressionAlgo::None),
            1 => Ok(CompressionAlgo::Zlib),
            other => Err(WireError::UnknownAlgorithm(other)),
        }
    }
}

impl std::fmt::Display for CompressionAlgo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompressionAlgo::None => write!(f, "none"),
            CompressionAlgo::Zlib => write!(f, "zlib"),
        }
    }
}

/// Compress an outbound payload.
///
/// `None` returns the input `Bytes` unchanged (zero-copy).
pub fn compress(payload: Bytes, algo: CompressionAlgo) -> Result<Bytes> {
    match algo {
        CompressionAlgo::None => Ok(payload),
        CompressionAlgo::Zlib => {
            let mut encoder = ZlibEncoder::new(
                Vec::with_capacity(payload.len() / 2),
                Compression::default(),
            );
            encoder
                .write_all(&payload)
                .map_err(WireError::Compression)?;
            let compressed = encoder.finish().map_err(WireError::Compression)?;
            Ok(Bytes::from(compressed))
        }
    }
}

/// Decompress an inbound payload.
///
/// `None` returns the input `Bytes` unchanged (zero-copy). Corrupt input
/// under a real algorithm fails with [`WireError::Decompression`]; the
/// caller treats that as fatal for the message and decides whether to
/// reset the stream.
pub fn decompress(payload: Bytes, algo: CompressionAlgo) -> Result<Bytes> {
    match algo {
        CompressionAlgo::None => Ok(payload),
        CompressionAlgo::Zlib => {
            let mut decoder = ZlibDecoder::new(&payload[..]);
            let mut out = Vec::with_capacity(payload.len() * 2);
            decoder
                .read_to_end(&mut out)
                .map_err(WireError::Decompression)?;
            Ok(Bytes::from(out))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_roundtrip_zero_copy() {
        let payload = Bytes::from_static(b"pass through");

        let compressed = compress(payload.clone(), CompressionAlgo::None).unwrap();
        assert_eq!(compressed.as_ptr(), payload.as_ptr());

        let decompressed = decompress(compressed, CompressionAlgo::None).unwrap();
        assert_eq!(decompressed, payload);
    }

    #[test]
    fn test_zlib_roundtrip() {
        let payload = Bytes::from(vec![b'x'; 4096]);

        let compressed = compress(payload.clone(), CompressionAlgo::Zlib).unwrap();
        assert!(compressed.len() < payload.len());

        let decompressed = decompress(compressed, CompressionAlgo::Zlib).unwrap();
        assert_eq!(decompressed, payload);
    }

    #[test]
    fn test_zlib_roundtrip_empty() {
        let compressed = compress(Bytes::new(), CompressionAlgo::Zlib).unwrap();
        let decompressed = decompress(compressed, CompressionAlgo::Zlib).unwrap();
        assert!(decompressed.is_empty());
    }

    #[test]
    fn test_zlib_roundtrip_all_byte_values() {
        let payload = Bytes::from((0u8..=255).collect::<Vec<u8>>());

        let compressed = compress(payload.clone(), CompressionAlgo::Zlib).unwrap();
        let decompressed = decompress(compressed, CompressionAlgo::Zlib).unwrap();
        assert_eq!(decompressed, payload);
    }

    #[test]
    fn test_zlib_corrupt_input_is_decompression_error() {
        let garbage = Bytes::from_static(b"\xDE\xAD\xBE\xEFnot zlib at all");
        let err = decompress(garbage, CompressionAlgo::Zlib).unwrap_err();
        assert!(matches!(err, WireError::Decompression(_)));
    }

    #[test]
    fn test_algo_id_roundtrip() {
        for algo in [CompressionAlgo::None, CompressionAlgo::Zlib] {
            assert_eq!(CompressionAlgo::from_id(algo.id()).unwrap(), algo);
        }
    }

    #[test]
    fn test_unknown_algo_id() {
        let err = CompressionAlgo::from_id(42).unwrap_err();
        assert!(matches!(err, WireError::UnknownAlgorithm(42)));
    }

    #[test]
    fn test_display() {
        assert_eq!(CompressionAlgo::None.to_string(), "none");
        assert_eq!(CompressionAlgo::Zlib.to_string(), "zlib");
    }
}
