//! Transport collaborator contract.
//!
//! The transport library (dialing, multiplexing, peer identity, NAT
//! traversal) is external to this crate. All it has to hand over is one
//! already-open duplex byte stream implementing [`RawStream`]; the session
//! layer does the rest.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use tokio::io::{AsyncRead, AsyncWrite, DuplexStream, ReadBuf};

/// An open, ordered, reliable duplex byte channel to one remote peer.
///
/// Implementors supply raw byte I/O plus the peer-facing accessors the
/// session exposes. Byte delivery must be ordered and reliable (TCP-like);
/// the read and write directions are independent half-duplex paths, so one
/// concurrent reader plus one concurrent writer is safe, but neither path
/// tolerates overlapping calls from multiple writers (or readers) without
/// external serialization.
pub trait RawStream: AsyncRead + AsyncWrite + Unpin + Send {
    /// String form of the remote peer's identity.
    fn remote_peer_id(&self) -> String;

    /// Remote peer's address in string form.
    fn remote_addr(&self) -> String;

    /// Protocol identifier negotiated for this stream.
    fn protocol_id(&self) -> &str;

    /// Arm an absolute deadline on the transport's write path.
    ///
    /// Transports with kernel-level deadlines (e.g. a socket with
    /// `SO_SNDTIMEO`) enforce it natively and may fail here; the default
    /// is a no-op `Ok(())` for transports that rely on the session's own
    /// send timeout instead.
    fn set_write_deadline(&mut self, _deadline: Instant) -> io::Result<()> {
        Ok(())
    }

    /// Abruptly tear the stream down, signaling a protocol error to the
    /// peer. Unlike a graceful shutdown, in-flight data may be discarded.
    fn reset(&mut self) -> io::Result<()>;
}

/// In-memory [`RawStream`] over a [`tokio::io::duplex`] pipe.
///
/// Intended for tests and demos: two connected `MemoryStream`s behave like
/// a loopback transport with fixed peer metadata.
///
/// # Example
///
/// ```
/// use peerwire::stream::{MemoryStream, RawStream};
///
/// let (a, b) = MemoryStream::pair(4096, "/peerwire/demo/1.0.0");
/// assert_eq!(a.remote_peer_id(), "peer-b");
/// assert_eq!(b.remote_peer_id(), "peer-a");
/// ```
pub struct MemoryStream {
    inner: DuplexStream,
    peer_id: String,
    addr: String,
    protocol: String,
}

impl MemoryStream {
    /// Create a connected pair of in-memory streams with `capacity` bytes
    /// of buffer per direction.
    pub fn pair(capacity: usize, protocol: &str) -> (MemoryStream, MemoryStream) {
        let (a, b) = tokio::io::duplex(capacity);
        (
            MemoryStream {
                inner: a,
                peer_id: "peer-b".to_string(),
                addr: "memory://peer-b".to_string(),
                protocol: protocol.to_string(),
            },
            MemoryStream {
                inner: b,
                peer_id: "peer-a".to_string(),
                addr: "memory://peer-a".to_string(),
                protocol: protocol.to_string(),
            },
        )
    }

    /// Wrap one half of a duplex pipe with explicit peer metadata.
    pub fn new(inner: DuplexStream, peer_id: &str, addr: &str, protocol: &str) -> Self {
        Self {
            inner,
            peer_id: peer_id.to_string(),
            addr: addr.to_string(),
            protocol: protocol.to_string(),
        }
    }
}

impl AsyncRead for MemoryStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl AsyncWrite for MemoryStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.inner).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}

impl RawStream for MemoryStream {
    fn remote_peer_id(&self) -> String {
        self.peer_id.clone()
    }

    fn remote_addr(&self) -> String {
        self.addr.clone()
    }

    fn protocol_id(&self) -> &str {
        &self.protocol
    }

    fn reset(&mut self) -> io::Result<()> {
        // Dropping a duplex half wakes the peer with EOF; there is no
        // abrupt-reset signal in an in-memory pipe, so this is as close
        // as the transport gets.
        Ok(())
    }
}
