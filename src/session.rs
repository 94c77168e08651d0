//! Stream session façade.
//!
//! A [`Session`] wraps one transport-owned stream and turns it into a
//! request/response and one-way messaging channel: per-call deadlines,
//! optional payload compression, a hard frame size cap, and traffic
//! counters at the session boundary.
//!
//! Outbound path: compress → frame → write (bounded by the send timeout).
//! Inbound path: read (bounded by the read timeout) → deframe → decompress.
//!
//! # Concurrency
//!
//! Session operations take `&mut self`, which enforces the underlying
//! stream's contract of at most one outstanding write and one outstanding
//! read. To run one writer and one reader concurrently (the two directions
//! are independent), use [`Session::into_split`].
//!
//! # Example
//!
//! ```no_run
//! use bytes::Bytes;
//! use peerwire::{Direction, Session, SessionConfig};
//! use peerwire::stream::MemoryStream;
//!
//! # async fn run() -> peerwire::Result<()> {
//! let (local, _remote) = MemoryStream::pair(4096, "/app/1.0.0");
//! let mut session = Session::new(local, Direction::Outbound, SessionConfig::default());
//!
//! let response = session.send(Bytes::from_static(b"ping")).await?;
//! assert_eq!(&response[..], b"pong");
//! session.close().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use tokio::io::AsyncWriteExt;
use tokio::time::timeout;

use crate::compression::{compress, decompress, CompressionAlgo};
use crate::error::{Result, WireError};
use crate::framing::{read_frame, write_frame};
use crate::metrics::{GlobalMetrics, MetricsSink, NoopMetrics};
use crate::stream::RawStream;

/// Default send timeout.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Default read timeout.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Which endpoint initiated the stream.
///
/// Carried for logging and metrics attribution only; framing behavior is
/// identical in both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// The remote peer initiated the stream.
    Inbound,
    /// The local peer initiated the stream.
    Outbound,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Inbound => write!(f, "inbound"),
            Direction::Outbound => write!(f, "outbound"),
        }
    }
}

/// Configuration for a [`Session`].
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Deadline budget for each outbound frame write.
    pub send_timeout: Duration,
    /// Deadline budget for each inbound frame read in [`Session::send`].
    pub read_timeout: Duration,
    /// Compression algorithm negotiated out-of-band for this stream.
    pub compression: CompressionAlgo,
    /// Whether traffic is recorded in the process-wide counters.
    pub enable_metrics: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            send_timeout: DEFAULT_SEND_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            compression: CompressionAlgo::None,
            enable_metrics: false,
        }
    }
}

impl SessionConfig {
    /// Set the send timeout.
    pub fn send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    /// Set the read timeout.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set the compression algorithm.
    pub fn compression(mut self, algo: CompressionAlgo) -> Self {
        self.compression = algo;
        self
    }

    /// Enable or disable metrics recording.
    pub fn enable_metrics(mut self, enabled: bool) -> Self {
        self.enable_metrics = enabled;
        self
    }
}

/// Snapshot of peer metadata, carried by split halves.
#[derive(Debug, Clone)]
struct PeerInfo {
    peer_id: String,
    addr: String,
    protocol: String,
}

/// One open duplex channel to a remote peer.
///
/// Exclusively owns its stream: only this session (or the halves produced
/// by [`Session::into_split`]) issues reads and writes on it. Terminated by
/// [`Session::close`] (graceful) or [`Session::reset`] (abrupt); both
/// consume the session, so reuse after termination is impossible.
pub struct Session<S: RawStream> {
    stream: S,
    config: SessionConfig,
    direction: Direction,
    metrics: Arc<dyn MetricsSink>,
}

impl<S: RawStream> Session<S> {
    /// Create a session over an open stream.
    pub fn new(stream: S, direction: Direction, config: SessionConfig) -> Self {
        let metrics: Arc<dyn MetricsSink> = if config.enable_metrics {
            Arc::new(GlobalMetrics)
        } else {
            Arc::new(NoopMetrics)
        };
        Self {
            stream,
            config,
            direction,
            metrics,
        }
    }

    /// Create a session with an explicit metrics sink, bypassing the
    /// process-wide counters. The config's `enable_metrics` flag is
    /// ignored in favor of the given sink.
    pub fn with_metrics_sink(
        stream: S,
        direction: Direction,
        config: SessionConfig,
        sink: Arc<dyn MetricsSink>,
    ) -> Self {
        Self {
            stream,
            config,
            direction,
            metrics: sink,
        }
    }

    /// String form of the remote peer's identity.
    pub fn remote_peer_id(&self) -> String {
        self.stream.remote_peer_id()
    }

    /// Remote peer's address.
    pub fn remote_addr(&self) -> String {
        self.stream.remote_addr()
    }

    /// Protocol identifier negotiated for this stream.
    pub fn protocol_id(&self) -> &str {
        self.stream.protocol_id()
    }

    /// Which endpoint initiated the stream.
    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Send one message without waiting for a response.
    ///
    /// Compresses the payload, rejects it if the compressed size exceeds
    /// the frame cap (nothing reaches the wire), then writes the frame
    /// under the session's send timeout. Returns as soon as the frame is
    /// fully written.
    pub async fn async_send(&mut self, msg: Bytes) -> Result<()> {
        self.stream
            .set_write_deadline(Instant::now() + self.config.send_timeout)
            .map_err(WireError::Deadline)?;

        let compressed = compress(msg, self.config.compression)?;
        let wire_len = compressed.len();

        match timeout(
            self.config.send_timeout,
            write_frame(&mut self.stream, &compressed),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => return Err(WireError::WriteTimeout(self.config.send_timeout)),
        }

        self.metrics.record_sent(wire_len as u64);
        tracing::trace!(
            "sent {} byte frame to {} ({})",
            wire_len,
            self.stream.remote_peer_id(),
            self.direction
        );
        Ok(())
    }

    /// Send one message and wait for the single response frame.
    ///
    /// A failure in the send phase is wrapped as [`WireError::SendFailed`]
    /// and the read is never attempted. Assumes exactly one response frame
    /// follows one request frame (no interleaving, no pipelining).
    pub async fn send(&mut self, msg: Bytes) -> Result<Bytes> {
        self.async_send(msg)
            .await
            .map_err(|e| WireError::SendFailed(Box::new(e)))?;

        self.read(self.config.read_timeout).await
    }

    /// Block until one full frame arrives or `timeout` elapses, then
    /// decompress it.
    ///
    /// Expiry surfaces as [`WireError::ReadTimeout`], distinguishable from
    /// [`WireError::PeerClosed`] and [`WireError::MalformedFrame`]; the
    /// stream stays usable for a fresh operation or for close/reset.
    pub async fn read(&mut self, read_timeout: Duration) -> Result<Bytes> {
        let frame = match timeout(read_timeout, read_frame(&mut self.stream)).await {
            Ok(result) => result?,
            Err(_) => return Err(WireError::ReadTimeout(read_timeout)),
        };

        let wire_len = frame.len();
        let payload = decompress(frame, self.config.compression)?;

        self.metrics.record_received(wire_len as u64);
        tracing::trace!(
            "received {} byte frame from {} ({})",
            wire_len,
            self.stream.remote_peer_id(),
            self.direction
        );
        Ok(payload)
    }

    /// Gracefully shut the stream down.
    pub async fn close(mut self) -> Result<()> {
        tracing::debug!(
            "closing {} session to {}",
            self.direction,
            self.stream.remote_peer_id()
        );
        self.stream.shutdown().await?;
        Ok(())
    }

    /// Abruptly tear the stream down, signaling a protocol error to the
    /// peer.
    pub fn reset(mut self) -> Result<()> {
        tracing::warn!(
            "resetting {} session to {}",
            self.direction,
            self.stream.remote_peer_id()
        );
        self.stream.reset()?;
        Ok(())
    }

    /// Split into independent send and read halves so one writer and one
    /// reader can run concurrently on the same session.
    ///
    /// The halves share the session's config and metrics sink and carry a
    /// snapshot of the peer metadata. Kernel-level write deadlines are not
    /// re-armed on a split session; the send timeout still bounds every
    /// write.
    pub fn into_split(self) -> (SendHalf<S>, ReadHalf<S>) {
        let info = PeerInfo {
            peer_id: self.stream.remote_peer_id(),
            addr: self.stream.remote_addr(),
            protocol: self.stream.protocol_id().to_string(),
        };
        let (read, write) = tokio::io::split(self.stream);

        (
            SendHalf {
                writer: write,
                config: self.config.clone(),
                direction: self.direction,
                metrics: self.metrics.clone(),
                info: info.clone(),
            },
            ReadHalf {
                reader: read,
                config: self.config,
                direction: self.direction,
                metrics: self.metrics,
                info,
            },
        )
    }
}

/// Write side of a split [`Session`].
pub struct SendHalf<S: RawStream> {
    writer: tokio::io::WriteHalf<S>,
    config: SessionConfig,
    direction: Direction,
    metrics: Arc<dyn MetricsSink>,
    info: PeerInfo,
}

impl<S: RawStream> SendHalf<S> {
    /// Send one message without waiting for a response.
    ///
    /// Same contract as [`Session::async_send`].
    pub async fn async_send(&mut self, msg: Bytes) -> Result<()> {
        let compressed = compress(msg, self.config.compression)?;
        let wire_len = compressed.len();

        match timeout(
            self.config.send_timeout,
            write_frame(&mut self.writer, &compressed),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => return Err(WireError::WriteTimeout(self.config.send_timeout)),
        }

        self.metrics.record_sent(wire_len as u64);
        tracing::trace!(
            "sent {} byte frame to {} ({})",
            wire_len,
            self.info.peer_id,
            self.direction
        );
        Ok(())
    }

    /// Gracefully shut the write direction down.
    pub async fn close(mut self) -> Result<()> {
        tracing::debug!(
            "closing {} send half to {}",
            self.direction,
            self.info.peer_id
        );
        self.writer.shutdown().await?;
        Ok(())
    }

    /// String form of the remote peer's identity.
    pub fn remote_peer_id(&self) -> &str {
        &self.info.peer_id
    }

    /// Remote peer's address.
    pub fn remote_addr(&self) -> &str {
        &self.info.addr
    }

    /// Protocol identifier negotiated for this stream.
    pub fn protocol_id(&self) -> &str {
        &self.info.protocol
    }
}

/// Read side of a split [`Session`].
pub struct ReadHalf<S: RawStream> {
    reader: tokio::io::ReadHalf<S>,
    config: SessionConfig,
    direction: Direction,
    metrics: Arc<dyn MetricsSink>,
    info: PeerInfo,
}

impl<S: RawStream> ReadHalf<S> {
    /// Block until one full frame arrives or `timeout` elapses.
    ///
    /// Same contract as [`Session::read`].
    pub async fn read(&mut self, read_timeout: Duration) -> Result<Bytes> {
        let frame = match timeout(read_timeout, read_frame(&mut self.reader)).await {
            Ok(result) => result?,
            Err(_) => return Err(WireError::ReadTimeout(read_timeout)),
        };

        let wire_len = frame.len();
        let payload = decompress(frame, self.config.compression)?;

        self.metrics.record_received(wire_len as u64);
        tracing::trace!(
            "received {} byte frame from {} ({})",
            wire_len,
            self.info.peer_id,
            self.direction
        );
        Ok(payload)
    }

    /// String form of the remote peer's identity.
    pub fn remote_peer_id(&self) -> &str {
        &self.info.peer_id
    }

    /// Remote peer's address.
    pub fn remote_addr(&self) -> &str {
        &self.info.addr
    }

    /// Protocol identifier negotiated for this stream.
    pub fn protocol_id(&self) -> &str {
        &self.info.protocol
    }
}
