//! # peerwire
//!
//! Message framing and transport hardening over a raw peer-to-peer byte
//! stream.
//!
//! An external transport library owns connection establishment, peer
//! discovery, multiplexing and stream lifecycle; it hands this crate one
//! already-open, ordered, reliable duplex stream (the [`stream::RawStream`]
//! contract). peerwire turns that stream into a request/response and
//! one-way messaging channel with:
//!
//! - **Framing**: varint length-prefixed frames with a hard 4 MiB cap,
//!   enforced identically on both ends ([`framing`])
//! - **Compression**: optional zlib payload compression, applied before
//!   framing ([`compression`])
//! - **Deadlines**: every blocking send and read is bounded by an explicit
//!   timeout ([`session`])
//! - **Observability**: process-wide sent/received byte counters
//!   ([`metrics`])
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use peerwire::{Direction, Session, SessionConfig};
//! use peerwire::stream::MemoryStream;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> peerwire::Result<()> {
//!     let (local, remote) = MemoryStream::pair(4096, "/app/echo/1.0.0");
//!     let mut alice = Session::new(local, Direction::Outbound, SessionConfig::default());
//!     let mut bob = Session::new(remote, Direction::Inbound, SessionConfig::default());
//!
//!     alice.async_send(Bytes::from_static(b"ping")).await?;
//!     let msg = bob.read(std::time::Duration::from_secs(1)).await?;
//!     assert_eq!(&msg[..], b"ping");
//!     Ok(())
//! }
//! ```

pub mod compression;
pub mod error;
pub mod framing;
pub mod metrics;
pub mod session;
pub mod stream;

pub use compression::CompressionAlgo;
pub use error::{Result, WireError};
pub use framing::MAX_MESSAGE_SIZE;
pub use session::{Direction, ReadHalf, SendHalf, Session, SessionConfig};
