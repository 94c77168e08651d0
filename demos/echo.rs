//! In-memory echo exchange over two peerwire sessions.
//!
//! Run with: `cargo run --example echo`

use std::time::Duration;

use bytes::Bytes;
use peerwire::stream::MemoryStream;
use peerwire::{CompressionAlgo, Direction, Session, SessionConfig};

#[tokio::main]
async fn main() -> peerwire::Result<()> {
    let (local, remote) = MemoryStream::pair(64 * 1024, "/peerwire/echo/1.0.0");

    let config = SessionConfig::default()
        .send_timeout(Duration::from_secs(2))
        .read_timeout(Duration::from_secs(2))
        .compression(CompressionAlgo::Zlib)
        .enable_metrics(true);

    let mut client = Session::new(local, Direction::Outbound, config.clone());
    let mut server = Session::new(remote, Direction::Inbound, config);

    let echo = tokio::spawn(async move {
        loop {
            match server.read(Duration::from_secs(2)).await {
                Ok(msg) => {
                    println!(
                        "server: {} bytes from {}",
                        msg.len(),
                        server.remote_peer_id()
                    );
                    server.async_send(msg).await?;
                }
                Err(peerwire::WireError::PeerClosed) => break,
                Err(e) => return Err(e),
            }
        }
        server.close().await
    });

    println!(
        "client: connected to {} ({})",
        client.remote_peer_id(),
        client.protocol_id()
    );

    for line in ["hello", "echo echo echo", "goodbye"] {
        let response = client.send(Bytes::from_static(line.as_bytes())).await?;
        println!("client: got back {:?}", String::from_utf8_lossy(&response));
        assert_eq!(&response[..], line.as_bytes());
    }

    client.close().await?;
    echo.await.expect("echo task panicked")?;

    println!(
        "totals: {} bytes sent, {} bytes received (compressed)",
        peerwire::metrics::sent_bytes(),
        peerwire::metrics::received_bytes()
    );
    Ok(())
}
