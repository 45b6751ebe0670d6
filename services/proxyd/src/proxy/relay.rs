//! Bidirectional byte relay between two established TCP streams.

use std::io;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, warn};

/// Buffer size for each relay direction.
const RELAY_BUF_SIZE: usize = 8192;

/// Copy bytes in both directions until both sides finish.
///
/// Each direction runs until its source reaches end-of-stream, then
/// half-closes the destination so the peer sees a clean EOF. The two
/// directions are independent: an error in one never cuts the other
/// short, and the call returns only after both have completed.
///
/// Returns (bytes_to_upstream, bytes_from_upstream).
pub async fn relay_bidirectional(client: &mut TcpStream, upstream: &mut TcpStream) -> (u64, u64) {
    let (mut client_read, mut client_write) = client.split();
    let (mut upstream_read, mut upstream_write) = upstream.split();

    let client_to_upstream = async {
        let mut total = 0u64;
        let mut buf = vec![0u8; RELAY_BUF_SIZE];
        loop {
            match client_read.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => {
                    upstream_write.write_all(&buf[..n]).await?;
                    total += n as u64;
                }
                Err(e) => return Err(e),
            }
        }
        upstream_write.shutdown().await?;
        Ok(total)
    };

    let upstream_to_client = async {
        let mut total = 0u64;
        let mut buf = vec![0u8; RELAY_BUF_SIZE];
        loop {
            match upstream_read.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => {
                    client_write.write_all(&buf[..n]).await?;
                    total += n as u64;
                }
                Err(e) => return Err(e),
            }
        }
        client_write.shutdown().await?;
        Ok(total)
    };

    let (up_result, down_result) = tokio::join!(client_to_upstream, upstream_to_client);

    // A direction that errored still relayed bytes; only the count is lost
    let bytes_to_upstream = finish_direction("client->upstream", up_result);
    let bytes_from_upstream = finish_direction("upstream->client", down_result);

    (bytes_to_upstream, bytes_from_upstream)
}

fn finish_direction(direction: &'static str, result: io::Result<u64>) -> u64 {
    match result {
        Ok(n) => n,
        Err(e) if is_graceful_close(&e) => {
            debug!(direction = direction, error = %e, "Stream closed by peer");
            0
        }
        Err(e) => {
            warn!(direction = direction, error = %e, "Relay direction failed");
            0
        }
    }
}

/// True when the error only signals that the peer or the opposite relay
/// leg already tore the stream down.
fn is_graceful_close(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::NotConnected
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    async fn socket_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let connect = tokio::spawn(async move { TcpStream::connect(addr).await.unwrap() });
        let (accepted, _) = listener.accept().await.unwrap();
        (connect.await.unwrap(), accepted)
    }

    #[tokio::test]
    async fn test_relay_round_trip() {
        let (mut client, proxy_client_side) = socket_pair().await;
        let (proxy_upstream_side, mut upstream) = socket_pair().await;

        let relay = tokio::spawn(async move {
            let mut a = proxy_client_side;
            let mut b = proxy_upstream_side;
            relay_bidirectional(&mut a, &mut b).await
        });

        client.write_all(b"ping").await.unwrap();
        let mut buf = [0u8; 4];
        upstream.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"ping");

        upstream.write_all(b"pong").await.unwrap();
        client.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"pong");

        // Upstream finishes first; the client should see a clean EOF.
        upstream.shutdown().await.unwrap();
        let mut byte = [0u8; 1];
        let n = client.read(&mut byte).await.unwrap();
        assert_eq!(n, 0, "expected EOF after upstream shutdown");

        // Client side closes, letting the remaining direction drain.
        drop(client);

        let (to_upstream, from_upstream) = relay.await.unwrap();
        assert_eq!(to_upstream, 4);
        assert_eq!(from_upstream, 4);
    }

    #[tokio::test]
    async fn test_relay_bulk_transfer_crosses_buffer_size() {
        let (mut client, proxy_client_side) = socket_pair().await;
        let (proxy_upstream_side, mut upstream) = socket_pair().await;

        let relay = tokio::spawn(async move {
            let mut a = proxy_client_side;
            let mut b = proxy_upstream_side;
            relay_bidirectional(&mut a, &mut b).await
        });

        let payload: Vec<u8> = (0..100_000).map(|i| (i % 251) as u8).collect();

        let writer = {
            let payload = payload.clone();
            tokio::spawn(async move {
                client.write_all(&payload).await.unwrap();
                client.shutdown().await.unwrap();
                client
            })
        };

        let mut received = vec![0u8; payload.len()];
        upstream.read_exact(&mut received).await.unwrap();
        assert_eq!(received, payload);

        // Relay half-closed towards upstream after the client EOF.
        let mut byte = [0u8; 1];
        let n = upstream.read(&mut byte).await.unwrap();
        assert_eq!(n, 0);

        drop(upstream);
        let _client = writer.await.unwrap();

        let (to_upstream, from_upstream) = relay.await.unwrap();
        assert_eq!(to_upstream, payload.len() as u64);
        assert_eq!(from_upstream, 0);
    }
}
