//! One-to-many transport: the publisher binds a TCP listener and fans out
//! length-prefixed ciphertext frames to every connected subscriber.
//!
//! Grounded on `EventBroadcaster` (`platform/broadcaster.rs`), generalized
//! from an in-process fan-out to a per-connection network fan-out, with
//! framing modeled on the length-prefixed wire format used by the
//! kvm-over-ip reference protocol.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

use crate::platform::broadcaster::{EventBroadcaster, SubscriptionId};

/// Maximum ciphertext frame size accepted from the wire. RSA-2048-OAEP
/// output is 256 bytes; this leaves generous headroom without admitting an
/// unbounded allocation from a malformed length prefix.
pub const MAX_FRAME_LEN: u32 = 64 * 1024;

/// Publisher side: accepts subscriber connections and broadcasts every
/// encrypted frame handed to it to all of them.
pub struct PublisherTransport {
    broadcaster: Arc<EventBroadcaster<Vec<u8>>>,
    accept_loop: JoinHandle<()>,
}

impl PublisherTransport {
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("binding transport listener on {addr}"))?;
        let broadcaster: Arc<EventBroadcaster<Vec<u8>>> = Arc::new(EventBroadcaster::new());

        let accept_broadcaster = Arc::clone(&broadcaster);
        let accept_loop = tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, peer)) => {
                        let bc = Arc::clone(&accept_broadcaster);
                        tokio::spawn(serve_subscriber(stream, peer, bc));
                    }
                    Err(e) => log::warn!("accepting subscriber connection failed: {e}"),
                }
            }
        });

        Ok(Self {
            broadcaster,
            accept_loop,
        })
    }

    /// Sends one encrypted frame to every currently connected subscriber.
    pub fn broadcast(&self, ciphertext: Vec<u8>) {
        self.broadcaster.broadcast(ciphertext);
    }

    pub fn subscriber_count(&self) -> usize {
        self.broadcaster.subscriber_count()
    }
}

impl Drop for PublisherTransport {
    fn drop(&mut self) {
        self.accept_loop.abort();
    }
}

async fn serve_subscriber(
    mut stream: TcpStream,
    peer: SocketAddr,
    broadcaster: Arc<EventBroadcaster<Vec<u8>>>,
) {
    log::info!("subscriber connected: {peer}");
    let (id, mut rx): (SubscriptionId, UnboundedReceiver<Vec<u8>>) = broadcaster.subscribe();

    while let Some(frame) = rx.recv().await {
        if let Err(e) = write_frame(&mut stream, &frame).await {
            log::info!("subscriber {peer} disconnected: {e}");
            break;
        }
    }

    broadcaster.unsubscribe(id);
}

async fn write_frame(stream: &mut TcpStream, frame: &[u8]) -> Result<()> {
    let len = frame.len() as u32;
    stream.write_all(&len.to_be_bytes()).await?;
    stream.write_all(frame).await?;
    Ok(())
}

/// Subscriber side: a single blocking connection to the publisher. Kept
/// synchronous (plain `std::net`) since a subscriber only ever talks to one
/// publisher at a time — no fan-out, no tokio runtime required.
pub struct SubscriberTransport {
    stream: std::net::TcpStream,
}

impl SubscriberTransport {
    pub fn connect(addr: SocketAddr) -> Result<Self> {
        let stream = std::net::TcpStream::connect(addr)
            .with_context(|| format!("connecting to publisher at {addr}"))?;
        Ok(Self { stream })
    }

    /// Blocks until one full ciphertext frame has arrived.
    pub fn recv_frame(&mut self) -> Result<Vec<u8>> {
        use std::io::Read;

        let mut len_bytes = [0u8; 4];
        self.stream
            .read_exact(&mut len_bytes)
            .context("reading frame length")?;
        let len = u32::from_be_bytes(len_bytes);
        anyhow::ensure!(len <= MAX_FRAME_LEN, "frame length {len} exceeds maximum");

        let mut buf = vec![0u8; len as usize];
        self.stream
            .read_exact(&mut buf)
            .context("reading frame body")?;
        Ok(buf)
    }
}
