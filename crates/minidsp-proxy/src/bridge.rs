use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use minidsp_frame::{hex, FrameCodec};
use minidsp_transport::{FrameSubscription, Result, Transport, TransportError, DEFAULT_PORT};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::{FramedRead, FramedWrite};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

/// Proxy listener settings.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub bind: SocketAddr,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
        }
    }
}

/// Republishes one transport to any number of TCP clients.
///
/// Clients speak the bare frame format. Their frames are written to the
/// transport as received, and every frame the transport emits is sent to
/// every client. There is no arbitration between clients.
pub struct ProxyBridge {
    listener: TcpListener,
    transport: Transport,
    connections: Arc<AtomicUsize>,
    next_client_id: AtomicU64,
}

impl ProxyBridge {
    /// Bind the listening socket.
    pub async fn bind(transport: Transport, config: &ProxyConfig) -> Result<Self> {
        let listener =
            TcpListener::bind(config.bind)
                .await
                .map_err(|source| TransportError::Bind {
                    addr: config.bind.to_string(),
                    source,
                })?;
        Ok(Self {
            listener,
            transport,
            connections: Arc::new(AtomicUsize::new(0)),
            next_client_id: AtomicU64::new(1),
        })
    }

    /// Bound address; useful when binding port 0.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Clients currently connected.
    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::Acquire)
    }

    /// Accept clients until `shutdown` fires or the transport closes.
    ///
    /// Open client connections are ended before this returns.
    pub async fn run(&self, shutdown: CancellationToken) -> Result<()> {
        let addr = self.local_addr()?;
        info!(%addr, kind = %self.transport.kind(), "proxy listening");

        let clients = shutdown.child_token();
        let tracker = TaskTracker::new();
        loop {
            let accepted = tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!("proxy shutting down");
                    break;
                }
                _ = self.transport.closed() => {
                    warn!("device transport closed; stopping proxy");
                    break;
                }
                accepted = self.listener.accept() => accepted,
            };

            match accepted {
                Ok((stream, peer)) => {
                    let id = self.next_client_id.fetch_add(1, Ordering::Relaxed);
                    let guard = ConnectionGuard::enter(self.connections.clone());
                    // Subscribed before the client can send its first command.
                    let frames = self.transport.subscribe();
                    tracker.spawn(serve_client(
                        stream,
                        peer,
                        id,
                        self.transport.clone(),
                        frames,
                        clients.clone(),
                        guard,
                    ));
                }
                // Usually descriptor exhaustion; the listener itself is fine.
                Err(err) => warn!(error = %TransportError::Accept(err), "accept failed"),
            }
        }

        clients.cancel();
        tracker.close();
        tracker.wait().await;
        Ok(())
    }
}

struct ConnectionGuard(Arc<AtomicUsize>);

impl ConnectionGuard {
    fn enter(count: Arc<AtomicUsize>) -> Self {
        count.fetch_add(1, Ordering::AcqRel);
        Self(count)
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

async fn serve_client(
    stream: TcpStream,
    peer: SocketAddr,
    id: u64,
    transport: Transport,
    mut frames: FrameSubscription,
    stop: CancellationToken,
    _guard: ConnectionGuard,
) {
    if let Err(err) = stream.set_nodelay(true) {
        debug!(client = id, error = %err, "could not disable nagle");
    }
    info!(client = id, %peer, "client connected");

    let (read_half, write_half) = stream.into_split();
    let mut inbound = FramedRead::new(read_half, FrameCodec::new());
    let mut outbound = FramedWrite::new(write_half, FrameCodec::new());

    loop {
        tokio::select! {
            _ = stop.cancelled() => break,
            next = inbound.next() => match next {
                Some(Ok(frame)) => {
                    debug!(client = id, payload = %hex(&frame.payload), "forwarding to device");
                    if let Err(err) = transport.write(&frame).await {
                        warn!(client = id, error = %err, "device write failed");
                        break;
                    }
                }
                Some(Err(err)) => {
                    warn!(client = id, error = %err, "dropping client");
                    break;
                }
                None => break,
            },
            received = frames.recv() => match received {
                Ok(frame) => {
                    if let Err(err) = outbound.send(frame).await {
                        debug!(client = id, error = %err, "client write failed");
                        break;
                    }
                }
                Err(_) => break,
            },
        }
    }

    info!(client = id, %peer, "client disconnected");
}
