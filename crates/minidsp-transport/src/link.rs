use std::fmt;
use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use minidsp_frame::{hex, Frame, FrameCodec, FrameError};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio_util::codec::{FramedRead, FramedWrite};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{TransportConfig, UsbConfig};
use crate::error::{Result, TransportError};
use crate::net::NetTransport;
use crate::usb::UsbTransport;

/// The physical or network link a [`Transport`] drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// 64-byte HID reports, one frame per report.
    Usb,
    /// Frames back to back on a TCP stream.
    Net,
}

impl TransportKind {
    pub fn name(self) -> &'static str {
        match self {
            TransportKind::Usb => "usb",
            TransportKind::Net => "net",
        }
    }

    /// List reachable devices for this kind of link.
    pub fn probe(self, config: &UsbConfig) -> Result<Vec<ProbedDevice>> {
        match self {
            TransportKind::Usb => UsbTransport::probe(config),
            TransportKind::Net => NetTransport::probe(),
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A device found by [`TransportKind::probe`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbedDevice {
    pub path: String,
    pub product: Option<String>,
    pub serial: Option<String>,
}

pub(crate) struct WriteRequest {
    pub frame: Frame,
    pub done: oneshot::Sender<Result<()>>,
}

/// Backend half of a transport: what the link task consumes and feeds.
pub(crate) struct LinkParts {
    pub writes: mpsc::Receiver<WriteRequest>,
    pub frames: broadcast::Sender<Frame>,
    pub shutdown: CancellationToken,
}

/// Handle to one open link.
///
/// Clones share the link. Writes from every clone are queued and reach the
/// link one whole frame at a time. Received frames are published to every
/// [`FrameSubscription`].
#[derive(Clone)]
pub struct Transport {
    shared: Arc<Shared>,
}

struct Shared {
    kind: TransportKind,
    writes: mpsc::Sender<WriteRequest>,
    frames: broadcast::Sender<Frame>,
    shutdown: CancellationToken,
}

impl Drop for Shared {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

impl Transport {
    pub(crate) fn new_pair(kind: TransportKind, config: &TransportConfig) -> (Self, LinkParts) {
        let (writes_tx, writes_rx) = mpsc::channel(config.write_queue.max(1));
        let (frames_tx, _) = broadcast::channel(config.frame_buffer.max(1));
        let shutdown = CancellationToken::new();

        let transport = Self {
            shared: Arc::new(Shared {
                kind,
                writes: writes_tx,
                frames: frames_tx.clone(),
                shutdown: shutdown.clone(),
            }),
        };
        let parts = LinkParts {
            writes: writes_rx,
            frames: frames_tx,
            shutdown,
        };
        (transport, parts)
    }

    /// Drive any duplex byte stream with the length-prefixed stream framing.
    ///
    /// Must be called from within a tokio runtime. EOF or an I/O error on
    /// the stream closes the transport.
    pub fn from_stream<S>(kind: TransportKind, stream: S, config: &TransportConfig) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (transport, parts) = Self::new_pair(kind, config);
        let (read_half, write_half) = tokio::io::split(stream);

        tokio::spawn(read_stream(
            FramedRead::new(read_half, FrameCodec::new()),
            parts.frames,
            parts.shutdown.clone(),
        ));
        tokio::spawn(write_stream(
            FramedWrite::new(write_half, FrameCodec::new()),
            parts.writes,
            parts.shutdown,
        ));

        transport
    }

    pub fn kind(&self) -> TransportKind {
        self.shared.kind
    }

    /// Send one frame down the link.
    ///
    /// Resolves once the backend has written the frame, or fails with the
    /// backend's error. Fails with [`TransportError::Closed`] after `close`.
    pub async fn write(&self, frame: &Frame) -> Result<()> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }

        let (done, result) = oneshot::channel();
        let request = WriteRequest {
            frame: frame.clone(),
            done,
        };
        self.shared
            .writes
            .send(request)
            .await
            .map_err(|_| TransportError::Closed)?;
        result.await.map_err(|_| TransportError::Closed)?
    }

    /// Subscribe to frames received from now on.
    pub fn subscribe(&self) -> FrameSubscription {
        FrameSubscription {
            rx: self.shared.frames.subscribe(),
            shutdown: self.shared.shutdown.clone(),
        }
    }

    /// Release the link. Calling this more than once is harmless.
    pub fn close(&self) {
        if !self.shared.shutdown.is_cancelled() {
            debug!(kind = %self.shared.kind, "closing transport");
        }
        self.shared.shutdown.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.shared.shutdown.is_cancelled()
    }

    /// Resolves once the transport is closed, locally or by the link.
    pub async fn closed(&self) {
        self.shared.shutdown.cancelled().await;
    }
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport")
            .field("kind", &self.shared.kind)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// A receiver for frames decoded by a [`Transport`].
pub struct FrameSubscription {
    rx: broadcast::Receiver<Frame>,
    shutdown: CancellationToken,
}

impl FrameSubscription {
    /// Wait for the next frame.
    ///
    /// Frames already received are still delivered after the transport
    /// closes; after that this fails with [`TransportError::Closed`].
    pub async fn recv(&mut self) -> Result<Frame> {
        loop {
            tokio::select! {
                biased;
                received = self.rx.recv() => match received {
                    Ok(frame) => return Ok(frame),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "frame subscriber lagged; frames dropped");
                    }
                    Err(RecvError::Closed) => return Err(TransportError::Closed),
                },
                _ = self.shutdown.cancelled() => return Err(TransportError::Closed),
            }
        }
    }

    /// Discard frames that are already buffered. Returns how many were dropped.
    pub fn drain(&mut self) -> usize {
        let mut dropped = 0usize;
        loop {
            match self.rx.try_recv() {
                Ok(_) => dropped += 1,
                Err(TryRecvError::Lagged(skipped)) => dropped += skipped as usize,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return dropped,
            }
        }
    }
}

async fn read_stream<R>(
    mut frames: FramedRead<R, FrameCodec>,
    subscribers: broadcast::Sender<Frame>,
    shutdown: CancellationToken,
) where
    R: AsyncRead + Unpin,
{
    loop {
        let next = tokio::select! {
            _ = shutdown.cancelled() => break,
            next = frames.next() => next,
        };

        match next {
            Some(Ok(frame)) => {
                debug!(payload = %hex(&frame.payload), "received frame");
                // No subscribers is not an error; the frame is simply unclaimed.
                let _ = subscribers.send(frame);
            }
            Some(Err(FrameError::Io(err))) => {
                warn!(error = %err, "stream read failed");
                break;
            }
            Some(Err(err)) => {
                // Without a resync marker the rest of the stream is unreadable.
                warn!(error = %err, "malformed frame on stream");
                break;
            }
            None => {
                info!("remote end closed the stream");
                break;
            }
        }
    }
    shutdown.cancel();
}

async fn write_stream<W>(
    mut sink: FramedWrite<W, FrameCodec>,
    mut requests: mpsc::Receiver<WriteRequest>,
    shutdown: CancellationToken,
) where
    W: AsyncWrite + Unpin,
{
    loop {
        let request = tokio::select! {
            _ = shutdown.cancelled() => break,
            request = requests.recv() => match request {
                Some(request) => request,
                None => break,
            },
        };

        debug!(payload = %hex(&request.frame.payload), "writing frame");
        let (result, fatal) = match sink.send(request.frame).await {
            Ok(()) => (Ok(()), false),
            Err(FrameError::Io(err)) => {
                warn!(error = %err, "stream write failed");
                (Err(TransportError::Io(err)), true)
            }
            Err(err) => (Err(TransportError::Frame(err)), false),
        };
        let _ = request.done.send(result);
        if fatal {
            break;
        }
    }
    shutdown.cancel();
    let _ = sink.close().await;
}
