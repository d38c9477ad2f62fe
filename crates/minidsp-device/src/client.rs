use bytes::Bytes;
use minidsp_frame::{hex, Frame};
use minidsp_transport::{FrameSubscription, Transport};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::commands;
use crate::config::{ChecksumPolicy, ClientConfig};
use crate::error::{DeviceError, Result};
use crate::input::Input;
use crate::types::{InputLevels, MasterStatus, Source};

struct Request {
    frame: Frame,
    reply: oneshot::Sender<Result<Frame>>,
}

/// Typed commands against one device.
///
/// The device answers each command with exactly one frame and has no
/// request ids, so the client runs one request at a time: a worker task
/// takes requests in the order they were submitted, writes the command and
/// pairs it with the next frame the transport delivers. Clones share the
/// worker and its queue.
#[derive(Clone)]
pub struct DeviceClient {
    transport: Transport,
    requests: mpsc::Sender<Request>,
}

impl DeviceClient {
    /// Start a client on `transport`. Must be called from within a tokio
    /// runtime.
    pub fn new(transport: Transport, config: ClientConfig) -> Self {
        let (requests, queue) = mpsc::channel(config.queue_depth.max(1));
        // Subscribe before any request so nothing is missed between them.
        let frames = transport.subscribe();
        tokio::spawn(run_worker(transport.clone(), frames, queue, config));
        Self {
            transport,
            requests,
        }
    }

    /// The transport this client talks through.
    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Close the underlying transport. Pending and later requests fail.
    pub fn close(&self) {
        self.transport.close();
    }

    /// Send a raw command and return the response payload, opcode first.
    pub async fn send_command(&self, opcode: u8, operands: &[u8]) -> Result<Bytes> {
        let response = self.send_frame(Frame::command(opcode, operands)).await?;
        Ok(response.payload)
    }

    /// Send a prepared frame and return the response frame.
    pub async fn send_frame(&self, frame: Frame) -> Result<Frame> {
        let (reply, response) = oneshot::channel();
        self.requests
            .send(Request { frame, reply })
            .await
            .map_err(|_| DeviceError::Closed)?;
        response.await.map_err(|_| DeviceError::Closed)?
    }

    pub async fn get_master_status(&self) -> Result<MasterStatus> {
        let response = self.send_frame(commands::read_master_status()).await?;
        commands::parse_master_status(&response.payload)
    }

    pub async fn get_volume(&self) -> Result<f32> {
        Ok(self.get_master_status().await?.volume_db)
    }

    pub async fn get_mute(&self) -> Result<bool> {
        Ok(self.get_master_status().await?.muted)
    }

    /// Set the master volume in dB, from -127 up to 0.
    pub async fn set_volume(&self, db: f32) -> Result<()> {
        let frame = commands::set_volume(db)?;
        self.send_frame(frame).await?;
        Ok(())
    }

    pub async fn set_mute(&self, muted: bool) -> Result<()> {
        self.send_frame(commands::set_mute(muted)).await?;
        Ok(())
    }

    pub async fn set_source(&self, source: Source) -> Result<()> {
        self.send_frame(commands::set_source(source)).await?;
        Ok(())
    }

    pub async fn get_source(&self) -> Result<Source> {
        let response = self.send_frame(commands::read_source()).await?;
        commands::parse_source(&response.payload)
    }

    /// Load configuration preset `index` (0 to 3).
    ///
    /// Sends four commands, each awaiting its response before the next is
    /// written. The first failure stops the sequence.
    pub async fn set_config(&self, index: u8) -> Result<()> {
        let steps = commands::set_config(index)?;
        info!(index, "loading configuration preset");
        for (step, frame) in steps.into_iter().enumerate() {
            self.send_frame(frame).await.inspect_err(|err| {
                warn!(index, step, error = %err, "configuration load aborted");
            })?;
        }
        Ok(())
    }

    pub async fn get_input_levels(&self) -> Result<InputLevels> {
        let response = self.send_frame(commands::read_input_levels()).await?;
        commands::parse_input_levels(&response.payload)
    }

    /// Handle to input channel 1 or 2.
    pub fn get_input(&self, index: u8) -> Result<Input> {
        commands::input_register(index)?;
        Ok(Input::new(self.clone(), index))
    }
}

impl std::fmt::Debug for DeviceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceClient")
            .field("transport", &self.transport)
            .finish()
    }
}

async fn run_worker(
    transport: Transport,
    mut frames: FrameSubscription,
    mut queue: mpsc::Receiver<Request>,
    config: ClientConfig,
) {
    while let Some(request) = queue.recv().await {
        let result = exchange(&transport, &mut frames, &request.frame, &config).await;
        if let Err(err) = &result {
            debug!(payload = %hex(&request.frame.payload), error = %err, "request failed");
        }
        // The caller may have given up; the exchange still completed.
        let _ = request.reply.send(result);
    }
    debug!("device client worker stopped");
}

async fn exchange(
    transport: &Transport,
    frames: &mut FrameSubscription,
    frame: &Frame,
    config: &ClientConfig,
) -> Result<Frame> {
    let stale = frames.drain();
    if stale > 0 {
        debug!(stale, "discarding unsolicited frames");
    }

    transport.write(frame).await?;

    let response = match config.request_timeout {
        Some(limit) => tokio::time::timeout(limit, frames.recv())
            .await
            .map_err(|_| DeviceError::Timeout(limit))??,
        None => frames.recv().await?,
    };

    if config.checksum == ChecksumPolicy::Verify {
        response.verify()?;
    }
    Ok(response)
}
