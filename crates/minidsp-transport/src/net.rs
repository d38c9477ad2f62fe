use tokio::net::TcpStream;
use tracing::{debug, info};

use crate::config::NetConfig;
use crate::error::{Result, TransportError};
use crate::link::{ProbedDevice, Transport, TransportKind};

/// TCP transport: frames back to back on a raw byte stream.
///
/// The usual peer is a proxy republishing a USB-attached device.
pub struct NetTransport;

impl NetTransport {
    /// Connect to `host:port` and start the stream framing tasks.
    pub async fn connect(config: &NetConfig) -> Result<Transport> {
        let addr = config.addr();
        debug!(%addr, "connecting");
        let stream = TcpStream::connect(&addr)
            .await
            .map_err(|source| TransportError::Connect {
                addr: addr.clone(),
                source,
            })?;
        stream.set_nodelay(true)?;
        info!(%addr, "connected to remote device");

        Ok(Transport::from_stream(
            TransportKind::Net,
            stream,
            &config.transport,
        ))
    }

    /// Remote devices cannot be enumerated.
    pub fn probe() -> Result<Vec<ProbedDevice>> {
        Err(TransportError::Unsupported(
            "probing is not supported by the net transport",
        ))
    }
}
