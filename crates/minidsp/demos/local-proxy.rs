//! Share a USB-attached device on the network.
//!
//! Run with:
//!   cargo run --example local-proxy --features usb
//!
//! Then point a client at port 5333, e.g.
//!   cargo run --features cli -- --transport net --opt host=127.0.0.1 status

use minidsp::proxy::{ProxyBridge, ProxyConfig};
use minidsp::transport::{UsbConfig, UsbTransport};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let transport = UsbTransport::open(&UsbConfig::default())?;
    let bridge = ProxyBridge::bind(transport, &ProxyConfig::default()).await?;
    eprintln!("Listening on {}", bridge.local_addr()?);

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            let _ = tokio::signal::ctrl_c().await;
            shutdown.cancel();
        }
    });

    bridge.run(shutdown).await?;
    Ok(())
}
