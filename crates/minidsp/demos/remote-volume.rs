//! Drive a device through a proxy on another machine.
//!
//! Run with:
//!   cargo run --example remote-volume -- 192.168.1.20 -20
//!
//! The host must be running `minidsp proxy`.

use minidsp::device::{ClientConfig, DeviceClient};
use minidsp::transport::{NetConfig, NetTransport};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let host = args.next().unwrap_or_else(|| "127.0.0.1".to_string());
    let volume: f32 = match args.next() {
        Some(value) => value.parse()?,
        None => -30.0,
    };

    let config = NetConfig {
        host,
        ..NetConfig::default()
    };
    let transport = NetTransport::connect(&config).await?;
    let dsp = DeviceClient::new(transport, ClientConfig::default());

    let before = dsp.get_master_status().await?;
    eprintln!("before: {:.1} dB, muted={}", before.volume_db, before.muted);

    dsp.set_volume(volume).await?;

    let after = dsp.get_master_status().await?;
    eprintln!("after: {:.1} dB, muted={}", after.volume_db, after.muted);

    dsp.close();
    Ok(())
}
