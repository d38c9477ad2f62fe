//! Typed control of a miniDSP 2x4HD.
//!
//! [`DeviceClient`] turns operations like "set the master volume" into the
//! device's command frames and parses the responses. It works over any
//! [`Transport`](minidsp_transport::Transport), USB or network.
//!
//! ```no_run
//! # async fn demo() -> minidsp_device::Result<()> {
//! use minidsp_device::{ClientConfig, DeviceClient, Source};
//! use minidsp_transport::{NetConfig, NetTransport};
//!
//! let transport = NetTransport::connect(&NetConfig::default()).await?;
//! let dsp = DeviceClient::new(transport, ClientConfig::default());
//! dsp.set_source(Source::Toslink).await?;
//! dsp.set_volume(-20.0).await?;
//! println!("{:?}", dsp.get_master_status().await?);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod input;
pub mod types;

pub use client::DeviceClient;
pub use config::{ChecksumPolicy, ClientConfig};
pub use error::{DeviceError, Result};
pub use input::{Equalizer, Input};
pub use types::{InputLevels, MasterStatus, Source};
