//! Network access to a locally attached miniDSP.
//!
//! [`ProxyBridge`] listens on TCP (port 5333 by default) and relays bare
//! frames between each client and one shared device transport, so a remote
//! `DeviceClient` over the net transport drives the hardware unchanged.

pub mod bridge;

pub use bridge::{ProxyBridge, ProxyConfig};
