//! Links that carry miniDSP frames.
//!
//! Two backends share one [`Transport`] handle:
//! - [`UsbTransport`]: the device itself, over 64-byte HID reports
//! - [`NetTransport`]: a TCP stream, usually to a proxy fronting the device
//!
//! Both serialize writes through a single queue and publish every decoded
//! frame to all subscribers.

pub mod config;
pub mod error;
pub mod link;
pub mod net;
pub mod usb;

pub use config::{
    NetConfig, TransportConfig, UsbConfig, DEFAULT_PORT, USB_PRODUCT_ID, USB_VENDOR_ID,
};
pub use error::{Result, TransportError};
pub use link::{FrameSubscription, ProbedDevice, Transport, TransportKind};
pub use net::NetTransport;
pub use usb::{HidLink, UsbTransport};
