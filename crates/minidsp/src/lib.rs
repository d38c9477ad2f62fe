//! Control a miniDSP 2x4HD over USB HID or the network.
//!
//! # Crate Structure
//!
//! - [`frame`]: the length-prefixed, checksummed wire frame
//! - [`transport`]: USB HID and TCP links behind one `Transport` handle
//! - [`device`]: typed commands with one request in flight at a time
//! - [`proxy`]: a TCP server sharing one device with many network clients
//!
//! USB access needs the `usb` feature (hidapi). Without it the network
//! transport still works against a proxy on another machine.

/// Re-export frame types.
pub mod frame {
    pub use minidsp_frame::*;
}

/// Re-export transport types.
pub mod transport {
    pub use minidsp_transport::*;
}

/// Re-export device client types.
pub mod device {
    pub use minidsp_device::*;
}

/// Re-export proxy types.
pub mod proxy {
    pub use minidsp_proxy::*;
}
