use std::time::Duration;

/// Vendor id of the miniDSP 2x4 HD.
pub const USB_VENDOR_ID: u16 = 0x2752;

/// Product id of the miniDSP 2x4 HD.
pub const USB_PRODUCT_ID: u16 = 0x0011;

/// TCP port the proxy listens on and the net transport connects to.
pub const DEFAULT_PORT: u16 = 5333;

/// Settings shared by every transport backend.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Writes queued ahead of the link before `write` waits.
    pub write_queue: usize,
    /// Frames buffered per subscriber before the oldest are dropped.
    pub frame_buffer: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            write_queue: 32,
            frame_buffer: 64,
        }
    }
}

/// USB HID backend settings.
#[derive(Debug, Clone)]
pub struct UsbConfig {
    pub vendor_id: u16,
    pub product_id: u16,
    /// Platform device path; takes precedence over the ids when set.
    pub path: Option<String>,
    /// How long a report read blocks before queued writes are serviced.
    pub poll_interval: Duration,
    pub transport: TransportConfig,
}

impl Default for UsbConfig {
    fn default() -> Self {
        Self {
            vendor_id: USB_VENDOR_ID,
            product_id: USB_PRODUCT_ID,
            path: None,
            poll_interval: Duration::from_millis(10),
            transport: TransportConfig::default(),
        }
    }
}

/// TCP backend settings.
#[derive(Debug, Clone)]
pub struct NetConfig {
    pub host: String,
    pub port: u16,
    pub transport: TransportConfig,
}

impl NetConfig {
    /// `host:port` as passed to the resolver.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            transport: TransportConfig::default(),
        }
    }
}
