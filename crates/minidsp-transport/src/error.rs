/// Errors that can occur in transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to connect to the specified address.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        source: std::io::Error,
    },

    /// Failed to bind to the specified address.
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    /// Failed to accept an incoming connection.
    #[error("failed to accept connection: {0}")]
    Accept(std::io::Error),

    /// No HID device matched the requested identifiers.
    #[error("device not found: VID={vid:04X} PID={pid:04X}")]
    DeviceNotFound { vid: u16, pid: u16 },

    /// The HID layer refused to open or enumerate.
    #[error("HID error: {0}")]
    Hid(String),

    /// An I/O error occurred on the link.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A frame could not be encoded for, or decoded from, the link.
    #[error("transport frame error: {0}")]
    Frame(#[from] minidsp_frame::FrameError),

    /// The operation is not available on this transport.
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    /// The transport has been closed or the link dropped.
    #[error("transport closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, TransportError>;
