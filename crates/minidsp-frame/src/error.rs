/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A length byte of zero cannot describe a frame (it must count the checksum).
    #[error("invalid frame length byte {0}")]
    InvalidLength(u8),

    /// The payload does not fit in a single length byte.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The encoded frame does not fit in one HID report.
    #[error("frame too large for a HID report ({size} bytes, max {max})")]
    ReportOverflow { size: usize, max: usize },

    /// A report declared more bytes than it carries.
    #[error("truncated report (length byte {declared}, {available} bytes available)")]
    Truncated { declared: usize, available: usize },

    /// The received checksum does not match the frame contents.
    #[error("checksum mismatch (expected {expected:#04x}, got {actual:#04x})")]
    ChecksumMismatch { expected: u8, actual: u8 },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FrameError>;
