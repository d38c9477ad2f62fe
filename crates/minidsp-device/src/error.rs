/// Errors that can occur in device operations.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// An argument is outside what the device accepts. Nothing was sent.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The device answered with something the command does not expect.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] minidsp_transport::TransportError),

    /// No response arrived in time.
    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The request worker has stopped.
    #[error("device client closed")]
    Closed,
}

impl From<minidsp_frame::FrameError> for DeviceError {
    fn from(err: minidsp_frame::FrameError) -> Self {
        match err {
            minidsp_frame::FrameError::Io(io) => DeviceError::Transport(io.into()),
            other => DeviceError::Protocol(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, DeviceError>;
