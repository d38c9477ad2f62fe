use std::time::Duration;

/// What to do with a response whose checksum does not match its bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChecksumPolicy {
    /// Reject the response with a protocol error.
    #[default]
    Verify,
    /// Accept the response as is.
    Ignore,
}

/// Configuration for a [`DeviceClient`](crate::DeviceClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// How long to wait for the response to each command. `None` waits
    /// until the transport closes.
    pub request_timeout: Option<Duration>,
    /// Requests that may wait behind the one in flight.
    pub queue_depth: usize,
    pub checksum: ChecksumPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Some(Duration::from_secs(2)),
            queue_depth: 32,
            checksum: ChecksumPolicy::Verify,
        }
    }
}
