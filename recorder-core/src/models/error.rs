use thiserror::Error;

/// Errors raised by the recording engine and its collaborators.
///
/// Setup failures come back synchronously from `start`. Failures during a
/// session are delivered through `RecordingListener::on_error`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecorderError {
    #[error("no capture devices available")]
    NoDevices,

    #[error("device not available: {0}")]
    DeviceUnavailable(String),

    #[error("invalid recording configuration: {0}")]
    InvalidConfig(String),

    #[error("capture failed: {0}")]
    Capture(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl RecorderError {
    /// Whether the error was raised before any audio reached the sink.
    pub fn is_setup_error(&self) -> bool {
        matches!(
            self,
            Self::NoDevices | Self::DeviceUnavailable(_) | Self::InvalidConfig(_)
        )
    }
}
