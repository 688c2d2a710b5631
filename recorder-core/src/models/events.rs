use super::audio_models::RecordingProgress;
use super::error::RecorderError;
use super::recording_result::RecordingResult;
use super::state::StatusChange;

/// Every notification the engine publishes, as a single value.
///
/// Produced by `ChannelListener` for callers that poll rather than
/// implement `RecordingListener`.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordingEvent {
    StatusChanged(StatusChange),
    Progress(RecordingProgress),
    Error(RecorderError),
    Finished(RecordingResult),
}

impl RecordingEvent {
    pub fn status(&self) -> Option<&StatusChange> {
        match self {
            Self::StatusChanged(change) => Some(change),
            _ => None,
        }
    }

    pub fn progress(&self) -> Option<&RecordingProgress> {
        match self {
            Self::Progress(progress) => Some(progress),
            _ => None,
        }
    }
}
