use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Recording state machine.
///
/// ```text
/// NotRecording → Recording → StopRequested → NotRecording
///                    └────────── write failure ──────┘
/// ```
///
/// `Unknown` only appears when a persisted or foreign value cannot be
/// mapped. The engine never enters it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordingStatus {
    NotRecording,
    StopRequested,
    Recording,
    #[serde(other)]
    Unknown,
}

impl RecordingStatus {
    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording)
    }

    /// True while the engine holds a capture stream and a sink.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Recording | Self::StopRequested)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::NotRecording => "not_recording",
            Self::StopRequested => "stop_requested",
            Self::Recording => "recording",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RecordingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Payload of a status-change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub status: RecordingStatus,
    pub temp_path: Option<PathBuf>,
    pub final_path: Option<PathBuf>,
}

impl StatusChange {
    pub fn new(status: RecordingStatus) -> Self {
        Self {
            status,
            temp_path: None,
            final_path: None,
        }
    }

    pub fn with_paths(status: RecordingStatus, temp_path: PathBuf, final_path: PathBuf) -> Self {
        Self {
            status,
            temp_path: Some(temp_path),
            final_path: Some(final_path),
        }
    }
}
