use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::config::TrackTags;
use crate::traits::file_sink::{SinkRequest, SinkSummary};

/// Outcome of a session whose sink closed cleanly.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingResult {
    pub session_id: Uuid,
    pub temp_path: PathBuf,
    pub final_path: PathBuf,
    pub bytes_written: u64,
    pub duration_secs: f64,
    pub checksum: String,
    pub tags: TrackTags,
}

/// JSON sidecar stored next to a finished recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingMetadata {
    pub id: String,
    pub duration_secs: f64,
    pub file_path: String,
    pub final_path: String,
    pub checksum: String,
    pub sample_rate: u32,
    pub channels: u16,
    pub created_at: String,
    pub tags: TrackTags,
}

impl RecordingMetadata {
    /// Metadata for the file described by `request` once `summary` is known.
    pub fn for_sink(request: &SinkRequest, summary: &SinkSummary) -> Self {
        Self {
            id: request.session_id.to_string(),
            duration_secs: request.format.duration_of(summary.bytes_written),
            file_path: request.path.to_string_lossy().into_owned(),
            final_path: request.final_path.to_string_lossy().into_owned(),
            checksum: summary.checksum.clone(),
            sample_rate: request.format.sample_rate,
            channels: request.format.channels,
            created_at: chrono::Utc::now().to_rfc3339(),
            tags: request.tags.clone(),
        }
    }
}
