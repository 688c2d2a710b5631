use std::path::PathBuf;

use uuid::Uuid;

use crate::models::config::{PcmFormat, TrackTags};
use crate::models::error::RecorderError;

/// Everything a sink needs to open its output for one session.
#[derive(Debug, Clone, PartialEq)]
pub struct SinkRequest {
    pub session_id: Uuid,
    /// File the sink writes to.
    pub path: PathBuf,
    /// Where the caller will move the finished file; informational.
    pub final_path: PathBuf,
    pub format: PcmFormat,
    pub tags: TrackTags,
}

/// Returned by `FileSink::close`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkSummary {
    /// PCM payload bytes accepted by `write` (container overhead excluded).
    pub bytes_written: u64,
    /// Integrity digest of the finished file; empty if the sink has none.
    pub checksum: String,
}

/// Opens file writers. Container and codec choices live behind this trait.
pub trait SinkFactory: Send + Sync {
    fn open_sink(&self, request: &SinkRequest) -> Result<Box<dyn FileSink>, RecorderError>;
}

/// A writer for one recording.
pub trait FileSink: Send {
    /// Append PCM bytes.
    fn write(&mut self, data: &[u8]) -> Result<(), RecorderError>;

    /// Finalize the file. The engine calls this exactly once per sink.
    fn close(&mut self) -> Result<SinkSummary, RecorderError>;
}
