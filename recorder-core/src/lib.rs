//! # recorder-core
//!
//! Capture-to-file recording engine.
//!
//! Drives one recording session at a time: opens a capture stream, writes
//! every delivered PCM buffer to a file sink, publishes volume levels while
//! recording, and fades the signal out on request before stopping. Device
//! backends implement `CaptureProvider`; storage backends implement
//! `SinkFactory`. A WAV sink with a JSON sidecar is included.
//!
//! ## Architecture
//!
//! ```text
//! recorder-core (this crate)
//! ├── traits/       ← CaptureProvider, CaptureStream, SinkFactory, FileSink, RecordingListener
//! ├── models/       ← RecorderError, RecordingStatus, RecordingConfig, RecordingEvent, etc.
//! ├── processing/   ← VolumeFader, SampleAggregator, PCM helpers, WAV header generation
//! ├── session/      ← RecordingEngine (state machine and buffer pipeline)
//! ├── silence/      ← SilenceService, Clock
//! └── storage/      ← WavFileSink, metadata sidecar
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod silence;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::audio_models::{AudioDevice, RecordingProgress, SessionDiagnostics};
pub use models::config::{EngineOptions, PcmFormat, RecordingConfig, TrackTags};
pub use models::error::RecorderError;
pub use models::events::RecordingEvent;
pub use models::recording_result::{RecordingMetadata, RecordingResult};
pub use models::state::{RecordingStatus, StatusChange};
pub use processing::sample_aggregator::{LevelReport, SampleAggregator};
pub use processing::volume_fader::{FadeOutcome, VolumeFader};
pub use session::recording_engine::RecordingEngine;
pub use silence::clock::{Clock, ManualClock, SystemClock};
pub use silence::silence_service::SilenceService;
pub use storage::wav_sink::{WavFileSink, WavSinkFactory};
pub use traits::capture_provider::{AudioBufferCallback, CaptureProvider, CaptureStream};
pub use traits::file_sink::{FileSink, SinkFactory, SinkRequest, SinkSummary};
pub use traits::recording_listener::{ChannelListener, RecordingListener};
