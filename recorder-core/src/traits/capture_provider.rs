use std::sync::Arc;

use crate::models::audio_models::AudioDevice;
use crate::models::config::PcmFormat;
use crate::models::error::RecorderError;

/// Callback invoked for every captured buffer.
///
/// The slice holds exactly the bytes recorded (interleaved 16-bit
/// little-endian PCM). It is mutable so the engine can fade it in place
/// before writing.
pub type AudioBufferCallback = Arc<dyn Fn(&mut [u8]) + Send + Sync + 'static>;

/// Source of capture streams (a sound-card API, a test double, ...).
pub trait CaptureProvider: Send + Sync {
    /// Devices that can currently be opened.
    fn devices(&self) -> Vec<AudioDevice>;

    /// Open a capture stream on `device_id` (`None` = default device).
    ///
    /// Returns `RecorderError::NoDevices` when nothing can be captured from.
    fn open(
        &self,
        device_id: Option<&str>,
        format: &PcmFormat,
    ) -> Result<Box<dyn CaptureStream>, RecorderError>;
}

/// An opened capture stream.
pub trait CaptureStream: Send {
    /// Begin delivering buffers to `callback`.
    ///
    /// The callback fires on a thread owned by the stream, in capture order,
    /// one invocation at a time.
    fn start(&mut self, callback: AudioBufferCallback) -> Result<(), RecorderError>;

    /// Stop delivery and release the device. Once this returns the callback
    /// is not invoked again. Must be safe to call more than once.
    fn stop(&mut self) -> Result<(), RecorderError>;
}
