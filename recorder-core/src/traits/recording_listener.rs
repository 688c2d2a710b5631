use std::sync::mpsc::Sender;

use crate::models::audio_models::RecordingProgress;
use crate::models::error::RecorderError;
use crate::models::events::RecordingEvent;
use crate::models::recording_result::RecordingResult;
use crate::models::state::StatusChange;

/// Observer for engine notifications.
///
/// Status changes are delivered from whichever thread made the transition
/// (the caller of `start`/`stop`, or the engine's teardown thread) while the
/// engine's control lock is held, so they arrive in transition order.
/// Implementations must not call `start` or `stop` synchronously from
/// `on_status_changed`, `on_error` or `on_recording_finished`.
///
/// Progress is delivered from the capture thread with no engine lock held.
/// `stop` may be called from `on_progress` (an auto-stop on silence, say);
/// the engine then defers the teardown to its own thread, since the capture
/// stream cannot be stopped from inside its callback. `start` must not be
/// called from `on_progress`.
pub trait RecordingListener: Send + Sync {
    fn on_status_changed(&self, _change: &StatusChange) {}

    fn on_progress(&self, _progress: &RecordingProgress) {}

    fn on_error(&self, _error: &RecorderError) {}

    fn on_recording_finished(&self, _result: &RecordingResult) {}
}

/// Forwards every notification into an mpsc channel.
///
/// Sends to a dropped receiver are ignored.
pub struct ChannelListener {
    sender: Sender<RecordingEvent>,
}

impl ChannelListener {
    pub fn new(sender: Sender<RecordingEvent>) -> Self {
        Self { sender }
    }

    fn send(&self, event: RecordingEvent) {
        let _ = self.sender.send(event);
    }
}

impl RecordingListener for ChannelListener {
    fn on_status_changed(&self, change: &StatusChange) {
        self.send(RecordingEvent::StatusChanged(change.clone()));
    }

    fn on_progress(&self, progress: &RecordingProgress) {
        self.send(RecordingEvent::Progress(*progress));
    }

    fn on_error(&self, error: &RecorderError) {
        self.send(RecordingEvent::Error(error.clone()));
    }

    fn on_recording_finished(&self, result: &RecordingResult) {
        self.send(RecordingEvent::Finished(result.clone()));
    }
}
