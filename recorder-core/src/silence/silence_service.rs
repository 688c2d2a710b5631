use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

use super::clock::{Clock, SystemClock};
use crate::models::audio_models::RecordingProgress;
use crate::models::state::{RecordingStatus, StatusChange};
use crate::traits::recording_listener::RecordingListener;

/// Tracks how long the input has stayed at or below a volume threshold.
///
/// Deciding what to do about a long silence (auto-stop, a warning) is up to
/// the caller. Registered as a `RecordingListener`, the service resets when
/// a session starts and follows the engine's progress reports.
pub struct SilenceService {
    clock: Arc<dyn Clock>,
    threshold: AtomicU8,
    last_non_silence: Mutex<Option<Instant>>,
}

impl SilenceService {
    /// `threshold` is a volume percentage; reports strictly above it count
    /// as sound.
    pub fn new(threshold: u8) -> Self {
        Self::with_clock(threshold, Arc::new(SystemClock))
    }

    pub fn with_clock(threshold: u8, clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            threshold: AtomicU8::new(threshold),
            last_non_silence: Mutex::new(None),
        }
    }

    pub fn threshold(&self) -> u8 {
        self.threshold.load(Ordering::Relaxed)
    }

    /// Apply a threshold change from the settings layer.
    pub fn set_threshold(&self, threshold: u8) {
        self.threshold.store(threshold, Ordering::Relaxed);
    }

    /// Record a meter reading; anything above the threshold restarts the
    /// silence timer.
    pub fn report_volume(&self, percent: u8) {
        if percent > self.threshold() {
            *self.last_non_silence.lock() = Some(self.clock.now());
        }
    }

    /// Whole seconds since the last reading above the threshold, or since
    /// the last `reset`. Zero if neither has happened.
    pub fn seconds_of_silence(&self) -> u64 {
        match *self.last_non_silence.lock() {
            Some(since) => self.clock.now().saturating_duration_since(since).as_secs(),
            None => 0,
        }
    }

    /// Measure silence from now on.
    pub fn reset(&self) {
        *self.last_non_silence.lock() = Some(self.clock.now());
    }
}

impl RecordingListener for SilenceService {
    fn on_status_changed(&self, change: &StatusChange) {
        if change.status == RecordingStatus::Recording {
            log::debug!("silence timer reset for new session");
            self.reset();
        }
    }

    fn on_progress(&self, progress: &RecordingProgress) {
        self.report_volume(progress.volume_percent);
    }
}
