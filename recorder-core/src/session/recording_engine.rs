use std::cell::Cell;
use std::sync::{Arc, Weak};
use std::thread;

use parking_lot::{Mutex, RwLock};
use uuid::Uuid;

use crate::models::audio_models::{AudioDevice, RecordingProgress, SessionDiagnostics};
use crate::models::config::{EngineOptions, RecordingConfig};
use crate::models::error::RecorderError;
use crate::models::recording_result::RecordingResult;
use crate::models::state::{RecordingStatus, StatusChange};
use crate::processing::pcm;
use crate::processing::sample_aggregator::SampleAggregator;
use crate::processing::volume_fader::{FadeOutcome, VolumeFader};
use crate::traits::capture_provider::{AudioBufferCallback, CaptureProvider, CaptureStream};
use crate::traits::file_sink::{FileSink, SinkFactory, SinkRequest, SinkSummary};
use crate::traits::recording_listener::RecordingListener;

thread_local! {
    /// Set while a buffer callback is publishing progress on this thread.
    static IN_CAPTURE_CALLBACK: Cell<bool> = const { Cell::new(false) };
}

/// Marks the current thread as the capture thread until dropped.
struct CaptureCallbackScope;

impl CaptureCallbackScope {
    fn enter() -> Self {
        IN_CAPTURE_CALLBACK.with(|flag| flag.set(true));
        CaptureCallbackScope
    }
}

impl Drop for CaptureCallbackScope {
    fn drop(&mut self) {
        IN_CAPTURE_CALLBACK.with(|flag| flag.set(false));
    }
}

fn on_capture_thread() -> bool {
    IN_CAPTURE_CALLBACK.with(Cell::get)
}

/// State shared with the capture callback, behind `Shared::session`.
struct SessionState {
    status: RecordingStatus,
    /// Bumped on every `start`; callbacks from older streams are ignored.
    generation: u64,
    session_id: Option<Uuid>,
    config: Option<Arc<RecordingConfig>>,
    sink: Option<Box<dyn FileSink>>,
    fader: Option<VolumeFader>,
    aggregator: Option<SampleAggregator>,
    /// Write failure waiting for the teardown thread.
    fault: Option<RecorderError>,
    teardown_scheduled: bool,
    diagnostics: SessionDiagnostics,
}

impl SessionState {
    fn new() -> Self {
        Self {
            status: RecordingStatus::NotRecording,
            generation: 0,
            session_id: None,
            config: None,
            sink: None,
            fader: None,
            aggregator: None,
            fault: None,
            teardown_scheduled: false,
            diagnostics: SessionDiagnostics::default(),
        }
    }

    /// Whether a delivered buffer should reach the sink.
    ///
    /// After `stop(false)`, after the fade completes and after a write
    /// failure, buffers are dropped.
    fn accepts_audio(&self) -> bool {
        if self.fault.is_some() || self.sink.is_none() {
            return false;
        }
        match self.status {
            RecordingStatus::Recording => true,
            RecordingStatus::StopRequested => self.fader.as_ref().is_some_and(|f| f.is_active()),
            _ => false,
        }
    }

    fn status_change(&self) -> StatusChange {
        match &self.config {
            Some(config) => StatusChange::with_paths(
                self.status,
                config.temp_file_path.clone(),
                config.final_file_path.clone(),
            ),
            None => StatusChange::new(self.status),
        }
    }

    /// Drop per-session processing state once the session has ended.
    fn clear(&mut self) {
        self.fader = None;
        self.aggregator = None;
        self.teardown_scheduled = false;
    }
}

/// Owned by whoever is making a transition, behind `Shared::control`.
struct ControlState {
    stream: Option<Box<dyn CaptureStream>>,
}

struct Shared {
    control: Mutex<ControlState>,
    session: Mutex<SessionState>,
    listeners: RwLock<Vec<Arc<dyn RecordingListener>>>,
}

/// Controls one recording session at a time.
///
/// ```text
/// [CaptureStream] → callback → [VolumeFader] → [FileSink]
///                                   └→ [SampleAggregator] → progress
/// ```
///
/// `start` and `stop` may be called from any thread. Buffers are processed
/// synchronously on the capture thread. Two locks guard the engine:
/// `control` serializes transitions and owns the capture stream, `session`
/// is shared with the callback. Lock order is always control → session.
pub struct RecordingEngine<P: CaptureProvider, F: SinkFactory> {
    provider: P,
    sinks: F,
    options: EngineOptions,
    shared: Arc<Shared>,
}

impl<P: CaptureProvider, F: SinkFactory> RecordingEngine<P, F> {
    pub fn new(provider: P, sinks: F, options: EngineOptions) -> Self {
        Self {
            provider,
            sinks,
            options,
            shared: Arc::new(Shared {
                control: Mutex::new(ControlState { stream: None }),
                session: Mutex::new(SessionState::new()),
                listeners: RwLock::new(Vec::new()),
            }),
        }
    }

    pub fn add_listener(&self, listener: Arc<dyn RecordingListener>) {
        self.shared.listeners.write().push(listener);
    }

    pub fn status(&self) -> RecordingStatus {
        self.shared.session.lock().status
    }

    pub fn diagnostics(&self) -> SessionDiagnostics {
        self.shared.session.lock().diagnostics.clone()
    }

    /// Configuration of the current (or most recent) session.
    pub fn current_config(&self) -> Option<Arc<RecordingConfig>> {
        self.shared.session.lock().config.clone()
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn devices(&self) -> Vec<AudioDevice> {
        self.provider.devices()
    }

    /// Begin a session. Ignored unless the engine is `NotRecording`.
    ///
    /// Any setup failure releases what was acquired and leaves the engine
    /// `NotRecording` without emitting an event.
    pub fn start(&self, config: RecordingConfig) -> Result<(), RecorderError> {
        let mut control = self.shared.control.lock();

        let generation = {
            let s = self.shared.session.lock();
            if s.status != RecordingStatus::NotRecording {
                log::debug!("start ignored while {}", s.status);
                return Ok(());
            }
            s.generation + 1
        };

        config.validate()?;
        let config = Arc::new(config);
        let format = config.pcm_format();

        let mut stream = self.provider.open(config.device(), &format).map_err(|e| {
            if e.is_setup_error() {
                log::warn!("capture device unavailable: {}", e);
            } else {
                log::error!("failed to open capture device: {}", e);
            }
            e
        })?;

        let session_id = Uuid::new_v4();
        let request = SinkRequest {
            session_id,
            path: config.temp_file_path.clone(),
            final_path: config.final_file_path.clone(),
            format,
            tags: config.tags(),
        };
        let sink = match self.sinks.open_sink(&request) {
            Ok(sink) => sink,
            Err(e) => {
                log::warn!("failed to open sink at {}: {}", request.path.display(), e);
                release_stream(stream.as_mut());
                return Err(e);
            }
        };

        let change = {
            let mut s = self.shared.session.lock();
            s.generation = generation;
            s.session_id = Some(session_id);
            s.config = Some(Arc::clone(&config));
            s.sink = Some(sink);
            s.fader = Some(VolumeFader::new(config.sample_rate, self.options.fade_duration));
            s.aggregator = Some(SampleAggregator::new(
                config.sample_rate.saturating_mul(config.channels as u32),
                self.options.reporting_interval_ms,
            ));
            s.fault = None;
            s.teardown_scheduled = false;
            s.diagnostics = SessionDiagnostics::default();
            s.status = RecordingStatus::Recording;
            s.status_change()
        };

        let callback = Shared::buffer_callback(&self.shared, generation);
        if let Err(e) = stream.start(callback) {
            log::error!("failed to start capture: {}", e);
            let sink = {
                let mut s = self.shared.session.lock();
                s.status = RecordingStatus::NotRecording;
                s.clear();
                s.sink.take()
            };
            if let Some(mut sink) = sink {
                if let Err(close_err) = sink.close() {
                    log::warn!("failed to close sink after aborted start: {}", close_err);
                }
            }
            release_stream(stream.as_mut());
            return Err(e);
        }
        control.stream = Some(stream);

        log::info!(
            "recording started: session {} at {} Hz x{} → {}",
            session_id,
            config.sample_rate,
            config.channels,
            config.temp_file_path.display()
        );
        self.shared.emit_status(&change);
        Ok(())
    }

    /// End the session. Ignored unless the engine is `Recording`.
    ///
    /// Without a fade, capture stops before this returns. With a fade, the
    /// engine stays `StopRequested` while buffers are faded out, then tears
    /// the session down on its own; listeners see `NotRecording` when done.
    ///
    /// Called from `RecordingListener::on_progress`, i.e. on the capture
    /// thread, the stream cannot be stopped in place. The teardown is handed
    /// to the teardown thread instead, and the call returns `Ok(())` at once.
    pub fn stop(&self, fade_out: bool) -> Result<(), RecorderError> {
        let from_capture = on_capture_thread();
        let mut control = if from_capture {
            // Another transition may be joining this very thread.
            match self.shared.control.try_lock() {
                Some(control) => control,
                None => {
                    log::debug!("stop from capture thread skipped; transition in progress");
                    return Ok(());
                }
            }
        } else {
            self.shared.control.lock()
        };

        let (change, generation) = {
            let mut s = self.shared.session.lock();
            if !s.status.is_recording() {
                log::debug!("stop ignored while {}", s.status);
                return Ok(());
            }
            s.status = RecordingStatus::StopRequested;
            if fade_out {
                if let Some(fader) = s.fader.as_mut() {
                    fader.start();
                }
            } else if from_capture {
                s.teardown_scheduled = true;
            }
            (s.status_change(), s.generation)
        };

        log::info!("stop requested (fade out: {})", fade_out);
        self.shared.emit_status(&change);

        if fade_out {
            return Ok(());
        }
        if from_capture {
            drop(control);
            self.shared.schedule_teardown(generation);
            return Ok(());
        }
        self.shared.finish(&mut control)
    }
}

impl<P: CaptureProvider, F: SinkFactory> Drop for RecordingEngine<P, F> {
    fn drop(&mut self) {
        let mut control = self.shared.control.lock();
        if self.shared.session.lock().status.is_active() {
            log::warn!("recording engine dropped mid-session; stopping capture");
            let _ = self.shared.finish(&mut control);
        }
    }
}

impl Shared {
    fn buffer_callback(this: &Arc<Self>, generation: u64) -> AudioBufferCallback {
        let weak: Weak<Self> = Arc::downgrade(this);
        Arc::new(move |buffer: &mut [u8]| {
            if let Some(shared) = weak.upgrade() {
                shared.on_buffer(generation, buffer);
            }
        })
    }

    /// Per-buffer pipeline: fade, write, aggregate, then publish progress
    /// with the session lock released.
    fn on_buffer(self: &Arc<Self>, generation: u64, buffer: &mut [u8]) {
        let mut progress = Vec::new();
        let mut teardown = false;

        {
            let mut guard = self.session.lock();
            let s = &mut *guard;
            if s.generation != generation {
                return;
            }
            s.diagnostics.buffers_received += 1;
            if !s.accepts_audio() {
                s.diagnostics.buffers_dropped += 1;
                return;
            }

            let fade_complete = match s.fader.as_mut() {
                Some(fader) => fader.fade_buffer(buffer) == FadeOutcome::Completed,
                None => false,
            };

            if let Some(sink) = s.sink.as_mut() {
                match sink.write(buffer) {
                    Ok(()) => {
                        s.diagnostics.buffers_written += 1;
                        s.diagnostics.bytes_written += buffer.len() as u64;
                    }
                    Err(e) => {
                        log::error!("failed to write audio data: {}", e);
                        s.fault = Some(e);
                        teardown = true;
                    }
                }
            }

            if s.fault.is_none() {
                if let Some(aggregator) = s.aggregator.as_mut() {
                    for sample in pcm::normalized_samples(buffer) {
                        if let Some(report) = aggregator.add(sample) {
                            progress.push(RecordingProgress::from_levels(report.min, report.max));
                        }
                    }
                }
                s.diagnostics.reports_emitted += progress.len() as u64;
            }

            if fade_complete {
                log::debug!("fade-out finished; scheduling teardown");
                teardown = true;
            }
            if teardown {
                teardown = !s.teardown_scheduled;
                s.teardown_scheduled = true;
            }
        }

        if !progress.is_empty() {
            let _scope = CaptureCallbackScope::enter();
            for update in &progress {
                self.emit_progress(update);
            }
        }
        if teardown {
            self.schedule_teardown(generation);
        }
    }

    /// Finish the session off the capture thread, since stopping the stream
    /// may join it.
    fn schedule_teardown(self: &Arc<Self>, generation: u64) {
        let shared = Arc::clone(self);
        let spawned = thread::Builder::new()
            .name("recording-teardown".into())
            .spawn(move || {
                let mut control = shared.control.lock();
                let current = {
                    let s = shared.session.lock();
                    s.generation == generation && s.status.is_active()
                };
                if current {
                    let _ = shared.finish(&mut control);
                }
            });
        if let Err(e) = spawned {
            log::error!("failed to spawn teardown thread: {}", e);
        }
    }

    /// Release the stream and sink and return to `NotRecording`.
    ///
    /// Caller holds the control lock. Safe to call when nothing is active.
    fn finish(&self, control: &mut ControlState) -> Result<(), RecorderError> {
        if let Some(mut stream) = control.stream.take() {
            release_stream(stream.as_mut());
        }

        let (sink, fault, change, session_id, config) = {
            let mut s = self.session.lock();
            if !s.status.is_active() {
                return Ok(());
            }
            s.status = RecordingStatus::NotRecording;
            s.clear();
            (
                s.sink.take(),
                s.fault.take(),
                s.status_change(),
                s.session_id,
                s.config.clone(),
            )
        };

        let closed: Option<Result<SinkSummary, RecorderError>> = sink.map(|mut sink| sink.close());
        let outcome = match (fault, closed) {
            (Some(fault), closed) => {
                if let Some(Err(e)) = closed {
                    log::warn!("failed to close sink after write failure: {}", e);
                }
                Err(fault)
            }
            (None, Some(closed)) => closed.map(Some),
            (None, None) => Ok(None),
        };

        match outcome {
            Ok(summary) => {
                log::info!("recording stopped");
                self.emit_status(&change);
                if let (Some(summary), Some(session_id), Some(config)) = (summary, session_id, config) {
                    let result = RecordingResult {
                        session_id,
                        temp_path: config.temp_file_path.clone(),
                        final_path: config.final_file_path.clone(),
                        bytes_written: summary.bytes_written,
                        duration_secs: config.pcm_format().duration_of(summary.bytes_written),
                        checksum: summary.checksum,
                        tags: config.tags(),
                    };
                    self.emit_finished(&result);
                }
                Ok(())
            }
            Err(e) => {
                log::error!("recording ended with error: {}", e);
                self.emit_error(&e);
                self.emit_status(&change);
                Err(e)
            }
        }
    }

    fn snapshot_listeners(&self) -> Vec<Arc<dyn RecordingListener>> {
        self.listeners.read().clone()
    }

    fn emit_status(&self, change: &StatusChange) {
        for listener in self.snapshot_listeners() {
            listener.on_status_changed(change);
        }
    }

    fn emit_progress(&self, progress: &RecordingProgress) {
        for listener in self.snapshot_listeners() {
            listener.on_progress(progress);
        }
    }

    fn emit_error(&self, error: &RecorderError) {
        for listener in self.snapshot_listeners() {
            listener.on_error(error);
        }
    }

    fn emit_finished(&self, result: &RecordingResult) {
        for listener in self.snapshot_listeners() {
            listener.on_recording_finished(result);
        }
    }
}

fn release_stream(stream: &mut dyn CaptureStream) {
    if let Err(e) = stream.stop() {
        log::warn!("capture stream did not stop cleanly: {}", e);
    }
}
