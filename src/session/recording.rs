//! Video recording
//!
//! States: idle -> starting -> recording | error. A recording only starts
//! once focus has resolved and the video storage has at least
//! `record_space_min` bytes free.

use super::{ActiveRecording, CameraSession, RecordingState};
use crate::config::VideoSettings;
use crate::errors::CameraError;
use crate::events::CameraEvent;
use crate::timing::{VideoTimer, VIDEO_TICK};
use crate::types::{CameraId, RecordingOptions};
use std::path::PathBuf;
use std::sync::{Arc, PoisonError};

/// Produces the path a new recording is written to
pub trait VideoFilepathGenerator: Send + Sync {
    fn create_video_filepath(&self) -> PathBuf;
}

impl<F> VideoFilepathGenerator for F
where
    F: Fn() -> PathBuf + Send + Sync,
{
    fn create_video_filepath(&self) -> PathBuf {
        self()
    }
}

/// `<directory>/<prefix><local timestamp>.<extension>`
#[derive(Debug, Clone)]
pub struct DatedVideoFilepath {
    directory: PathBuf,
    prefix: String,
    extension: String,
}

impl DatedVideoFilepath {
    pub fn new(
        directory: impl Into<PathBuf>,
        prefix: impl Into<String>,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            directory: directory.into(),
            prefix: prefix.into(),
            extension: extension.into(),
        }
    }

    pub fn from_settings(settings: &VideoSettings) -> Self {
        Self::new(&settings.directory, &settings.file_prefix, &settings.extension)
    }
}

impl VideoFilepathGenerator for DatedVideoFilepath {
    fn create_video_filepath(&self) -> PathBuf {
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S_%3f");
        self.directory
            .join(format!("{}{}.{}", self.prefix, stamp, self.extension))
    }
}

impl CameraSession {
    /// Replace the path generation step used by `start_recording`
    pub fn set_video_filepath_generator(&self, generator: Arc<dyn VideoFilepathGenerator>) {
        *self
            .inner
            .filepath_generator
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = generator;
    }

    pub fn create_video_filepath(&self) -> PathBuf {
        let generator = self
            .inner
            .filepath_generator
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        generator.create_video_filepath()
    }

    /// Start recording to a freshly generated path.
    ///
    /// The size cap is the explicit `max_file_size_bytes` when non-zero,
    /// otherwise free space minus `record_space_padding`. The rotation is the
    /// orientation reading, negated for the front camera. Orientation updates
    /// stay stopped until the recording ends.
    pub async fn start_recording(&self) -> Result<(), CameraError> {
        let handle = self.current_handle()?;
        {
            let mut state = self.inner.state();
            if !matches!(state.recording, RecordingState::Idle) {
                log::debug!("start_recording ignored: already starting or recording");
                return Ok(());
            }
            state.recording = RecordingState::Starting;
        }
        self.busy();

        if let Err(e) = self.focus().await {
            log::debug!("focus before recording failed: {}", e);
        }

        let video = &self.inner.config.video;
        let free = match self.inner.video_storage.free_space().await {
            Ok(free) => free,
            Err(e) => return Err(self.on_recording_error(CameraError::StorageError(e.to_string()))),
        };
        if free < video.record_space_min {
            log::warn!(
                "Not enough space to record: {} free, {} required",
                free,
                video.record_space_min
            );
            return Err(self.on_recording_error(CameraError::InsufficientStorage {
                free,
                required: video.record_space_min,
            }));
        }

        let filepath = self.create_video_filepath();
        let (max_file_size_bytes, front) = {
            let state = self.inner.state();
            let cap = match state.max_file_size_bytes {
                0 => free.saturating_sub(video.record_space_padding),
                cap => cap,
            };
            (cap, state.selected_camera == CameraId::Front)
        };
        let reading = self.inner.orientation.get();
        let options = RecordingOptions {
            rotation: if front { -reading } else { reading },
            max_file_size_bytes,
        };

        // Lock orientation for the length of the recording.
        self.inner.orientation.stop();

        log::info!("Starting recording to {:?} ({:?})", filepath, options);
        let started = handle
            .start_recording(&options, self.inner.video_storage.clone(), &filepath)
            .await;

        match started {
            Ok(()) => {
                let timer = VideoTimer::start(self.inner.events.clone(), VIDEO_TICK);
                self.inner.state().recording =
                    RecordingState::Recording(ActiveRecording { filepath, timer });
                self.emit(CameraEvent::RecordingChange(true));
                self.ready();
                Ok(())
            }
            Err(e) => Err(self.on_recording_error(CameraError::RecordingError(e))),
        }
    }

    /// Stop the active recording and announce the new video.
    ///
    /// No-op when nothing is recording.
    pub async fn stop_recording(&self) -> Result<(), CameraError> {
        let (handle, recording) = {
            let mut state = self.inner.state();
            let recording = match std::mem::take(&mut state.recording) {
                RecordingState::Recording(recording) => recording,
                other => {
                    state.recording = other;
                    return Ok(());
                }
            };
            (state.handle.clone(), recording)
        };

        let duration = recording.timer.stop();
        self.emit(CameraEvent::RecordingChange(false));
        self.inner.orientation.start();

        let result = match handle {
            Some(handle) => handle
                .stop_recording()
                .await
                .map_err(CameraError::RecordingError),
            None => Err(CameraError::NoCamera),
        };

        match &result {
            Ok(()) => {
                log::info!("Recording stopped after {:.1}s", duration.as_secs_f64());
                self.emit(CameraEvent::NewVideo {
                    filepath: recording.filepath,
                    duration,
                });
            }
            Err(e) => {
                log::warn!("Failed to stop recording: {}", e);
                self.emit(CameraEvent::RecordingError(e.clone()));
            }
        }
        self.ready();
        result
    }

    /// Common failure path for recording: clears the recording state,
    /// unlocks orientation, emits `RecordingError` then `Ready`, and hands
    /// the error back for the caller to return.
    pub fn on_recording_error(&self, error: CameraError) -> CameraError {
        log::error!("Recording error: {}", error);
        let was_recording = std::mem::take(&mut self.inner.state().recording).is_recording();
        if was_recording {
            self.emit(CameraEvent::RecordingChange(false));
        }
        self.inner.orientation.start();
        self.emit(CameraEvent::RecordingError(error.clone()));
        self.ready();
        error
    }

    /// Recorder messages pushed by the hardware
    pub async fn on_recorder_state_change(&self, message: &str) {
        log::debug!("recorder state: {}", message);
        if message == "FileSizeLimitReached" {
            if let Err(e) = self.stop_recording().await {
                log::warn!("Failed to stop recording at size limit: {}", e);
            }
            self.emit(CameraEvent::FileSizeLimitReached);
        }
    }
}
