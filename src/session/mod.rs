//! Camera session controller
//!
//! [`CameraSession`] owns at most one hardware handle and serializes every
//! intent from the UI (load, configure, focus, capture, record) against the
//! current lifecycle state. Progress is reported on the typed event stream.
//!
//! The session is cheap to clone; clones share the same state. Operations that
//! defer work (`configure`, hardware event forwarding, the recording timer)
//! spawn tokio tasks, so the session must be driven from inside a runtime.

mod boot;
mod capture;
mod configure;
mod lifecycle;
mod recording;

pub use boot::BootConfig;
pub use recording::{DatedVideoFilepath, VideoFilepathGenerator};

use crate::config::CamSessionConfig;
use crate::errors::CameraError;
use crate::events::{CameraEvent, EventBus, EventKind, EventStream};
use crate::orientation::{FixedOrientation, OrientationSource};
use crate::platform::{CameraDevice, CameraHandle};
use crate::storage::{KeyValueStore, MemoryStore, VideoStorage};
use crate::timing::VideoTimer;
use crate::types::{CameraId, CameraMode, Capabilities, FocusState, HardwareConfig, Size};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

/// Derived state of an in-progress recording
#[derive(Debug)]
pub(crate) struct ActiveRecording {
    pub filepath: PathBuf,
    pub timer: VideoTimer,
}

/// `Idle -> Starting -> Recording`; any failure drops back to `Idle`
#[derive(Debug, Default)]
pub(crate) enum RecordingState {
    #[default]
    Idle,
    Starting,
    Recording(ActiveRecording),
}

impl RecordingState {
    pub fn is_recording(&self) -> bool {
        matches!(self, RecordingState::Recording(_))
    }

    pub fn active(&self) -> Option<&ActiveRecording> {
        match self {
            RecordingState::Recording(active) => Some(active),
            _ => None,
        }
    }
}

pub(crate) struct SessionState {
    pub selected_camera: CameraId,
    /// Camera the current handle was acquired for
    pub acquired_camera: Option<CameraId>,
    pub handle: Option<Arc<dyn CameraHandle>>,
    pub capabilities: Option<Capabilities>,
    pub mode: CameraMode,
    pub picture_size: Option<Size>,
    pub recorder_profile: Option<String>,
    pub hardware_config: Option<HardwareConfig>,
    pub max_file_size_bytes: u64,
    pub focus: FocusState,
    pub is_first_load: bool,
    pub is_busy: bool,
    pub configured: bool,
    /// A deferred configure task is queued for the next turn
    pub configure_scheduled: bool,
    /// A configure arrived while busy and must run on the next `ready`
    pub configure_on_ready: bool,
    /// Bumped by every configure request; a completed application only
    /// counts as configured if no newer request arrived meanwhile
    pub config_generation: u64,
    /// Boot settings waiting for the next new camera
    pub pending_boot_config: Option<BootConfig>,
    pub recording: RecordingState,
}

impl SessionState {
    fn new(max_file_size_bytes: u64) -> Self {
        Self {
            selected_camera: CameraId::default(),
            acquired_camera: None,
            handle: None,
            capabilities: None,
            mode: CameraMode::default(),
            picture_size: None,
            recorder_profile: None,
            hardware_config: None,
            max_file_size_bytes,
            focus: FocusState::None,
            is_first_load: true,
            is_busy: false,
            configured: false,
            configure_scheduled: false,
            configure_on_ready: false,
            config_generation: 0,
            pending_boot_config: None,
            recording: RecordingState::Idle,
        }
    }
}

pub(crate) struct Inner {
    device: Arc<dyn CameraDevice>,
    store: Arc<dyn KeyValueStore>,
    video_storage: Arc<dyn VideoStorage>,
    orientation: Arc<dyn OrientationSource>,
    config: CamSessionConfig,
    events: EventBus,
    releasing: watch::Sender<bool>,
    /// Held for the whole of an acquisition so only one `get_camera` runs
    acquiring: tokio::sync::Mutex<()>,
    filepath_generator: Mutex<Arc<dyn VideoFilepathGenerator>>,
    state: Mutex<SessionState>,
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Builder for [`CameraSession`]; everything but the device and the video
/// storage has a default.
pub struct SessionBuilder {
    device: Arc<dyn CameraDevice>,
    video_storage: Arc<dyn VideoStorage>,
    store: Option<Arc<dyn KeyValueStore>>,
    orientation: Option<Arc<dyn OrientationSource>>,
    filepath_generator: Option<Arc<dyn VideoFilepathGenerator>>,
    config: CamSessionConfig,
}

impl SessionBuilder {
    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn orientation(mut self, orientation: Arc<dyn OrientationSource>) -> Self {
        self.orientation = Some(orientation);
        self
    }

    pub fn filepath_generator(mut self, generator: Arc<dyn VideoFilepathGenerator>) -> Self {
        self.filepath_generator = Some(generator);
        self
    }

    pub fn config(mut self, config: CamSessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn cache_config(mut self, enabled: bool) -> Self {
        self.config.session.cache_config = enabled;
        self
    }

    pub fn record_space(mut self, min: u64, padding: u64) -> Self {
        self.config.video.record_space_min = min;
        self.config.video.record_space_padding = padding;
        self
    }

    pub fn build(self) -> CameraSession {
        let filepath_generator = self
            .filepath_generator
            .unwrap_or_else(|| Arc::new(DatedVideoFilepath::from_settings(&self.config.video)));
        let (releasing, _) = watch::channel(false);

        CameraSession {
            inner: Arc::new(Inner {
                device: self.device,
                store: self.store.unwrap_or_else(|| Arc::new(MemoryStore::new())),
                video_storage: self.video_storage,
                orientation: self
                    .orientation
                    .unwrap_or_else(|| Arc::new(FixedOrientation::default())),
                events: EventBus::new(),
                releasing,
                acquiring: tokio::sync::Mutex::new(()),
                filepath_generator: Mutex::new(filepath_generator),
                state: Mutex::new(SessionState::new(self.config.video.max_file_size_bytes)),
                config: self.config,
            }),
        }
    }
}

#[derive(Clone)]
pub struct CameraSession {
    inner: Arc<Inner>,
}

impl CameraSession {
    pub fn builder(
        device: Arc<dyn CameraDevice>,
        video_storage: Arc<dyn VideoStorage>,
    ) -> SessionBuilder {
        SessionBuilder {
            device,
            video_storage,
            store: None,
            orientation: None,
            filepath_generator: None,
            config: CamSessionConfig::default(),
        }
    }

    pub fn subscribe(&self) -> EventStream {
        self.inner.events.subscribe()
    }

    pub fn subscribe_to(&self, kinds: &[EventKind]) -> EventStream {
        self.inner.events.subscribe_to(kinds)
    }

    pub fn config(&self) -> &CamSessionConfig {
        &self.inner.config
    }

    pub fn available_cameras(&self) -> Vec<CameraId> {
        self.inner.device.list_cameras()
    }

    pub fn selected_camera(&self) -> CameraId {
        self.inner.state().selected_camera
    }

    /// Point the session at another camera; takes effect on the next `load()`
    pub fn select_camera(&self, camera: CameraId) {
        let mut state = self.inner.state();
        if state.selected_camera != camera {
            log::info!("Selected camera {} -> {}", state.selected_camera, camera);
            state.selected_camera = camera;
        }
    }

    pub fn toggle_camera(&self) -> CameraId {
        let next = self.selected_camera().toggled();
        self.select_camera(next);
        next
    }

    pub fn mode(&self) -> CameraMode {
        self.inner.state().mode
    }

    pub fn is_busy(&self) -> bool {
        self.inner.state().is_busy
    }

    pub fn is_configured(&self) -> bool {
        self.inner.state().configured
    }

    pub fn is_releasing(&self) -> bool {
        *self.inner.releasing.borrow()
    }

    pub fn is_recording(&self) -> bool {
        self.inner.state().recording.is_recording()
    }

    pub fn is_first_load(&self) -> bool {
        self.inner.state().is_first_load
    }

    pub fn has_camera(&self) -> bool {
        self.inner.state().handle.is_some()
    }

    /// Current focus state.
    ///
    /// Fixed-focus hardware never leaves `Focusing` after a `focus()` call;
    /// the next capture resets it to `None`. Check
    /// [`CameraHandle::focus_mode`] before showing progress for it.
    pub fn focus_state(&self) -> FocusState {
        self.inner.state().focus
    }

    pub fn picture_size(&self) -> Option<Size> {
        self.inner.state().picture_size
    }

    pub fn recorder_profile(&self) -> Option<String> {
        self.inner.state().recorder_profile.clone()
    }

    pub fn hardware_config(&self) -> Option<HardwareConfig> {
        self.inner.state().hardware_config.clone()
    }

    pub fn capabilities(&self) -> Option<Capabilities> {
        self.inner.state().capabilities.clone()
    }

    pub fn max_file_size_bytes(&self) -> u64 {
        self.inner.state().max_file_size_bytes
    }

    /// Explicit recording cap; 0 falls back to free space minus padding
    pub fn set_max_file_size_bytes(&self, bytes: u64) {
        self.inner.state().max_file_size_bytes = bytes;
    }

    pub fn recording_filepath(&self) -> Option<PathBuf> {
        self.inner
            .state()
            .recording
            .active()
            .map(|r| r.filepath.clone())
    }

    /// Map the hardware's preview state onto busy/ready.
    ///
    /// `stopped` and `paused` mean busy; any other value, recognized or not,
    /// means ready.
    pub fn on_preview_state_change(&self, state: &str) {
        log::debug!("preview state: {}", state);
        match state {
            "stopped" | "paused" => self.busy(),
            _ => self.ready(),
        }
    }

    pub(crate) fn busy(&self) {
        self.inner.state().is_busy = true;
        self.inner.events.emit(CameraEvent::Busy);
    }

    pub(crate) fn ready(&self) {
        let run_deferred = {
            let mut state = self.inner.state();
            state.is_busy = false;
            std::mem::take(&mut state.configure_on_ready)
        };
        self.inner.events.emit(CameraEvent::Ready);
        if run_deferred {
            log::debug!("running configure deferred until ready");
            self.configure();
        }
    }

    pub(crate) fn set_focus(&self, focus: FocusState) {
        self.inner.state().focus = focus;
        self.inner.events.emit(CameraEvent::FocusChange(focus));
    }

    pub(crate) fn current_handle(&self) -> Result<Arc<dyn CameraHandle>, CameraError> {
        self.inner.state().handle.clone().ok_or(CameraError::NoCamera)
    }

    pub(crate) fn emit(&self, event: CameraEvent) {
        self.inner.events.emit(event);
    }
}

impl std::fmt::Debug for CameraSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state();
        f.debug_struct("CameraSession")
            .field("selected_camera", &state.selected_camera)
            .field("mode", &state.mode)
            .field("has_camera", &state.handle.is_some())
            .field("is_busy", &state.is_busy)
            .field("configured", &state.configured)
            .field("recording", &state.recording.is_recording())
            .finish()
    }
}
