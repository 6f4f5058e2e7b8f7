//! Configuration pipeline
//!
//! `configure()` is the only path that pushes `{mode, previewSize,
//! recorderProfile}` to the hardware. Requests are debounced through a single
//! `configure_scheduled` slot: every request in the same scheduling turn lands
//! on one spawned task, which reads the state as it is when it runs.

use super::{CameraSession, SessionState};
use crate::errors::CameraError;
use crate::events::CameraEvent;
use crate::platform::CameraHandle;
use crate::sizing::{optimal_preview_size, thumbnail_size_for};
use crate::types::{CameraMode, Capabilities, HardwareConfig, HdrMode, SetOptions, Size};

impl CameraSession {
    /// Request that the current settings be applied to the hardware.
    ///
    /// No-op without a handle. Otherwise marks the session unconfigured and
    /// schedules one application for the next turn; while the session is
    /// busy the application waits for the next `ready`.
    pub fn configure(&self) {
        let schedule = {
            let mut state = self.inner.state();
            if state.handle.is_none() {
                log::debug!("configure ignored: no camera");
                return;
            }
            state.configured = false;
            state.config_generation = state.config_generation.wrapping_add(1);
            !std::mem::replace(&mut state.configure_scheduled, true)
        };

        if schedule {
            let session = self.clone();
            tokio::spawn(async move { session.run_configure().await });
        }
    }

    async fn run_configure(&self) {
        let (handle, options, generation) = {
            let mut state = self.inner.state();
            state.configure_scheduled = false;
            let Some(handle) = state.handle.clone() else {
                return;
            };
            if state.is_busy {
                log::debug!("camera busy, configure deferred until ready");
                state.configure_on_ready = true;
                return;
            }
            let options = HardwareConfig {
                mode: state.mode,
                preview_size: preview_size(&state),
                recorder_profile: state.recorder_profile.clone(),
            };
            (handle, options, state.config_generation)
        };

        self.busy();
        log::debug!("applying hardware configuration {:?}", options);

        match handle.set_configuration(&options).await {
            Ok(()) => {
                let configured = {
                    let mut state = self.inner.state();
                    state.is_busy = false;
                    state.hardware_config = Some(options);
                    state.configured = state.config_generation == generation;
                    state.configured
                };
                if configured {
                    log::info!("Camera configured");
                    self.emit(CameraEvent::Configured);
                } else {
                    log::debug!("configuration superseded while applying");
                }
                self.ready();
                self.save_boot_config();
            }
            Err(e) => {
                log::warn!("Failed to configure camera: {}", e);
                self.emit(CameraEvent::Error(CameraError::ConfigurationError(e)));
                self.ready();
            }
        }
    }

    /// Change the capture mode; reconfigures when it actually changes
    pub fn set_mode(&self, mode: CameraMode) {
        {
            let mut state = self.inner.state();
            if state.mode == mode {
                return;
            }
            log::info!("Mode {} -> {}", state.mode.as_str(), mode.as_str());
            state.mode = mode;
        }
        self.configure();
    }

    /// Set the recorder profile by name.
    ///
    /// Absent, empty and unchanged values are ignored.
    pub fn set_recorder_profile(&self, profile: Option<&str>, options: SetOptions) {
        let Some(profile) = profile.filter(|p| !p.is_empty()) else {
            return;
        };
        {
            let mut state = self.inner.state();
            if state.recorder_profile.as_deref() == Some(profile) {
                return;
            }
            state.recorder_profile = Some(profile.to_string());
        }
        log::debug!("recorder profile set to {}", profile);

        if options.configure {
            self.configure();
        }
    }

    /// Set the picture size and derive a matching thumbnail size.
    ///
    /// Absent, zero-area and unchanged values are ignored.
    pub fn set_picture_size(&self, size: Option<Size>, options: SetOptions) {
        let Some(size) = size.filter(|s| !s.is_empty()) else {
            return;
        };
        let (handle, capabilities) = {
            let mut state = self.inner.state();
            if state.picture_size == Some(size) {
                return;
            }
            state.picture_size = Some(size);
            (state.handle.clone(), state.capabilities.clone())
        };
        log::debug!("picture size set to {}", size);

        if let Some(handle) = handle {
            handle.set_picture_size(size);
            let thumbnails = capabilities.map(|c| c.thumbnail_sizes).unwrap_or_default();
            set_thumbnail_size(handle.as_ref(), &thumbnails, size);
        }

        if options.configure {
            self.configure();
        }
    }

    pub fn set_iso_mode(&self, mode: &str) {
        self.apply_mode("ISO", mode, |c| &c.iso_modes, |h, m| h.set_iso_mode(m));
    }

    pub fn set_white_balance(&self, mode: &str) {
        self.apply_mode(
            "white balance",
            mode,
            |c| &c.white_balance_modes,
            |h, m| h.set_white_balance_mode(m),
        );
    }

    pub fn set_scene_mode(&self, mode: &str) {
        self.apply_mode("scene", mode, |c| &c.scene_modes, |h, m| h.set_scene_mode(m));
    }

    pub fn set_flash_mode(&self, mode: &str) {
        self.apply_mode("flash", mode, |c| &c.flash_modes, |h, m| h.set_flash_mode(m));
    }

    pub fn set_hdr(&self, hdr: HdrMode) {
        self.set_scene_mode(hdr.scene_mode());
    }

    /// Apply `mode` only if the hardware advertises it; anything else is
    /// dropped without an error.
    fn apply_mode(
        &self,
        dimension: &str,
        mode: &str,
        supported: impl Fn(&Capabilities) -> &Vec<String>,
        apply: impl Fn(&dyn CameraHandle, &str),
    ) {
        let Ok(handle) = self.current_handle() else {
            log::debug!("{} mode {} ignored: no camera", dimension, mode);
            return;
        };
        let capabilities = handle.capabilities();
        if !Capabilities::supports(supported(&capabilities), mode) {
            log::debug!("{} mode {} not supported, ignoring", dimension, mode);
            return;
        }
        apply(handle.as_ref(), mode);
    }
}

fn preview_size(state: &SessionState) -> Option<Size> {
    let capabilities = state.capabilities.as_ref()?;
    let target = match state.mode {
        CameraMode::Picture => state.picture_size,
        CameraMode::Video => state
            .recorder_profile
            .as_ref()
            .and_then(|name| capabilities.recorder_profiles.get(name))
            .map(|profile| profile.video),
    };
    optimal_preview_size(&capabilities.preview_sizes, target)
}

fn set_thumbnail_size(handle: &dyn CameraHandle, thumbnails: &[Size], picture: Size) {
    match thumbnail_size_for(thumbnails, picture) {
        Some(thumbnail) => {
            log::debug!("thumbnail size set to {}", thumbnail);
            handle.set_thumbnail_size(thumbnail);
        }
        None => log::debug!("no thumbnail size advertised for {}", picture),
    }
}

