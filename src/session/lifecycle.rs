//! Handle acquisition and release

use super::CameraSession;
use crate::errors::{CameraError, HardwareError};
use crate::events::CameraEvent;
use crate::platform::{CameraHandle, HardwareEvent};
use crate::types::{CameraId, HardwareConfig, SetOptions};
use std::sync::Arc;

impl CameraSession {
    /// Bring up the selected camera.
    ///
    /// With the same camera still held this only re-runs
    /// [`setup_new_camera`](Self::setup_new_camera). After a selection change
    /// the old handle is released first and its hardware configuration
    /// dropped. A load issued while a release is in flight waits for it, and
    /// overlapping loads queue behind the acquisition already running.
    pub async fn load(&self) -> Result<(), CameraError> {
        self.wait_for_release().await;
        let _acquiring = self.inner.acquiring.lock().await;

        if self.is_first_load() {
            self.first_load();
        }

        let (selected, acquired, handle) = {
            let state = self.inner.state();
            (state.selected_camera, state.acquired_camera, state.handle.clone())
        };

        if let Some(handle) = handle {
            if acquired == Some(selected) {
                log::debug!("camera {} already loaded", selected);
                self.setup_new_camera(handle);
                return Ok(());
            }

            log::info!("Switching camera {:?} -> {}", acquired, selected);
            if let Err(e) = self.release().await {
                log::warn!("Release before camera switch failed: {}", e);
            }
            self.inner.state().hardware_config = None;
        }

        let config = self.inner.state().hardware_config.clone();
        self.acquire(selected, config).await
    }

    /// Acquire a handle for `camera`, optionally pre-configured with `config`.
    ///
    /// Emits `Busy`, then on success `NewCamera`, `Configured` (only when a
    /// config was supplied) and `Ready`. Failures are emitted as `Error` and
    /// returned; the handle slot stays empty.
    pub async fn request_camera(
        &self,
        camera: CameraId,
        config: Option<HardwareConfig>,
    ) -> Result<(), CameraError> {
        self.wait_for_release().await;
        let _acquiring = self.inner.acquiring.lock().await;
        self.acquire(camera, config).await
    }

    async fn acquire(
        &self,
        camera: CameraId,
        config: Option<HardwareConfig>,
    ) -> Result<(), CameraError> {
        if self.has_camera() {
            if let Err(e) = self.release().await {
                log::warn!("Release of previous handle failed: {}", e);
            }
        }

        self.busy();
        log::info!("Requesting camera {} (preconfigured: {})", camera, config.is_some());

        match self.inner.device.get_camera(camera, config.clone()).await {
            Ok(handle) => {
                let configured = config.is_some();
                {
                    let mut state = self.inner.state();
                    state.configured = configured;
                    state.acquired_camera = Some(camera);
                    if configured {
                        state.hardware_config = config;
                    }
                }
                self.setup_new_camera(handle);
                if configured {
                    self.emit(CameraEvent::Configured);
                }
                self.ready();
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to acquire camera {}: {}", camera, e);
                self.inner.state().is_busy = false;
                let error = CameraError::AcquireError(e);
                self.emit(CameraEvent::Error(error.clone()));
                Err(error)
            }
        }
    }

    /// Release the held handle.
    ///
    /// `is_releasing()` reports true until the hardware answers. `Released`
    /// is emitted on success and failure alike, and the hardware error is
    /// returned unchanged.
    pub async fn release(&self) -> Result<(), HardwareError> {
        let handle = {
            let mut state = self.inner.state();
            state.acquired_camera = None;
            state.capabilities = None;
            state.handle.take()
        };
        let Some(handle) = handle else {
            return Ok(());
        };

        self.inner.releasing.send_replace(true);
        log::info!("Releasing camera");
        let result = handle.release().await;
        self.inner.releasing.send_replace(false);

        if let Err(e) = &result {
            log::warn!("Camera release reported an error: {}", e);
        }
        self.emit(CameraEvent::Released);
        result
    }

    /// Adopt `handle` as the live camera and announce it.
    ///
    /// Boot settings fetched by the first load are applied here, once,
    /// without reconfiguring the hardware. A different handle already held
    /// is released in the background.
    pub fn setup_new_camera(&self, handle: Arc<dyn CameraHandle>) {
        let capabilities = handle.capabilities();
        let hardware_events = handle.take_events();
        let replaced = {
            let mut state = self.inner.state();
            state.capabilities = Some(capabilities.clone());
            state
                .handle
                .replace(handle.clone())
                .filter(|old| !same_handle(old, &handle))
        };

        if let Some(old) = replaced {
            log::warn!("Replacing a live camera handle; releasing the old one");
            tokio::spawn(async move {
                if let Err(e) = old.release().await {
                    log::warn!("Release of replaced handle failed: {}", e);
                }
            });
        }

        if let Some(receiver) = hardware_events {
            self.forward_hardware_events(receiver);
        }

        self.emit(CameraEvent::NewCamera(capabilities));

        let boot = self.inner.state().pending_boot_config.take();
        if let Some(boot) = boot {
            log::debug!("applying boot config to new camera");
            self.set_recorder_profile(boot.recorder_profile.as_deref(), SetOptions::NO_CONFIGURE);
            self.set_picture_size(boot.picture_size, SetOptions::NO_CONFIGURE);
        }
    }

    /// Read the persisted boot configuration and stage it for the first camera
    pub fn first_load(&self) {
        self.inner.state().is_first_load = false;
        let Some(boot) = self.fetch_boot_config() else {
            log::debug!("no boot config stored");
            return;
        };

        log::info!("Restoring boot config");
        let mut state = self.inner.state();
        state.hardware_config = boot.hardware_config.clone();
        state.pending_boot_config = Some(boot);
    }

    /// Stop any recording, release the handle and stop orientation updates
    pub async fn teardown(&self) {
        if self.is_recording() {
            if let Err(e) = self.stop_recording().await {
                log::warn!("Failed to stop recording during teardown: {}", e);
            }
        }
        if let Err(e) = self.release().await {
            log::warn!("Error releasing camera during teardown: {}", e);
        }
        self.inner.orientation.stop();
    }

    async fn wait_for_release(&self) {
        if !self.is_releasing() {
            return;
        }
        log::debug!("deferring until camera is released");
        let mut receiver = self.inner.releasing.subscribe();
        // The sender lives as long as the session, so this only fails if
        // the session is gone.
        let _ = receiver.wait_for(|releasing| !*releasing).await;
    }

    fn forward_hardware_events(
        &self,
        mut receiver: tokio::sync::mpsc::UnboundedReceiver<HardwareEvent>,
    ) {
        let weak = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            while let Some(event) = receiver.recv().await {
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                let session = CameraSession { inner };
                match event {
                    HardwareEvent::Shutter => session.emit(CameraEvent::Shutter),
                    HardwareEvent::PreviewStateChange(state) => {
                        session.on_preview_state_change(&state)
                    }
                    HardwareEvent::RecorderStateChange(message) => {
                        session.on_recorder_state_change(&message).await
                    }
                }
            }
            log::debug!("hardware event channel closed");
        });
    }
}

fn same_handle(a: &Arc<dyn CameraHandle>, b: &Arc<dyn CameraHandle>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}
