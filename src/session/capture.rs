//! Focus and still capture

use super::CameraSession;
use crate::errors::CameraError;
use crate::events::CameraEvent;
use crate::types::{CameraId, FileFormat, FocusState, PictureConfig, PictureOptions};
use bytes::Bytes;

impl CameraSession {
    /// Run an autofocus pass.
    ///
    /// The state moves to `Focusing` immediately. Fixed-focus hardware
    /// resolves on the next turn without touching the lens; otherwise the
    /// state ends at `Focused` or `Fail` and a failed pass returns
    /// [`CameraError::FocusFailed`].
    pub async fn focus(&self) -> Result<(), CameraError> {
        let handle = self.current_handle()?;
        self.set_focus(FocusState::Focusing);

        if !handle.focus_mode().supports_autofocus() {
            log::debug!("autofocus not supported in {:?}", handle.focus_mode());
            tokio::task::yield_now().await;
            return Ok(());
        }

        match handle.auto_focus().await {
            Ok(true) => {
                self.set_focus(FocusState::Focused);
                Ok(())
            }
            Ok(false) => {
                self.set_focus(FocusState::Fail);
                Err(CameraError::FocusFailed)
            }
            Err(e) => {
                log::warn!("Autofocus error: {}", e);
                self.set_focus(FocusState::Fail);
                Err(CameraError::FocusFailed)
            }
        }
    }

    /// Focus, then capture a JPEG at the current picture size.
    ///
    /// A failed focus does not stop the capture. On success `NewImage` is
    /// emitted, the preview resumes and `Ready` follows.
    pub async fn take_picture(&self, options: PictureOptions) -> Result<Bytes, CameraError> {
        let handle = self.current_handle()?;
        self.busy();

        if let Err(e) = self.focus().await {
            log::warn!("Focus failed, capturing anyway: {}", e);
        }

        let config = {
            let state = self.inner.state();
            let rotation = self.inner.orientation.get();
            PictureConfig {
                file_format: FileFormat::Jpeg,
                picture_size: state.picture_size,
                rotation: if state.selected_camera == CameraId::Front {
                    -rotation
                } else {
                    rotation
                },
                date_time: options
                    .date_time
                    .unwrap_or_else(|| chrono::Utc::now().timestamp()),
                position: options.position,
            }
        };
        log::debug!("taking picture {:?}", config);

        let result = handle.take_picture(&config).await;
        self.set_focus(FocusState::None);

        match result {
            Ok(blob) => {
                log::info!("Captured image ({} bytes)", blob.len());
                self.emit(CameraEvent::NewImage { blob: blob.clone() });
                handle.resume_preview();
                self.ready();
                Ok(blob)
            }
            Err(e) => {
                log::error!("Failed to take picture: {}", e);
                let error = CameraError::CaptureError(e);
                self.emit(CameraEvent::Error(error.clone()));
                handle.resume_preview();
                self.ready();
                Err(error)
            }
        }
    }
}
