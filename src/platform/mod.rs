//! Hardware capability seams
//!
//! The session never talks to a driver directly. A platform adapter implements
//! [`CameraDevice`] (enumeration and acquisition) and [`CameraHandle`] (the
//! live, exclusively owned camera) and is injected at construction time.

use crate::errors::HardwareError;
use crate::storage::VideoStorage;
use crate::types::{
    CameraId, Capabilities, FocusMode, HardwareConfig, PictureConfig, RecordingOptions, Size,
};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Notifications a live handle pushes back to the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HardwareEvent {
    Shutter,
    PreviewStateChange(String),
    RecorderStateChange(String),
}

#[async_trait]
pub trait CameraDevice: Send + Sync {
    /// Cameras present on the device
    fn list_cameras(&self) -> Vec<CameraId>;

    /// Acquire a handle, optionally pre-configured
    async fn get_camera(
        &self,
        camera: CameraId,
        config: Option<HardwareConfig>,
    ) -> Result<Arc<dyn CameraHandle>, HardwareError>;
}

#[async_trait]
pub trait CameraHandle: Send + Sync {
    fn capabilities(&self) -> Capabilities;
    fn focus_mode(&self) -> FocusMode;

    fn set_picture_size(&self, size: Size);
    fn set_thumbnail_size(&self, size: Size);

    fn iso_mode(&self) -> Option<String>;
    fn set_iso_mode(&self, mode: &str);
    fn white_balance_mode(&self) -> Option<String>;
    fn set_white_balance_mode(&self, mode: &str);
    fn scene_mode(&self) -> Option<String>;
    fn set_scene_mode(&self, mode: &str);
    fn flash_mode(&self) -> Option<String>;
    fn set_flash_mode(&self, mode: &str);

    async fn set_configuration(&self, config: &HardwareConfig) -> Result<(), HardwareError>;

    /// `Ok(false)` means the lens could not lock focus
    async fn auto_focus(&self) -> Result<bool, HardwareError>;

    async fn take_picture(&self, config: &PictureConfig) -> Result<Bytes, HardwareError>;

    fn resume_preview(&self);

    async fn start_recording(
        &self,
        options: &RecordingOptions,
        storage: Arc<dyn VideoStorage>,
        filepath: &Path,
    ) -> Result<(), HardwareError>;

    async fn stop_recording(&self) -> Result<(), HardwareError>;

    async fn release(&self) -> Result<(), HardwareError>;

    /// Hand over the handle's notification channel. Only the first call
    /// returns a receiver.
    fn take_events(&self) -> Option<mpsc::UnboundedReceiver<HardwareEvent>> {
        None
    }
}
