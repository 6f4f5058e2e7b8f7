//! In-memory camera hardware
//!
//! [`SimulatedDevice`] implements the platform traits without touching a
//! driver. Every hardware call lands in one ordered log shared by the device
//! and its handles, failures are switched on through [`SimulatedBehavior`],
//! and `release` / `set_configuration` can be held in flight to observe the
//! session mid-operation.

use crate::errors::HardwareError;
use crate::platform::{CameraDevice, CameraHandle, HardwareEvent};
use crate::storage::VideoStorage;
use crate::types::{
    CameraId, Capabilities, FocusMode, HardwareConfig, PictureConfig, RecorderProfile,
    RecordingOptions, Size,
};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{mpsc, watch};

/// One call made against the simulated hardware
#[derive(Debug, Clone, PartialEq)]
pub enum HardwareCall {
    GetCamera {
        camera: CameraId,
        config: Option<HardwareConfig>,
    },
    SetConfiguration(HardwareConfig),
    AutoFocus,
    TakePicture(PictureConfig),
    ResumePreview,
    StartRecording {
        options: RecordingOptions,
        storage: String,
        filepath: PathBuf,
    },
    StopRecording,
    SetPictureSize(Size),
    SetThumbnailSize(Size),
    Release,
}

#[derive(Debug, Clone)]
pub struct SimulatedBehavior {
    pub cameras: Vec<CameraId>,
    pub capabilities: Capabilities,
    pub focus_mode: FocusMode,
    pub focus_succeeds: bool,
    pub picture: Bytes,
    pub acquire_error: Option<String>,
    pub release_error: Option<String>,
    pub configuration_error: Option<String>,
    pub capture_error: Option<String>,
    pub recording_error: Option<String>,
}

impl SimulatedBehavior {
    /// Capabilities of a typical phone back camera
    pub fn phone_capabilities() -> Capabilities {
        let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        let mut recorder_profiles = BTreeMap::new();
        recorder_profiles.insert("cif".to_string(), RecorderProfile { video: Size::new(352, 288) });
        recorder_profiles.insert("720p".to_string(), RecorderProfile { video: Size::new(1280, 720) });
        recorder_profiles.insert("1080p".to_string(), RecorderProfile { video: Size::new(1920, 1080) });

        Capabilities {
            picture_sizes: vec![
                Size::new(2048, 1536),
                Size::new(1600, 1200),
                Size::new(1280, 720),
                Size::new(640, 480),
            ],
            preview_sizes: vec![
                Size::new(320, 240),
                Size::new(640, 480),
                Size::new(1280, 720),
                Size::new(1920, 1080),
            ],
            thumbnail_sizes: vec![Size::new(160, 120), Size::new(320, 240), Size::new(192, 108)],
            recorder_profiles,
            iso_modes: strings(&["auto", "hjr", "100", "200", "400", "800", "1600"]),
            white_balance_modes: strings(&["auto", "cloudy", "sunny", "incandescent"]),
            scene_modes: strings(&["auto", "hdr"]),
            flash_modes: strings(&["auto", "on", "off"]),
            focus_modes: vec![FocusMode::Auto, FocusMode::ContinuousPicture],
        }
    }
}

impl Default for SimulatedBehavior {
    fn default() -> Self {
        Self {
            cameras: vec![CameraId::Back, CameraId::Front],
            capabilities: Self::phone_capabilities(),
            focus_mode: FocusMode::Auto,
            focus_succeeds: true,
            picture: Bytes::from_static(b"\xFF\xD8simulated-jpeg\xFF\xD9"),
            acquire_error: None,
            release_error: None,
            configuration_error: None,
            capture_error: None,
            recording_error: None,
        }
    }
}

struct Shared {
    calls: Mutex<Vec<HardwareCall>>,
    behavior: Mutex<SimulatedBehavior>,
    handles: Mutex<Vec<Arc<SimulatedHandle>>>,
    /// `true` while releases may complete
    release_gate: watch::Sender<bool>,
    /// `true` while configurations may complete
    configure_gate: watch::Sender<bool>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Shared {
    fn record(&self, call: HardwareCall) {
        lock(&self.calls).push(call);
    }

    fn behavior(&self) -> SimulatedBehavior {
        lock(&self.behavior).clone()
    }
}

async fn pass_gate(gate: &watch::Sender<bool>) {
    let mut receiver = gate.subscribe();
    let _ = receiver.wait_for(|open| *open).await;
}

fn fail_if(error: Option<String>) -> Result<(), HardwareError> {
    match error {
        Some(message) => Err(HardwareError(message)),
        None => Ok(()),
    }
}

#[derive(Clone)]
pub struct SimulatedDevice {
    shared: Arc<Shared>,
}

impl SimulatedDevice {
    pub fn new() -> Self {
        Self::with_behavior(SimulatedBehavior::default())
    }

    pub fn with_behavior(behavior: SimulatedBehavior) -> Self {
        let (release_gate, _) = watch::channel(true);
        let (configure_gate, _) = watch::channel(true);
        Self {
            shared: Arc::new(Shared {
                calls: Mutex::new(Vec::new()),
                behavior: Mutex::new(behavior),
                handles: Mutex::new(Vec::new()),
                release_gate,
                configure_gate,
            }),
        }
    }

    /// Change behavior for subsequent calls
    pub fn update(&self, change: impl FnOnce(&mut SimulatedBehavior)) {
        change(&mut lock(&self.shared.behavior));
    }

    pub fn calls(&self) -> Vec<HardwareCall> {
        lock(&self.shared.calls).clone()
    }

    pub fn clear_calls(&self) {
        lock(&self.shared.calls).clear();
    }

    pub fn count(&self, matches: impl Fn(&HardwareCall) -> bool) -> usize {
        lock(&self.shared.calls).iter().filter(|c| matches(c)).count()
    }

    /// Position of the first matching call in the log
    pub fn position(&self, matches: impl Fn(&HardwareCall) -> bool) -> Option<usize> {
        lock(&self.shared.calls).iter().position(|c| matches(c))
    }

    pub fn hold_releases(&self) {
        self.shared.release_gate.send_replace(false);
    }

    pub fn resume_releases(&self) {
        self.shared.release_gate.send_replace(true);
    }

    pub fn hold_configuration(&self) {
        self.shared.configure_gate.send_replace(false);
    }

    pub fn resume_configuration(&self) {
        self.shared.configure_gate.send_replace(true);
    }

    /// Most recently acquired handle
    pub fn last_handle(&self) -> Option<Arc<SimulatedHandle>> {
        lock(&self.shared.handles).last().cloned()
    }

    pub fn handles_acquired(&self) -> usize {
        lock(&self.shared.handles).len()
    }
}

impl Default for SimulatedDevice {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CameraDevice for SimulatedDevice {
    fn list_cameras(&self) -> Vec<CameraId> {
        self.shared.behavior().cameras
    }

    async fn get_camera(
        &self,
        camera: CameraId,
        config: Option<HardwareConfig>,
    ) -> Result<Arc<dyn CameraHandle>, HardwareError> {
        self.shared.record(HardwareCall::GetCamera {
            camera,
            config: config.clone(),
        });
        tokio::task::yield_now().await;

        let behavior = self.shared.behavior();
        fail_if(behavior.acquire_error)?;
        if !behavior.cameras.contains(&camera) {
            return Err(HardwareError::new(format!("no {} camera", camera)));
        }

        let handle = Arc::new(SimulatedHandle::new(self.shared.clone(), camera));
        lock(&self.shared.handles).push(handle.clone());
        Ok(handle as Arc<dyn CameraHandle>)
    }
}

#[derive(Debug, Default, Clone)]
struct HandleProps {
    iso_mode: Option<String>,
    white_balance_mode: Option<String>,
    scene_mode: Option<String>,
    flash_mode: Option<String>,
    picture_size: Option<Size>,
    thumbnail_size: Option<Size>,
    recording: bool,
    released: bool,
}

pub struct SimulatedHandle {
    shared: Arc<Shared>,
    camera: CameraId,
    props: Mutex<HandleProps>,
    event_sender: mpsc::UnboundedSender<HardwareEvent>,
    event_receiver: Mutex<Option<mpsc::UnboundedReceiver<HardwareEvent>>>,
}

impl SimulatedHandle {
    fn new(shared: Arc<Shared>, camera: CameraId) -> Self {
        let (event_sender, event_receiver) = mpsc::unbounded_channel();
        Self {
            shared,
            camera,
            props: Mutex::new(HandleProps::default()),
            event_sender,
            event_receiver: Mutex::new(Some(event_receiver)),
        }
    }

    pub fn camera(&self) -> CameraId {
        self.camera
    }

    pub fn picture_size(&self) -> Option<Size> {
        lock(&self.props).picture_size
    }

    pub fn thumbnail_size(&self) -> Option<Size> {
        lock(&self.props).thumbnail_size
    }

    pub fn is_recording(&self) -> bool {
        lock(&self.props).recording
    }

    pub fn is_released(&self) -> bool {
        lock(&self.props).released
    }

    /// Push a notification as the driver would
    pub fn push_event(&self, event: HardwareEvent) {
        let _ = self.event_sender.send(event);
    }
}

#[async_trait]
impl CameraHandle for SimulatedHandle {
    fn capabilities(&self) -> Capabilities {
        self.shared.behavior().capabilities
    }

    fn focus_mode(&self) -> FocusMode {
        self.shared.behavior().focus_mode
    }

    fn set_picture_size(&self, size: Size) {
        self.shared.record(HardwareCall::SetPictureSize(size));
        lock(&self.props).picture_size = Some(size);
    }

    fn set_thumbnail_size(&self, size: Size) {
        self.shared.record(HardwareCall::SetThumbnailSize(size));
        lock(&self.props).thumbnail_size = Some(size);
    }

    fn iso_mode(&self) -> Option<String> {
        lock(&self.props).iso_mode.clone()
    }

    fn set_iso_mode(&self, mode: &str) {
        lock(&self.props).iso_mode = Some(mode.to_string());
    }

    fn white_balance_mode(&self) -> Option<String> {
        lock(&self.props).white_balance_mode.clone()
    }

    fn set_white_balance_mode(&self, mode: &str) {
        lock(&self.props).white_balance_mode = Some(mode.to_string());
    }

    fn scene_mode(&self) -> Option<String> {
        lock(&self.props).scene_mode.clone()
    }

    fn set_scene_mode(&self, mode: &str) {
        lock(&self.props).scene_mode = Some(mode.to_string());
    }

    fn flash_mode(&self) -> Option<String> {
        lock(&self.props).flash_mode.clone()
    }

    fn set_flash_mode(&self, mode: &str) {
        lock(&self.props).flash_mode = Some(mode.to_string());
    }

    async fn set_configuration(&self, config: &HardwareConfig) -> Result<(), HardwareError> {
        self.shared.record(HardwareCall::SetConfiguration(config.clone()));
        pass_gate(&self.shared.configure_gate).await;
        fail_if(self.shared.behavior().configuration_error)
    }

    async fn auto_focus(&self) -> Result<bool, HardwareError> {
        self.shared.record(HardwareCall::AutoFocus);
        tokio::task::yield_now().await;
        Ok(self.shared.behavior().focus_succeeds)
    }

    async fn take_picture(&self, config: &PictureConfig) -> Result<Bytes, HardwareError> {
        self.shared.record(HardwareCall::TakePicture(config.clone()));
        tokio::task::yield_now().await;
        let behavior = self.shared.behavior();
        fail_if(behavior.capture_error)?;
        Ok(behavior.picture)
    }

    fn resume_preview(&self) {
        self.shared.record(HardwareCall::ResumePreview);
    }

    async fn start_recording(
        &self,
        options: &RecordingOptions,
        storage: Arc<dyn VideoStorage>,
        filepath: &Path,
    ) -> Result<(), HardwareError> {
        self.shared.record(HardwareCall::StartRecording {
            options: *options,
            storage: storage.name().to_string(),
            filepath: filepath.to_path_buf(),
        });
        tokio::task::yield_now().await;
        fail_if(self.shared.behavior().recording_error)?;
        lock(&self.props).recording = true;
        Ok(())
    }

    async fn stop_recording(&self) -> Result<(), HardwareError> {
        self.shared.record(HardwareCall::StopRecording);
        lock(&self.props).recording = false;
        Ok(())
    }

    async fn release(&self) -> Result<(), HardwareError> {
        self.shared.record(HardwareCall::Release);
        tokio::task::yield_now().await;
        pass_gate(&self.shared.release_gate).await;
        fail_if(self.shared.behavior().release_error)?;
        lock(&self.props).released = true;
        Ok(())
    }

    fn take_events(&self) -> Option<mpsc::UnboundedReceiver<HardwareEvent>> {
        lock(&self.event_receiver).take()
    }
}

/// Video storage with a settable free-space reading
#[derive(Debug)]
pub struct SimulatedVideoStorage {
    name: String,
    free: AtomicU64,
    error: Mutex<Option<String>>,
}

impl SimulatedVideoStorage {
    pub fn new(free: u64) -> Self {
        Self {
            name: "videos".to_string(),
            free: AtomicU64::new(free),
            error: Mutex::new(None),
        }
    }

    pub fn set_free_space(&self, free: u64) {
        self.free.store(free, Ordering::Release);
    }

    pub fn fail_with(&self, message: Option<&str>) {
        *lock(&self.error) = message.map(str::to_string);
    }
}

#[async_trait]
impl VideoStorage for SimulatedVideoStorage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn free_space(&self) -> Result<u64, HardwareError> {
        fail_if(lock(&self.error).clone())?;
        Ok(self.free.load(Ordering::Acquire))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_calls_are_logged_in_order() {
        let device = SimulatedDevice::new();
        let handle = device.get_camera(CameraId::Front, None).await.unwrap();
        handle.resume_preview();
        handle.release().await.unwrap();

        assert_eq!(
            device.calls(),
            vec![
                HardwareCall::GetCamera {
                    camera: CameraId::Front,
                    config: None,
                },
                HardwareCall::ResumePreview,
                HardwareCall::Release,
            ]
        );
        assert!(device.last_handle().unwrap().is_released());
    }

    #[tokio::test]
    async fn test_release_gate_holds_until_resumed() {
        let device = SimulatedDevice::new();
        let handle = device.get_camera(CameraId::Back, None).await.unwrap();
        device.hold_releases();

        let release = tokio::spawn(async move { handle.release().await });
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
        assert!(!release.is_finished());

        device.resume_releases();
        release.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_configured_failures() {
        let device = SimulatedDevice::new();
        device.update(|b| b.acquire_error = Some("busy".to_string()));
        let err = device.get_camera(CameraId::Back, None).await.err().unwrap();
        assert_eq!(err.message(), "busy");

        let storage = SimulatedVideoStorage::new(10);
        assert_eq!(storage.free_space().await.unwrap(), 10);
        storage.fail_with(Some("unmounted"));
        assert!(storage.free_space().await.is_err());
    }

    #[test]
    fn test_events_channel_is_handed_out_once() {
        let handle = SimulatedHandle::new(
            SimulatedDevice::new().shared.clone(),
            CameraId::Back,
        );
        let mut receiver = handle.take_events().unwrap();
        assert!(handle.take_events().is_none());

        handle.push_event(HardwareEvent::Shutter);
        assert_eq!(receiver.try_recv().unwrap(), HardwareEvent::Shutter);
    }
}
