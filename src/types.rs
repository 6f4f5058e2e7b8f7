//! Value types shared between the session and the hardware capability

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Which physical camera the session is pointed at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CameraId {
    #[default]
    Back,
    Front,
}

impl CameraId {
    pub fn as_str(&self) -> &'static str {
        match self {
            CameraId::Back => "back",
            CameraId::Front => "front",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            CameraId::Back => CameraId::Front,
            CameraId::Front => CameraId::Back,
        }
    }
}

impl fmt::Display for CameraId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CameraId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "back" => Ok(Self::Back),
            "front" => Ok(Self::Front),
            _ => Err(format!("Unknown camera: {}", s)),
        }
    }
}

/// Capture mode the hardware is configured for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CameraMode {
    #[default]
    Picture,
    Video,
}

impl CameraMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CameraMode::Picture => "picture",
            CameraMode::Video => "video",
        }
    }
}

impl FromStr for CameraMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "picture" => Ok(Self::Picture),
            "video" => Ok(Self::Video),
            _ => Err(format!("Unknown camera mode: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// A zero-area size counts as "no size"
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            return 0.0;
        }
        self.width as f64 / self.height as f64
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Hardware focus mode as advertised by the handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum FocusMode {
    #[default]
    Auto,
    Macro,
    ContinuousPicture,
    ContinuousVideo,
    Infinity,
    Fixed,
    Edof,
}

impl FocusMode {
    /// Fixed-lens modes cannot run an autofocus pass
    pub fn supports_autofocus(&self) -> bool {
        !matches!(self, FocusMode::Infinity | FocusMode::Fixed | FocusMode::Edof)
    }
}

/// Observable focus state: `None -> Focusing -> {Focused | Fail}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FocusState {
    #[default]
    None,
    Focusing,
    Focused,
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HdrMode {
    On,
    #[default]
    Off,
}

impl HdrMode {
    /// Scene mode that implements this HDR setting
    pub fn scene_mode(&self) -> &'static str {
        match self {
            HdrMode::On => "hdr",
            HdrMode::Off => "auto",
        }
    }
}

impl FromStr for HdrMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "on" => Ok(Self::On),
            "off" => Ok(Self::Off),
            _ => Err(format!("HDR mode must be on or off, got {}", s)),
        }
    }
}

/// Video dimensions associated with a named recorder profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecorderProfile {
    pub video: Size,
}

/// Everything the hardware advertises for the acquired camera
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    pub picture_sizes: Vec<Size>,
    pub preview_sizes: Vec<Size>,
    pub thumbnail_sizes: Vec<Size>,
    pub recorder_profiles: BTreeMap<String, RecorderProfile>,
    pub iso_modes: Vec<String>,
    pub white_balance_modes: Vec<String>,
    pub scene_modes: Vec<String>,
    pub flash_modes: Vec<String>,
    pub focus_modes: Vec<FocusMode>,
}

impl Capabilities {
    pub fn supports(list: &[String], value: &str) -> bool {
        list.iter().any(|v| v == value)
    }
}

/// Low-level configuration pushed to the hardware by `configure()` and
/// optionally handed to acquisition so the camera comes up pre-configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HardwareConfig {
    pub mode: CameraMode,
    pub preview_size: Option<Size>,
    pub recorder_profile: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    #[default]
    Jpeg,
}

/// Geographic position attached to a still capture
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: Option<f64>,
    pub timestamp: Option<i64>,
}

/// Caller-supplied extras merged into a still capture request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PictureOptions {
    pub position: Option<Position>,
    /// Seconds since the epoch; defaults to the capture time
    pub date_time: Option<i64>,
}

impl PictureOptions {
    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_date_time(mut self, date_time: i64) -> Self {
        self.date_time = Some(date_time);
        self
    }
}

/// Still capture request handed to the hardware
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PictureConfig {
    pub file_format: FileFormat,
    pub picture_size: Option<Size>,
    pub rotation: i32,
    pub date_time: i64,
    pub position: Option<Position>,
}

/// Options handed to the hardware when a recording starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingOptions {
    pub rotation: i32,
    pub max_file_size_bytes: u64,
}

/// Per-call override for the typed setters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetOptions {
    pub configure: bool,
}

impl SetOptions {
    pub const NO_CONFIGURE: SetOptions = SetOptions { configure: false };
}

impl Default for SetOptions {
    fn default() -> Self {
        Self { configure: true }
    }
}
