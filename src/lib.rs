//! camsession: event-driven camera session control for mobile camera UIs
//!
//! This crate mediates access to a single hardware camera. The UI issues
//! intents (load, configure, focus, capture, record) and a [`CameraSession`]
//! serializes them against the one handle it owns, reporting progress as
//! typed [`CameraEvent`]s.
//!
//! # Features
//! - Asynchronous acquire/release lifecycle with camera switching
//! - Debounced hardware configuration (one application per turn)
//! - Capability-validated ISO, white balance, scene, HDR and flash modes
//! - Focus, still capture and video recording state machines
//! - Boot configuration cache for fast first start
//!
//! The hardware, storage and orientation sensor are injected through the
//! traits in [`platform`], [`storage`] and [`orientation`]; [`testing`] holds
//! an in-memory simulator implementing all of them.
//!
//! # Usage
//! ```rust,ignore
//! use camsession::{CameraSession, SetOptions};
//!
//! let session = CameraSession::builder(device, video_storage)
//!     .cache_config(true)
//!     .build();
//! let mut events = session.subscribe();
//!
//! session.load().await?;
//! session.set_picture_size(Some(Size::new(1600, 1200)), SetOptions::default());
//! let jpeg = session.take_picture(Default::default()).await?;
//! ```
pub mod config;
pub mod errors;
pub mod events;
pub mod orientation;
pub mod platform;
pub mod session;
pub mod sizing;
pub mod storage;
pub mod timing;
pub mod types;

// Simulated hardware for offline testing and the CLI
pub mod testing;

// Re-exports for convenience
pub use config::CamSessionConfig;
pub use errors::{CameraError, HardwareError};
pub use events::{CameraEvent, EventKind, EventStream};
pub use platform::{CameraDevice, CameraHandle, HardwareEvent};
pub use session::{BootConfig, CameraSession, SessionBuilder, VideoFilepathGenerator};
pub use types::{
    CameraId, CameraMode, Capabilities, FocusMode, FocusState, HardwareConfig, HdrMode,
    PictureConfig, PictureOptions, Position, RecordingOptions, SetOptions, Size,
};

/// Initialize logging for the camera session
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "camsession=info");
    }
    let _ = env_logger::try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get crate information
pub fn get_info() -> CrateInfo {
    CrateInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: DESCRIPTION.to_string(),
    }
}

/// Crate information structure
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CrateInfo {
    pub name: String,
    pub version: String,
    pub description: String,
}
