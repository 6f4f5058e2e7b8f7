use thiserror::Error;

/// Opaque failure reported by an injected hardware or storage capability.
///
/// The session never interprets the message; it is forwarded as-is to the
/// caller and onto the event stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct HardwareError(pub String);

impl HardwareError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

impl From<&str> for HardwareError {
    fn from(message: &str) -> Self {
        Self(message.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CameraError {
    #[error("No camera handle is held")]
    NoCamera,
    #[error("Camera acquisition error: {0}")]
    AcquireError(HardwareError),
    #[error("Camera configuration error: {0}")]
    ConfigurationError(HardwareError),
    #[error("failed")]
    FocusFailed,
    #[error("Capture error: {0}")]
    CaptureError(HardwareError),
    #[error("Recording error: {0}")]
    RecordingError(HardwareError),
    #[error("Not enough storage space: {free} bytes free, {required} bytes required")]
    InsufficientStorage { free: u64, required: u64 },
    #[error("Storage error: {0}")]
    StorageError(String),
    #[error("Configuration file error: {0}")]
    ConfigError(String),
}

impl CameraError {
    /// Whether the failure came from the hardware capability rather than the session.
    pub fn is_hardware(&self) -> bool {
        matches!(
            self,
            CameraError::AcquireError(_)
                | CameraError::ConfigurationError(_)
                | CameraError::CaptureError(_)
                | CameraError::RecordingError(_)
        )
    }
}

impl From<std::io::Error> for CameraError {
    fn from(error: std::io::Error) -> Self {
        CameraError::StorageError(error.to_string())
    }
}

impl From<serde_json::Error> for CameraError {
    fn from(error: serde_json::Error) -> Self {
        CameraError::StorageError(error.to_string())
    }
}
