//! Boot configuration cache
//!
//! The minimal settings needed to bring the default camera up already
//! configured on the next start, stored as JSON under a fixed key.

use super::CameraSession;
use crate::types::{CameraId, CameraMode, HardwareConfig, Size};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// Each field decodes on its own; a malformed or empty entry reads as
/// absent without discarding its siblings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootConfig {
    #[serde(rename = "mozCameraConfig", default, deserialize_with = "lenient")]
    pub hardware_config: Option<HardwareConfig>,
    #[serde(default, deserialize_with = "lenient")]
    pub picture_size: Option<Size>,
    #[serde(default, deserialize_with = "lenient")]
    pub recorder_profile: Option<String>,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match serde_json::from_value::<Option<T>>(value) {
        Ok(parsed) => Ok(parsed),
        Err(e) => {
            log::warn!("Dropping unreadable boot config entry: {}", e);
            Ok(None)
        }
    }
}

impl CameraSession {
    /// Read the boot configuration from storage; unreadable values count as absent
    pub fn fetch_boot_config(&self) -> Option<BootConfig> {
        let key = &self.inner.config.session.boot_config_key;
        let raw = self.inner.store.get_item(key)?;
        match serde_json::from_str(&raw) {
            Ok(boot) => Some(boot),
            Err(e) => {
                log::warn!("Ignoring unreadable boot config under {}: {}", key, e);
                None
            }
        }
    }

    /// Persist the boot configuration.
    ///
    /// Only when caching is enabled and the back camera is in picture mode;
    /// every other combination is left alone.
    pub fn save_boot_config(&self) {
        if !self.inner.config.session.cache_config {
            return;
        }

        let boot = {
            let state = self.inner.state();
            if state.selected_camera != CameraId::Back || state.mode != CameraMode::Picture {
                return;
            }
            BootConfig {
                hardware_config: state.hardware_config.clone(),
                picture_size: state.picture_size,
                recorder_profile: state.recorder_profile.clone(),
            }
        };

        let json = match serde_json::to_string(&boot) {
            Ok(json) => json,
            Err(e) => {
                log::warn!("Failed to serialize boot config: {}", e);
                return;
            }
        };

        let key = &self.inner.config.session.boot_config_key;
        match self.inner.store.set_item(key, &json) {
            Ok(()) => log::debug!("boot config saved under {}", key),
            Err(e) => log::warn!("Failed to save boot config: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boot_config_json_keys() {
        let boot = BootConfig {
            hardware_config: None,
            picture_size: Some(Size::new(400, 300)),
            recorder_profile: Some("720p".to_string()),
        };
        let json: serde_json::Value = serde_json::to_value(&boot).unwrap();
        assert!(json.get("mozCameraConfig").is_some());
        assert_eq!(json["pictureSize"]["width"], 400);
        assert_eq!(json["recorderProfile"], "720p");
    }

    #[test]
    fn test_boot_config_tolerates_missing_fields() {
        let boot: BootConfig = serde_json::from_str(r#"{"recorderProfile":"720p"}"#).unwrap();
        assert_eq!(boot.recorder_profile.as_deref(), Some("720p"));
        assert!(boot.picture_size.is_none());
        assert!(boot.hardware_config.is_none());
    }

    #[test]
    fn test_empty_entries_keep_their_siblings() {
        let boot: BootConfig = serde_json::from_str(
            r#"{"mozCameraConfig":{},"pictureSize":{},"recorderProfile":"720p"}"#,
        )
        .unwrap();
        assert_eq!(
            boot,
            BootConfig {
                hardware_config: None,
                picture_size: None,
                recorder_profile: Some("720p".to_string()),
            }
        );
    }

    #[test]
    fn test_wrong_typed_entry_is_dropped() {
        let boot: BootConfig = serde_json::from_str(
            r#"{"pictureSize":{"width":"wide","height":300},"recorderProfile":7}"#,
        )
        .unwrap();
        assert!(boot.picture_size.is_none());
        assert!(boot.recorder_profile.is_none());
    }
}
