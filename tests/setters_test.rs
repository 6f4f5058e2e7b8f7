//! Typed setter tests: no-op rules, thumbnail derivation and capability
//! validation for ISO, white balance, scene, HDR and flash.
//!
//! Run with: cargo test --test setters_test

mod common;

use camsession::testing::{settle, HardwareCall};
use camsession::{CameraHandle, CameraId, CameraMode, HdrMode, SetOptions, Size};
use common::Harness;

// ═══════════════════════════════════════════════════════════════════════════
// RECORDER PROFILE
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_absent_or_empty_profile_is_ignored() {
    let h = Harness::loaded().await;
    h.session.set_recorder_profile(None, SetOptions::default());
    h.session.set_recorder_profile(Some(""), SetOptions::default());
    settle().await;

    assert!(h.session.recorder_profile().is_none());
    assert!(h.configurations().is_empty());
}

#[tokio::test]
async fn test_unchanged_profile_does_not_configure() {
    let mut h = Harness::loaded().await;
    h.session
        .set_recorder_profile(Some("720p"), SetOptions::default());
    settle().await;
    assert_eq!(h.configurations().len(), 1);
    h.reset();

    h.session
        .set_recorder_profile(Some("720p"), SetOptions::default());
    settle().await;
    assert!(h.configurations().is_empty());
    assert!(h.kinds().is_empty());
}

#[tokio::test]
async fn test_no_configure_option_updates_state_only() {
    let h = Harness::loaded().await;
    h.session
        .set_recorder_profile(Some("1080p"), SetOptions::NO_CONFIGURE);
    settle().await;

    assert_eq!(h.session.recorder_profile().as_deref(), Some("1080p"));
    assert!(h.configurations().is_empty());
}

// ═══════════════════════════════════════════════════════════════════════════
// PICTURE SIZE
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_picture_size_sets_hardware_and_thumbnail() {
    let h = Harness::loaded().await;
    h.session
        .set_picture_size(Some(Size::new(1280, 720)), SetOptions::default());
    settle().await;

    let handle = h.handle();
    assert_eq!(handle.picture_size(), Some(Size::new(1280, 720)));
    assert_eq!(handle.thumbnail_size(), Some(Size::new(192, 108)));
    assert_eq!(h.configurations().len(), 1);

    // 4:3 ties between 160x120 and 320x240; the larger wins
    h.session
        .set_picture_size(Some(Size::new(1600, 1200)), SetOptions::default());
    assert_eq!(handle.thumbnail_size(), Some(Size::new(320, 240)));
}

#[tokio::test]
async fn test_unchanged_picture_size_skips_thumbnail_and_configure() {
    let mut h = Harness::loaded().await;
    h.session
        .set_picture_size(Some(Size::new(1600, 1200)), SetOptions::default());
    settle().await;
    h.reset();

    h.session
        .set_picture_size(Some(Size::new(1600, 1200)), SetOptions::default());
    settle().await;

    assert_eq!(
        h.device.count(|c| matches!(c, HardwareCall::SetThumbnailSize(_))),
        0
    );
    assert!(h.configurations().is_empty());
}

#[tokio::test]
async fn test_absent_or_zero_picture_size_is_ignored() {
    let h = Harness::loaded().await;
    h.session.set_picture_size(None, SetOptions::default());
    h.session
        .set_picture_size(Some(Size::new(0, 0)), SetOptions::default());
    settle().await;

    assert!(h.session.picture_size().is_none());
    assert!(h.device.calls().is_empty());
}

#[tokio::test]
async fn test_picture_size_before_load_is_kept() {
    let h = Harness::new();
    h.session
        .set_picture_size(Some(Size::new(640, 480)), SetOptions::default());
    settle().await;

    assert_eq!(h.session.picture_size(), Some(Size::new(640, 480)));
    assert!(h.device.calls().is_empty());
}

// ═══════════════════════════════════════════════════════════════════════════
// CAPABILITY-VALIDATED MODES
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_iso_mode_validated_against_capabilities() {
    let h = Harness::loaded().await;
    let handle = h.handle();

    h.session.set_iso_mode("invalid");
    assert_ne!(handle.iso_mode().as_deref(), Some("invalid"));

    h.session.set_iso_mode("auto");
    assert_eq!(handle.iso_mode().as_deref(), Some("auto"));

    h.session.set_iso_mode("invalid");
    assert_eq!(handle.iso_mode().as_deref(), Some("auto"), "unsupported value leaves it unchanged");
}

#[tokio::test]
async fn test_white_balance_validated_against_capabilities() {
    let h = Harness::loaded().await;
    let handle = h.handle();

    h.session.set_white_balance("cloudy");
    assert_eq!(handle.white_balance_mode().as_deref(), Some("cloudy"));

    h.session.set_white_balance("fluorescent");
    assert_eq!(handle.white_balance_mode().as_deref(), Some("cloudy"));
}

#[tokio::test]
async fn test_hdr_maps_onto_scene_mode() {
    let h = Harness::loaded().await;
    let handle = h.handle();

    h.session.set_hdr(HdrMode::On);
    assert_eq!(handle.scene_mode().as_deref(), Some("hdr"));

    h.session.set_hdr(HdrMode::Off);
    assert_eq!(handle.scene_mode().as_deref(), Some("auto"));

    h.session.set_scene_mode("night");
    assert_eq!(handle.scene_mode().as_deref(), Some("auto"));
}

#[tokio::test]
async fn test_flash_mode_validated_against_capabilities() {
    let h = Harness::loaded().await;
    let handle = h.handle();

    h.session.set_flash_mode("torch");
    assert!(handle.flash_mode().is_none());

    h.session.set_flash_mode("on");
    assert_eq!(handle.flash_mode().as_deref(), Some("on"));
}

#[tokio::test]
async fn test_mode_setters_never_configure() {
    let mut h = Harness::loaded().await;
    h.session.set_iso_mode("100");
    h.session.set_white_balance("sunny");
    h.session.set_hdr(HdrMode::On);
    settle().await;

    assert!(h.configurations().is_empty());
    assert!(h.kinds().is_empty());
}

#[tokio::test]
async fn test_mode_setters_without_camera_are_ignored() {
    let h = Harness::new();
    h.session.set_iso_mode("auto");
    h.session.set_white_balance("auto");
    h.session.set_hdr(HdrMode::On);
    h.session.set_flash_mode("on");
    assert!(h.device.calls().is_empty());
}

// ═══════════════════════════════════════════════════════════════════════════
// MODE & CAMERA SELECTION
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_set_mode_configures_only_on_change() {
    let h = Harness::loaded().await;
    h.session.set_mode(CameraMode::Picture);
    settle().await;
    assert!(h.configurations().is_empty());

    h.session.set_mode(CameraMode::Video);
    settle().await;
    assert_eq!(h.session.mode(), CameraMode::Video);
    assert_eq!(h.configurations().len(), 1);
}

#[tokio::test]
async fn test_toggle_camera_flips_selection_without_loading() {
    let h = Harness::new();
    assert_eq!(h.session.selected_camera(), CameraId::Back);
    assert_eq!(h.session.toggle_camera(), CameraId::Front);
    assert_eq!(h.session.toggle_camera(), CameraId::Back);
    assert!(h.device.calls().is_empty());
    assert_eq!(
        h.session.available_cameras(),
        vec![CameraId::Back, CameraId::Front]
    );
}
