//! Configuration pipeline tests: debounce, deferral while busy, and the
//! configured flag.
//!
//! Run with: cargo test --test configure_test

mod common;

use camsession::testing::{settle, SimulatedBehavior};
use camsession::{
    CameraError, CameraEvent, CameraMode, EventKind, HardwareConfig, SetOptions, Size,
};
use common::{count_of, Harness};

// ═══════════════════════════════════════════════════════════════════════════
// APPLICATION
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_configure_without_camera_is_noop() {
    let mut h = Harness::new();
    h.session.configure();
    settle().await;

    assert!(h.device.calls().is_empty());
    assert!(h.kinds().is_empty());
    assert!(!h.session.is_configured());
}

#[tokio::test]
async fn test_configure_pushes_mode_preview_and_profile() {
    let h = Harness::loaded().await;
    h.session
        .set_recorder_profile(Some("720p"), SetOptions::NO_CONFIGURE);
    h.session
        .set_picture_size(Some(Size::new(1600, 1200)), SetOptions::NO_CONFIGURE);
    assert!(h.configurations().is_empty());

    h.session.configure();
    settle().await;

    // 4:3 picture, so the largest 4:3 preview
    assert_eq!(
        h.configurations(),
        vec![HardwareConfig {
            mode: CameraMode::Picture,
            preview_size: Some(Size::new(640, 480)),
            recorder_profile: Some("720p".to_string()),
        }]
    );
}

#[tokio::test]
async fn test_video_mode_previews_at_profile_aspect() {
    let h = Harness::loaded().await;
    h.session
        .set_recorder_profile(Some("1080p"), SetOptions::NO_CONFIGURE);
    h.session.set_mode(CameraMode::Video);
    settle().await;

    let configs = h.configurations();
    assert_eq!(configs.len(), 1);
    assert_eq!(configs[0].mode, CameraMode::Video);
    assert_eq!(configs[0].preview_size, Some(Size::new(1920, 1080)));
}

#[tokio::test]
async fn test_configure_emits_busy_configured_ready() {
    let mut h = Harness::loaded().await;
    h.session.configure();
    assert!(!h.session.is_configured(), "flag drops as soon as configure is requested");
    settle().await;

    assert_eq!(
        h.kinds(),
        vec![EventKind::Busy, EventKind::Configured, EventKind::Ready]
    );
    assert!(h.session.is_configured());
    assert!(!h.session.is_busy());
    assert_eq!(h.session.hardware_config(), h.configurations().pop());
}

// ═══════════════════════════════════════════════════════════════════════════
// DEBOUNCE
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_synchronous_configures_coalesce_into_latest_state() {
    let h = Harness::loaded().await;

    h.session.configure();
    h.session
        .set_recorder_profile(Some("720p"), SetOptions::default());
    h.session.configure();
    h.session
        .set_recorder_profile(Some("cif"), SetOptions::default());
    h.session.set_mode(CameraMode::Video);
    h.session.configure();
    settle().await;

    let configs = h.configurations();
    assert_eq!(configs.len(), 1, "one application per turn: {:?}", configs);
    assert_eq!(configs[0].mode, CameraMode::Video);
    assert_eq!(configs[0].recorder_profile.as_deref(), Some("cif"));
    // No 352x288-shaped preview is advertised, so the largest wins.
    assert_eq!(configs[0].preview_size, Some(Size::new(1920, 1080)));
}

#[tokio::test]
async fn test_configures_in_separate_turns_apply_separately() {
    let h = Harness::loaded().await;

    h.session.configure();
    settle().await;
    h.session.configure();
    settle().await;

    assert_eq!(h.configurations().len(), 2);
}

// ═══════════════════════════════════════════════════════════════════════════
// BUSY DEFERRAL
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_configure_while_busy_waits_for_ready() {
    let h = Harness::loaded().await;
    h.session.on_preview_state_change("stopped");
    assert!(h.session.is_busy());

    h.session.configure();
    h.session.configure();
    settle().await;
    assert!(h.configurations().is_empty());
    assert!(!h.session.is_configured());

    h.session.on_preview_state_change("started");
    settle().await;
    assert_eq!(h.configurations().len(), 1, "deferred configure runs exactly once");
    assert!(h.session.is_configured());

    h.session.on_preview_state_change("started");
    settle().await;
    assert_eq!(h.configurations().len(), 1);
}

#[tokio::test]
async fn test_superseded_application_is_not_configured() {
    let mut h = Harness::loaded().await;
    h.device.hold_configuration();

    h.session.configure();
    settle().await;
    assert!(h.session.is_busy(), "first application in flight");

    h.session
        .set_recorder_profile(Some("cif"), SetOptions::default());
    settle().await;
    assert_eq!(h.configurations().len(), 1);

    h.device.resume_configuration();
    settle().await;

    let configs = h.configurations();
    assert_eq!(configs.len(), 2);
    assert_eq!(configs[1].recorder_profile.as_deref(), Some("cif"));
    assert!(h.session.is_configured());

    let events = h.events.drain();
    assert_eq!(count_of(&events, EventKind::Configured), 1);
    assert_eq!(h.session.hardware_config(), Some(configs[1].clone()));
}

// ═══════════════════════════════════════════════════════════════════════════
// FAILURE
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_configuration_failure_emits_error_and_ready() {
    let behavior = SimulatedBehavior {
        configuration_error: Some("bad preview size".to_string()),
        ..Default::default()
    };
    let mut h = Harness::loaded_with(behavior, |b| b.cache_config(true)).await;

    h.session.configure();
    settle().await;

    let events = h.events.drain();
    let kinds: Vec<_> = events.iter().map(CameraEvent::kind).collect();
    assert_eq!(kinds, vec![EventKind::Busy, EventKind::Error, EventKind::Ready]);
    assert!(matches!(
        &events[1],
        CameraEvent::Error(CameraError::ConfigurationError(e)) if e.message() == "bad preview size"
    ));
    assert!(!h.session.is_configured());
    assert!(!h.session.is_busy());
    assert!(h.store.is_empty(), "failed configuration is not cached");
}
