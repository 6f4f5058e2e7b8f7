//! Testing utilities for camsession
//!
//! Simulated hardware and storage so sessions can be driven without a
//! camera, plus a helper for letting deferred session work run.

pub mod simulated;

pub use simulated::{
    HardwareCall, SimulatedBehavior, SimulatedDevice, SimulatedHandle, SimulatedVideoStorage,
};

/// Yield enough times for spawned session tasks (deferred configure,
/// hardware event forwarding) to run to completion.
pub async fn settle() {
    for _ in 0..64 {
        tokio::task::yield_now().await;
    }
}
