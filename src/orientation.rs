//! Device orientation sources

use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

pub trait OrientationSource: Send + Sync {
    /// Current rotation in degrees
    fn get(&self) -> i32;
    fn start(&self);
    fn stop(&self);
}

/// Orientation that never changes
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedOrientation(pub i32);

impl OrientationSource for FixedOrientation {
    fn get(&self) -> i32 {
        self.0
    }

    fn start(&self) {}

    fn stop(&self) {}
}

/// Orientation reading fed by the host's sensor callbacks.
///
/// While observation is stopped, updates are dropped and the last reading
/// stays locked in.
#[derive(Debug)]
pub struct SharedOrientation {
    degrees: AtomicI32,
    observing: AtomicBool,
}

impl SharedOrientation {
    pub fn new(initial: i32) -> Self {
        Self {
            degrees: AtomicI32::new(initial),
            observing: AtomicBool::new(true),
        }
    }

    /// Feed a new sensor reading; returns whether it was accepted
    pub fn update(&self, degrees: i32) -> bool {
        if !self.observing.load(Ordering::Acquire) {
            return false;
        }
        self.degrees.store(degrees, Ordering::Release);
        true
    }

    pub fn is_observing(&self) -> bool {
        self.observing.load(Ordering::Acquire)
    }
}

impl Default for SharedOrientation {
    fn default() -> Self {
        Self::new(0)
    }
}

impl OrientationSource for SharedOrientation {
    fn get(&self) -> i32 {
        self.degrees.load(Ordering::Acquire)
    }

    fn start(&self) {
        self.observing.store(true, Ordering::Release);
    }

    fn stop(&self) {
        self.observing.store(false, Ordering::Release);
    }
}
