//! Recording timer
//!
//! Tracks elapsed recording time from a single monotonic start instant and
//! publishes a `VideoTime` tick once per period.

use crate::events::{CameraEvent, EventBus};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

pub const VIDEO_TICK: Duration = Duration::from_secs(1);

/// Elapsed-time timer for an active recording
///
/// The tick task is aborted when the timer is dropped.
#[derive(Debug)]
pub struct VideoTimer {
    start: Instant,
    task: JoinHandle<()>,
}

impl VideoTimer {
    /// Start ticking; must be called inside a tokio runtime
    pub fn start(events: EventBus, period: Duration) -> Self {
        let start = Instant::now();
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(start + period, period);
            loop {
                interval.tick().await;
                events.emit(CameraEvent::VideoTime(start.elapsed()));
            }
        });
        Self { start, task }
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop ticking and return the total elapsed time
    pub fn stop(self) -> Duration {
        self.elapsed()
    }
}

impl Drop for VideoTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}
