//! Typed session events
//!
//! The session publishes every lifecycle transition on a broadcast channel.
//! Consumers either take the whole stream or subscribe to a set of kinds.

use crate::errors::CameraError;
use crate::types::{Capabilities, FocusState};
use bytes::Bytes;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::broadcast;

const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub enum CameraEvent {
    Busy,
    Ready,
    Configured,
    Released,
    NewCamera(Capabilities),
    NewImage { blob: Bytes },
    NewVideo { filepath: PathBuf, duration: Duration },
    FocusChange(FocusState),
    RecordingChange(bool),
    VideoTime(Duration),
    Shutter,
    FileSizeLimitReached,
    RecordingError(CameraError),
    Error(CameraError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Busy,
    Ready,
    Configured,
    Released,
    NewCamera,
    NewImage,
    NewVideo,
    FocusChange,
    RecordingChange,
    VideoTime,
    Shutter,
    FileSizeLimitReached,
    RecordingError,
    Error,
}

impl CameraEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            CameraEvent::Busy => EventKind::Busy,
            CameraEvent::Ready => EventKind::Ready,
            CameraEvent::Configured => EventKind::Configured,
            CameraEvent::Released => EventKind::Released,
            CameraEvent::NewCamera(_) => EventKind::NewCamera,
            CameraEvent::NewImage { .. } => EventKind::NewImage,
            CameraEvent::NewVideo { .. } => EventKind::NewVideo,
            CameraEvent::FocusChange(_) => EventKind::FocusChange,
            CameraEvent::RecordingChange(_) => EventKind::RecordingChange,
            CameraEvent::VideoTime(_) => EventKind::VideoTime,
            CameraEvent::Shutter => EventKind::Shutter,
            CameraEvent::FileSizeLimitReached => EventKind::FileSizeLimitReached,
            CameraEvent::RecordingError(_) => EventKind::RecordingError,
            CameraEvent::Error(_) => EventKind::Error,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CameraEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        Self { sender }
    }

    pub fn emit(&self, event: CameraEvent) {
        log::debug!("emit {:?}", event.kind());
        // No subscribers is fine.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> EventStream {
        EventStream {
            receiver: self.sender.subscribe(),
            kinds: None,
        }
    }

    pub fn subscribe_to(&self, kinds: &[EventKind]) -> EventStream {
        EventStream {
            receiver: self.sender.subscribe(),
            kinds: Some(kinds.to_vec()),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// One subscriber's view of the event stream
pub struct EventStream {
    receiver: broadcast::Receiver<CameraEvent>,
    kinds: Option<Vec<EventKind>>,
}

impl EventStream {
    fn wants(&self, event: &CameraEvent) -> bool {
        self.kinds
            .as_ref()
            .map_or(true, |kinds| kinds.contains(&event.kind()))
    }

    /// Wait for the next matching event; `None` once the session is gone.
    pub async fn recv(&mut self) -> Option<CameraEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.wants(&event) => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    log::warn!("event subscriber lagged, {} events dropped", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Next matching event already queued, without waiting
    pub fn try_recv(&mut self) -> Option<CameraEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.wants(&event) => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    log::warn!("event subscriber lagged, {} events dropped", skipped);
                }
                Err(_) => return None,
            }
        }
    }

    /// All matching events queued so far
    pub fn drain(&mut self) -> Vec<CameraEvent> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }

    pub fn drain_kinds(&mut self) -> Vec<EventKind> {
        self.drain().iter().map(CameraEvent::kind).collect()
    }
}
