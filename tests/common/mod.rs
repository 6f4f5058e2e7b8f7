//! Shared fixtures for the session integration tests
#![allow(dead_code)]

use camsession::orientation::SharedOrientation;
use camsession::storage::MemoryStore;
use camsession::testing::{
    settle, HardwareCall, SimulatedBehavior, SimulatedDevice, SimulatedHandle,
    SimulatedVideoStorage,
};
use camsession::{CameraEvent, CameraSession, EventKind, EventStream, HardwareConfig, SessionBuilder};
use std::sync::Arc;

pub const DEFAULT_FREE_SPACE: u64 = 64 * 1024 * 1024;

/// A session wired to simulated hardware, with an event subscription taken
/// before anything happens.
pub struct Harness {
    pub device: SimulatedDevice,
    pub storage: Arc<SimulatedVideoStorage>,
    pub store: Arc<MemoryStore>,
    pub orientation: Arc<SharedOrientation>,
    pub session: CameraSession,
    pub events: EventStream,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(SimulatedBehavior::default(), |b| b)
    }

    pub fn build(
        behavior: SimulatedBehavior,
        customize: impl FnOnce(SessionBuilder) -> SessionBuilder,
    ) -> Self {
        let device = SimulatedDevice::with_behavior(behavior);
        let storage = Arc::new(SimulatedVideoStorage::new(DEFAULT_FREE_SPACE));
        let store = Arc::new(MemoryStore::new());
        let orientation = Arc::new(SharedOrientation::new(0));

        let builder = CameraSession::builder(Arc::new(device.clone()), storage.clone())
            .store(store.clone())
            .orientation(orientation.clone());
        let session = customize(builder).build();
        let events = session.subscribe();

        Self {
            device,
            storage,
            store,
            orientation,
            session,
            events,
        }
    }

    /// Session with the back camera loaded and the call log and event
    /// queue cleared.
    pub async fn loaded() -> Self {
        Self::loaded_with(SimulatedBehavior::default(), |b| b).await
    }

    pub async fn loaded_with(
        behavior: SimulatedBehavior,
        customize: impl FnOnce(SessionBuilder) -> SessionBuilder,
    ) -> Self {
        let mut harness = Self::build(behavior, customize);
        harness.session.load().await.expect("initial load");
        settle().await;
        harness.reset();
        harness
    }

    pub fn reset(&mut self) {
        self.device.clear_calls();
        self.events.drain();
    }

    pub fn handle(&self) -> Arc<SimulatedHandle> {
        self.device.last_handle().expect("a camera was acquired")
    }

    pub fn kinds(&mut self) -> Vec<EventKind> {
        self.events.drain_kinds()
    }

    pub fn configurations(&self) -> Vec<HardwareConfig> {
        self.device
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                HardwareCall::SetConfiguration(config) => Some(config),
                _ => None,
            })
            .collect()
    }
}

pub fn position_of(kinds: &[EventKind], kind: EventKind) -> usize {
    kinds
        .iter()
        .position(|k| *k == kind)
        .unwrap_or_else(|| panic!("{:?} not emitted in {:?}", kind, kinds))
}

pub fn count_of(events: &[CameraEvent], kind: EventKind) -> usize {
    events.iter().filter(|e| e.kind() == kind).count()
}
