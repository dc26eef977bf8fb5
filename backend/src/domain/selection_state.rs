//! Application-scoped current-value cells.
//!
//! `SelectedDogCell` holds the dog every tracker screen and the calorie
//! accounting act on. `DogStatusCell` holds the startup resolution state.
//! Both are owned by `AppState` and cloned into the services that write them;
//! readers only get receivers or snapshots.

use shared::{Dog, DogStatus, EntityId};
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Clone, Debug)]
pub struct SelectedDogCell {
    sender: Arc<watch::Sender<Option<Dog>>>,
}

impl Default for SelectedDogCell {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectedDogCell {
    pub fn new() -> Self {
        Self {
            sender: Arc::new(watch::channel(None).0),
        }
    }

    pub fn current(&self) -> Option<Dog> {
        self.sender.borrow().clone()
    }

    pub fn current_id(&self) -> Option<EntityId> {
        self.sender.borrow().as_ref().map(|dog| dog.id)
    }

    /// Receiver that always starts at the latest value
    pub fn subscribe(&self) -> watch::Receiver<Option<Dog>> {
        self.sender.subscribe()
    }

    pub(crate) fn publish(&self, dog: Option<Dog>) {
        self.sender.send_replace(dog);
    }
}

#[derive(Clone, Debug)]
pub struct DogStatusCell {
    sender: Arc<watch::Sender<DogStatus>>,
}

impl Default for DogStatusCell {
    fn default() -> Self {
        Self::new()
    }
}

impl DogStatusCell {
    pub fn new() -> Self {
        Self {
            sender: Arc::new(watch::channel(DogStatus::Loading).0),
        }
    }

    pub fn current(&self) -> DogStatus {
        *self.sender.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<DogStatus> {
        self.sender.subscribe()
    }

    pub(crate) fn set(&self, status: DogStatus) {
        self.sender.send_replace(status);
    }
}
