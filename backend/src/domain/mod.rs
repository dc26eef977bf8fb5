//! # Domain Module
//!
//! Business logic of the tracker, sitting between storage and whatever
//! presents the data.
//!
//! ## Services
//!
//! - **DogService** - dog management, the selection protocol and date rollover
//! - **FoodService** - meal logging and the selected dog's calorie counter
//! - **BathroomService** / **WalkService** - entry logging with date/time defaults
//! - **StartupService** - resolves the selected dog when the app starts
//! - **CalendarService** - formatted "today" and "now" from an injectable clock
//!
//! ## Shared state
//!
//! - **SelectedDogCell** / **DogStatusCell** - application-scoped current values
//! - **ProjectionSet** - cached list views of the four tables
//! - **WriteLock** - serializes every read-modify-write of a dog row

use std::sync::Arc;
use tokio::sync::Mutex;

pub mod bathroom_service;
pub mod calendar;
pub mod dog_service;
pub mod errors;
pub mod food_service;
pub mod projections;
pub mod selection_state;
pub mod startup;
pub mod walk_service;

pub use bathroom_service::BathroomService;
pub use calendar::{CalendarService, Clock, FixedClock, SystemClock};
pub use dog_service::DogService;
pub use errors::TrackerError;
pub use food_service::FoodService;
pub use projections::{Projection, ProjectionSet, ProjectionSubscription};
pub use selection_state::{DogStatusCell, SelectedDogCell};
pub use startup::StartupService;
pub use walk_service::WalkService;

/// Lock held by every protocol that reads a dog row and writes it back
pub type WriteLock = Arc<Mutex<()>>;

pub fn new_write_lock() -> WriteLock {
    Arc::new(Mutex::new(()))
}
