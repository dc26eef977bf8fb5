//! # Dog Tracker Backend
//!
//! Local persistence and derived state for the dog wellbeing tracker.
//!
//! - **Storage**: sqlite tables for dogs and their bathroom, food and walk
//!   entries, with a change feed that re-emits a table after every write
//! - **Domain**: the selection, calorie accounting and date rollover protocols,
//!   plus the projections and current-value cells presentation subscribes to
//! - **Config**: `tracker_config.yaml` in the data directory
//!
//! ```text
//! Presentation
//!     ↓ commands            ↑ projections / cells
//! Domain (services, protocols)
//!     ↓
//! Storage (repositories, change feed, sqlite)
//! ```

pub mod config;
pub mod domain;
pub mod storage;

#[cfg(test)]
pub mod test_utils;

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::config::TrackerConfig;
use crate::domain::{
    new_write_lock, BathroomService, CalendarService, DogService, DogStatusCell, FoodService,
    ProjectionSet, SelectedDogCell, StartupService, WalkService,
};
use crate::storage::{
    BathroomRepository, BathroomStorage, DbConnection, DogRepository, DogStorage, FoodRepository,
    FoodStorage, WalkRepository, WalkStorage,
};

/// Main application state that holds all services and shared cells
#[derive(Clone)]
pub struct AppState {
    pub config: TrackerConfig,
    pub calendar: CalendarService,
    pub dog_repository: Arc<dyn DogStorage>,
    pub bathroom_repository: Arc<dyn BathroomStorage>,
    pub food_repository: Arc<dyn FoodStorage>,
    pub walk_repository: Arc<dyn WalkStorage>,
    pub selected_dog: SelectedDogCell,
    pub status: DogStatusCell,
    pub dog_service: DogService,
    pub food_service: FoodService,
    pub bathroom_service: BathroomService,
    pub walk_service: WalkService,
    pub startup: StartupService,
    pub projections: ProjectionSet,
}

impl AppState {
    /// Wire every service on top of an open database
    pub fn new(db: DbConnection, config: TrackerConfig, calendar: CalendarService) -> Self {
        let dog_repository: Arc<dyn DogStorage> = Arc::new(DogRepository::new(db.clone()));
        let bathroom_repository: Arc<dyn BathroomStorage> =
            Arc::new(BathroomRepository::new(db.clone()));
        let food_repository: Arc<dyn FoodStorage> = Arc::new(FoodRepository::new(db.clone()));
        let walk_repository: Arc<dyn WalkStorage> = Arc::new(WalkRepository::new(db));

        let selected_dog = SelectedDogCell::new();
        let status = DogStatusCell::new();
        let write_lock = new_write_lock();

        let projections = ProjectionSet::new(
            dog_repository.clone(),
            bathroom_repository.clone(),
            food_repository.clone(),
            walk_repository.clone(),
            config.projection_keepalive(),
        );

        let dog_service = DogService::new(
            dog_repository.clone(),
            bathroom_repository.clone(),
            food_repository.clone(),
            walk_repository.clone(),
            calendar.clone(),
            selected_dog.clone(),
            status.clone(),
            write_lock.clone(),
            config.cascade_dog_delete,
        );
        let food_service = FoodService::new(
            food_repository.clone(),
            dog_repository.clone(),
            calendar.clone(),
            selected_dog.clone(),
            write_lock,
        );
        let bathroom_service =
            BathroomService::new(bathroom_repository.clone(), calendar.clone(), selected_dog.clone());
        let walk_service =
            WalkService::new(walk_repository.clone(), calendar.clone(), selected_dog.clone());
        let startup = StartupService::new(
            dog_service.clone(),
            projections.dog_list.clone(),
            status.clone(),
            config.startup_settle_delay(),
            config.no_dogs_timeout(),
        );

        Self {
            config,
            calendar,
            dog_repository,
            bathroom_repository,
            food_repository,
            walk_repository,
            selected_dog,
            status,
            dog_service,
            food_service,
            bathroom_service,
            walk_service,
            startup,
            projections,
        }
    }
}

/// Initialize the backend from a data directory, using the wall clock
pub async fn initialize_backend(data_dir: &Path) -> Result<AppState> {
    let config = TrackerConfig::load_or_create(data_dir)?;
    initialize_backend_with(data_dir, config, CalendarService::default()).await
}

/// Initialize the backend with an explicit config and calendar
pub async fn initialize_backend_with(
    data_dir: &Path,
    config: TrackerConfig,
    calendar: CalendarService,
) -> Result<AppState> {
    info!("Setting up database");
    let db = DbConnection::new(&config.database_path(data_dir), config.max_connections).await?;

    info!("Setting up domain model");
    Ok(AppState::new(db, config, calendar))
}
