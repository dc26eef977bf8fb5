//! Startup resolution of the selected dog.
//!
//! ```text
//! Loading --(selected dog found)--> Success
//! Loading --(timeout, none found)--> NoDogs
//! Success --(user selects a dog)--> Success
//! NoDogs  --(dog added)-----------> Success
//! Success --(selected dog deleted)-> NoDogs
//! ```

use anyhow::Result;
use shared::{DogList, DogStatus};
use std::time::Duration;
use tracing::{info, warn};

use crate::domain::dog_service::DogService;
use crate::domain::projections::Projection;
use crate::domain::selection_state::DogStatusCell;

#[derive(Clone)]
pub struct StartupService {
    dog_service: DogService,
    dog_list: Projection<DogList>,
    status: DogStatusCell,
    settle_delay: Duration,
    no_dogs_timeout: Duration,
}

impl StartupService {
    pub fn new(
        dog_service: DogService,
        dog_list: Projection<DogList>,
        status: DogStatusCell,
        settle_delay: Duration,
        no_dogs_timeout: Duration,
    ) -> Self {
        Self {
            dog_service,
            dog_list,
            status,
            settle_delay,
            no_dogs_timeout,
        }
    }

    /// Resolve the selected dog, then reset its calorie counter if the day changed
    pub async fn run(&self) -> Result<DogStatus> {
        let status = self.resolve_selected_dog().await?;
        if status == DogStatus::Success && self.dog_service.check_date_rollover().await? {
            info!("Daily calorie counter reset for a new day");
        }
        Ok(status)
    }

    /// Drive the Loading state to Success or NoDogs
    pub async fn resolve_selected_dog(&self) -> Result<DogStatus> {
        self.status.set(DogStatus::Loading);
        let dogs = self.dog_list.subscribe();

        tokio::time::sleep(self.settle_delay).await;

        let list = dogs.current();
        if let Some(dog) = list.selected() {
            info!("Restoring selected dog: {} with ID: {}", dog.name, dog.id);
            self.dog_service.select_dog(dog).await?;
        }

        if self.status.current() != DogStatus::Success {
            tokio::time::sleep(self.no_dogs_timeout).await;

            if self.status.current() == DogStatus::Loading {
                warn!(
                    "No selected dog after {:?}, {} dogs loaded",
                    self.no_dogs_timeout,
                    list.dogs.len()
                );
                self.status.set(DogStatus::NoDogs);
            }
        }

        let status = self.status.current();
        info!("Startup dog resolution finished: {}", status);
        Ok(status)
    }
}
