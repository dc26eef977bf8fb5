//! Dog management and the selection protocol.
//!
//! Every operation that reads and then rewrites a dog row holds the shared
//! write lock, so a selection, an edit, a rollover and the calorie accounting
//! in `FoodService` can never interleave and overwrite each other's changes.

use anyhow::Result;
use shared::{Dog, DogStatus, EntityId};
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::calendar::CalendarService;
use crate::domain::errors::TrackerError;
use crate::domain::selection_state::{DogStatusCell, SelectedDogCell};
use crate::domain::WriteLock;
use crate::storage::{BathroomStorage, DogStorage, FoodStorage, WalkStorage};

/// Service for managing dogs and which one is selected
#[derive(Clone)]
pub struct DogService {
    dog_repository: Arc<dyn DogStorage>,
    bathroom_repository: Arc<dyn BathroomStorage>,
    food_repository: Arc<dyn FoodStorage>,
    walk_repository: Arc<dyn WalkStorage>,
    calendar: CalendarService,
    selected_dog: SelectedDogCell,
    status: DogStatusCell,
    write_lock: WriteLock,
    cascade_delete: bool,
}

impl DogService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        dog_repository: Arc<dyn DogStorage>,
        bathroom_repository: Arc<dyn BathroomStorage>,
        food_repository: Arc<dyn FoodStorage>,
        walk_repository: Arc<dyn WalkStorage>,
        calendar: CalendarService,
        selected_dog: SelectedDogCell,
        status: DogStatusCell,
        write_lock: WriteLock,
        cascade_delete: bool,
    ) -> Self {
        Self {
            dog_repository,
            bathroom_repository,
            food_repository,
            walk_repository,
            calendar,
            selected_dog,
            status,
            write_lock,
            cascade_delete,
        }
    }

    /// List all dogs ordered by name
    pub async fn list_dogs(&self) -> Result<Vec<Dog>> {
        self.dog_repository.list_all().await
    }

    /// The dog flagged as selected in storage, if any
    pub async fn get_selected_dog(&self) -> Result<Option<Dog>> {
        self.dog_repository.get_selected_dog().await
    }

    /// Store a new dog and select it.
    /// Returns `None` if a dog with the same id already exists.
    pub async fn add_dog(&self, dog: Dog) -> Result<Option<Dog>> {
        let _guard = self.write_lock.lock().await;
        info!("Adding dog: name={}", dog.name);

        let mut dog = dog;
        dog.is_selected = false;
        dog.is_edit_field_expanded = false;
        if dog.daily_current_calories.trim().is_empty() {
            dog.daily_current_calories = "0".to_string();
        }
        if dog.daily_max_calories.trim().is_empty() {
            dog.daily_max_calories = "0".to_string();
        }
        if dog.stored_date.trim().is_empty() {
            dog.stored_date = self.calendar.today();
        }

        let Some(dog_id) = self.dog_repository.insert(&dog).await? else {
            warn!("Dog {} already exists, nothing added", dog.id);
            return Ok(None);
        };

        let selected = self.select_locked(dog_id).await?;
        Ok(Some(selected))
    }

    /// Run the selection protocol for `dog`: it becomes the only selected dog
    /// in storage and the published selected dog, and startup status is Success.
    pub async fn select_dog(&self, dog: &Dog) -> Result<Dog> {
        let _guard = self.write_lock.lock().await;
        self.select_locked(dog.id).await
    }

    async fn select_locked(&self, dog_id: EntityId) -> Result<Dog> {
        if !self.dog_repository.select_dog(dog_id).await? {
            return Err(TrackerError::DogNotFound(dog_id).into());
        }

        let dog = self
            .dog_repository
            .get_dog(dog_id)
            .await?
            .ok_or(TrackerError::DogNotFound(dog_id))?;

        info!("Selected dog: {} with ID: {}", dog.name, dog.id);
        self.selected_dog.publish(Some(dog.clone()));
        self.status.set(DogStatus::Success);
        Ok(dog)
    }

    /// Save an edited dog.
    /// Selection and the calorie counter are owned by their protocols, so the
    /// stored values of `is_selected`, `daily_current_calories` and
    /// `stored_date` are kept.
    pub async fn update_dog(&self, dog: &Dog) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        info!("Updating dog: {}", dog.id);

        let Some(stored) = self.dog_repository.get_dog(dog.id).await? else {
            warn!("Dog not found: {}", dog.id);
            return Ok(false);
        };

        let updated = Dog {
            is_selected: stored.is_selected,
            daily_current_calories: stored.daily_current_calories,
            stored_date: stored.stored_date,
            ..dog.clone()
        };
        self.dog_repository.update(&updated).await?;
        self.republish_if_selected(&updated);
        Ok(true)
    }

    /// Delete a dog. With cascading enabled its entries go too; otherwise they stay orphaned.
    /// Deleting the selected dog clears the selection and moves the status to NoDogs.
    pub async fn delete_dog(&self, dog: &Dog) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        info!("Deleting dog: {}", dog.id);

        if !self.dog_repository.delete(dog).await? {
            warn!("Dog not found: {}", dog.id);
            return Ok(false);
        }

        if self.cascade_delete {
            let bathrooms = self.bathroom_repository.delete_for_dog(dog.id).await?;
            let foods = self.food_repository.delete_for_dog(dog.id).await?;
            let walks = self.walk_repository.delete_for_dog(dog.id).await?;
            info!(
                "Removed entries of dog {}: {} bathroom, {} food, {} walk",
                dog.id, bathrooms, foods, walks
            );
        }

        if self.selected_dog.current_id() == Some(dog.id) {
            info!("Deleted the selected dog, no dog is selected now");
            self.selected_dog.publish(None);
            self.status.set(DogStatus::NoDogs);
        }
        Ok(true)
    }

    /// Open the edit form of one dog
    pub async fn expand_edit_field(&self, dog: &Dog) -> Result<bool> {
        let _guard = self.write_lock.lock().await;

        let Some(mut stored) = self.dog_repository.get_dog(dog.id).await? else {
            return Ok(false);
        };
        stored.is_edit_field_expanded = true;
        self.dog_repository.update(&stored).await?;
        self.republish_if_selected(&stored);
        Ok(true)
    }

    /// Close every open edit form
    pub async fn reset_edit_field_expansion(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.dog_repository.reset_edit_field_expansion().await?;

        if let Some(mut current) = self.selected_dog.current() {
            current.is_edit_field_expanded = false;
            self.selected_dog.publish(Some(current));
        }
        Ok(())
    }

    /// Reset the selected dog's calorie counter if its stored date is not today.
    /// Returns whether a reset happened.
    pub async fn check_date_rollover(&self) -> Result<bool> {
        let _guard = self.write_lock.lock().await;

        let Some(mut dog) = self.dog_repository.get_selected_dog().await? else {
            return Ok(false);
        };

        let today = self.calendar.today();
        if dog.stored_date == today {
            return Ok(false);
        }

        info!(
            "Day changed for dog {} ({} -> {}), resetting calories",
            dog.id, dog.stored_date, today
        );
        dog.daily_current_calories = "0".to_string();
        dog.stored_date = today;
        self.dog_repository.update(&dog).await?;
        self.selected_dog.publish(Some(dog));
        Ok(true)
    }

    fn republish_if_selected(&self, dog: &Dog) {
        if self.selected_dog.current_id() == Some(dog.id) {
            self.selected_dog.publish(Some(dog.clone()));
        }
    }
}
