//! Food logging and the selected dog's daily calorie counter.
//!
//! The counter lives on the dog row (`daily_current_calories`) and is kept
//! incrementally: adding a meal dated today raises it, deleting any meal
//! lowers it, floored at zero. `stored_date` marks the day it belongs to and
//! `DogService::check_date_rollover` zeroes it when that day has passed.

use anyhow::Result;
use shared::{Dog, EntityId, Food, UNASSIGNED_ID};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::calendar::CalendarService;
use crate::domain::errors::{parse_count, TrackerError};
use crate::domain::selection_state::SelectedDogCell;
use crate::domain::WriteLock;
use crate::storage::{DogStorage, FoodStorage};

#[derive(Clone)]
pub struct FoodService {
    food_repository: Arc<dyn FoodStorage>,
    dog_repository: Arc<dyn DogStorage>,
    calendar: CalendarService,
    selected_dog: SelectedDogCell,
    write_lock: WriteLock,
}

impl FoodService {
    pub fn new(
        food_repository: Arc<dyn FoodStorage>,
        dog_repository: Arc<dyn DogStorage>,
        calendar: CalendarService,
        selected_dog: SelectedDogCell,
        write_lock: WriteLock,
    ) -> Self {
        Self {
            food_repository,
            dog_repository,
            calendar,
            selected_dog,
            write_lock,
        }
    }

    pub async fn list_foods(&self) -> Result<Vec<Food>> {
        self.food_repository.list_all().await
    }

    /// Store a meal and account its calories to the selected dog.
    ///
    /// An empty date defaults to today and an unassigned dog id to the
    /// selected dog. Calories only count when the meal is dated today.
    /// Returns `None` if a food row with the same id already exists; the
    /// counter is left untouched in that case.
    pub async fn add_food(&self, food: Food) -> Result<Option<Food>> {
        let _guard = self.write_lock.lock().await;

        let mut dog = self.selected_dog_in_storage().await?;

        let mut food = food;
        if food.date.trim().is_empty() {
            food.date = self.calendar.today();
        }
        if food.dog_id == UNASSIGNED_ID {
            food.dog_id = dog.id;
        }

        let Some(food_id) = self.food_repository.insert(&food).await? else {
            warn!("Food {} already exists, calories not counted again", food.id);
            return Ok(None);
        };
        food.id = food_id;

        if self.calendar.is_today(&food.date) {
            let total = parse_count(&dog.daily_current_calories)
                .saturating_add(parse_count(&food.calories));
            dog.daily_current_calories = total.to_string();
        } else {
            debug!("Food {} dated {} does not count toward today", food.id, food.date);
        }

        info!(
            "Logged {} calories of {} for dog {} (today: {})",
            food.calories, food.food_type, dog.id, dog.daily_current_calories
        );
        self.dog_repository.update(&dog).await?;
        self.selected_dog.publish(Some(dog));
        Ok(Some(food))
    }

    /// Delete a meal and take its calories off the selected dog's counter,
    /// whatever the meal's date. Returns false if the row did not exist.
    pub async fn delete_food(&self, food: &Food) -> Result<bool> {
        let _guard = self.write_lock.lock().await;

        let mut dog = self.selected_dog_in_storage().await?;

        if !self.food_repository.delete(food).await? {
            warn!("Food not found: {}", food.id);
            return Ok(false);
        }

        let remaining = parse_count(&dog.daily_current_calories)
            .saturating_sub(parse_count(&food.calories))
            .max(0);
        dog.daily_current_calories = remaining.to_string();

        info!("Removed food {} for dog {} (today: {})", food.id, dog.id, remaining);
        self.dog_repository.update(&dog).await?;
        self.selected_dog.publish(Some(dog));
        Ok(true)
    }

    /// Calories over every food row of every dog and date
    pub async fn calculate_daily_calories(&self) -> Result<i64> {
        self.food_repository.calculate_daily_calories().await
    }

    /// Calories logged for one dog on one date
    pub async fn calories_for(&self, dog_id: EntityId, date: &str) -> Result<i64> {
        self.food_repository.sum_calories_for(dog_id, date).await
    }

    /// Rebuild the selected dog's counter from its food rows for today.
    /// Returns the updated dog, or `None` when no dog is selected.
    pub async fn recalculate_selected_dog(&self) -> Result<Option<Dog>> {
        let _guard = self.write_lock.lock().await;

        let Some(mut dog) = self.dog_repository.get_selected_dog().await? else {
            return Ok(None);
        };

        let today = self.calendar.today();
        let total = self.food_repository.sum_calories_for(dog.id, &today).await?;
        dog.daily_current_calories = total.max(0).to_string();
        dog.stored_date = today;

        self.dog_repository.update(&dog).await?;
        self.selected_dog.publish(Some(dog.clone()));
        Ok(Some(dog))
    }

    async fn selected_dog_in_storage(&self) -> Result<Dog> {
        self.dog_repository
            .get_selected_dog()
            .await?
            .ok_or_else(|| TrackerError::NoSelectedDog.into())
    }
}
