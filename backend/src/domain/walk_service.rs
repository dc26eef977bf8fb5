use anyhow::Result;
use shared::{Walk, UNASSIGNED_ID};
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::calendar::CalendarService;
use crate::domain::selection_state::SelectedDogCell;
use crate::storage::WalkStorage;

/// Service for logging walks
#[derive(Clone)]
pub struct WalkService {
    walk_repository: Arc<dyn WalkStorage>,
    calendar: CalendarService,
    selected_dog: SelectedDogCell,
}

impl WalkService {
    pub fn new(
        walk_repository: Arc<dyn WalkStorage>,
        calendar: CalendarService,
        selected_dog: SelectedDogCell,
    ) -> Self {
        Self {
            walk_repository,
            calendar,
            selected_dog,
        }
    }

    pub async fn list_walks(&self) -> Result<Vec<Walk>> {
        self.walk_repository.list_all().await
    }

    /// Log a walk, defaulting empty date and time to now
    pub async fn add_walk(&self, walk: Walk) -> Result<Option<Walk>> {
        let mut walk = walk;
        if walk.date.trim().is_empty() {
            walk.date = self.calendar.today();
        }
        if walk.time.trim().is_empty() {
            walk.time = self.calendar.current_time();
        }
        if walk.dog_id == UNASSIGNED_ID {
            if let Some(dog_id) = self.selected_dog.current_id() {
                walk.dog_id = dog_id;
            }
        }

        let Some(id) = self.walk_repository.insert(&walk).await? else {
            warn!("Walk {} already exists", walk.id);
            return Ok(None);
        };

        info!("Logged walk {} of {} for dog {}", id, walk.duration, walk.dog_id);
        Ok(Some(Walk { id, ..walk }))
    }

    pub async fn delete_walk(&self, walk: &Walk) -> Result<bool> {
        self.walk_repository.delete(walk).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{clock_at, TestEnvironment};

    #[tokio::test]
    async fn test_add_walk_defaults_to_now() {
        let env = TestEnvironment::new().await.unwrap();
        let app = env.app_state(clock_at(2024, 11, 30, 16, 20));

        let walk = app
            .walk_service
            .add_walk(Walk { dog_id: 2, duration: "25 mins".to_string(), ..Default::default() })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(walk.date, "11/30/24");
        assert_eq!(walk.time, "04:20 PM");
        assert_eq!(walk.dog_id, 2);
        assert_eq!(walk.duration, "25 mins");
    }

    #[tokio::test]
    async fn test_walk_without_selected_dog_stays_unassigned() {
        let env = TestEnvironment::new().await.unwrap();
        let app = env.app_state(clock_at(2024, 11, 30, 16, 20));

        let walk = app.walk_service.add_walk(Walk::default()).await.unwrap().unwrap();
        assert_eq!(walk.dog_id, UNASSIGNED_ID);

        assert!(app.walk_service.delete_walk(&walk).await.unwrap());
        assert!(app.walk_service.list_walks().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_walk_is_ignored() {
        let env = TestEnvironment::new().await.unwrap();
        let app = env.app_state(clock_at(2024, 11, 30, 16, 20));

        let walk = app.walk_service.add_walk(Walk::default()).await.unwrap().unwrap();
        let again = app.walk_service.add_walk(walk.clone()).await.unwrap();

        assert!(again.is_none());
        assert_eq!(app.walk_service.list_walks().await.unwrap(), vec![walk]);
    }
}
