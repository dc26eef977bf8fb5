use anyhow::Result;
use shared::{Bathroom, UNASSIGNED_ID};
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::calendar::CalendarService;
use crate::domain::selection_state::SelectedDogCell;
use crate::storage::BathroomStorage;

/// Service for logging bathroom breaks
#[derive(Clone)]
pub struct BathroomService {
    bathroom_repository: Arc<dyn BathroomStorage>,
    calendar: CalendarService,
    selected_dog: SelectedDogCell,
}

impl BathroomService {
    pub fn new(
        bathroom_repository: Arc<dyn BathroomStorage>,
        calendar: CalendarService,
        selected_dog: SelectedDogCell,
    ) -> Self {
        Self {
            bathroom_repository,
            calendar,
            selected_dog,
        }
    }

    pub async fn list_bathrooms(&self) -> Result<Vec<Bathroom>> {
        self.bathroom_repository.list_all().await
    }

    /// Log a bathroom break. Empty date and time default to now and an
    /// unassigned dog id to the selected dog.
    pub async fn add_bathroom(&self, bathroom: Bathroom) -> Result<Option<Bathroom>> {
        let mut bathroom = bathroom;
        if bathroom.date.trim().is_empty() {
            bathroom.date = self.calendar.today();
        }
        if bathroom.time.trim().is_empty() {
            bathroom.time = self.calendar.current_time();
        }
        if bathroom.dog_id == UNASSIGNED_ID {
            if let Some(dog_id) = self.selected_dog.current_id() {
                bathroom.dog_id = dog_id;
            }
        }

        match self.bathroom_repository.insert(&bathroom).await? {
            Some(id) => {
                info!(
                    "Logged bathroom break {} ({}) for dog {}",
                    id, bathroom.bathroom_type, bathroom.dog_id
                );
                Ok(Some(Bathroom { id, ..bathroom }))
            }
            None => {
                warn!("Bathroom entry {} already exists", bathroom.id);
                Ok(None)
            }
        }
    }

    pub async fn delete_bathroom(&self, bathroom: &Bathroom) -> Result<bool> {
        let deleted = self.bathroom_repository.delete(bathroom).await?;
        if !deleted {
            warn!("Bathroom entry not found: {}", bathroom.id);
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{clock_at, TestEnvironment};
    use shared::Dog;

    #[tokio::test]
    async fn test_add_bathroom_fills_defaults() {
        let env = TestEnvironment::new().await.unwrap();
        let app = env.app_state(clock_at(2024, 3, 9, 7, 45));
        let rex = app
            .dog_service
            .add_dog(Dog { name: "Rex".to_string(), ..Default::default() })
            .await
            .unwrap()
            .unwrap();

        let entry = app
            .bathroom_service
            .add_bathroom(Bathroom { bathroom_type: "pee".to_string(), ..Default::default() })
            .await
            .unwrap()
            .unwrap();

        assert!(entry.id > 0);
        assert_eq!(entry.dog_id, rex.id);
        assert_eq!(entry.date, "03/09/24");
        assert_eq!(entry.time, "07:45 AM");
        assert_eq!(app.bathroom_service.list_bathrooms().await.unwrap(), vec![entry]);
    }

    #[tokio::test]
    async fn test_explicit_values_are_kept() {
        let env = TestEnvironment::new().await.unwrap();
        let app = env.app_state(clock_at(2024, 3, 9, 7, 45));

        let entry = app
            .bathroom_service
            .add_bathroom(Bathroom {
                dog_id: 3,
                date: "03/08/24".to_string(),
                time: "11:15 PM".to_string(),
                bathroom_type: "poop".to_string(),
                ..Default::default()
            })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(entry.dog_id, 3);
        assert_eq!(entry.date, "03/08/24");
        assert_eq!(entry.time, "11:15 PM");
    }

    #[tokio::test]
    async fn test_delete_bathroom() {
        let env = TestEnvironment::new().await.unwrap();
        let app = env.app_state(clock_at(2024, 3, 9, 7, 45));

        let entry = app
            .bathroom_service
            .add_bathroom(Bathroom::default())
            .await
            .unwrap()
            .unwrap();

        assert!(app.bathroom_service.delete_bathroom(&entry).await.unwrap());
        assert!(!app.bathroom_service.delete_bathroom(&entry).await.unwrap());
        assert!(app.bathroom_service.list_bathrooms().await.unwrap().is_empty());
    }
}
