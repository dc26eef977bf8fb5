use anyhow::Result;
use async_trait::async_trait;
use shared::{Dog, EntityId};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::{debug, info};

use super::assigned_id;
use crate::domain::errors::TrackerError;
use crate::storage::change_feed::{snapshot_stream, EntityStream, Table};
use crate::storage::connection::DbConnection;
use crate::storage::traits::{DogStorage, EntityStorage};

const DOG_COLUMNS: &str = "id, is_selected, name, age, breed, weight, daily_current_calories, \
     daily_max_calories, sex, picture, is_edit_field_expanded, stored_date";

/// Repository for dog operations
#[derive(Clone)]
pub struct DogRepository {
    db: DbConnection,
}

impl DogRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn row_to_dog(row: &SqliteRow) -> Dog {
        Dog {
            id: row.get("id"),
            is_selected: row.get("is_selected"),
            name: row.get("name"),
            age: row.get("age"),
            breed: row.get("breed"),
            weight: row.get("weight"),
            daily_current_calories: row.get("daily_current_calories"),
            daily_max_calories: row.get("daily_max_calories"),
            sex: row.get("sex"),
            picture: row.get("picture"),
            is_edit_field_expanded: row.get("is_edit_field_expanded"),
            stored_date: row.get("stored_date"),
        }
    }
}

#[async_trait]
impl EntityStorage<Dog> for DogRepository {
    fn observe_all(&self) -> EntityStream<Dog> {
        let repository = self.clone();
        snapshot_stream(self.db.subscribe(Table::Dogs), move || {
            let repository = repository.clone();
            async move { repository.list_all().await }
        })
    }

    /// List all dogs ordered by name
    async fn list_all(&self) -> Result<Vec<Dog>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM dogs ORDER BY name ASC, id ASC",
            DOG_COLUMNS
        ))
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.iter().map(Self::row_to_dog).collect())
    }

    async fn insert(&self, dog: &Dog) -> Result<Option<EntityId>> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO dogs (id, is_selected, name, age, breed, weight,
                daily_current_calories, daily_max_calories, sex, picture,
                is_edit_field_expanded, stored_date)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(assigned_id(dog.id))
        .bind(dog.is_selected)
        .bind(&dog.name)
        .bind(&dog.age)
        .bind(&dog.breed)
        .bind(&dog.weight)
        .bind(&dog.daily_current_calories)
        .bind(&dog.daily_max_calories)
        .bind(&dog.sex)
        .bind(&dog.picture)
        .bind(dog.is_edit_field_expanded)
        .bind(&dog.stored_date)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() == 0 {
            debug!("Ignored duplicate dog insert for id {}", dog.id);
            return Ok(None);
        }

        let id = result.last_insert_rowid();
        info!("Stored dog '{}' with id {}", dog.name, id);
        self.db.notify(Table::Dogs);
        Ok(Some(id))
    }

    async fn delete(&self, dog: &Dog) -> Result<bool> {
        let result = sqlx::query("DELETE FROM dogs WHERE id = ?")
            .bind(dog.id)
            .execute(self.db.pool())
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            self.db.notify(Table::Dogs);
        }
        Ok(deleted)
    }
}

#[async_trait]
impl DogStorage for DogRepository {
    async fn get_dog(&self, dog_id: EntityId) -> Result<Option<Dog>> {
        let row = sqlx::query(&format!("SELECT {} FROM dogs WHERE id = ?", DOG_COLUMNS))
            .bind(dog_id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.as_ref().map(Self::row_to_dog))
    }

    async fn update(&self, dog: &Dog) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE dogs
            SET is_selected = ?, name = ?, age = ?, breed = ?, weight = ?,
                daily_current_calories = ?, daily_max_calories = ?, sex = ?,
                picture = ?, is_edit_field_expanded = ?, stored_date = ?
            WHERE id = ?
            "#,
        )
        .bind(dog.is_selected)
        .bind(&dog.name)
        .bind(&dog.age)
        .bind(&dog.breed)
        .bind(&dog.weight)
        .bind(&dog.daily_current_calories)
        .bind(&dog.daily_max_calories)
        .bind(&dog.sex)
        .bind(&dog.picture)
        .bind(dog.is_edit_field_expanded)
        .bind(&dog.stored_date)
        .bind(dog.id)
        .execute(self.db.pool())
        .await?;

        let updated = result.rows_affected() > 0;
        if updated {
            self.db.notify(Table::Dogs);
        }
        Ok(updated)
    }

    async fn reset_selected_dog(&self) -> Result<()> {
        let result = sqlx::query("UPDATE dogs SET is_selected = FALSE WHERE is_selected")
            .execute(self.db.pool())
            .await?;

        if result.rows_affected() > 0 {
            self.db.notify(Table::Dogs);
        }
        Ok(())
    }

    async fn select_dog(&self, dog_id: EntityId) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE dogs
            SET is_selected = (id = ?1)
            WHERE EXISTS (SELECT 1 FROM dogs WHERE id = ?1)
            "#,
        )
        .bind(dog_id)
        .execute(self.db.pool())
        .await?;

        let selected = result.rows_affected() > 0;
        if selected {
            self.db.notify(Table::Dogs);
        }
        Ok(selected)
    }

    async fn get_selected_dog(&self) -> Result<Option<Dog>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM dogs WHERE is_selected ORDER BY id ASC",
            DOG_COLUMNS
        ))
        .fetch_all(self.db.pool())
        .await?;

        match rows.len() {
            0 => Ok(None),
            1 => Ok(Some(Self::row_to_dog(&rows[0]))),
            count => Err(TrackerError::MultipleSelectedDogs(count).into()),
        }
    }

    async fn reset_edit_field_expansion(&self) -> Result<()> {
        let result = sqlx::query(
            "UPDATE dogs SET is_edit_field_expanded = FALSE WHERE is_edit_field_expanded",
        )
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() > 0 {
            self.db.notify(Table::Dogs);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestEnvironment;
    use futures_util::StreamExt;

    fn dog(name: &str) -> Dog {
        Dog {
            name: name.to_string(),
            stored_date: "01/02/24".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_ids_and_lists_by_name() {
        let env = TestEnvironment::new().await.unwrap();
        let repo = DogRepository::new(env.connection.clone());

        let rex = repo.insert(&dog("Rex")).await.unwrap().unwrap();
        let apollo = repo.insert(&dog("Apollo")).await.unwrap().unwrap();
        assert_ne!(rex, apollo);

        let names: Vec<String> = repo.list_all().await.unwrap().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["Apollo", "Rex"]);
    }

    #[tokio::test]
    async fn test_duplicate_insert_is_ignored() {
        let env = TestEnvironment::new().await.unwrap();
        let repo = DogRepository::new(env.connection.clone());

        let id = repo.insert(&dog("Rex")).await.unwrap().unwrap();
        let duplicate = Dog { id, name: "Impostor".to_string(), ..Default::default() };

        assert_eq!(repo.insert(&duplicate).await.unwrap(), None);
        let dogs = repo.list_all().await.unwrap();
        assert_eq!(dogs.len(), 1);
        assert_eq!(dogs[0].name, "Rex");
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_dog_are_noops() {
        let env = TestEnvironment::new().await.unwrap();
        let repo = DogRepository::new(env.connection.clone());
        let ghost = Dog { id: 42, ..dog("Ghost") };

        assert!(!repo.update(&ghost).await.unwrap());
        assert!(!repo.delete(&ghost).await.unwrap());
        assert_eq!(env.connection.changes().version(Table::Dogs), 0);
    }

    #[tokio::test]
    async fn test_update_replaces_full_record() {
        let env = TestEnvironment::new().await.unwrap();
        let repo = DogRepository::new(env.connection.clone());
        let id = repo.insert(&dog("Rex")).await.unwrap().unwrap();

        let edited = Dog {
            id,
            breed: "Beagle".to_string(),
            daily_max_calories: "900".to_string(),
            ..dog("Rex II")
        };
        assert!(repo.update(&edited).await.unwrap());

        assert_eq!(repo.get_dog(id).await.unwrap(), Some(edited));
    }

    #[tokio::test]
    async fn test_select_dog_flags_exactly_one() {
        let env = TestEnvironment::new().await.unwrap();
        let repo = DogRepository::new(env.connection.clone());
        let first = repo.insert(&Dog { is_selected: true, ..dog("A") }).await.unwrap().unwrap();
        let second = repo.insert(&dog("B")).await.unwrap().unwrap();

        assert!(repo.select_dog(second).await.unwrap());

        let selected: Vec<EntityId> = repo
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .filter(|d| d.is_selected)
            .map(|d| d.id)
            .collect();
        assert_eq!(selected, vec![second]);
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_select_missing_dog_keeps_current_selection() {
        let env = TestEnvironment::new().await.unwrap();
        let repo = DogRepository::new(env.connection.clone());
        let id = repo.insert(&Dog { is_selected: true, ..dog("A") }).await.unwrap().unwrap();

        assert!(!repo.select_dog(999).await.unwrap());
        assert_eq!(repo.get_selected_dog().await.unwrap().map(|d| d.id), Some(id));
    }

    #[tokio::test]
    async fn test_get_selected_dog() {
        let env = TestEnvironment::new().await.unwrap();
        let repo = DogRepository::new(env.connection.clone());

        assert_eq!(repo.get_selected_dog().await.unwrap(), None);

        repo.insert(&Dog { is_selected: true, ..dog("A") }).await.unwrap();
        repo.insert(&Dog { is_selected: true, ..dog("B") }).await.unwrap();
        let err = repo.get_selected_dog().await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TrackerError>(),
            Some(TrackerError::MultipleSelectedDogs(2))
        ));

        repo.reset_selected_dog().await.unwrap();
        assert_eq!(repo.get_selected_dog().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_reset_edit_field_expansion() {
        let env = TestEnvironment::new().await.unwrap();
        let repo = DogRepository::new(env.connection.clone());
        repo.insert(&Dog { is_edit_field_expanded: true, ..dog("A") }).await.unwrap();
        repo.insert(&Dog { is_edit_field_expanded: true, ..dog("B") }).await.unwrap();

        repo.reset_edit_field_expansion().await.unwrap();

        assert!(repo.list_all().await.unwrap().iter().all(|d| !d.is_edit_field_expanded));
    }

    #[tokio::test]
    async fn test_observe_all_emits_full_snapshots() {
        let env = TestEnvironment::new().await.unwrap();
        let repo = DogRepository::new(env.connection.clone());
        let mut stream = repo.observe_all();

        assert!(stream.next().await.unwrap().unwrap().is_empty());

        repo.insert(&dog("Rex")).await.unwrap();
        let snapshot = stream.next().await.unwrap().unwrap();
        assert_eq!(snapshot.len(), 1);

        repo.insert(&dog("Apollo")).await.unwrap();
        let snapshot = stream.next().await.unwrap().unwrap();
        let names: Vec<&str> = snapshot.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Apollo", "Rex"]);
    }
}
