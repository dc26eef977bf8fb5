use anyhow::Result;
use async_trait::async_trait;
use shared::{EntityId, Food};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::debug;

use super::assigned_id;
use crate::domain::errors::parse_count;
use crate::storage::change_feed::{snapshot_stream, EntityStream, Table};
use crate::storage::connection::DbConnection;
use crate::storage::traits::{EntityStorage, EntryStorage, FoodStorage};

/// Repository for food operations
#[derive(Clone)]
pub struct FoodRepository {
    db: DbConnection,
}

impl FoodRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn row_to_food(row: &SqliteRow) -> Food {
        Food {
            id: row.get("id"),
            dog_id: row.get("dog_id"),
            date: row.get("date"),
            notes: row.get("notes"),
            calories: row.get("calories"),
            food_type: row.get("type"),
        }
    }
}

#[async_trait]
impl EntityStorage<Food> for FoodRepository {
    fn observe_all(&self) -> EntityStream<Food> {
        let repository = self.clone();
        snapshot_stream(self.db.subscribe(Table::Food), move || {
            let repository = repository.clone();
            async move { repository.list_all().await }
        })
    }

    async fn list_all(&self) -> Result<Vec<Food>> {
        let rows = sqlx::query(
            r#"
            SELECT id, dog_id, date, notes, calories, type
            FROM food
            ORDER BY id ASC
            "#,
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.iter().map(Self::row_to_food).collect())
    }

    async fn insert(&self, food: &Food) -> Result<Option<EntityId>> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO food (id, dog_id, date, notes, calories, type)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(assigned_id(food.id))
        .bind(food.dog_id)
        .bind(&food.date)
        .bind(&food.notes)
        .bind(&food.calories)
        .bind(&food.food_type)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() == 0 {
            debug!("Ignored duplicate food insert for id {}", food.id);
            return Ok(None);
        }

        self.db.notify(Table::Food);
        Ok(Some(result.last_insert_rowid()))
    }

    async fn delete(&self, food: &Food) -> Result<bool> {
        let result = sqlx::query("DELETE FROM food WHERE id = ?")
            .bind(food.id)
            .execute(self.db.pool())
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            self.db.notify(Table::Food);
        }
        Ok(deleted)
    }
}

#[async_trait]
impl EntryStorage<Food> for FoodRepository {
    async fn delete_for_dog(&self, dog_id: EntityId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM food WHERE dog_id = ?")
            .bind(dog_id)
            .execute(self.db.pool())
            .await?;

        let removed = result.rows_affected();
        if removed > 0 {
            self.db.notify(Table::Food);
        }
        Ok(removed)
    }
}

/// Sum calorie strings with the same rule the incremental counter uses
fn total_calories(rows: &[SqliteRow]) -> i64 {
    rows.iter()
        .map(|row| parse_count(row.get::<String, _>("calories").as_str()))
        .fold(0, i64::saturating_add)
}

#[async_trait]
impl FoodStorage for FoodRepository {
    async fn calculate_daily_calories(&self) -> Result<i64> {
        let rows = sqlx::query("SELECT calories FROM food")
            .fetch_all(self.db.pool())
            .await?;

        Ok(total_calories(&rows))
    }

    async fn sum_calories_for(&self, dog_id: EntityId, date: &str) -> Result<i64> {
        let rows = sqlx::query("SELECT calories FROM food WHERE dog_id = ? AND date = ?")
            .bind(dog_id)
            .bind(date)
            .fetch_all(self.db.pool())
            .await?;

        Ok(total_calories(&rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestEnvironment;

    fn food(dog_id: EntityId, date: &str, calories: &str) -> Food {
        Food {
            dog_id,
            date: date.to_string(),
            calories: calories.to_string(),
            food_type: "dinner".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_duplicate_id_is_ignored() {
        let env = TestEnvironment::new().await.unwrap();
        let repo = FoodRepository::new(env.connection.clone());

        let id = repo.insert(&food(1, "01/02/24", "30")).await.unwrap().unwrap();
        let again = Food { id, ..food(1, "01/02/24", "30") };

        assert_eq!(repo.insert(&again).await.unwrap(), None);
        assert_eq!(repo.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_global_sum_ignores_dog_and_date() {
        let env = TestEnvironment::new().await.unwrap();
        let repo = FoodRepository::new(env.connection.clone());

        assert_eq!(repo.calculate_daily_calories().await.unwrap(), 0);

        repo.insert(&food(1, "01/02/24", "30")).await.unwrap();
        repo.insert(&food(2, "01/01/24", "120")).await.unwrap();
        repo.insert(&food(1, "01/02/24", "lots")).await.unwrap();

        assert_eq!(repo.calculate_daily_calories().await.unwrap(), 150);
    }

    #[tokio::test]
    async fn test_sum_calories_for_dog_and_date() {
        let env = TestEnvironment::new().await.unwrap();
        let repo = FoodRepository::new(env.connection.clone());
        repo.insert(&food(1, "01/02/24", "30")).await.unwrap();
        repo.insert(&food(1, "01/02/24", "45")).await.unwrap();
        repo.insert(&food(1, "01/01/24", "500")).await.unwrap();
        repo.insert(&food(2, "01/02/24", "500")).await.unwrap();

        assert_eq!(repo.sum_calories_for(1, "01/02/24").await.unwrap(), 75);
        assert_eq!(repo.sum_calories_for(3, "01/02/24").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_sums_skip_values_that_are_not_whole_numbers() {
        let env = TestEnvironment::new().await.unwrap();
        let repo = FoodRepository::new(env.connection.clone());
        repo.insert(&food(1, "01/02/24", "12.5")).await.unwrap();
        repo.insert(&food(1, "01/02/24", "30abc")).await.unwrap();
        repo.insert(&food(1, "01/02/24", " 20 ")).await.unwrap();

        assert_eq!(repo.sum_calories_for(1, "01/02/24").await.unwrap(), 20);
        assert_eq!(repo.calculate_daily_calories().await.unwrap(), 20);
    }

    #[tokio::test]
    async fn test_delete_for_dog() {
        let env = TestEnvironment::new().await.unwrap();
        let repo = FoodRepository::new(env.connection.clone());
        repo.insert(&food(1, "01/02/24", "30")).await.unwrap();
        repo.insert(&food(2, "01/02/24", "40")).await.unwrap();

        assert_eq!(repo.delete_for_dog(1).await.unwrap(), 1);
        assert_eq!(repo.delete_for_dog(1).await.unwrap(), 0);
        assert_eq!(repo.calculate_daily_calories().await.unwrap(), 40);
    }
}
