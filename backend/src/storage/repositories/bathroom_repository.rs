use anyhow::Result;
use async_trait::async_trait;
use shared::{Bathroom, EntityId};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::debug;

use super::assigned_id;
use crate::storage::change_feed::{snapshot_stream, EntityStream, Table};
use crate::storage::connection::DbConnection;
use crate::storage::traits::{EntityStorage, EntryStorage};

/// Repository for bathroom break operations
#[derive(Clone)]
pub struct BathroomRepository {
    db: DbConnection,
}

impl BathroomRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn row_to_bathroom(row: &SqliteRow) -> Bathroom {
        Bathroom {
            id: row.get("id"),
            dog_id: row.get("dog_id"),
            date: row.get("date"),
            time: row.get("time"),
            bathroom_type: row.get("type"),
            notes: row.get("notes"),
            times_peed: row.get("times_peed"),
            times_pooped: row.get("times_pooped"),
        }
    }
}

#[async_trait]
impl EntityStorage<Bathroom> for BathroomRepository {
    fn observe_all(&self) -> EntityStream<Bathroom> {
        let repository = self.clone();
        snapshot_stream(self.db.subscribe(Table::Bathroom), move || {
            let repository = repository.clone();
            async move { repository.list_all().await }
        })
    }

    async fn list_all(&self) -> Result<Vec<Bathroom>> {
        let rows = sqlx::query(
            r#"
            SELECT id, dog_id, date, time, type, notes, times_peed, times_pooped
            FROM bathroom
            ORDER BY id ASC
            "#,
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.iter().map(Self::row_to_bathroom).collect())
    }

    async fn insert(&self, bathroom: &Bathroom) -> Result<Option<EntityId>> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO bathroom (id, dog_id, date, time, type, notes, times_peed, times_pooped)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(assigned_id(bathroom.id))
        .bind(bathroom.dog_id)
        .bind(&bathroom.date)
        .bind(&bathroom.time)
        .bind(&bathroom.bathroom_type)
        .bind(&bathroom.notes)
        .bind(&bathroom.times_peed)
        .bind(&bathroom.times_pooped)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() == 0 {
            debug!("Ignored duplicate bathroom insert for id {}", bathroom.id);
            return Ok(None);
        }

        self.db.notify(Table::Bathroom);
        Ok(Some(result.last_insert_rowid()))
    }

    async fn delete(&self, bathroom: &Bathroom) -> Result<bool> {
        let result = sqlx::query("DELETE FROM bathroom WHERE id = ?")
            .bind(bathroom.id)
            .execute(self.db.pool())
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            self.db.notify(Table::Bathroom);
        }
        Ok(deleted)
    }
}

#[async_trait]
impl EntryStorage<Bathroom> for BathroomRepository {
    async fn delete_for_dog(&self, dog_id: EntityId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM bathroom WHERE dog_id = ?")
            .bind(dog_id)
            .execute(self.db.pool())
            .await?;

        let removed = result.rows_affected();
        if removed > 0 {
            self.db.notify(Table::Bathroom);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestEnvironment;

    fn bathroom(dog_id: EntityId, kind: &str) -> Bathroom {
        Bathroom {
            dog_id,
            date: "01/02/24".to_string(),
            time: "08:15 AM".to_string(),
            bathroom_type: kind.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_store_list_and_delete() {
        let env = TestEnvironment::new().await.unwrap();
        let repo = BathroomRepository::new(env.connection.clone());

        let pee = repo.insert(&bathroom(1, "pee")).await.unwrap().unwrap();
        let poop = repo.insert(&bathroom(1, "poop")).await.unwrap().unwrap();

        let stored = repo.list_all().await.unwrap();
        assert_eq!(stored.iter().map(|b| b.id).collect::<Vec<_>>(), vec![pee, poop]);
        assert_eq!(stored[1].bathroom_type, "poop");
        assert_eq!(stored[0].time, "08:15 AM");

        assert!(repo.delete(&stored[0]).await.unwrap());
        assert!(!repo.delete(&stored[0]).await.unwrap());
        assert_eq!(repo.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_for_dog_leaves_other_dogs() {
        let env = TestEnvironment::new().await.unwrap();
        let repo = BathroomRepository::new(env.connection.clone());
        repo.insert(&bathroom(1, "pee")).await.unwrap();
        repo.insert(&bathroom(1, "poop")).await.unwrap();
        repo.insert(&bathroom(2, "pee")).await.unwrap();

        assert_eq!(repo.delete_for_dog(1).await.unwrap(), 2);

        let remaining = repo.list_all().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].dog_id, 2);
    }
}
