use anyhow::Result;
use async_trait::async_trait;
use shared::{EntityId, Walk};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::debug;

use super::assigned_id;
use crate::storage::change_feed::{snapshot_stream, EntityStream, Table};
use crate::storage::connection::DbConnection;
use crate::storage::traits::{EntityStorage, EntryStorage};

/// Repository for walk operations
#[derive(Clone)]
pub struct WalkRepository {
    db: DbConnection,
}

impl WalkRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn row_to_walk(row: &SqliteRow) -> Walk {
        Walk {
            id: row.get("id"),
            dog_id: row.get("dog_id"),
            date: row.get("date"),
            time: row.get("time"),
            duration: row.get("duration"),
            notes: row.get("notes"),
            times_walked: row.get("times_walked"),
        }
    }
}

#[async_trait]
impl EntityStorage<Walk> for WalkRepository {
    fn observe_all(&self) -> EntityStream<Walk> {
        let repository = self.clone();
        snapshot_stream(self.db.subscribe(Table::Walk), move || {
            let repository = repository.clone();
            async move { repository.list_all().await }
        })
    }

    async fn list_all(&self) -> Result<Vec<Walk>> {
        let rows = sqlx::query(
            r#"
            SELECT id, dog_id, date, time, duration, notes, times_walked
            FROM walk
            ORDER BY id ASC
            "#,
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.iter().map(Self::row_to_walk).collect())
    }

    async fn insert(&self, walk: &Walk) -> Result<Option<EntityId>> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO walk (id, dog_id, date, time, duration, notes, times_walked)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(assigned_id(walk.id))
        .bind(walk.dog_id)
        .bind(&walk.date)
        .bind(&walk.time)
        .bind(&walk.duration)
        .bind(&walk.notes)
        .bind(&walk.times_walked)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() == 0 {
            debug!("Ignored duplicate walk insert for id {}", walk.id);
            return Ok(None);
        }

        self.db.notify(Table::Walk);
        Ok(Some(result.last_insert_rowid()))
    }

    async fn delete(&self, walk: &Walk) -> Result<bool> {
        let result = sqlx::query("DELETE FROM walk WHERE id = ?")
            .bind(walk.id)
            .execute(self.db.pool())
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            self.db.notify(Table::Walk);
        }
        Ok(deleted)
    }
}

#[async_trait]
impl EntryStorage<Walk> for WalkRepository {
    async fn delete_for_dog(&self, dog_id: EntityId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM walk WHERE dog_id = ?")
            .bind(dog_id)
            .execute(self.db.pool())
            .await?;

        let removed = result.rows_affected();
        if removed > 0 {
            self.db.notify(Table::Walk);
        }
        Ok(removed)
    }
}
