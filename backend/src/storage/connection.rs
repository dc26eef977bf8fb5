use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

use super::change_feed::{ChangeFeed, Table};

/// DbConnection owns the sqlite pool and the per-table change feed
#[derive(Clone)]
pub struct DbConnection {
    pool: Arc<SqlitePool>,
    changes: Arc<ChangeFeed>,
}

impl DbConnection {
    /// Open (or create) the database file at `path` and make sure the schema exists
    pub async fn new(path: &Path, max_connections: u32) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await?;

        Self::setup_schema(&pool).await?;
        info!("Opened tracker database at {:?}", path);

        Ok(Self {
            pool: Arc::new(pool),
            changes: Arc::new(ChangeFeed::new()),
        })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Notify observers of `table` after a mutation took effect
    pub fn notify(&self, table: Table) {
        self.changes.notify(table);
    }

    pub fn subscribe(&self, table: Table) -> watch::Receiver<u64> {
        self.changes.subscribe(table)
    }

    pub fn changes(&self) -> &ChangeFeed {
        &self.changes
    }

    /// Set up the required database schema.
    /// Dates and times are stored as the formatted strings the app displays.
    async fn setup_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS dogs (
                id INTEGER PRIMARY KEY,
                is_selected BOOLEAN NOT NULL DEFAULT FALSE,
                name TEXT NOT NULL DEFAULT '',
                age TEXT NOT NULL DEFAULT '',
                breed TEXT NOT NULL DEFAULT '',
                weight TEXT NOT NULL DEFAULT '',
                daily_current_calories TEXT NOT NULL DEFAULT '0',
                daily_max_calories TEXT NOT NULL DEFAULT '0',
                sex TEXT NOT NULL DEFAULT '',
                picture TEXT NOT NULL DEFAULT '',
                is_edit_field_expanded BOOLEAN NOT NULL DEFAULT FALSE,
                stored_date TEXT NOT NULL DEFAULT ''
            );
            "#,
        )
        .execute(pool)
        .await?;

        // Dog list is always read ordered by name
        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_dogs_name
            ON dogs(name);
            "#,
        )
        .execute(pool)
        .await?;

        // dog_id is a plain column: entries may outlive their dog
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS bathroom (
                id INTEGER PRIMARY KEY,
                dog_id INTEGER NOT NULL DEFAULT 0,
                date TEXT NOT NULL DEFAULT '',
                time TEXT NOT NULL DEFAULT '',
                type TEXT NOT NULL DEFAULT '',
                notes TEXT NOT NULL DEFAULT '',
                times_peed TEXT NOT NULL DEFAULT '',
                times_pooped TEXT NOT NULL DEFAULT ''
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS food (
                id INTEGER PRIMARY KEY,
                dog_id INTEGER NOT NULL DEFAULT 0,
                date TEXT NOT NULL DEFAULT '',
                notes TEXT NOT NULL DEFAULT '',
                calories TEXT NOT NULL DEFAULT '',
                type TEXT NOT NULL DEFAULT ''
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_food_dog_date
            ON food(dog_id, date);
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS walk (
                id INTEGER PRIMARY KEY,
                dog_id INTEGER NOT NULL DEFAULT 0,
                date TEXT NOT NULL DEFAULT '',
                time TEXT NOT NULL DEFAULT '',
                duration TEXT NOT NULL DEFAULT '',
                notes TEXT NOT NULL DEFAULT '',
                times_walked TEXT NOT NULL DEFAULT ''
            );
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Row;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_creates_all_tables() {
        let temp_dir = TempDir::new().unwrap();
        let db = DbConnection::new(&temp_dir.path().join("nested").join("tracker.db"), 1)
            .await
            .expect("Failed to open database");

        let rows = sqlx::query("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .fetch_all(db.pool())
            .await
            .unwrap();
        let tables: Vec<String> = rows.iter().map(|row| row.get("name")).collect();

        assert_eq!(tables, vec!["bathroom", "dogs", "food", "walk"]);
    }

    #[tokio::test]
    async fn test_reopening_keeps_schema_and_data() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tracker.db");

        let db = DbConnection::new(&path, 1).await.unwrap();
        sqlx::query("INSERT INTO dogs (name) VALUES ('Rex')")
            .execute(db.pool())
            .await
            .unwrap();
        db.pool().close().await;

        let reopened = DbConnection::new(&path, 1).await.unwrap();
        let count: i64 = sqlx::query("SELECT COUNT(*) AS count FROM dogs")
            .fetch_one(reopened.pool())
            .await
            .unwrap()
            .get("count");
        assert_eq!(count, 1);
    }
}
