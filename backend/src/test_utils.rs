//! Test utilities module for automatic cleanup and consistent test infrastructure
//!
//! Every test gets its own sqlite file inside a temporary directory that is
//! removed when the environment is dropped, even if the test panics.

use anyhow::Result;
use chrono::NaiveDate;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

use crate::config::TrackerConfig;
use crate::domain::{CalendarService, FixedClock};
use crate::storage::DbConnection;
use crate::AppState;

/// RAII Test Environment that automatically cleans up on drop
pub struct TestEnvironment {
    /// The temporary directory - kept alive until drop
    _temp_dir: TempDir,
    /// Connection to the test database
    pub connection: DbConnection,
    /// Base directory path for manual inspection if needed
    pub base_path: PathBuf,
}

impl TestEnvironment {
    /// Create a new test environment with automatic cleanup
    pub async fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let base_path = temp_dir.path().to_path_buf();
        let connection = DbConnection::new(&base_path.join("tracker.db"), 1).await?;

        Ok(TestEnvironment {
            _temp_dir: temp_dir,
            connection,
            base_path,
        })
    }

    /// Config with startup delays and keepalive short enough for tests
    pub fn config(&self) -> TrackerConfig {
        TrackerConfig {
            startup_settle_delay_ms: 50,
            no_dogs_timeout_ms: 250,
            projection_keepalive_ms: 100,
            ..TrackerConfig::default()
        }
    }

    /// Fully wired application state on this environment's database
    pub fn app_state(&self, clock: Arc<FixedClock>) -> AppState {
        self.app_state_with(self.config(), clock)
    }

    pub fn app_state_with(&self, config: TrackerConfig, clock: Arc<FixedClock>) -> AppState {
        AppState::new(self.connection.clone(), config, CalendarService::new(clock))
    }
}

/// Clock fixed at noon on the given day
pub fn clock_on(year: i32, month: u32, day: u32) -> Arc<FixedClock> {
    clock_at(year, month, day, 12, 0)
}

pub fn clock_at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> Arc<FixedClock> {
    let now = NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, 0))
        .expect("valid test date");
    Arc::new(FixedClock::new(now))
}
