//! Broadcast-on-write change notifications.
//!
//! Every table owns a `watch` channel carrying a version counter. Writers bump
//! the counter after a mutation lands; observers wake up and re-read the full
//! table. Notifications coalesce, so a slow observer only ever sees the latest
//! snapshot, never a backlog.

use anyhow::Result;
use futures_util::stream::{self, BoxStream, StreamExt};
use std::fmt;
use std::future::Future;
use tokio::sync::watch;
use tracing::debug;

/// Stream of full table snapshots. Never completes while storage is alive.
pub type EntityStream<E> = BoxStream<'static, Result<Vec<E>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Dogs,
    Bathroom,
    Food,
    Walk,
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Table::Dogs => "dogs",
            Table::Bathroom => "bathroom",
            Table::Food => "food",
            Table::Walk => "walk",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug)]
pub struct ChangeFeed {
    dogs: watch::Sender<u64>,
    bathroom: watch::Sender<u64>,
    food: watch::Sender<u64>,
    walk: watch::Sender<u64>,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeFeed {
    pub fn new() -> Self {
        Self {
            dogs: watch::channel(0).0,
            bathroom: watch::channel(0).0,
            food: watch::channel(0).0,
            walk: watch::channel(0).0,
        }
    }

    fn sender(&self, table: Table) -> &watch::Sender<u64> {
        match table {
            Table::Dogs => &self.dogs,
            Table::Bathroom => &self.bathroom,
            Table::Food => &self.food,
            Table::Walk => &self.walk,
        }
    }

    /// Tell every observer of `table` that its contents changed
    pub fn notify(&self, table: Table) {
        let sender = self.sender(table);
        sender.send_modify(|version| *version = version.wrapping_add(1));
        debug!(
            "Table {} changed (version {}, {} observers)",
            table,
            *sender.borrow(),
            sender.receiver_count()
        );
    }

    pub fn subscribe(&self, table: Table) -> watch::Receiver<u64> {
        self.sender(table).subscribe()
    }

    /// Current version of a table, bumped once per effective mutation
    pub fn version(&self, table: Table) -> u64 {
        *self.sender(table).borrow()
    }
}

/// Build a snapshot stream: one read immediately, then one read per change
pub fn snapshot_stream<E, F, Fut>(changes: watch::Receiver<u64>, load: F) -> EntityStream<E>
where
    E: Send + 'static,
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Vec<E>>> + Send + 'static,
{
    stream::unfold((changes, load, true), |(mut changes, load, first)| async move {
        if first {
            changes.borrow_and_update();
        } else if changes.changed().await.is_err() {
            return None;
        }
        let snapshot = load().await;
        Some((snapshot, (changes, load, false)))
    })
    .boxed()
}
