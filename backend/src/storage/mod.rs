//! # Storage Module
//!
//! Durable entity store for the tracker: four sqlite tables (dogs, bathroom,
//! food, walk) keyed by auto-assigned integer ids, plus a change feed that
//! lets observers re-read a table whenever it is mutated.
//!
//! ## Components
//!
//! - **connection.rs** - pool ownership and schema setup
//! - **change_feed.rs** - per-table broadcast-on-write notifications
//! - **traits.rs** - repository contracts the domain depends on
//! - **repositories/** - sqlite implementations, one per entity kind
//!
//! ## Store semantics
//!
//! - Inserting an existing primary key is silently ignored
//! - Updating or deleting a missing key is a no-op
//! - Only mutations that changed rows notify observers

pub mod change_feed;
pub mod connection;
pub mod repositories;
pub mod traits;

// Re-export the main types that other modules need
pub use change_feed::{ChangeFeed, EntityStream, Table};
pub use connection::DbConnection;
pub use repositories::{BathroomRepository, DogRepository, FoodRepository, WalkRepository};
pub use traits::{
    BathroomStorage, DogStorage, EntityStorage, EntryStorage, FoodStorage, WalkStorage,
};
