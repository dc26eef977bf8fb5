//! # Storage Traits
//!
//! Capability contracts the domain layer depends on. Implementations are thin
//! pass-throughs to the entity store; no business rules live behind them.

use anyhow::Result;
use async_trait::async_trait;
use shared::{Bathroom, Dog, EntityId, Food, Walk};

use super::change_feed::EntityStream;

/// Operations every entity table supports
#[async_trait]
pub trait EntityStorage<E>: Send + Sync
where
    E: Send + Sync + 'static,
{
    /// Full current row set, re-emitted after every mutation of the table
    fn observe_all(&self) -> EntityStream<E>;

    /// One-shot read of the full row set, in the same order as `observe_all`
    async fn list_all(&self) -> Result<Vec<E>>;

    /// Insert if the primary key is new.
    /// Returns the stored id, or `None` when the key already existed.
    async fn insert(&self, entity: &E) -> Result<Option<EntityId>>;

    /// Delete by primary key. Returns false if nothing was deleted.
    async fn delete(&self, entity: &E) -> Result<bool>;
}

/// Entries that belong to a dog (bathroom breaks, meals, walks)
#[async_trait]
pub trait EntryStorage<E>: EntityStorage<E>
where
    E: Send + Sync + 'static,
{
    /// Remove every entry of one dog, returning how many were removed
    async fn delete_for_dog(&self, dog_id: EntityId) -> Result<u64>;
}

/// Trait defining the interface for dog storage operations
#[async_trait]
pub trait DogStorage: EntityStorage<Dog> {
    /// Retrieve a specific dog by ID
    async fn get_dog(&self, dog_id: EntityId) -> Result<Option<Dog>>;

    /// Replace the full stored record. Returns false if the dog does not exist.
    async fn update(&self, dog: &Dog) -> Result<bool>;

    /// Clear the selected flag on every dog
    async fn reset_selected_dog(&self) -> Result<()>;

    /// Flag exactly `dog_id` as selected and every other dog as not selected,
    /// in a single statement. Returns false (and changes nothing) if the dog
    /// does not exist.
    async fn select_dog(&self, dog_id: EntityId) -> Result<bool>;

    /// The dog flagged as selected. Fails if more than one is flagged.
    async fn get_selected_dog(&self) -> Result<Option<Dog>>;

    /// Close every open edit form
    async fn reset_edit_field_expansion(&self) -> Result<()>;
}

pub trait BathroomStorage: EntryStorage<Bathroom> {}

impl<T: EntryStorage<Bathroom>> BathroomStorage for T {}

/// Trait defining the interface for food storage operations
#[async_trait]
pub trait FoodStorage: EntryStorage<Food> {
    /// Sum of calories over every food row, regardless of dog or date.
    /// Unparseable calorie values count as zero.
    async fn calculate_daily_calories(&self) -> Result<i64>;

    /// Sum of calories for one dog on one date (MM/DD/YY)
    async fn sum_calories_for(&self, dog_id: EntityId, date: &str) -> Result<i64>;
}

pub trait WalkStorage: EntryStorage<Walk> {}

impl<T: EntryStorage<Walk>> WalkStorage for T {}
