// Repository modules
pub mod bathroom_repository;
pub mod dog_repository;
pub mod food_repository;
pub mod walk_repository;

// Re-export repository types
pub use bathroom_repository::BathroomRepository;
pub use dog_repository::DogRepository;
pub use food_repository::FoodRepository;
pub use walk_repository::WalkRepository;

use shared::{EntityId, UNASSIGNED_ID};

/// Unassigned ids are bound as NULL so sqlite picks the next rowid
pub(crate) fn assigned_id(id: EntityId) -> Option<EntityId> {
    (id != UNASSIGNED_ID).then_some(id)
}
