use serde::{Deserialize, Serialize};
use std::fmt;

/// Auto-assigned row identifier shared by every entity kind
pub type EntityId = i64;

/// Id carried by an entity that has not been stored yet.
/// Inserting an entity with this id lets storage assign a fresh one.
pub const UNASSIGNED_ID: EntityId = 0;

/// One tracked animal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dog {
    pub id: EntityId,
    /// At most one dog is selected at a time
    pub is_selected: bool,
    pub name: String,
    pub age: String,
    pub breed: String,
    pub weight: String,
    /// Running calorie total for `stored_date` (integer as string)
    pub daily_current_calories: String,
    /// User-set daily target (integer as string)
    pub daily_max_calories: String,
    pub sex: String,
    /// Opaque reference to a picture managed outside the core
    pub picture: String,
    /// Whether this dog's edit form is currently open
    pub is_edit_field_expanded: bool,
    /// Date (MM/DD/YY) the calorie counter was last reset
    pub stored_date: String,
}

impl Default for Dog {
    fn default() -> Self {
        Self {
            id: UNASSIGNED_ID,
            is_selected: false,
            name: String::new(),
            age: String::new(),
            breed: String::new(),
            weight: String::new(),
            daily_current_calories: "0".to_string(),
            daily_max_calories: "0".to_string(),
            sex: String::new(),
            picture: String::new(),
            is_edit_field_expanded: false,
            stored_date: String::new(),
        }
    }
}

/// One bathroom break
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bathroom {
    pub id: EntityId,
    pub dog_id: EntityId,
    /// MM/DD/YY
    pub date: String,
    /// hh:mm AM/PM
    pub time: String,
    /// "pee" or "poop"
    #[serde(rename = "type")]
    pub bathroom_type: String,
    pub notes: String,
    /// Reserved, never populated
    pub times_peed: String,
    /// Reserved, never populated
    pub times_pooped: String,
}

/// One meal or snack
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Food {
    pub id: EntityId,
    pub dog_id: EntityId,
    /// MM/DD/YY
    pub date: String,
    pub notes: String,
    /// Integer as string; unparseable values count as zero
    pub calories: String,
    /// snack, breakfast, lunch or dinner
    #[serde(rename = "type")]
    pub food_type: String,
}

/// One walk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Walk {
    pub id: EntityId,
    pub dog_id: EntityId,
    /// MM/DD/YY
    pub date: String,
    /// hh:mm AM/PM
    pub time: String,
    /// Free text, usually "N mins"
    pub duration: String,
    pub notes: String,
    /// Reserved, never populated
    pub times_walked: String,
}

/// Entries that belong to a dog and carry a date
pub trait DogEntry {
    fn dog_id(&self) -> EntityId;
    fn date(&self) -> &str;
}

impl DogEntry for Bathroom {
    fn dog_id(&self) -> EntityId {
        self.dog_id
    }

    fn date(&self) -> &str {
        &self.date
    }
}

impl DogEntry for Food {
    fn dog_id(&self) -> EntityId {
        self.dog_id
    }

    fn date(&self) -> &str {
        &self.date
    }
}

impl DogEntry for Walk {
    fn dog_id(&self) -> EntityId {
        self.dog_id
    }

    fn date(&self) -> &str {
        &self.date
    }
}

fn entries_for<'a, E: DogEntry>(entries: &'a [E], dog_id: EntityId, date: &str) -> Vec<&'a E> {
    entries
        .iter()
        .filter(|entry| entry.dog_id() == dog_id && entry.date() == date)
        .collect()
}

/// Current dog list, ordered by name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DogList {
    pub dogs: Vec<Dog>,
}

impl DogList {
    pub fn new(dogs: Vec<Dog>) -> Self {
        Self { dogs }
    }

    /// The first dog flagged as selected, if any
    pub fn selected(&self) -> Option<&Dog> {
        self.dogs.iter().find(|dog| dog.is_selected)
    }
}

/// Current bathroom log
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BathroomList {
    pub bathrooms: Vec<Bathroom>,
}

impl BathroomList {
    pub fn new(bathrooms: Vec<Bathroom>) -> Self {
        Self { bathrooms }
    }

    pub fn entries_for(&self, dog_id: EntityId, date: &str) -> Vec<&Bathroom> {
        entries_for(&self.bathrooms, dog_id, date)
    }
}

/// Current food log
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodList {
    pub foods: Vec<Food>,
}

impl FoodList {
    pub fn new(foods: Vec<Food>) -> Self {
        Self { foods }
    }

    pub fn entries_for(&self, dog_id: EntityId, date: &str) -> Vec<&Food> {
        entries_for(&self.foods, dog_id, date)
    }
}

/// Current walk log
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkList {
    pub walks: Vec<Walk>,
}

impl WalkList {
    pub fn new(walks: Vec<Walk>) -> Self {
        Self { walks }
    }

    pub fn entries_for(&self, dog_id: EntityId, date: &str) -> Vec<&Walk> {
        entries_for(&self.walks, dog_id, date)
    }
}

/// Status of the startup dog resolution
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DogStatus {
    /// Still waiting for the dog list to load
    #[default]
    Loading,
    /// A selected dog was found (or the user selected one)
    Success,
    /// The timeout elapsed and no selected dog was found
    NoDogs,
}

impl fmt::Display for DogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DogStatus::Loading => write!(f, "loading"),
            DogStatus::Success => write!(f, "success"),
            DogStatus::NoDogs => write!(f, "no dogs"),
        }
    }
}
