//! Persistence boundary for the freezer catalog.
//!
//! `FreezerStore` is deliberately dumb: it loads and saves records. Filtering,
//! FIFO ordering and intake rules live in `freezer-inventory` so every backend
//! shares them. The one exception is [`FreezerStore::take_out`], which must
//! check and mutate a batch inside a single atomic scope.
//!
//! Backends:
//! - [`InMemoryFreezerStore`]: `RwLock`-guarded tables for dev and tests
//! - [`PostgresFreezerStore`]: SQLx over PostgreSQL

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use freezer_core::{ContainerId, ContainerTypeId, InventoryItemId, MealSetId, RecipeId};
use freezer_inventory::{
    Container, ContainerType, ContainerTypeDraft, InventoryItem, ItemDraft, MealSet,
    NewContainer, NewMealSet, Recipe, RecipeDraft, TakeoutBatch, TakeoutRejection,
};

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryFreezerStore;
pub use postgres::PostgresFreezerStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Takeout(#[from] TakeoutRejection),

    #[error("duplicate {field}: {value}")]
    Duplicate { field: &'static str, value: String },

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("store lock poisoned")]
    Poisoned,

    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("database error: {0}")]
    Database(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Record storage for items, meal sets, containers and recipes.
#[async_trait::async_trait]
pub trait FreezerStore: Send + Sync {
    /// Short backend name for health reporting.
    fn backend(&self) -> &'static str;

    async fn ping(&self) -> StoreResult<()>;

    async fn list_meal_sets(&self) -> StoreResult<Vec<MealSet>>;
    async fn get_meal_set(&self, id: MealSetId) -> StoreResult<Option<MealSet>>;
    async fn insert_meal_set(&self, set: NewMealSet) -> StoreResult<MealSet>;

    /// Every active item, in no particular order.
    async fn list_active_items(&self) -> StoreResult<Vec<InventoryItem>>;
    /// Active items assigned to `set`, in no particular order.
    async fn active_items_for_set(&self, set: MealSetId) -> StoreResult<Vec<InventoryItem>>;
    async fn get_item(&self, id: InventoryItemId) -> StoreResult<Option<InventoryItem>>;
    /// Persist an intake. A missing `id_code` is generated from the new id.
    async fn insert_item(&self, draft: ItemDraft) -> StoreResult<InventoryItem>;

    /// Mark every item of `batch` as taken out, or none of them.
    ///
    /// Returns the ids in batch order. Fails with [`StoreError::Takeout`]
    /// when any id is unknown or already inactive.
    async fn take_out(
        &self,
        batch: &TakeoutBatch,
        at: DateTime<Utc>,
    ) -> StoreResult<Vec<InventoryItemId>>;

    async fn list_container_types(&self) -> StoreResult<Vec<ContainerType>>;
    async fn get_container_type(&self, id: ContainerTypeId) -> StoreResult<Option<ContainerType>>;
    async fn insert_container_type(&self, draft: ContainerTypeDraft) -> StoreResult<ContainerType>;

    async fn list_containers(&self) -> StoreResult<Vec<Container>>;
    async fn get_container(&self, id: ContainerId) -> StoreResult<Option<Container>>;
    async fn insert_container(&self, container: NewContainer) -> StoreResult<Container>;
    /// Overwrite an existing container; the code must stay unique.
    async fn update_container(&self, container: Container) -> StoreResult<Container>;

    async fn list_recipes(&self) -> StoreResult<Vec<Recipe>>;
    async fn get_recipe(&self, id: RecipeId) -> StoreResult<Option<Recipe>>;
    async fn insert_recipe(&self, draft: RecipeDraft) -> StoreResult<Recipe>;
    async fn update_recipe(&self, recipe: Recipe) -> StoreResult<Recipe>;
}

/// Shared handle used by the service layer.
pub type SharedStore = Arc<dyn FreezerStore>;
