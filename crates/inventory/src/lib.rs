//! Freezer inventory domain module.
//!
//! This crate contains the business rules for frozen items, meal sets,
//! containers and recipes, implemented purely as deterministic domain logic
//! (no IO, no HTTP, no storage). FIFO take-out selection lives in [`selector`].

pub mod container;
pub mod filter;
pub mod item;
pub mod meal_set;
pub mod recipe;
pub mod selector;
pub mod takeout;

pub use container::{
    ActiveFilter, Container, ContainerPatch, ContainerType, ContainerTypeDraft, Material,
    NewContainer, NewContainerType, Shape,
};
pub use filter::{is_expiring, ListFilters, Page};
pub use item::{
    prepare_intake, IntakeContext, InventoryItem, InventoryView, ItemDraft, ItemType,
    NewInventoryItem, StorageType, BEST_BEFORE_DAYS_MAX, DEFAULT_BEST_BEFORE_DAYS,
};
pub use meal_set::{MealSet, MealSetComponent, NewMealSet, COMPONENT_QUANTITY_MAX};
pub use recipe::{NewRecipe, Recipe, RecipeDraft, RecipePatch, RecipeQuery, RecipeSort, RecipeType};
pub use selector::{complete_count, fifo_order, select_single_set, NoItemsAvailable};
pub use takeout::{TakeoutBatch, TakeoutRejection};
