//! `freezer-core`: ids, errors and the entity trait shared by every crate.

pub mod entity;
pub mod error;
pub mod id;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{ContainerId, ContainerTypeId, InventoryItemId, MealSetId, RecipeId};
