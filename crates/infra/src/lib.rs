//! Infrastructure layer: storage backends and the service that drives them.

pub mod service;
pub mod store;

pub use service::{
    ContainerView, FreezerService, HealthReport, ItemView, MealSetDetail, MealSetSummary,
    ServiceError, ServiceResult, ServiceSettings,
};
pub use store::{
    FreezerStore, InMemoryFreezerStore, PostgresFreezerStore, SharedStore, StoreError,
    StoreResult,
};
