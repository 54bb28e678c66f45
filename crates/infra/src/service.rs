//! Freezer service: orchestration over a [`FreezerStore`].
//!
//! Every HTTP operation maps onto one method here. The service resolves
//! references, calls into the pure `freezer-inventory` rules, and persists the
//! result through the injected store. Errors from both layers are folded into
//! [`ServiceError`].

use std::collections::HashMap;

use chrono::{Local, NaiveDate, Utc};
use tracing::{info, warn};

use freezer_core::{ContainerId, ContainerTypeId, DomainError, Entity, InventoryItemId, MealSetId, RecipeId};
use freezer_inventory::{
    complete_count, fifo_order, prepare_intake, select_single_set, ActiveFilter, Container,
    ContainerPatch, ContainerType, IntakeContext, InventoryItem, InventoryView, ListFilters,
    MealSet, NewContainer, NewContainerType, NewInventoryItem, NewMealSet, NewRecipe,
    NoItemsAvailable, Page, Recipe, RecipePatch, RecipeQuery, StorageType, TakeoutBatch,
    DEFAULT_BEST_BEFORE_DAYS,
};

use crate::store::{SharedStore, StoreError};

#[derive(Debug)]
pub enum ServiceError {
    /// Referenced record does not exist.
    NotFound(&'static str),
    /// Input failed validation (deterministic).
    Validation(String),
    /// Domain invariant failure (deterministic).
    InvariantViolation(String),
    /// Not enough active items to assemble one complete meal set.
    NoItemsAvailable(NoItemsAvailable),
    /// A take-out request named no items.
    NoItemsSelected,
    /// Some items of a take-out batch are unknown or already taken out.
    ItemsUnavailable(Vec<InventoryItemId>),
    /// Explicit take-out ids that belong to a different meal set.
    ItemNotInSet(Vec<InventoryItemId>),
    /// Unique constraint clash (e.g. duplicate container code).
    Conflict(String),
    /// Backend failure.
    Store(StoreError),
}

impl From<DomainError> for ServiceError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => ServiceError::Validation(msg),
            DomainError::InvariantViolation(msg) => ServiceError::InvariantViolation(msg),
            DomainError::InvalidId(msg) => ServiceError::Validation(msg),
            DomainError::NotFound(resource) => ServiceError::NotFound(resource),
            DomainError::Conflict(msg) => ServiceError::Conflict(msg),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Takeout(rejection) => ServiceError::ItemsUnavailable(rejection.ids()),
            StoreError::Duplicate { field, value } => {
                ServiceError::Conflict(format!("{field} already exists: {value}"))
            }
            StoreError::NotFound(resource) => ServiceError::NotFound(resource),
            other => ServiceError::Store(other),
        }
    }
}

impl From<NoItemsAvailable> for ServiceError {
    fn from(value: NoItemsAvailable) -> Self {
        ServiceError::NoItemsAvailable(value)
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Runtime knobs the service needs from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceSettings {
    pub default_best_before_days: u32,
    pub expiring_window_days: i64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            default_best_before_days: DEFAULT_BEST_BEFORE_DAYS,
            expiring_window_days: 14,
        }
    }
}

/// An inventory item with the values derived for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemView {
    pub item: InventoryItem,
    pub best_before: NaiveDate,
    pub is_expiring: bool,
    pub container_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MealSetSummary {
    pub set: MealSet,
    pub active_count: usize,
    pub complete_count: u32,
    pub is_expiring: bool,
    /// Items the next take-out would consume; empty when no complete set is available.
    pub fifo_ids: Vec<InventoryItemId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MealSetDetail {
    pub summary: MealSetSummary,
    /// All active items of the set, FIFO ordered.
    pub items: Vec<ItemView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerView {
    pub container: Container,
    pub container_type: Option<ContainerType>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthReport {
    pub ok: bool,
    pub backend: &'static str,
    pub error: Option<String>,
}

pub struct FreezerService {
    store: SharedStore,
    settings: ServiceSettings,
}

impl FreezerService {
    pub fn new(store: SharedStore, settings: ServiceSettings) -> Self {
        Self { store, settings }
    }

    pub fn settings(&self) -> ServiceSettings {
        self.settings
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    pub async fn health(&self) -> HealthReport {
        match self.store.ping().await {
            Ok(()) => HealthReport {
                ok: true,
                backend: self.store.backend(),
                error: None,
            },
            Err(err) => {
                warn!(error = %err, "store health check failed");
                HealthReport {
                    ok: false,
                    backend: self.store.backend(),
                    error: Some(err.to_string()),
                }
            }
        }
    }

    // ---- meal sets -------------------------------------------------------

    pub async fn list_meal_sets(
        &self,
        filters: &ListFilters,
        page: Page,
    ) -> ServiceResult<Vec<MealSetSummary>> {
        let sets = self.store.list_meal_sets().await?;
        let mut by_set: HashMap<MealSetId, Vec<InventoryItem>> = HashMap::new();
        for item in self.store.list_active_items().await? {
            if let Some(set_id) = item.meal_set_id {
                by_set.entry(set_id).or_default().push(item);
            }
        }

        let today = self.today();
        let mut summaries: Vec<MealSetSummary> = sets
            .into_iter()
            .filter(|set| filters.matches_text(&[set.name.as_str()]))
            .filter(|set| filters.matches_diet(set.is_veggie, set.is_vegan))
            .map(|set| {
                let items = by_set.remove(&set.id).unwrap_or_default();
                self.summarize(set, &items, today)
            })
            .filter(|summary| filters.matches_expiry(summary.is_expiring))
            .collect();
        summaries.sort_by(|a, b| {
            a.set
                .name
                .to_lowercase()
                .cmp(&b.set.name.to_lowercase())
                .then(a.set.id.cmp(&b.set.id))
        });
        Ok(page.apply(summaries))
    }

    pub async fn meal_set_detail(&self, id: MealSetId) -> ServiceResult<MealSetDetail> {
        let set = self.require_meal_set(id).await?;
        let mut items = self.store.active_items_for_set(id).await?;
        fifo_order(&mut items);

        let today = self.today();
        let summary = self.summarize(set, &items, today);
        let codes = self.container_codes().await?;
        let items = items
            .into_iter()
            .map(|item| self.view_item(item, today, &codes))
            .collect();
        Ok(MealSetDetail { summary, items })
    }

    pub async fn create_meal_set(&self, input: NewMealSet) -> ServiceResult<MealSet> {
        let set = self.store.insert_meal_set(input.validate()?).await?;
        info!(meal_set_id = %set.id, name = %set.name, "meal set created");
        Ok(set)
    }

    /// FIFO selection of one complete set. No side effects.
    pub async fn select_for_set(&self, id: MealSetId) -> ServiceResult<Vec<InventoryItemId>> {
        let set = self.require_meal_set(id).await?;
        let items = self.store.active_items_for_set(id).await?;
        let selected = select_single_set(&set, &items).inspect_err(|err| {
            warn!(
                meal_set_id = %id,
                component = ?err.component,
                required = err.required,
                available = err.available,
                "meal set cannot be completed"
            );
        })?;
        Ok(selected)
    }

    /// Take out one meal set: the explicit ids when given, else the FIFO selection.
    pub async fn take_out_meal_set(
        &self,
        id: MealSetId,
        explicit: Option<Vec<InventoryItemId>>,
    ) -> ServiceResult<Vec<InventoryItemId>> {
        let set = self.require_meal_set(id).await?;
        let explicit = explicit.and_then(|ids| TakeoutBatch::new(ids));

        let batch = match explicit {
            Some(batch) => {
                let mut foreign = Vec::new();
                for item_id in batch.ids() {
                    if let Some(item) = self.store.get_item(*item_id).await? {
                        if item.meal_set_id != Some(set.id) {
                            foreign.push(*item_id);
                        }
                    }
                }
                if !foreign.is_empty() {
                    warn!(meal_set_id = %id, ?foreign, "take-out ids outside meal set");
                    return Err(ServiceError::ItemNotInSet(foreign));
                }
                batch
            }
            None => {
                let selected = self.select_for_set(id).await?;
                TakeoutBatch::new(selected).ok_or_else(|| {
                    ServiceError::InvariantViolation("selector returned no items".to_string())
                })?
            }
        };

        let taken = self.apply_takeout(&batch).await?;
        info!(meal_set_id = %id, items = taken.len(), "meal set taken out");
        Ok(taken)
    }

    // ---- inventory -------------------------------------------------------

    pub async fn take_out_items(&self, ids: Vec<InventoryItemId>) -> ServiceResult<Vec<InventoryItemId>> {
        let batch = TakeoutBatch::new(ids).ok_or(ServiceError::NoItemsSelected)?;
        let taken = self.apply_takeout(&batch).await?;
        info!(items = taken.len(), "items taken out");
        Ok(taken)
    }

    async fn apply_takeout(&self, batch: &TakeoutBatch) -> ServiceResult<Vec<InventoryItemId>> {
        match self.store.take_out(batch, Utc::now()).await {
            Ok(ids) => Ok(ids),
            Err(StoreError::Takeout(rejection)) => {
                warn!(
                    missing = ?rejection.missing,
                    taken_out = ?rejection.taken_out,
                    "take-out rejected"
                );
                Err(ServiceError::ItemsUnavailable(rejection.ids()))
            }
            Err(err) => Err(err.into()),
        }
    }

    pub async fn list_items(
        &self,
        view: InventoryView,
        filters: &ListFilters,
        page: Page,
    ) -> ServiceResult<Vec<ItemView>> {
        let item_type = view.item_type();
        let today = self.today();
        let window = self.settings.expiring_window_days;

        let mut items: Vec<InventoryItem> = self
            .store
            .list_active_items()
            .await?
            .into_iter()
            .filter(|i| i.item_type == item_type)
            .filter(|i| filters.matches_text(&[i.name.as_str(), i.id_code.as_str()]))
            .filter(|i| filters.matches_diet(i.is_veggie, i.is_vegan))
            .filter(|i| filters.matches_expiry(i.is_expiring(today, window)))
            .collect();
        fifo_order(&mut items);

        let codes = self.container_codes().await?;
        Ok(page
            .apply(items)
            .into_iter()
            .map(|item| self.view_item(item, today, &codes))
            .collect())
    }

    pub async fn get_item(&self, id: InventoryItemId) -> ServiceResult<ItemView> {
        let item = self
            .store
            .get_item(id)
            .await?
            .ok_or(ServiceError::NotFound(InventoryItem::RESOURCE))?;
        let codes = self.container_codes().await?;
        Ok(self.view_item(item, self.today(), &codes))
    }

    /// Intake of a new frozen item.
    pub async fn create_item(&self, input: NewInventoryItem) -> ServiceResult<ItemView> {
        let recipe = match input.recipe_id {
            Some(id) => self.store.get_recipe(id).await?,
            None => None,
        };
        let meal_set = match input.meal_set_id {
            Some(id) => self.store.get_meal_set(id).await?,
            None => None,
        };
        let container = match input.container_id {
            Some(id) => self.store.get_container(id).await?,
            None => None,
        };

        let today = self.today();
        let ctx = IntakeContext {
            recipe: recipe.as_ref(),
            meal_set: meal_set.as_ref(),
            container: container.as_ref(),
            today,
            default_best_before_days: self.settings.default_best_before_days,
        };
        let draft = prepare_intake(input, &ctx)?;
        let item = self.store.insert_item(draft).await?;
        info!(item_id = %item.id, id_code = %item.id_code, "item frozen");

        let mut codes = HashMap::new();
        if let Some(c) = container {
            codes.insert(c.id, c.container_code);
        }
        Ok(self.view_item(item, today, &codes))
    }

    pub fn storage_standards(&self) -> &'static [StorageType] {
        &StorageType::STANDARDS
    }

    // ---- containers ------------------------------------------------------

    pub async fn list_container_types(&self) -> ServiceResult<Vec<ContainerType>> {
        Ok(self.store.list_container_types().await?)
    }

    pub async fn create_container_type(&self, input: NewContainerType) -> ServiceResult<ContainerType> {
        let created = self.store.insert_container_type(input.validate()?).await?;
        info!(container_type_id = %created.id, "container type created");
        Ok(created)
    }

    pub async fn list_containers(&self, active: ActiveFilter) -> ServiceResult<Vec<ContainerView>> {
        let types: HashMap<_, _> = self
            .store
            .list_container_types()
            .await?
            .into_iter()
            .map(|t| (t.id, t))
            .collect();
        let mut containers: Vec<Container> = self
            .store
            .list_containers()
            .await?
            .into_iter()
            .filter(|c| active.matches(c.is_active))
            .collect();
        containers.sort_by(|a, b| {
            a.container_code
                .cmp(&b.container_code)
                .then(a.id.cmp(&b.id))
        });
        Ok(containers
            .into_iter()
            .map(|container| ContainerView {
                container_type: container
                    .container_type_id
                    .and_then(|id| types.get(&id).cloned()),
                container,
            })
            .collect())
    }

    pub async fn create_container(&self, input: NewContainer) -> ServiceResult<Container> {
        let input = input.validate()?;
        if let Some(type_id) = input.container_type_id {
            self.require_container_type(type_id).await?;
        }
        let created = self.store.insert_container(input).await?;
        info!(container_id = %created.id, code = %created.container_code, "container created");
        Ok(created)
    }

    pub async fn update_container(&self, id: ContainerId, patch: ContainerPatch) -> ServiceResult<Container> {
        let current = self
            .store
            .get_container(id)
            .await?
            .ok_or(ServiceError::NotFound(Container::RESOURCE))?;
        let next = patch.apply(&current)?;
        if let Some(type_id) = next.container_type_id {
            if current.container_type_id != Some(type_id) {
                self.require_container_type(type_id).await?;
            }
        }
        Ok(self.store.update_container(next).await?)
    }

    // ---- recipes ---------------------------------------------------------

    pub async fn list_recipes(&self, query: &RecipeQuery) -> ServiceResult<Vec<Recipe>> {
        Ok(query.apply(self.store.list_recipes().await?))
    }

    pub async fn get_recipe(&self, id: RecipeId) -> ServiceResult<Recipe> {
        self.store
            .get_recipe(id)
            .await?
            .ok_or(ServiceError::NotFound(Recipe::RESOURCE))
    }

    pub async fn create_recipe(&self, input: NewRecipe) -> ServiceResult<Recipe> {
        let created = self.store.insert_recipe(input.validate()?).await?;
        info!(recipe_id = %created.id, name = %created.name, "recipe created");
        Ok(created)
    }

    pub async fn update_recipe(&self, id: RecipeId, patch: RecipePatch) -> ServiceResult<Recipe> {
        let current = self.get_recipe(id).await?;
        let next = patch.apply(&current, Utc::now())?;
        Ok(self.store.update_recipe(next).await?)
    }

    // ---- helpers ---------------------------------------------------------

    async fn require_meal_set(&self, id: MealSetId) -> ServiceResult<MealSet> {
        self.store
            .get_meal_set(id)
            .await?
            .ok_or(ServiceError::NotFound(MealSet::RESOURCE))
    }

    async fn require_container_type(&self, id: ContainerTypeId) -> ServiceResult<()> {
        match self.store.get_container_type(id).await? {
            Some(_) => Ok(()),
            None => Err(ServiceError::Validation(format!(
                "container type {id} does not exist"
            ))),
        }
    }

    async fn container_codes(&self) -> ServiceResult<HashMap<ContainerId, String>> {
        Ok(self
            .store
            .list_containers()
            .await?
            .into_iter()
            .map(|c| (c.id, c.container_code))
            .collect())
    }

    fn summarize(&self, set: MealSet, items: &[InventoryItem], today: NaiveDate) -> MealSetSummary {
        let window = self.settings.expiring_window_days;
        MealSetSummary {
            active_count: items.len(),
            complete_count: complete_count(&set, items),
            is_expiring: items.iter().any(|i| i.is_expiring(today, window)),
            fifo_ids: select_single_set(&set, items).unwrap_or_default(),
            set,
        }
    }

    fn view_item(
        &self,
        item: InventoryItem,
        today: NaiveDate,
        codes: &HashMap<ContainerId, String>,
    ) -> ItemView {
        ItemView {
            best_before: item.best_before(),
            is_expiring: item.is_expiring(today, self.settings.expiring_window_days),
            container_code: item.container_id.and_then(|id| codes.get(&id).cloned()),
            item,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;

    use super::*;
    use crate::store::InMemoryFreezerStore;
    use freezer_inventory::{ItemType, MealSetComponent};

    fn service() -> FreezerService {
        FreezerService::new(Arc::new(InMemoryFreezerStore::new()), ServiceSettings::default())
    }

    fn days_ago(n: i64) -> NaiveDate {
        Local::now().date_naive() - Duration::days(n)
    }

    fn components(parts: &[(&str, u32)]) -> Vec<MealSetComponent> {
        parts
            .iter()
            .map(|(k, q)| MealSetComponent {
                key: k.to_string(),
                label: String::new(),
                quantity: *q,
            })
            .collect()
    }

    async fn meal_set(svc: &FreezerService, name: &str, parts: &[(&str, u32)]) -> MealSet {
        svc.create_meal_set(NewMealSet {
            name: name.to_string(),
            is_veggie: false,
            is_vegan: false,
            components: components(parts),
        })
        .await
        .unwrap()
    }

    async fn freeze(
        svc: &FreezerService,
        set: Option<MealSetId>,
        component: Option<&str>,
        frozen_days_ago: i64,
    ) -> InventoryItemId {
        svc.create_item(NewInventoryItem {
            name: Some("Portion".to_string()),
            meal_set_id: set,
            component: component.map(str::to_string),
            frozen_at: Some(days_ago(frozen_days_ago)),
            ..Default::default()
        })
        .await
        .unwrap()
        .item
        .id
    }

    #[tokio::test]
    async fn fifo_takeout_takes_oldest_with_id_tie_break() {
        let svc = service();
        let set = meal_set(&svc, "Chili", &[("main", 2)]).await;
        let a = freeze(&svc, Some(set.id), None, 10).await;
        let b = freeze(&svc, Some(set.id), None, 10).await;
        let _c = freeze(&svc, Some(set.id), None, 8).await;

        assert_eq!(svc.select_for_set(set.id).await.unwrap(), vec![a, b]);
        let taken = svc.take_out_meal_set(set.id, None).await.unwrap();
        assert_eq!(taken, vec![a, b]);

        let detail = svc.meal_set_detail(set.id).await.unwrap();
        assert_eq!(detail.items.len(), 1);
        assert_eq!(detail.summary.complete_count, 0);
        assert!(detail.summary.fifo_ids.is_empty());
    }

    #[tokio::test]
    async fn short_meal_set_fails_without_mutation() {
        let svc = service();
        let set = meal_set(&svc, "Lasagne", &[("main", 3)]).await;
        freeze(&svc, Some(set.id), None, 3).await;
        freeze(&svc, Some(set.id), None, 2).await;

        assert!(matches!(
            svc.select_for_set(set.id).await,
            Err(ServiceError::NoItemsAvailable(_))
        ));
        let err = svc.take_out_meal_set(set.id, None).await.unwrap_err();
        match err {
            ServiceError::NoItemsAvailable(e) => {
                assert_eq!(e.required, 3);
                assert_eq!(e.available, 2);
            }
            other => panic!("expected NoItemsAvailable, got {other:?}"),
        }
        let detail = svc.meal_set_detail(set.id).await.unwrap();
        assert_eq!(detail.summary.active_count, 2);
    }

    #[tokio::test]
    async fn unknown_meal_set_is_not_found() {
        let svc = service();
        let err = svc.select_for_set(MealSetId::new(42)).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound("meal set")));
    }

    #[tokio::test]
    async fn explicit_takeout_ids_must_belong_to_set() {
        let svc = service();
        let curry = meal_set(&svc, "Curry", &[("main", 1)]).await;
        let soup = meal_set(&svc, "Soup", &[("main", 1)]).await;
        let _mine = freeze(&svc, Some(curry.id), None, 1).await;
        let theirs = freeze(&svc, Some(soup.id), None, 1).await;

        let err = svc
            .take_out_meal_set(curry.id, Some(vec![theirs]))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::ItemNotInSet(ids) if ids == vec![theirs]));
        assert!(svc.get_item(theirs).await.unwrap().item.is_active);
    }

    #[tokio::test]
    async fn batch_with_taken_out_item_changes_nothing() {
        let svc = service();
        let a = freeze(&svc, None, None, 1).await;
        let b = freeze(&svc, None, None, 1).await;
        svc.take_out_items(vec![a]).await.unwrap();

        let err = svc.take_out_items(vec![b, a]).await.unwrap_err();
        assert!(matches!(err, ServiceError::ItemsUnavailable(ids) if ids == vec![a]));
        assert!(svc.get_item(b).await.unwrap().item.is_active);
    }

    #[tokio::test]
    async fn empty_takeout_is_rejected() {
        let svc = service();
        let err = svc.take_out_items(Vec::new()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NoItemsSelected));
    }

    #[tokio::test]
    async fn multi_component_set_counts_complete_sets() {
        let svc = service();
        let set = meal_set(&svc, "Curry + rice", &[("curry", 1), ("rice", 2)]).await;
        let curry = freeze(&svc, Some(set.id), Some("curry"), 5).await;
        let rice1 = freeze(&svc, Some(set.id), Some("rice"), 6).await;
        let rice2 = freeze(&svc, Some(set.id), Some("rice"), 4).await;
        freeze(&svc, Some(set.id), Some("rice"), 1).await;

        let sets = svc
            .list_meal_sets(&ListFilters::default(), Page::default())
            .await
            .unwrap();
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].complete_count, 1);
        assert_eq!(sets[0].fifo_ids, vec![rice1, curry, rice2]);
    }

    #[tokio::test]
    async fn meal_set_filters_apply_text_and_expiry() {
        let svc = service();
        let old = meal_set(&svc, "Old stew", &[("main", 1)]).await;
        let fresh = meal_set(&svc, "Fresh soup", &[("main", 1)]).await;
        // 90 day shelf life; frozen 85 days ago expires within the window.
        freeze(&svc, Some(old.id), None, 85).await;
        freeze(&svc, Some(fresh.id), None, 1).await;

        let expiring = svc
            .list_meal_sets(&ListFilters::new(None, false, true), Page::default())
            .await
            .unwrap();
        assert_eq!(expiring.len(), 1);
        assert_eq!(expiring[0].set.id, old.id);

        let searched = svc
            .list_meal_sets(&ListFilters::new(Some("SOUP"), false, false), Page::default())
            .await
            .unwrap();
        assert_eq!(searched.len(), 1);
        assert_eq!(searched[0].set.id, fresh.id);
    }

    #[tokio::test]
    async fn list_items_filters_by_view_in_fifo_order() {
        let svc = service();
        let newer = freeze(&svc, None, None, 1).await;
        let older = freeze(&svc, None, None, 9).await;
        svc.create_item(NewInventoryItem {
            name: Some("Stock".to_string()),
            item_type: Some("INGREDIENT".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

        let singles = svc
            .list_items(InventoryView::Single, &ListFilters::default(), Page::default())
            .await
            .unwrap();
        let ids: Vec<_> = singles.iter().map(|v| v.item.id).collect();
        assert_eq!(ids, vec![older, newer]);

        let ingredients = svc
            .list_items(InventoryView::Ingredient, &ListFilters::default(), Page::default())
            .await
            .unwrap();
        assert_eq!(ingredients.len(), 1);
        assert_eq!(ingredients[0].item.item_type, ItemType::Ingredient);
    }

    #[tokio::test]
    async fn intake_with_unknown_recipe_is_validation_error() {
        let svc = service();
        let err = svc
            .create_item(NewInventoryItem {
                recipe_id: Some(RecipeId::new(5)),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn boxed_intake_reports_container_code() {
        let svc = service();
        let container = svc
            .create_container(NewContainer {
                container_code: "B-07".to_string(),
                container_type_id: None,
                note: None,
                is_active: true,
            })
            .await
            .unwrap();
        let view = svc
            .create_item(NewInventoryItem {
                name: Some("Goulash".to_string()),
                container_id: Some(container.id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(view.item.storage_type, StorageType::Box);
        assert_eq!(view.container_code.as_deref(), Some("B-07"));
    }

    #[tokio::test]
    async fn duplicate_container_code_is_conflict() {
        let svc = service();
        let input = NewContainer {
            container_code: "B-01".to_string(),
            container_type_id: None,
            note: None,
            is_active: true,
        };
        svc.create_container(input.clone()).await.unwrap();
        let err = svc.create_container(input).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn container_listing_honours_active_filter() {
        let svc = service();
        let kept = svc
            .create_container(NewContainer {
                container_code: "B-02".to_string(),
                container_type_id: None,
                note: None,
                is_active: true,
            })
            .await
            .unwrap();
        let retired = svc
            .create_container(NewContainer {
                container_code: "B-01".to_string(),
                container_type_id: None,
                note: None,
                is_active: true,
            })
            .await
            .unwrap();
        svc.update_container(
            retired.id,
            ContainerPatch {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let active = svc.list_containers(ActiveFilter::Active).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].container.id, kept.id);

        let all = svc.list_containers(ActiveFilter::All).await.unwrap();
        let codes: Vec<_> = all.iter().map(|v| v.container.container_code.as_str()).collect();
        assert_eq!(codes, vec!["B-01", "B-02"]);
    }

    #[tokio::test]
    async fn container_with_unknown_type_is_rejected() {
        let svc = service();
        let err = svc
            .create_container(NewContainer {
                container_code: "B-03".to_string(),
                container_type_id: Some(ContainerTypeId::new(9)),
                note: None,
                is_active: true,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn recipe_patch_updates_and_normalises_flags() {
        let svc = service();
        let recipe = svc
            .create_recipe(NewRecipe {
                name: "Dal".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        let updated = svc
            .update_recipe(
                recipe.id,
                RecipePatch {
                    is_vegan: Some(true),
                    kcal_per_portion: Some(Some(380)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.is_vegan);
        assert!(updated.is_veggie);
        assert_eq!(updated.kcal_per_portion, Some(380));
        assert!(updated.updated_at >= recipe.updated_at);

        let missing = svc
            .update_recipe(RecipeId::new(99), RecipePatch::default())
            .await
            .unwrap_err();
        assert!(matches!(missing, ServiceError::NotFound("recipe")));
    }

    #[tokio::test]
    async fn health_reports_backend() {
        let report = service().health().await;
        assert!(report.ok);
        assert_eq!(report.backend, "memory");
    }
}
