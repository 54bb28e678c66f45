use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use freezer_core::{ContainerId, ContainerTypeId, Entity, InventoryItemId, MealSetId, RecipeId};
use freezer_inventory::{
    Container, ContainerType, ContainerTypeDraft, InventoryItem, ItemDraft, MealSet,
    NewContainer, NewMealSet, Recipe, RecipeDraft, TakeoutBatch,
};

use super::{FreezerStore, StoreError, StoreResult};

/// Rows of one entity keyed by id, with a serial counter.
#[derive(Debug)]
struct Table<E: Entity> {
    rows: BTreeMap<E::Id, E>,
    last_id: i64,
}

impl<E> Table<E>
where
    E: Entity + Clone,
    E::Id: From<i64>,
{
    fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
            last_id: 0,
        }
    }

    fn next_id(&mut self) -> E::Id {
        self.last_id += 1;
        E::Id::from(self.last_id)
    }

    fn insert(&mut self, row: E) -> E {
        self.rows.insert(row.id(), row.clone());
        row
    }

    fn get(&self, id: E::Id) -> Option<E> {
        self.rows.get(&id).cloned()
    }

    fn all(&self) -> Vec<E> {
        self.rows.values().cloned().collect()
    }

    fn replace(&mut self, row: E) -> StoreResult<E> {
        match self.rows.get_mut(&row.id()) {
            Some(slot) => {
                *slot = row.clone();
                Ok(row)
            }
            None => Err(StoreError::NotFound(E::RESOURCE)),
        }
    }
}

#[derive(Debug)]
struct Tables {
    meal_sets: Table<MealSet>,
    items: Table<InventoryItem>,
    container_types: Table<ContainerType>,
    containers: Table<Container>,
    recipes: Table<Recipe>,
}

/// In-memory store for tests/dev. Contents are lost on restart.
#[derive(Debug)]
pub struct InMemoryFreezerStore {
    inner: RwLock<Tables>,
}

impl InMemoryFreezerStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Tables {
                meal_sets: Table::new(),
                items: Table::new(),
                container_types: Table::new(),
                containers: Table::new(),
                recipes: Table::new(),
            }),
        }
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.inner.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.inner.write().map_err(|_| StoreError::Poisoned)
    }
}

impl Default for InMemoryFreezerStore {
    fn default() -> Self {
        Self::new()
    }
}

fn ensure_unique_code(
    containers: &Table<Container>,
    code: &str,
    except: Option<ContainerId>,
) -> StoreResult<()> {
    let taken = containers
        .rows
        .values()
        .any(|c| c.container_code == code && Some(c.id) != except);
    if taken {
        return Err(StoreError::Duplicate {
            field: "container_code",
            value: code.to_string(),
        });
    }
    Ok(())
}

#[async_trait::async_trait]
impl FreezerStore for InMemoryFreezerStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> StoreResult<()> {
        self.read().map(|_| ())
    }

    async fn list_meal_sets(&self) -> StoreResult<Vec<MealSet>> {
        Ok(self.read()?.meal_sets.all())
    }

    async fn get_meal_set(&self, id: MealSetId) -> StoreResult<Option<MealSet>> {
        Ok(self.read()?.meal_sets.get(id))
    }

    async fn insert_meal_set(&self, set: NewMealSet) -> StoreResult<MealSet> {
        let mut tables = self.write()?;
        let id = tables.meal_sets.next_id();
        Ok(tables.meal_sets.insert(MealSet {
            id,
            name: set.name,
            is_veggie: set.is_veggie,
            is_vegan: set.is_vegan,
            components: set.components,
            created_at: Utc::now(),
        }))
    }

    async fn list_active_items(&self) -> StoreResult<Vec<InventoryItem>> {
        let tables = self.read()?;
        Ok(tables
            .items
            .rows
            .values()
            .filter(|i| i.is_active)
            .cloned()
            .collect())
    }

    async fn active_items_for_set(&self, set: MealSetId) -> StoreResult<Vec<InventoryItem>> {
        let tables = self.read()?;
        Ok(tables
            .items
            .rows
            .values()
            .filter(|i| i.is_active && i.meal_set_id == Some(set))
            .cloned()
            .collect())
    }

    async fn get_item(&self, id: InventoryItemId) -> StoreResult<Option<InventoryItem>> {
        Ok(self.read()?.items.get(id))
    }

    async fn insert_item(&self, draft: ItemDraft) -> StoreResult<InventoryItem> {
        let mut tables = self.write()?;
        if let Some(code) = draft.id_code.as_deref() {
            if tables.items.rows.values().any(|i| i.id_code == code) {
                return Err(StoreError::Duplicate {
                    field: "id_code",
                    value: code.to_string(),
                });
            }
        }
        let id = tables.items.next_id();
        Ok(tables.items.insert(draft.into_item(id, Utc::now())))
    }

    async fn take_out(
        &self,
        batch: &TakeoutBatch,
        at: DateTime<Utc>,
    ) -> StoreResult<Vec<InventoryItemId>> {
        // Check and mutate under one write guard.
        let mut tables = self.write()?;
        let found: Vec<(InventoryItemId, bool)> = batch
            .ids()
            .iter()
            .filter_map(|id| tables.items.rows.get(id).map(|i| (*id, i.is_active)))
            .collect();
        batch.check(found)?;

        for id in batch.ids() {
            if let Some(item) = tables.items.rows.get_mut(id) {
                item.is_active = false;
                item.taken_out_at = Some(at);
            }
        }
        Ok(batch.ids().to_vec())
    }

    async fn list_container_types(&self) -> StoreResult<Vec<ContainerType>> {
        Ok(self.read()?.container_types.all())
    }

    async fn get_container_type(&self, id: ContainerTypeId) -> StoreResult<Option<ContainerType>> {
        Ok(self.read()?.container_types.get(id))
    }

    async fn insert_container_type(&self, draft: ContainerTypeDraft) -> StoreResult<ContainerType> {
        let mut tables = self.write()?;
        let id = tables.container_types.next_id();
        Ok(tables.container_types.insert(ContainerType {
            id,
            shape: draft.shape,
            volume_ml: draft.volume_ml,
            height_mm: draft.height_mm,
            width_mm: draft.width_mm,
            length_mm: draft.length_mm,
            material: draft.material,
            note: draft.note,
            created_at: Utc::now(),
        }))
    }

    async fn list_containers(&self) -> StoreResult<Vec<Container>> {
        Ok(self.read()?.containers.all())
    }

    async fn get_container(&self, id: ContainerId) -> StoreResult<Option<Container>> {
        Ok(self.read()?.containers.get(id))
    }

    async fn insert_container(&self, container: NewContainer) -> StoreResult<Container> {
        let mut tables = self.write()?;
        ensure_unique_code(&tables.containers, &container.container_code, None)?;
        let id = tables.containers.next_id();
        Ok(tables.containers.insert(Container {
            id,
            container_code: container.container_code,
            container_type_id: container.container_type_id,
            note: container.note,
            is_active: container.is_active,
            created_at: Utc::now(),
        }))
    }

    async fn update_container(&self, container: Container) -> StoreResult<Container> {
        let mut tables = self.write()?;
        ensure_unique_code(&tables.containers, &container.container_code, Some(container.id))?;
        tables.containers.replace(container)
    }

    async fn list_recipes(&self) -> StoreResult<Vec<Recipe>> {
        Ok(self.read()?.recipes.all())
    }

    async fn get_recipe(&self, id: RecipeId) -> StoreResult<Option<Recipe>> {
        Ok(self.read()?.recipes.get(id))
    }

    async fn insert_recipe(&self, draft: RecipeDraft) -> StoreResult<Recipe> {
        let mut tables = self.write()?;
        let id = tables.recipes.next_id();
        let now = Utc::now();
        Ok(tables.recipes.insert(Recipe {
            id,
            name: draft.name,
            recipe_type: draft.recipe_type,
            yield_portions: draft.yield_portions,
            kcal_per_portion: draft.kcal_per_portion,
            default_best_before_days: draft.default_best_before_days,
            tags_text: draft.tags_text,
            ingredients_text: draft.ingredients_text,
            prep_text: draft.prep_text,
            reheat_text: draft.reheat_text,
            is_veggie: draft.is_veggie,
            is_vegan: draft.is_vegan,
            created_at: now,
            updated_at: now,
        }))
    }

    async fn update_recipe(&self, recipe: Recipe) -> StoreResult<Recipe> {
        self.write()?.recipes.replace(recipe)
    }
}
