//! Postgres-backed freezer store.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Duplicate` (field taken from the constraint name) |
//! | Database (other) | any other | `Database` |
//! | PoolClosed / other | N/A | `Database` |
//!
//! Rows whose enum columns hold unknown values decode to `StoreError::Corrupt`.
//!
//! ## Take-out
//!
//! `take_out` locks the batch rows with `SELECT ... FOR UPDATE`, validates
//! them with [`TakeoutBatch::check`], then flips them with an `UPDATE` guarded
//! by `is_active`. A row-count mismatch rolls the transaction back, so two
//! overlapping batches can never both succeed.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::{debug, instrument};

use freezer_core::{ContainerId, ContainerTypeId, Entity, InventoryItemId, MealSetId, RecipeId};
use freezer_inventory::{
    Container, ContainerType, ContainerTypeDraft, InventoryItem, ItemDraft, ItemType, Material,
    MealSet, MealSetComponent, NewContainer, NewMealSet, Recipe, RecipeDraft, RecipeType, Shape,
    StorageType, TakeoutBatch, TakeoutRejection,
};

use super::{FreezerStore, StoreError, StoreResult};

const SCHEMA: &str = include_str!("../../migrations/0001_init.sql");

const ITEM_COLUMNS: &str = "id, id_code, name, item_type, frozen_at, best_before_days, \
     is_veggie, is_vegan, meal_set_id, component, recipe_id, storage_type, container_id, \
     note, is_active, taken_out_at, created_at";

const RECIPE_COLUMNS: &str = "id, name, recipe_type, yield_portions, kcal_per_portion, \
     default_best_before_days, tags_text, ingredients_text, prep_text, reheat_text, \
     is_veggie, is_vegan, created_at, updated_at";

const CONTAINER_TYPE_COLUMNS: &str =
    "id, shape, volume_ml, height_mm, width_mm, length_mm, material, note, created_at";

const CONTAINER_COLUMNS: &str = "id, container_code, container_type_id, note, is_active, created_at";

/// PostgreSQL store. Cheap to clone; all clones share one pool.
#[derive(Debug, Clone)]
pub struct PostgresFreezerStore {
    pool: Arc<PgPool>,
}

impl PostgresFreezerStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Connect and bring the schema up to date.
    #[instrument(skip(database_url), err)]
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    /// Apply the bundled schema. Safe to run repeatedly.
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        debug!("schema applied");
        Ok(())
    }

    async fn components_for(&self, ids: &[i64]) -> StoreResult<BTreeMap<i64, Vec<MealSetComponent>>> {
        let rows = sqlx::query(
            r#"
            SELECT meal_set_id, key, label, quantity
            FROM meal_set_components
            WHERE meal_set_id = ANY($1)
            ORDER BY meal_set_id, position
            "#,
        )
        .bind(ids)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("load_components", e))?;

        let mut grouped: BTreeMap<i64, Vec<MealSetComponent>> = BTreeMap::new();
        for row in rows {
            let set_id: i64 = row.try_get("meal_set_id").map_err(|e| map_sqlx_error("decode_component", e))?;
            let component = MealSetComponent {
                key: row.try_get("key").map_err(|e| map_sqlx_error("decode_component", e))?,
                label: row.try_get("label").map_err(|e| map_sqlx_error("decode_component", e))?,
                quantity: to_u32(
                    "quantity",
                    row.try_get("quantity").map_err(|e| map_sqlx_error("decode_component", e))?,
                )?,
            };
            grouped.entry(set_id).or_default().push(component);
        }
        Ok(grouped)
    }

    async fn fetch_items(&self, operation: &str, sql: String, set: Option<i64>) -> StoreResult<Vec<InventoryItem>> {
        let mut query = sqlx::query_as::<_, ItemRow>(&sql);
        if let Some(set) = set {
            query = query.bind(set);
        }
        let rows = query
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;
        rows.into_iter().map(InventoryItem::try_from).collect()
    }
}

#[async_trait::async_trait]
impl FreezerStore for PostgresFreezerStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1")
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("ping", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn list_meal_sets(&self) -> StoreResult<Vec<MealSet>> {
        let rows = sqlx::query_as::<_, MealSetRow>(
            "SELECT id, name, is_veggie, is_vegan, created_at FROM meal_sets ORDER BY id",
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_meal_sets", e))?;

        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let mut components = self.components_for(&ids).await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let parts = components.remove(&row.id).unwrap_or_default();
                row.into_meal_set(parts)
            })
            .collect())
    }

    #[instrument(skip(self), fields(meal_set_id = %id), err)]
    async fn get_meal_set(&self, id: MealSetId) -> StoreResult<Option<MealSet>> {
        let row = sqlx::query_as::<_, MealSetRow>(
            "SELECT id, name, is_veggie, is_vegan, created_at FROM meal_sets WHERE id = $1",
        )
        .bind(id.get())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_meal_set", e))?;

        match row {
            Some(row) => {
                let mut components = self.components_for(&[row.id]).await?;
                let parts = components.remove(&row.id).unwrap_or_default();
                Ok(Some(row.into_meal_set(parts)))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self, set), err)]
    async fn insert_meal_set(&self, set: NewMealSet) -> StoreResult<MealSet> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let row = sqlx::query_as::<_, MealSetRow>(
            r#"
            INSERT INTO meal_sets (name, is_veggie, is_vegan)
            VALUES ($1, $2, $3)
            RETURNING id, name, is_veggie, is_vegan, created_at
            "#,
        )
        .bind(&set.name)
        .bind(set.is_veggie)
        .bind(set.is_vegan)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_meal_set", e))?;

        for (position, component) in set.components.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO meal_set_components (meal_set_id, position, key, label, quantity)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(row.id)
            .bind(position as i64)
            .bind(&component.key)
            .bind(&component.label)
            .bind(i64::from(component.quantity))
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert_component", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(row.into_meal_set(set.components))
    }

    async fn list_active_items(&self) -> StoreResult<Vec<InventoryItem>> {
        self.fetch_items(
            "list_active_items",
            format!("SELECT {ITEM_COLUMNS} FROM inventory_items WHERE is_active"),
            None,
        )
        .await
    }

    async fn active_items_for_set(&self, set: MealSetId) -> StoreResult<Vec<InventoryItem>> {
        self.fetch_items(
            "active_items_for_set",
            format!(
                "SELECT {ITEM_COLUMNS} FROM inventory_items WHERE is_active AND meal_set_id = $1"
            ),
            Some(set.get()),
        )
        .await
    }

    async fn get_item(&self, id: InventoryItemId) -> StoreResult<Option<InventoryItem>> {
        let row = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM inventory_items WHERE id = $1"
        ))
        .bind(id.get())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_item", e))?;
        row.map(InventoryItem::try_from).transpose()
    }

    #[instrument(skip(self, draft), fields(name = %draft.name), err)]
    async fn insert_item(&self, draft: ItemDraft) -> StoreResult<InventoryItem> {
        // Reserve the id first so a generated code can embed it.
        let id: i64 = sqlx::query_scalar("SELECT nextval(pg_get_serial_sequence('inventory_items', 'id'))")
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("reserve_item_id", e))?;
        let id_code = draft
            .id_code
            .clone()
            .unwrap_or_else(|| InventoryItem::generated_code(InventoryItemId::new(id)));

        let row = sqlx::query_as::<_, ItemRow>(&format!(
            r#"
            INSERT INTO inventory_items (
                id, id_code, name, item_type, frozen_at, best_before_days,
                is_veggie, is_vegan, meal_set_id, component, recipe_id,
                storage_type, container_id, note
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&id_code)
        .bind(&draft.name)
        .bind(draft.item_type.as_str())
        .bind(draft.frozen_at)
        .bind(i64::from(draft.best_before_days))
        .bind(draft.is_veggie)
        .bind(draft.is_vegan)
        .bind(draft.meal_set_id.map(MealSetId::get))
        .bind(&draft.component)
        .bind(draft.recipe_id.map(RecipeId::get))
        .bind(draft.storage_type.as_str())
        .bind(draft.container_id.map(ContainerId::get))
        .bind(&draft.note)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_item", e))?;
        InventoryItem::try_from(row)
    }

    #[instrument(skip(self, batch), fields(batch_size = batch.len()), err)]
    async fn take_out(
        &self,
        batch: &TakeoutBatch,
        at: DateTime<Utc>,
    ) -> StoreResult<Vec<InventoryItemId>> {
        let ids: Vec<i64> = batch.ids().iter().map(|id| id.get()).collect();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let rows = sqlx::query("SELECT id, is_active FROM inventory_items WHERE id = ANY($1) FOR UPDATE")
            .bind(&ids)
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("lock_items", e))?;

        let mut found = Vec::with_capacity(rows.len());
        for row in rows {
            let id: i64 = row.try_get("id").map_err(|e| map_sqlx_error("decode_lock", e))?;
            let active: bool = row.try_get("is_active").map_err(|e| map_sqlx_error("decode_lock", e))?;
            found.push((InventoryItemId::new(id), active));
        }

        if let Err(rejection) = batch.check(found) {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Err(rejection.into());
        }

        let updated: Vec<i64> = sqlx::query_scalar(
            r#"
            UPDATE inventory_items
            SET is_active = FALSE, taken_out_at = $2
            WHERE id = ANY($1) AND is_active
            RETURNING id
            "#,
        )
        .bind(&ids)
        .bind(at)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("take_out", e))?;

        let skipped = not_updated(batch, &updated);
        if !skipped.is_empty() {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Err(StoreError::Takeout(TakeoutRejection {
                missing: Vec::new(),
                taken_out: skipped,
            }));
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(batch.ids().to_vec())
    }

    async fn list_container_types(&self) -> StoreResult<Vec<ContainerType>> {
        let rows = sqlx::query_as::<_, ContainerTypeRow>(&format!(
            "SELECT {CONTAINER_TYPE_COLUMNS} FROM container_types ORDER BY id"
        ))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_container_types", e))?;
        rows.into_iter().map(ContainerType::try_from).collect()
    }

    async fn get_container_type(&self, id: ContainerTypeId) -> StoreResult<Option<ContainerType>> {
        let row = sqlx::query_as::<_, ContainerTypeRow>(&format!(
            "SELECT {CONTAINER_TYPE_COLUMNS} FROM container_types WHERE id = $1"
        ))
        .bind(id.get())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_container_type", e))?;
        row.map(ContainerType::try_from).transpose()
    }

    #[instrument(skip(self, draft), err)]
    async fn insert_container_type(&self, draft: ContainerTypeDraft) -> StoreResult<ContainerType> {
        let row = sqlx::query_as::<_, ContainerTypeRow>(&format!(
            r#"
            INSERT INTO container_types (shape, volume_ml, height_mm, width_mm, length_mm, material, note)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {CONTAINER_TYPE_COLUMNS}
            "#
        ))
        .bind(draft.shape.as_str())
        .bind(i64::from(draft.volume_ml))
        .bind(draft.height_mm.map(i64::from))
        .bind(draft.width_mm.map(i64::from))
        .bind(draft.length_mm.map(i64::from))
        .bind(draft.material.map(|m| m.as_str()))
        .bind(&draft.note)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_container_type", e))?;
        ContainerType::try_from(row)
    }

    async fn list_containers(&self) -> StoreResult<Vec<Container>> {
        let rows = sqlx::query_as::<_, ContainerRow>(&format!(
            "SELECT {CONTAINER_COLUMNS} FROM containers ORDER BY id"
        ))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_containers", e))?;
        Ok(rows.into_iter().map(Container::from).collect())
    }

    async fn get_container(&self, id: ContainerId) -> StoreResult<Option<Container>> {
        let row = sqlx::query_as::<_, ContainerRow>(&format!(
            "SELECT {CONTAINER_COLUMNS} FROM containers WHERE id = $1"
        ))
        .bind(id.get())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_container", e))?;
        Ok(row.map(Container::from))
    }

    #[instrument(skip(self, container), fields(code = %container.container_code), err)]
    async fn insert_container(&self, container: NewContainer) -> StoreResult<Container> {
        let row = sqlx::query_as::<_, ContainerRow>(&format!(
            r#"
            INSERT INTO containers (container_code, container_type_id, note, is_active)
            VALUES ($1, $2, $3, $4)
            RETURNING {CONTAINER_COLUMNS}
            "#
        ))
        .bind(&container.container_code)
        .bind(container.container_type_id.map(ContainerTypeId::get))
        .bind(&container.note)
        .bind(container.is_active)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_container", e))?;
        Ok(Container::from(row))
    }

    #[instrument(skip(self, container), fields(container_id = %container.id), err)]
    async fn update_container(&self, container: Container) -> StoreResult<Container> {
        let row = sqlx::query_as::<_, ContainerRow>(&format!(
            r#"
            UPDATE containers
            SET container_code = $2, container_type_id = $3, note = $4, is_active = $5
            WHERE id = $1
            RETURNING {CONTAINER_COLUMNS}
            "#
        ))
        .bind(container.id.get())
        .bind(&container.container_code)
        .bind(container.container_type_id.map(ContainerTypeId::get))
        .bind(&container.note)
        .bind(container.is_active)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_container", e))?;
        row.map(Container::from).ok_or(StoreError::NotFound(Container::RESOURCE))
    }

    async fn list_recipes(&self) -> StoreResult<Vec<Recipe>> {
        let rows = sqlx::query_as::<_, RecipeRow>(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes ORDER BY id"
        ))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_recipes", e))?;
        rows.into_iter().map(Recipe::try_from).collect()
    }

    async fn get_recipe(&self, id: RecipeId) -> StoreResult<Option<Recipe>> {
        let row = sqlx::query_as::<_, RecipeRow>(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = $1"
        ))
        .bind(id.get())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_recipe", e))?;
        row.map(Recipe::try_from).transpose()
    }

    #[instrument(skip(self, draft), fields(name = %draft.name), err)]
    async fn insert_recipe(&self, draft: RecipeDraft) -> StoreResult<Recipe> {
        let row = sqlx::query_as::<_, RecipeRow>(&format!(
            r#"
            INSERT INTO recipes (
                name, recipe_type, yield_portions, kcal_per_portion, default_best_before_days,
                tags_text, ingredients_text, prep_text, reheat_text, is_veggie, is_vegan
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {RECIPE_COLUMNS}
            "#
        ))
        .bind(&draft.name)
        .bind(draft.recipe_type.as_str())
        .bind(draft.yield_portions.map(i64::from))
        .bind(draft.kcal_per_portion.map(i64::from))
        .bind(draft.default_best_before_days.map(i64::from))
        .bind(&draft.tags_text)
        .bind(&draft.ingredients_text)
        .bind(&draft.prep_text)
        .bind(&draft.reheat_text)
        .bind(draft.is_veggie)
        .bind(draft.is_vegan)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_recipe", e))?;
        Recipe::try_from(row)
    }

    #[instrument(skip(self, recipe), fields(recipe_id = %recipe.id), err)]
    async fn update_recipe(&self, recipe: Recipe) -> StoreResult<Recipe> {
        let row = sqlx::query_as::<_, RecipeRow>(&format!(
            r#"
            UPDATE recipes
            SET name = $2, recipe_type = $3, yield_portions = $4, kcal_per_portion = $5,
                default_best_before_days = $6, tags_text = $7, ingredients_text = $8,
                prep_text = $9, reheat_text = $10, is_veggie = $11, is_vegan = $12,
                updated_at = $13
            WHERE id = $1
            RETURNING {RECIPE_COLUMNS}
            "#
        ))
        .bind(recipe.id.get())
        .bind(&recipe.name)
        .bind(recipe.recipe_type.as_str())
        .bind(recipe.yield_portions.map(i64::from))
        .bind(recipe.kcal_per_portion.map(i64::from))
        .bind(recipe.default_best_before_days.map(i64::from))
        .bind(&recipe.tags_text)
        .bind(&recipe.ingredients_text)
        .bind(&recipe.prep_text)
        .bind(&recipe.reheat_text)
        .bind(recipe.is_veggie)
        .bind(recipe.is_vegan)
        .bind(recipe.updated_at)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_recipe", e))?;
        row.map(Recipe::try_from)
            .transpose()?
            .ok_or(StoreError::NotFound(Recipe::RESOURCE))
    }
}

/// Map SQLx errors to StoreError.
/// Batch ids the take-out UPDATE did not touch, in batch order.
fn not_updated(batch: &TakeoutBatch, updated: &[i64]) -> Vec<InventoryItemId> {
    let updated: HashSet<i64> = updated.iter().copied().collect();
    batch
        .ids()
        .iter()
        .copied()
        .filter(|id| !updated.contains(&id.get()))
        .collect()
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            if db_err.code().as_deref() == Some("23505") {
                let field = match db_err.constraint() {
                    Some(c) if c.contains("container_code") => "container_code",
                    Some(c) if c.contains("id_code") => "id_code",
                    Some(c) if c.contains("meal_set_components") => "component key",
                    _ => "value",
                };
                return StoreError::Duplicate {
                    field,
                    value: db_err.message().to_string(),
                };
            }
            StoreError::Database(format!("database error in {}: {}", operation, db_err.message()))
        }
        sqlx::Error::PoolClosed => {
            StoreError::Database(format!("connection pool closed in {}", operation))
        }
        _ => StoreError::Database(format!("sqlx error in {}: {}", operation, err)),
    }
}

fn to_u32(field: &str, value: i64) -> StoreResult<u32> {
    u32::try_from(value).map_err(|_| StoreError::Corrupt(format!("{field} out of range: {value}")))
}

fn opt_u32(field: &str, value: Option<i64>) -> StoreResult<Option<u32>> {
    value.map(|v| to_u32(field, v)).transpose()
}

fn corrupt(err: freezer_core::DomainError) -> StoreError {
    StoreError::Corrupt(err.to_string())
}

/// Database row representation for meal sets (components load separately).
struct MealSetRow {
    id: i64,
    name: String,
    is_veggie: bool,
    is_vegan: bool,
    created_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, PgRow> for MealSetRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(MealSetRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            is_veggie: row.try_get("is_veggie")?,
            is_vegan: row.try_get("is_vegan")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl MealSetRow {
    fn into_meal_set(self, components: Vec<MealSetComponent>) -> MealSet {
        MealSet {
            id: MealSetId::new(self.id),
            name: self.name,
            is_veggie: self.is_veggie,
            is_vegan: self.is_vegan,
            components,
            created_at: self.created_at,
        }
    }
}

/// Database row representation for inventory items.
struct ItemRow {
    id: i64,
    id_code: String,
    name: String,
    item_type: String,
    frozen_at: NaiveDate,
    best_before_days: i64,
    is_veggie: bool,
    is_vegan: bool,
    meal_set_id: Option<i64>,
    component: Option<String>,
    recipe_id: Option<i64>,
    storage_type: String,
    container_id: Option<i64>,
    note: Option<String>,
    is_active: bool,
    taken_out_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, PgRow> for ItemRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ItemRow {
            id: row.try_get("id")?,
            id_code: row.try_get("id_code")?,
            name: row.try_get("name")?,
            item_type: row.try_get("item_type")?,
            frozen_at: row.try_get("frozen_at")?,
            best_before_days: row.try_get("best_before_days")?,
            is_veggie: row.try_get("is_veggie")?,
            is_vegan: row.try_get("is_vegan")?,
            meal_set_id: row.try_get("meal_set_id")?,
            component: row.try_get("component")?,
            recipe_id: row.try_get("recipe_id")?,
            storage_type: row.try_get("storage_type")?,
            container_id: row.try_get("container_id")?,
            note: row.try_get("note")?,
            is_active: row.try_get("is_active")?,
            taken_out_at: row.try_get("taken_out_at")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl TryFrom<ItemRow> for InventoryItem {
    type Error = StoreError;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        Ok(InventoryItem {
            id: InventoryItemId::new(row.id),
            id_code: row.id_code,
            name: row.name,
            item_type: ItemType::parse(&row.item_type).map_err(corrupt)?,
            frozen_at: row.frozen_at,
            best_before_days: to_u32("best_before_days", row.best_before_days)?,
            is_veggie: row.is_veggie,
            is_vegan: row.is_vegan,
            meal_set_id: row.meal_set_id.map(MealSetId::new),
            component: row.component,
            recipe_id: row.recipe_id.map(RecipeId::new),
            storage_type: StorageType::parse(&row.storage_type).map_err(corrupt)?,
            container_id: row.container_id.map(ContainerId::new),
            note: row.note,
            is_active: row.is_active,
            taken_out_at: row.taken_out_at,
            created_at: row.created_at,
        })
    }
}

struct ContainerTypeRow {
    id: i64,
    shape: String,
    volume_ml: i64,
    height_mm: Option<i64>,
    width_mm: Option<i64>,
    length_mm: Option<i64>,
    material: Option<String>,
    note: Option<String>,
    created_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, PgRow> for ContainerTypeRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ContainerTypeRow {
            id: row.try_get("id")?,
            shape: row.try_get("shape")?,
            volume_ml: row.try_get("volume_ml")?,
            height_mm: row.try_get("height_mm")?,
            width_mm: row.try_get("width_mm")?,
            length_mm: row.try_get("length_mm")?,
            material: row.try_get("material")?,
            note: row.try_get("note")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl TryFrom<ContainerTypeRow> for ContainerType {
    type Error = StoreError;

    fn try_from(row: ContainerTypeRow) -> Result<Self, Self::Error> {
        Ok(ContainerType {
            id: ContainerTypeId::new(row.id),
            shape: Shape::parse(&row.shape).map_err(corrupt)?,
            volume_ml: to_u32("volume_ml", row.volume_ml)?,
            height_mm: opt_u32("height_mm", row.height_mm)?,
            width_mm: opt_u32("width_mm", row.width_mm)?,
            length_mm: opt_u32("length_mm", row.length_mm)?,
            material: row
                .material
                .as_deref()
                .map(Material::parse)
                .transpose()
                .map_err(corrupt)?,
            note: row.note,
            created_at: row.created_at,
        })
    }
}

struct ContainerRow {
    id: i64,
    container_code: String,
    container_type_id: Option<i64>,
    note: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, PgRow> for ContainerRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ContainerRow {
            id: row.try_get("id")?,
            container_code: row.try_get("container_code")?,
            container_type_id: row.try_get("container_type_id")?,
            note: row.try_get("note")?,
            is_active: row.try_get("is_active")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl From<ContainerRow> for Container {
    fn from(row: ContainerRow) -> Self {
        Container {
            id: ContainerId::new(row.id),
            container_code: row.container_code,
            container_type_id: row.container_type_id.map(ContainerTypeId::new),
            note: row.note,
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

struct RecipeRow {
    id: i64,
    name: String,
    recipe_type: String,
    yield_portions: Option<i64>,
    kcal_per_portion: Option<i64>,
    default_best_before_days: Option<i64>,
    tags_text: Option<String>,
    ingredients_text: Option<String>,
    prep_text: Option<String>,
    reheat_text: Option<String>,
    is_veggie: bool,
    is_vegan: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, PgRow> for RecipeRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(RecipeRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            recipe_type: row.try_get("recipe_type")?,
            yield_portions: row.try_get("yield_portions")?,
            kcal_per_portion: row.try_get("kcal_per_portion")?,
            default_best_before_days: row.try_get("default_best_before_days")?,
            tags_text: row.try_get("tags_text")?,
            ingredients_text: row.try_get("ingredients_text")?,
            prep_text: row.try_get("prep_text")?,
            reheat_text: row.try_get("reheat_text")?,
            is_veggie: row.try_get("is_veggie")?,
            is_vegan: row.try_get("is_vegan")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl TryFrom<RecipeRow> for Recipe {
    type Error = StoreError;

    fn try_from(row: RecipeRow) -> Result<Self, Self::Error> {
        Ok(Recipe {
            id: RecipeId::new(row.id),
            name: row.name,
            recipe_type: RecipeType::parse(&row.recipe_type).map_err(corrupt)?,
            yield_portions: opt_u32("yield_portions", row.yield_portions)?,
            kcal_per_portion: opt_u32("kcal_per_portion", row.kcal_per_portion)?,
            default_best_before_days: opt_u32(
                "default_best_before_days",
                row.default_best_before_days,
            )?,
            tags_text: row.tags_text,
            ingredients_text: row.ingredients_text,
            prep_text: row.prep_text,
            reheat_text: row.reheat_text,
            is_veggie: row.is_veggie,
            is_vegan: row.is_vegan,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_updated_reports_only_skipped_ids() {
        let batch = TakeoutBatch::new([3, 1, 2].map(InventoryItemId::new)).unwrap();

        assert!(not_updated(&batch, &[1, 2, 3]).is_empty());
        assert_eq!(not_updated(&batch, &[1]), vec![InventoryItemId::new(3), InventoryItemId::new(2)]);
        assert_eq!(not_updated(&batch, &[]).len(), 3);
    }
}
