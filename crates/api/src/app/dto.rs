use axum::body::Bytes;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};

use freezer_core::{ContainerId, ContainerTypeId, MealSetId, RecipeId};
use freezer_infra::{ContainerView, ItemView, MealSetDetail, MealSetSummary};
use freezer_inventory::{
    ActiveFilter, ContainerPatch, ContainerType, InventoryView, ListFilters, MealSet,
    MealSetComponent, NewContainer, NewContainerType, NewInventoryItem, NewMealSet, NewRecipe,
    Page, Recipe, RecipePatch, RecipeQuery, RecipeSort, RecipeType,
};

use crate::app::errors;

/// Decode a JSON body; an empty body decodes to `T::default()`.
pub fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, axum::response::Response> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| errors::invalid_json(e.to_string()))
}

// -------------------------
// Query DTOs
// -------------------------

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub q: Option<String>,
    pub veggie: Option<String>,
    pub expiring: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub view: Option<String>,
}

impl ListQuery {
    pub fn filters(&self) -> ListFilters {
        ListFilters::new(self.q.as_deref(), flag(&self.veggie), flag(&self.expiring))
    }

    pub fn page(&self) -> Page {
        Page::new(int(&self.limit), int(&self.offset))
    }

    pub fn view(&self) -> InventoryView {
        InventoryView::parse(self.view.as_deref())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ContainerQuery {
    pub active: Option<String>,
}

impl ContainerQuery {
    pub fn active(&self) -> ActiveFilter {
        ActiveFilter::parse(self.active.as_deref())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RecipeListQuery {
    #[serde(alias = "search")]
    pub q: Option<String>,
    #[serde(alias = "type")]
    pub recipe_type: Option<String>,
    pub veggie: Option<String>,
    pub vegan: Option<String>,
    pub sort: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl RecipeListQuery {
    /// Unknown recipe types are ignored rather than rejected.
    pub fn to_query(&self) -> RecipeQuery {
        RecipeQuery {
            search: self.q.clone().unwrap_or_default(),
            recipe_type: self
                .recipe_type
                .as_deref()
                .filter(|t| !t.trim().is_empty())
                .and_then(|t| RecipeType::parse(t).ok()),
            veggie: flag(&self.veggie),
            vegan: flag(&self.vegan),
            sort: RecipeSort::parse(self.sort.as_deref()),
            page: Page::new(int(&self.limit), int(&self.offset)),
        }
    }
}

/// Query flags are set unless absent, empty, `0` or `false`.
fn flag(raw: &Option<String>) -> bool {
    match raw.as_deref().map(str::trim) {
        None | Some("") | Some("0") => false,
        Some(v) => !v.eq_ignore_ascii_case("false"),
    }
}

fn int(raw: &Option<String>) -> Option<i64> {
    raw.as_deref().and_then(|v| v.trim().parse().ok())
}

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Default, Deserialize)]
pub struct TakeoutRequest {
    #[serde(default)]
    pub item_ids: Option<Vec<i64>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateMealSetRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub is_veggie: bool,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub is_vegan: bool,
    #[serde(default)]
    pub components: Vec<MealSetComponent>,
}

impl From<CreateMealSetRequest> for NewMealSet {
    fn from(body: CreateMealSetRequest) -> Self {
        NewMealSet {
            name: body.name,
            is_veggie: body.is_veggie,
            is_vegan: body.is_vegan,
            components: body.components,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateItemRequest {
    pub id_code: Option<String>,
    pub name: Option<String>,
    pub item_type: Option<String>,
    pub frozen_at: Option<NaiveDate>,
    pub best_before_days: Option<i64>,
    pub recipe_id: Option<i64>,
    pub meal_set_id: Option<i64>,
    pub component: Option<String>,
    pub storage_type: Option<String>,
    pub container_id: Option<i64>,
    pub note: Option<String>,
    #[serde(default, deserialize_with = "flexible_opt_bool")]
    pub is_veggie: Option<bool>,
    #[serde(default, deserialize_with = "flexible_opt_bool")]
    pub is_vegan: Option<bool>,
}

impl From<CreateItemRequest> for NewInventoryItem {
    fn from(body: CreateItemRequest) -> Self {
        NewInventoryItem {
            id_code: body.id_code,
            name: body.name,
            item_type: body.item_type,
            frozen_at: body.frozen_at,
            best_before_days: body.best_before_days,
            recipe_id: body.recipe_id.map(RecipeId::new),
            meal_set_id: body.meal_set_id.map(MealSetId::new),
            component: body.component,
            storage_type: body.storage_type,
            container_id: body.container_id.map(ContainerId::new),
            note: body.note,
            is_veggie: body.is_veggie,
            is_vegan: body.is_vegan,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateContainerTypeRequest {
    #[serde(default)]
    pub shape: String,
    pub volume_ml: Option<i64>,
    pub height_mm: Option<i64>,
    pub width_mm: Option<i64>,
    pub length_mm: Option<i64>,
    pub material: Option<String>,
    pub note: Option<String>,
}

impl From<CreateContainerTypeRequest> for NewContainerType {
    fn from(body: CreateContainerTypeRequest) -> Self {
        NewContainerType {
            shape: body.shape,
            volume_ml: body.volume_ml,
            height_mm: body.height_mm,
            width_mm: body.width_mm,
            length_mm: body.length_mm,
            material: body.material,
            note: body.note,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateContainerRequest {
    #[serde(default)]
    pub container_code: String,
    pub container_type_id: Option<i64>,
    pub note: Option<String>,
    #[serde(default, deserialize_with = "flexible_opt_bool")]
    pub is_active: Option<bool>,
}

impl From<CreateContainerRequest> for NewContainer {
    fn from(body: CreateContainerRequest) -> Self {
        NewContainer {
            container_code: body.container_code,
            container_type_id: body.container_type_id.map(ContainerTypeId::new),
            note: body.note,
            is_active: body.is_active.unwrap_or(true),
        }
    }
}

/// `null` clears a nullable field; an absent key leaves it unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct PatchContainerRequest {
    pub container_code: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub container_type_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub note: Option<Option<String>>,
    #[serde(default, deserialize_with = "flexible_opt_bool")]
    pub is_active: Option<bool>,
}

impl From<PatchContainerRequest> for ContainerPatch {
    fn from(body: PatchContainerRequest) -> Self {
        ContainerPatch {
            container_code: body.container_code,
            container_type_id: body
                .container_type_id
                .map(|inner| inner.map(ContainerTypeId::new)),
            note: body.note,
            is_active: body.is_active,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateRecipeRequest {
    #[serde(default)]
    pub name: String,
    pub recipe_type: Option<String>,
    pub yield_portions: Option<i64>,
    pub kcal_per_portion: Option<i64>,
    pub default_best_before_days: Option<i64>,
    pub tags_text: Option<String>,
    pub ingredients_text: Option<String>,
    pub prep_text: Option<String>,
    pub reheat_text: Option<String>,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub is_veggie: bool,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub is_vegan: bool,
}

impl From<CreateRecipeRequest> for NewRecipe {
    fn from(body: CreateRecipeRequest) -> Self {
        NewRecipe {
            name: body.name,
            recipe_type: body.recipe_type,
            yield_portions: body.yield_portions,
            kcal_per_portion: body.kcal_per_portion,
            default_best_before_days: body.default_best_before_days,
            tags_text: body.tags_text,
            ingredients_text: body.ingredients_text,
            prep_text: body.prep_text,
            reheat_text: body.reheat_text,
            is_veggie: body.is_veggie,
            is_vegan: body.is_vegan,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PatchRecipeRequest {
    pub name: Option<String>,
    pub recipe_type: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub yield_portions: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub kcal_per_portion: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub default_best_before_days: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub tags_text: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub ingredients_text: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub prep_text: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub reheat_text: Option<Option<String>>,
    #[serde(default, deserialize_with = "flexible_opt_bool")]
    pub is_veggie: Option<bool>,
    #[serde(default, deserialize_with = "flexible_opt_bool")]
    pub is_vegan: Option<bool>,
}

impl From<PatchRecipeRequest> for RecipePatch {
    fn from(body: PatchRecipeRequest) -> Self {
        RecipePatch {
            name: body.name,
            recipe_type: body.recipe_type,
            yield_portions: body.yield_portions,
            kcal_per_portion: body.kcal_per_portion,
            default_best_before_days: body.default_best_before_days,
            tags_text: body.tags_text,
            ingredients_text: body.ingredients_text,
            prep_text: body.prep_text,
            reheat_text: body.reheat_text,
            is_veggie: body.is_veggie,
            is_vegan: body.is_vegan,
        }
    }
}

fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Form posts send flags as `true`, `1`, `"1"` or `"on"`.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "on" | "yes"
        ),
        _ => false,
    }
}

fn flexible_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Value::deserialize(deserializer).map(|v| truthy(&v))
}

fn flexible_opt_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    Value::deserialize(deserializer).map(|v| match v {
        Value::Null => None,
        other => Some(truthy(&other)),
    })
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn item_to_json(view: &ItemView) -> Value {
    let item = &view.item;
    json!({
        "id": item.id.get(),
        "id_code": item.id_code,
        "name": item.name,
        "item_type": item.item_type.as_str(),
        "frozen_at": item.frozen_at.to_string(),
        "best_before_days": item.best_before_days,
        "computed_best_before": view.best_before.to_string(),
        "best_before": view.best_before.to_string(),
        "is_expiring": view.is_expiring,
        "is_veggie": item.is_veggie,
        "is_vegan": item.is_vegan,
        "meal_set_id": item.meal_set_id.map(|id| id.get()),
        "component": item.component,
        "recipe_id": item.recipe_id.map(|id| id.get()),
        "storage_type": item.storage_type.as_str(),
        "container_id": item.container_id.map(|id| id.get()),
        "container_code": view.container_code,
        "note": item.note,
        "is_active": item.is_active,
        "taken_out_at": item.taken_out_at.map(|t| t.to_rfc3339()),
        "created_at": item.created_at.to_rfc3339(),
    })
}

pub fn meal_set_to_json(set: &MealSet) -> Value {
    json!({
        "id": set.id.get(),
        "name": set.name,
        "is_veggie": set.is_veggie,
        "is_vegan": set.is_vegan,
        "components": set.components.iter().map(|c| json!({
            "key": c.key,
            "label": c.label,
            "quantity": c.quantity,
        })).collect::<Vec<_>>(),
        "items_per_set": set.items_per_set(),
        "created_at": set.created_at.to_rfc3339(),
    })
}

pub fn meal_set_summary_to_json(summary: &MealSetSummary) -> Value {
    let mut out = meal_set_to_json(&summary.set);
    if let Some(obj) = out.as_object_mut() {
        obj.insert("active_count".into(), json!(summary.active_count));
        obj.insert("complete_count".into(), json!(summary.complete_count));
        obj.insert("is_expiring".into(), json!(summary.is_expiring));
        obj.insert(
            "fifo_ids".into(),
            json!(summary.fifo_ids.iter().map(|id| id.get()).collect::<Vec<_>>()),
        );
    }
    out
}

pub fn meal_set_detail_to_json(detail: &MealSetDetail) -> Value {
    let mut out = meal_set_summary_to_json(&detail.summary);
    if let Some(obj) = out.as_object_mut() {
        obj.insert(
            "items".into(),
            Value::Array(detail.items.iter().map(item_to_json).collect()),
        );
    }
    out
}

pub fn container_type_to_json(t: &ContainerType) -> Value {
    json!({
        "id": t.id.get(),
        "shape": t.shape.as_str(),
        "volume_ml": t.volume_ml,
        "height_mm": t.height_mm,
        "width_mm": t.width_mm,
        "length_mm": t.length_mm,
        "material": t.material.map(|m| m.as_str()),
        "note": t.note,
        "created_at": t.created_at.to_rfc3339(),
    })
}

pub fn container_to_json(view: &ContainerView) -> Value {
    let c = &view.container;
    json!({
        "id": c.id.get(),
        "container_code": c.container_code,
        "container_type_id": c.container_type_id.map(|id| id.get()),
        "container_type": view.container_type.as_ref().map(container_type_to_json),
        "note": c.note,
        "is_active": c.is_active,
        "created_at": c.created_at.to_rfc3339(),
    })
}

pub fn recipe_to_json(r: &Recipe) -> Value {
    json!({
        "id": r.id.get(),
        "name": r.name,
        "recipe_type": r.recipe_type.as_str(),
        "yield_portions": r.yield_portions,
        "kcal_per_portion": r.kcal_per_portion,
        "default_best_before_days": r.default_best_before_days,
        "tags_text": r.tags_text,
        "ingredients_text": r.ingredients_text,
        "prep_text": r.prep_text,
        "reheat_text": r.reheat_text,
        "is_veggie": r.is_veggie,
        "is_vegan": r.is_vegan,
        "created_at": r.created_at.to_rfc3339(),
        "updated_at": r.updated_at.to_rfc3339(),
    })
}
