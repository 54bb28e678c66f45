use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use freezer_core::{
    ContainerId, DomainError, DomainResult, Entity, InventoryItemId, MealSetId, RecipeId,
};

use crate::container::{bounded_note, Container};
use crate::filter::is_expiring;
use crate::meal_set::MealSet;
use crate::recipe::Recipe;

/// Shelf life applied when neither the item nor its recipe specifies one.
pub const DEFAULT_BEST_BEFORE_DAYS: u32 = 90;

/// Longest shelf life accepted anywhere (items, recipe defaults, config).
pub const BEST_BEFORE_DAYS_MAX: u32 = 3650;

const ITEM_NOTE_MAX: usize = 200;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemType {
    /// Component of a meal set.
    Meal,
    /// Stand-alone portion.
    Single,
    /// Raw or prepped ingredient.
    Ingredient,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Meal => "MEAL",
            ItemType::Single => "SINGLE",
            ItemType::Ingredient => "INGREDIENT",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MEAL" => Ok(ItemType::Meal),
            "SINGLE" => Ok(ItemType::Single),
            "INGREDIENT" => Ok(ItemType::Ingredient),
            other => Err(DomainError::validation(format!(
                "item_type must be one of MEAL, SINGLE, INGREDIENT (got '{other}')"
            ))),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StorageType {
    Box,
    Free,
    FreezerBag,
    VacuumBag,
}

impl StorageType {
    /// Storage standards offered for items that are not kept in a box.
    pub const STANDARDS: [StorageType; 3] = [
        StorageType::Free,
        StorageType::FreezerBag,
        StorageType::VacuumBag,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageType::Box => "BOX",
            StorageType::Free => "FREE",
            StorageType::FreezerBag => "FREEZER_BAG",
            StorageType::VacuumBag => "VACUUM_BAG",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BOX" => Ok(StorageType::Box),
            "FREE" => Ok(StorageType::Free),
            "FREEZER_BAG" => Ok(StorageType::FreezerBag),
            "VACUUM_BAG" => Ok(StorageType::VacuumBag),
            other => Err(DomainError::validation(format!(
                "unknown storage_type '{other}'"
            ))),
        }
    }
}

/// `?view=` selector of the inventory listing.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum InventoryView {
    Meals,
    #[default]
    Single,
    Ingredient,
}

impl InventoryView {
    /// Unknown or missing views list single portions.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("meals") | Some("meal") => InventoryView::Meals,
            Some("ingredient") | Some("ingredients") => InventoryView::Ingredient,
            _ => InventoryView::Single,
        }
    }

    pub fn item_type(&self) -> ItemType {
        match self {
            InventoryView::Meals => ItemType::Meal,
            InventoryView::Single => ItemType::Single,
            InventoryView::Ingredient => ItemType::Ingredient,
        }
    }
}

/// A physical frozen item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryItem {
    pub id: InventoryItemId,
    pub id_code: String,
    pub name: String,
    pub item_type: ItemType,
    pub frozen_at: NaiveDate,
    pub best_before_days: u32,
    pub is_veggie: bool,
    pub is_vegan: bool,
    pub meal_set_id: Option<MealSetId>,
    /// Key of the meal-set component this item fills.
    pub component: Option<String>,
    pub recipe_id: Option<RecipeId>,
    pub storage_type: StorageType,
    pub container_id: Option<ContainerId>,
    pub note: Option<String>,
    pub is_active: bool,
    pub taken_out_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl InventoryItem {
    /// Saturates at the last representable date for out-of-range rows.
    pub fn best_before(&self) -> NaiveDate {
        self.frozen_at
            .checked_add_days(Days::new(u64::from(self.best_before_days)))
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn is_expiring(&self, today: NaiveDate, window_days: i64) -> bool {
        is_expiring(self.best_before(), today, window_days)
    }

    /// FIFO sort key: oldest freeze date first, then insertion order.
    pub fn fifo_key(&self) -> (NaiveDate, InventoryItemId) {
        (self.frozen_at, self.id)
    }

    /// Human-readable code assigned when intake did not supply one.
    pub fn generated_code(id: InventoryItemId) -> String {
        format!("F-{:06}", id.get())
    }
}

impl Entity for InventoryItem {
    type Id = InventoryItemId;
    const RESOURCE: &'static str = "item";

    fn id(&self) -> InventoryItemId {
        self.id
    }
}

/// Raw intake input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewInventoryItem {
    pub id_code: Option<String>,
    pub name: Option<String>,
    pub item_type: Option<String>,
    pub frozen_at: Option<NaiveDate>,
    pub best_before_days: Option<i64>,
    pub recipe_id: Option<RecipeId>,
    pub meal_set_id: Option<MealSetId>,
    pub component: Option<String>,
    pub storage_type: Option<String>,
    pub container_id: Option<ContainerId>,
    pub note: Option<String>,
    pub is_veggie: Option<bool>,
    pub is_vegan: Option<bool>,
}

/// Records referenced by an intake, resolved by the caller.
#[derive(Debug, Clone, Copy)]
pub struct IntakeContext<'a> {
    pub recipe: Option<&'a Recipe>,
    pub meal_set: Option<&'a MealSet>,
    pub container: Option<&'a Container>,
    pub today: NaiveDate,
    pub default_best_before_days: u32,
}

/// Validated intake, ready to persist. The store assigns id, timestamps and
/// (when missing) the id code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDraft {
    pub id_code: Option<String>,
    pub name: String,
    pub item_type: ItemType,
    pub frozen_at: NaiveDate,
    pub best_before_days: u32,
    pub is_veggie: bool,
    pub is_vegan: bool,
    pub meal_set_id: Option<MealSetId>,
    pub component: Option<String>,
    pub recipe_id: Option<RecipeId>,
    pub storage_type: StorageType,
    pub container_id: Option<ContainerId>,
    pub note: Option<String>,
}

impl ItemDraft {
    pub fn into_item(self, id: InventoryItemId, created_at: DateTime<Utc>) -> InventoryItem {
        InventoryItem {
            id,
            id_code: self.id_code.unwrap_or_else(|| InventoryItem::generated_code(id)),
            name: self.name,
            item_type: self.item_type,
            frozen_at: self.frozen_at,
            best_before_days: self.best_before_days,
            is_veggie: self.is_veggie,
            is_vegan: self.is_vegan,
            meal_set_id: self.meal_set_id,
            component: self.component,
            recipe_id: self.recipe_id,
            storage_type: self.storage_type,
            container_id: self.container_id,
            note: self.note,
            is_active: true,
            taken_out_at: None,
            created_at,
        }
    }
}

/// Apply intake rules and defaults.
///
/// References in `input` must already be resolved into `ctx`; a reference
/// without its record is reported as a validation error.
pub fn prepare_intake(input: NewInventoryItem, ctx: &IntakeContext<'_>) -> DomainResult<ItemDraft> {
    let recipe = match (input.recipe_id, ctx.recipe) {
        (Some(id), Some(r)) if r.id == id => Some(r),
        (Some(id), _) => return Err(DomainError::validation(format!("recipe {id} does not exist"))),
        (None, _) => None,
    };
    let meal_set = match (input.meal_set_id, ctx.meal_set) {
        (Some(id), Some(s)) if s.id == id => Some(s),
        (Some(id), _) => {
            return Err(DomainError::validation(format!("meal set {id} does not exist")));
        }
        (None, _) => None,
    };

    let name = match input.name.as_deref().map(str::trim) {
        Some(n) if !n.is_empty() => n.to_string(),
        _ => match recipe {
            Some(r) => r.name.clone(),
            None => return Err(DomainError::validation("name cannot be empty")),
        },
    };

    let requested_type = input.item_type.as_deref().map(ItemType::parse).transpose()?;
    let component = non_blank(input.component);
    let (item_type, component) = match meal_set {
        Some(set) => {
            if matches!(requested_type, Some(t) if t != ItemType::Meal) {
                return Err(DomainError::validation(
                    "items of a meal set must have item_type MEAL",
                ));
            }
            let key = match component {
                Some(k) => k,
                None => set.sole_component_key().map(str::to_string).ok_or_else(|| {
                    DomainError::validation("component is required for multi-component meal sets")
                })?,
            };
            if set.component(&key).is_none() {
                return Err(DomainError::validation(format!(
                    "meal set '{}' has no component '{key}'",
                    set.name
                )));
            }
            (ItemType::Meal, Some(key))
        }
        None => {
            if component.is_some() {
                return Err(DomainError::validation("component requires a meal_set_id"));
            }
            (requested_type.unwrap_or(ItemType::Single), None)
        }
    };

    let frozen_at = input.frozen_at.unwrap_or(ctx.today);
    if frozen_at > ctx.today {
        return Err(DomainError::validation("frozen_at cannot be in the future"));
    }

    let best_before_days = match input.best_before_days {
        Some(d) if d < 1 => {
            return Err(DomainError::validation("best_before_days must be at least 1"));
        }
        Some(d) if d > i64::from(BEST_BEFORE_DAYS_MAX) => {
            return Err(DomainError::validation(format!(
                "best_before_days must be at most {BEST_BEFORE_DAYS_MAX}"
            )));
        }
        Some(d) => u32::try_from(d)
            .map_err(|_| DomainError::validation("best_before_days is too large"))?,
        None => recipe
            .and_then(|r| r.default_best_before_days)
            .unwrap_or(ctx.default_best_before_days)
            .min(BEST_BEFORE_DAYS_MAX),
    };

    let inherited = recipe
        .map(|r| (r.is_veggie, r.is_vegan))
        .or_else(|| meal_set.map(|s| (s.is_veggie, s.is_vegan)))
        .unwrap_or((false, false));
    let is_vegan = input.is_vegan.unwrap_or(inherited.1);
    let is_veggie = input.is_veggie.unwrap_or(inherited.0) || is_vegan;

    let storage_type = match input.storage_type.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => StorageType::parse(s)?,
        _ if input.container_id.is_some() => StorageType::Box,
        _ => StorageType::Free,
    };
    let container_id = match (storage_type, input.container_id) {
        (StorageType::Box, None) => {
            return Err(DomainError::validation("storage_type BOX requires a container_id"));
        }
        (StorageType::Box, Some(id)) => match ctx.container {
            Some(c) if c.id == id && c.is_active => Some(id),
            Some(c) if c.id == id => {
                return Err(DomainError::validation(format!(
                    "container {} is inactive",
                    c.container_code
                )));
            }
            _ => return Err(DomainError::validation(format!("container {id} does not exist"))),
        },
        (_, Some(_)) => {
            return Err(DomainError::validation(
                "container_id is only allowed with storage_type BOX",
            ));
        }
        (_, None) => None,
    };

    Ok(ItemDraft {
        id_code: non_blank(input.id_code),
        name,
        item_type,
        frozen_at,
        best_before_days,
        is_veggie,
        is_vegan,
        meal_set_id: meal_set.map(|s| s.id),
        component,
        recipe_id: recipe.map(|r| r.id),
        storage_type,
        container_id,
        note: bounded_note(input.note, ITEM_NOTE_MAX)?,
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
