//! Recipe catalog.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use freezer_core::{DomainError, DomainResult, Entity, RecipeId};

use crate::filter::Page;
use crate::item::BEST_BEFORE_DAYS_MAX;

const NAME_MAX: usize = 200;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecipeType {
    #[default]
    Meal,
    Side,
    Sauce,
    Soup,
    Base,
    Dessert,
    Other,
}

impl RecipeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecipeType::Meal => "MEAL",
            RecipeType::Side => "SIDE",
            RecipeType::Sauce => "SAUCE",
            RecipeType::Soup => "SOUP",
            RecipeType::Base => "BASE",
            RecipeType::Dessert => "DESSERT",
            RecipeType::Other => "OTHER",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MEAL" => Ok(RecipeType::Meal),
            "SIDE" => Ok(RecipeType::Side),
            "SAUCE" => Ok(RecipeType::Sauce),
            "SOUP" => Ok(RecipeType::Soup),
            "BASE" => Ok(RecipeType::Base),
            "DESSERT" => Ok(RecipeType::Dessert),
            "OTHER" => Ok(RecipeType::Other),
            other => Err(DomainError::validation(format!(
                "unknown recipe_type '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    pub id: RecipeId,
    pub name: String,
    pub recipe_type: RecipeType,
    pub yield_portions: Option<u32>,
    pub kcal_per_portion: Option<u32>,
    pub default_best_before_days: Option<u32>,
    pub tags_text: Option<String>,
    pub ingredients_text: Option<String>,
    pub prep_text: Option<String>,
    pub reheat_text: Option<String>,
    pub is_veggie: bool,
    pub is_vegan: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Recipe {
    type Id = RecipeId;
    const RESOURCE: &'static str = "recipe";

    fn id(&self) -> RecipeId {
        self.id
    }
}

/// Raw recipe input as submitted by the recipe form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewRecipe {
    pub name: String,
    pub recipe_type: Option<String>,
    pub yield_portions: Option<i64>,
    pub kcal_per_portion: Option<i64>,
    pub default_best_before_days: Option<i64>,
    pub tags_text: Option<String>,
    pub ingredients_text: Option<String>,
    pub prep_text: Option<String>,
    pub reheat_text: Option<String>,
    pub is_veggie: bool,
    pub is_vegan: bool,
}

/// Validated recipe fields (everything but identity and timestamps).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeDraft {
    pub name: String,
    pub recipe_type: RecipeType,
    pub yield_portions: Option<u32>,
    pub kcal_per_portion: Option<u32>,
    pub default_best_before_days: Option<u32>,
    pub tags_text: Option<String>,
    pub ingredients_text: Option<String>,
    pub prep_text: Option<String>,
    pub reheat_text: Option<String>,
    pub is_veggie: bool,
    pub is_vegan: bool,
}

impl NewRecipe {
    pub fn validate(self) -> DomainResult<RecipeDraft> {
        let recipe_type = match self.recipe_type.as_deref().map(str::trim) {
            None | Some("") => RecipeType::default(),
            Some(t) => RecipeType::parse(t)?,
        };
        Ok(RecipeDraft {
            name: recipe_name(&self.name)?,
            recipe_type,
            yield_portions: at_least("yield_portions", self.yield_portions, 1)?,
            kcal_per_portion: at_least("kcal_per_portion", self.kcal_per_portion, 0)?,
            default_best_before_days: shelf_life(self.default_best_before_days)?,
            tags_text: text(self.tags_text),
            ingredients_text: text(self.ingredients_text),
            prep_text: text(self.prep_text),
            reheat_text: text(self.reheat_text),
            is_veggie: self.is_veggie || self.is_vegan,
            is_vegan: self.is_vegan,
        })
    }
}

/// Partial recipe update. `Some(None)` clears a nullable field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipePatch {
    pub name: Option<String>,
    pub recipe_type: Option<String>,
    pub yield_portions: Option<Option<i64>>,
    pub kcal_per_portion: Option<Option<i64>>,
    pub default_best_before_days: Option<Option<i64>>,
    pub tags_text: Option<Option<String>>,
    pub ingredients_text: Option<Option<String>>,
    pub prep_text: Option<Option<String>>,
    pub reheat_text: Option<Option<String>>,
    pub is_veggie: Option<bool>,
    pub is_vegan: Option<bool>,
}

impl RecipePatch {
    pub fn apply(self, current: &Recipe, now: DateTime<Utc>) -> DomainResult<Recipe> {
        let mut next = current.clone();
        if let Some(name) = self.name {
            next.name = recipe_name(&name)?;
        }
        if let Some(t) = self.recipe_type {
            next.recipe_type = RecipeType::parse(&t)?;
        }
        if let Some(v) = self.yield_portions {
            next.yield_portions = at_least("yield_portions", v, 1)?;
        }
        if let Some(v) = self.kcal_per_portion {
            next.kcal_per_portion = at_least("kcal_per_portion", v, 0)?;
        }
        if let Some(v) = self.default_best_before_days {
            next.default_best_before_days = shelf_life(v)?;
        }
        if let Some(v) = self.tags_text {
            next.tags_text = text(v);
        }
        if let Some(v) = self.ingredients_text {
            next.ingredients_text = text(v);
        }
        if let Some(v) = self.prep_text {
            next.prep_text = text(v);
        }
        if let Some(v) = self.reheat_text {
            next.reheat_text = text(v);
        }
        if let Some(v) = self.is_veggie {
            next.is_veggie = v;
        }
        if let Some(v) = self.is_vegan {
            next.is_vegan = v;
        }
        next.is_veggie |= next.is_vegan;
        next.updated_at = now;
        Ok(next)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum RecipeSort {
    #[default]
    Name,
    Updated,
    Created,
    Kcal,
}

impl RecipeSort {
    /// Unknown values sort by name.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("updated") => RecipeSort::Updated,
            Some("created") | Some("newest") => RecipeSort::Created,
            Some("kcal") => RecipeSort::Kcal,
            _ => RecipeSort::Name,
        }
    }

    fn compare(&self, a: &Recipe, b: &Recipe) -> Ordering {
        let primary = match self {
            RecipeSort::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            RecipeSort::Updated => b.updated_at.cmp(&a.updated_at),
            RecipeSort::Created => b.created_at.cmp(&a.created_at),
            // Recipes without kcal go last.
            RecipeSort::Kcal => match (a.kcal_per_portion, b.kcal_per_portion) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
        };
        primary.then(a.id.cmp(&b.id))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeQuery {
    pub search: String,
    pub recipe_type: Option<RecipeType>,
    pub veggie: bool,
    pub vegan: bool,
    pub sort: RecipeSort,
    pub page: Page,
}

impl RecipeQuery {
    fn matches(&self, r: &Recipe) -> bool {
        if let Some(t) = self.recipe_type {
            if r.recipe_type != t {
                return false;
            }
        }
        if self.vegan && !r.is_vegan {
            return false;
        }
        if self.veggie && !(r.is_veggie || r.is_vegan) {
            return false;
        }
        let needle = self.search.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        [Some(&r.name), r.tags_text.as_ref(), r.ingredients_text.as_ref()]
            .into_iter()
            .flatten()
            .any(|f| f.to_lowercase().contains(&needle))
    }

    /// Filter, sort and paginate.
    pub fn apply(&self, recipes: Vec<Recipe>) -> Vec<Recipe> {
        let mut hits: Vec<Recipe> = recipes.into_iter().filter(|r| self.matches(r)).collect();
        hits.sort_by(|a, b| self.sort.compare(a, b));
        self.page.apply(hits)
    }
}

fn recipe_name(raw: &str) -> DomainResult<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(DomainError::validation("name cannot be empty"));
    }
    if name.chars().count() > NAME_MAX {
        return Err(DomainError::validation(format!(
            "name must be at most {NAME_MAX} characters"
        )));
    }
    Ok(name.to_string())
}

fn shelf_life(value: Option<i64>) -> DomainResult<Option<u32>> {
    match at_least("default_best_before_days", value, 1)? {
        Some(days) if days > BEST_BEFORE_DAYS_MAX => Err(DomainError::validation(format!(
            "default_best_before_days must be at most {BEST_BEFORE_DAYS_MAX}"
        ))),
        days => Ok(days),
    }
}

fn at_least(field: &str, value: Option<i64>, min: i64) -> DomainResult<Option<u32>> {
    match value {
        None => Ok(None),
        Some(v) if v < min => Err(DomainError::validation(format!(
            "{field} must be at least {min}"
        ))),
        Some(v) => u32::try_from(v)
            .map(Some)
            .map_err(|_| DomainError::validation(format!("{field} is too large"))),
    }
}

fn text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
