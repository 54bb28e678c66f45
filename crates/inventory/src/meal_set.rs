use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use freezer_core::{DomainError, DomainResult, Entity, MealSetId};

/// Largest number of portions one component may ask for.
pub const COMPONENT_QUANTITY_MAX: u32 = 100;

/// One slot of a meal set's composition, e.g. "2x rice".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealSetComponent {
    /// Stable key that inventory items reference.
    pub key: String,
    /// Display label; defaults to the key.
    #[serde(default)]
    pub label: String,
    /// Items of this component needed for one complete set.
    pub quantity: u32,
}

/// A named grouping of inventory items that together make one servable meal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MealSet {
    pub id: MealSetId,
    pub name: String,
    pub is_veggie: bool,
    pub is_vegan: bool,
    pub components: Vec<MealSetComponent>,
    pub created_at: DateTime<Utc>,
}

impl MealSet {
    pub fn component(&self, key: &str) -> Option<&MealSetComponent> {
        self.components.iter().find(|c| c.key == key)
    }

    /// Number of items that make up one complete set.
    pub fn items_per_set(&self) -> u32 {
        self.components
            .iter()
            .fold(0u32, |acc, c| acc.saturating_add(c.quantity))
    }

    /// The implicit component key, when the composition has exactly one slot.
    pub fn sole_component_key(&self) -> Option<&str> {
        match self.components.as_slice() {
            [only] => Some(only.key.as_str()),
            _ => None,
        }
    }
}

impl Entity for MealSet {
    type Id = MealSetId;
    const RESOURCE: &'static str = "meal set";

    fn id(&self) -> MealSetId {
        self.id
    }
}

/// Input for creating a meal set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMealSet {
    pub name: String,
    pub is_veggie: bool,
    pub is_vegan: bool,
    pub components: Vec<MealSetComponent>,
}

impl NewMealSet {
    /// Validate and normalise: trimmed non-empty name, at least one component,
    /// unique non-empty keys, positive quantities, vegan implies veggie.
    pub fn validate(self) -> DomainResult<Self> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if self.components.is_empty() {
            return Err(DomainError::validation(
                "a meal set needs at least one component",
            ));
        }

        let mut seen = HashSet::new();
        let mut components = Vec::with_capacity(self.components.len());
        for c in self.components {
            let key = c.key.trim().to_string();
            if key.is_empty() {
                return Err(DomainError::validation("component key cannot be empty"));
            }
            if c.quantity == 0 {
                return Err(DomainError::validation(format!(
                    "component '{key}' needs a quantity of at least 1"
                )));
            }
            if c.quantity > COMPONENT_QUANTITY_MAX {
                return Err(DomainError::validation(format!(
                    "component '{key}' quantity must be at most {COMPONENT_QUANTITY_MAX}"
                )));
            }
            if !seen.insert(key.clone()) {
                return Err(DomainError::validation(format!(
                    "duplicate component key '{key}'"
                )));
            }
            let label = match c.label.trim() {
                "" => key.clone(),
                l => l.to_string(),
            };
            components.push(MealSetComponent {
                key,
                label,
                quantity: c.quantity,
            });
        }

        Ok(Self {
            name,
            is_veggie: self.is_veggie || self.is_vegan,
            is_vegan: self.is_vegan,
            components,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component(key: &str, quantity: u32) -> MealSetComponent {
        MealSetComponent {
            key: key.to_string(),
            label: String::new(),
            quantity,
        }
    }

    fn new_set(components: Vec<MealSetComponent>) -> NewMealSet {
        NewMealSet {
            name: " Chili sin carne ".to_string(),
            is_veggie: false,
            is_vegan: true,
            components,
        }
    }

    #[test]
    fn validate_normalises_name_labels_and_flags() {
        let set = new_set(vec![component(" chili ", 1), component("rice", 2)])
            .validate()
            .unwrap();
        assert_eq!(set.name, "Chili sin carne");
        assert!(set.is_veggie);
        assert_eq!(set.components[0].key, "chili");
        assert_eq!(set.components[0].label, "chili");
        assert_eq!(set.components[1].quantity, 2);
    }

    #[test]
    fn validate_rejects_empty_composition() {
        let err = new_set(vec![]).validate().unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn validate_rejects_zero_quantity_and_duplicates() {
        assert!(new_set(vec![component("rice", 0)]).validate().is_err());
        assert!(
            new_set(vec![component("rice", 1), component("rice", 1)])
                .validate()
                .is_err()
        );
    }

    #[test]
    fn validate_caps_component_quantity() {
        assert!(
            new_set(vec![component("rice", COMPONENT_QUANTITY_MAX)])
                .validate()
                .is_ok()
        );
        let err = new_set(vec![component("rice", 4_000_000_000)])
            .validate()
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg.contains("at most")));
    }

    #[test]
    fn items_per_set_saturates_instead_of_overflowing() {
        let set = MealSet {
            id: MealSetId::new(1),
            name: "Legacy".to_string(),
            is_veggie: false,
            is_vegan: false,
            components: vec![component("a", u32::MAX), component("b", u32::MAX)],
            created_at: Utc::now(),
        };
        assert_eq!(set.items_per_set(), u32::MAX);
    }

    #[test]
    fn sole_component_only_for_single_slot_sets() {
        let single = MealSet {
            id: MealSetId::new(1),
            name: "Soup".to_string(),
            is_veggie: true,
            is_vegan: false,
            components: vec![component("soup", 2)],
            created_at: Utc::now(),
        };
        assert_eq!(single.sole_component_key(), Some("soup"));
        assert_eq!(single.items_per_set(), 2);

        let double = MealSet {
            components: vec![component("curry", 1), component("rice", 1)],
            ..single
        };
        assert_eq!(double.sole_component_key(), None);
        assert!(double.component("rice").is_some());
    }
}
