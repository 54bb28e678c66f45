//! FIFO take-out selection for meal sets.
//!
//! Oldest stock goes first: items are ordered by freeze date ascending and,
//! for equal dates, by id ascending (insertion order). One complete set takes
//! the first `quantity` active items of every component in that order.
//!
//! Ordering is done here rather than in the store so every backend shares the
//! same tie-break.

use thiserror::Error;

use freezer_core::{InventoryItemId, MealSetId};

use crate::item::InventoryItem;
use crate::meal_set::MealSet;

/// Not enough active items to assemble even one complete set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no items available to complete meal set {meal_set_id}")]
pub struct NoItemsAvailable {
    pub meal_set_id: MealSetId,
    /// First component that came up short; `None` for an empty composition.
    pub component: Option<String>,
    pub required: u32,
    pub available: u32,
}

/// Sort items into FIFO order in place.
pub fn fifo_order(items: &mut [InventoryItem]) {
    items.sort_by_key(InventoryItem::fifo_key);
}

/// Select the items forming one complete instance of `set`.
///
/// `items` may contain anything; only active items assigned to `set` are
/// considered. The returned ids are in FIFO order. Fails without a partial
/// result when any component is short.
pub fn select_single_set(
    set: &MealSet,
    items: &[InventoryItem],
) -> Result<Vec<InventoryItemId>, NoItemsAvailable> {
    if set.components.is_empty() {
        return Err(NoItemsAvailable {
            meal_set_id: set.id,
            component: None,
            required: 0,
            available: 0,
        });
    }

    let candidates = candidates(set, items);
    let mut chosen: Vec<&InventoryItem> = Vec::new();

    for component in &set.components {
        let matching: Vec<&InventoryItem> = candidates
            .iter()
            .copied()
            .filter(|item| component_of(set, item) == Some(component.key.as_str()))
            .collect();
        if matching.len() < component.quantity as usize {
            return Err(NoItemsAvailable {
                meal_set_id: set.id,
                component: Some(component.key.clone()),
                required: component.quantity,
                available: matching.len() as u32,
            });
        }
        chosen.extend(matching.into_iter().take(component.quantity as usize));
    }

    chosen.sort_by_key(|item| item.fifo_key());
    Ok(chosen.into_iter().map(|item| item.id).collect())
}

/// How many complete sets the active items of `set` can currently form.
pub fn complete_count(set: &MealSet, items: &[InventoryItem]) -> u32 {
    let candidates = candidates(set, items);
    set.components
        .iter()
        .map(|component| {
            let available = candidates
                .iter()
                .filter(|item| component_of(set, item) == Some(component.key.as_str()))
                .count() as u32;
            available / component.quantity.max(1)
        })
        .min()
        .unwrap_or(0)
}

/// Active items of `set`, FIFO ordered.
fn candidates<'a>(set: &MealSet, items: &'a [InventoryItem]) -> Vec<&'a InventoryItem> {
    let mut out: Vec<&InventoryItem> = items
        .iter()
        .filter(|item| item.is_active && item.meal_set_id == Some(set.id))
        .collect();
    out.sort_by_key(|item| item.fifo_key());
    out
}

/// Items without an explicit component fill the only slot of a single-slot set.
fn component_of<'a>(set: &'a MealSet, item: &'a InventoryItem) -> Option<&'a str> {
    item.component.as_deref().or_else(|| set.sole_component_key())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, Utc};
    use proptest::prelude::*;

    use crate::item::{ItemType, StorageType};
    use crate::meal_set::MealSetComponent;

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(offset)
    }

    fn set(components: &[(&str, u32)]) -> MealSet {
        MealSet {
            id: MealSetId::new(1),
            name: "Test set".to_string(),
            is_veggie: false,
            is_vegan: false,
            components: components
                .iter()
                .map(|(k, q)| MealSetComponent {
                    key: k.to_string(),
                    label: k.to_string(),
                    quantity: *q,
                })
                .collect(),
            created_at: Utc::now(),
        }
    }

    fn item(id: i64, frozen_offset: i64, component: &str) -> InventoryItem {
        InventoryItem {
            id: InventoryItemId::new(id),
            id_code: InventoryItem::generated_code(InventoryItemId::new(id)),
            name: format!("item {id}"),
            item_type: ItemType::Meal,
            frozen_at: day(frozen_offset),
            best_before_days: 90,
            is_veggie: false,
            is_vegan: false,
            meal_set_id: Some(MealSetId::new(1)),
            component: Some(component.to_string()),
            recipe_id: None,
            storage_type: StorageType::Free,
            container_id: None,
            note: None,
            is_active: true,
            taken_out_at: None,
            created_at: Utc::now(),
        }
    }

    fn ids(raw: &[i64]) -> Vec<InventoryItemId> {
        raw.iter().copied().map(InventoryItemId::new).collect()
    }

    #[test]
    fn ties_on_freeze_date_break_by_id() {
        // A(2024-01-01), B(2024-01-01), C(2024-01-03); set needs 2.
        let s = set(&[("main", 2)]);
        let items = vec![item(3, 2, "main"), item(2, 0, "main"), item(1, 0, "main")];
        assert_eq!(select_single_set(&s, &items).unwrap(), ids(&[1, 2]));
    }

    #[test]
    fn short_stock_fails_without_partial_result() {
        let s = set(&[("main", 3)]);
        let items = vec![item(1, 0, "main"), item(2, 1, "main")];
        let err = select_single_set(&s, &items).unwrap_err();
        assert_eq!(err.required, 3);
        assert_eq!(err.available, 2);
        assert_eq!(err.component.as_deref(), Some("main"));
    }

    #[test]
    fn taken_out_and_foreign_items_are_ignored() {
        let s = set(&[("main", 1)]);
        let mut taken = item(1, 0, "main");
        taken.is_active = false;
        let mut foreign = item(2, 0, "main");
        foreign.meal_set_id = Some(MealSetId::new(99));
        let items = vec![taken, foreign, item(3, 5, "main")];
        assert_eq!(select_single_set(&s, &items).unwrap(), ids(&[3]));
    }

    #[test]
    fn multi_component_selection_is_fifo_per_component() {
        let s = set(&[("curry", 1), ("rice", 2)]);
        let items = vec![
            item(1, 4, "curry"),
            item(2, 1, "curry"),
            item(3, 3, "rice"),
            item(4, 0, "rice"),
            item(5, 9, "rice"),
        ];
        // curry -> 2 (day 1); rice -> 4 (day 0), 3 (day 3); output FIFO overall.
        assert_eq!(select_single_set(&s, &items).unwrap(), ids(&[4, 2, 3]));
        assert_eq!(complete_count(&s, &items), 1);
    }

    #[test]
    fn missing_component_blocks_the_set() {
        let s = set(&[("curry", 1), ("rice", 1)]);
        let items = vec![item(1, 0, "curry"), item(2, 0, "curry")];
        let err = select_single_set(&s, &items).unwrap_err();
        assert_eq!(err.component.as_deref(), Some("rice"));
        assert_eq!(complete_count(&s, &items), 0);
    }

    #[test]
    fn empty_composition_is_never_complete() {
        let s = set(&[]);
        let items = vec![item(1, 0, "main")];
        assert!(select_single_set(&s, &items).is_err());
        assert_eq!(complete_count(&s, &items), 0);
    }

    #[test]
    fn items_without_component_fill_single_slot_sets() {
        let s = set(&[("main", 1)]);
        let mut legacy = item(1, 0, "main");
        legacy.component = None;
        assert_eq!(select_single_set(&s, &[legacy]).unwrap(), ids(&[1]));
    }

    #[test]
    fn complete_count_uses_integer_division() {
        let s = set(&[("main", 2)]);
        let items: Vec<_> = (1..=5).map(|i| item(i, i, "main")).collect();
        assert_eq!(complete_count(&s, &items), 2);
    }

    #[test]
    fn fifo_order_sorts_in_place() {
        let mut items = vec![item(2, 1, "main"), item(3, 0, "main"), item(1, 1, "main")];
        fifo_order(&mut items);
        let order: Vec<i64> = items.iter().map(|i| i.id.get()).collect();
        assert_eq!(order, vec![3, 1, 2]);
    }

    proptest! {
        #[test]
        fn selection_is_the_fifo_prefix(
            offsets in proptest::collection::vec(0i64..20, 0..30),
            required in 1u32..6,
        ) {
            let s = set(&[("main", required)]);
            let items: Vec<InventoryItem> = offsets
                .iter()
                .enumerate()
                .map(|(i, off)| item(i as i64 + 1, *off, "main"))
                .collect();

            let mut expected = items.clone();
            fifo_order(&mut expected);

            match select_single_set(&s, &items) {
                Ok(selected) => {
                    prop_assert_eq!(selected.len(), required as usize);
                    let prefix: Vec<InventoryItemId> =
                        expected.iter().take(required as usize).map(|i| i.id).collect();
                    prop_assert_eq!(&selected, &prefix);
                    for pair in selected.windows(2) {
                        let a = items.iter().find(|i| i.id == pair[0]).unwrap();
                        let b = items.iter().find(|i| i.id == pair[1]).unwrap();
                        prop_assert!(a.fifo_key() < b.fifo_key());
                    }
                }
                Err(err) => {
                    prop_assert!(items.len() < required as usize);
                    prop_assert_eq!(err.available as usize, items.len());
                }
            }
        }

        #[test]
        fn distinct_dates_come_out_strictly_ascending(
            offsets in proptest::collection::hash_set(0i64..365, 1..20)
                .prop_map(|s| s.into_iter().collect::<Vec<_>>()),
        ) {
            let required = offsets.len() as u32;
            let s = set(&[("main", required)]);
            let items: Vec<InventoryItem> = offsets
                .iter()
                .enumerate()
                .map(|(i, off)| item(i as i64 + 1, *off, "main"))
                .collect();
            let selected = select_single_set(&s, &items).unwrap();
            let dates: Vec<NaiveDate> = selected
                .iter()
                .map(|id| items.iter().find(|i| i.id == *id).unwrap().frozen_at)
                .collect();
            for pair in dates.windows(2) {
                prop_assert!(pair[0] < pair[1]);
            }
        }
    }
}
