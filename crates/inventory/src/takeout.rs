//! Take-out batches: validation shared by every store backend.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use freezer_core::InventoryItemId;

/// A de-duplicated, non-empty list of items to take out in one go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TakeoutBatch {
    ids: Vec<InventoryItemId>,
}

/// Why a batch cannot be applied. Nothing in the batch is mutated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("items unavailable for take-out (missing: {missing:?}, already taken out: {taken_out:?})")]
pub struct TakeoutRejection {
    pub missing: Vec<InventoryItemId>,
    pub taken_out: Vec<InventoryItemId>,
}

impl TakeoutRejection {
    /// Every rejected id, sorted ascending.
    pub fn ids(&self) -> Vec<InventoryItemId> {
        let mut all: Vec<InventoryItemId> =
            self.missing.iter().chain(&self.taken_out).copied().collect();
        all.sort();
        all
    }
}

impl TakeoutBatch {
    /// Collapse duplicates (first occurrence wins). `None` for an empty list.
    pub fn new(ids: impl IntoIterator<Item = InventoryItemId>) -> Option<Self> {
        let mut seen = HashSet::new();
        let ids: Vec<InventoryItemId> = ids.into_iter().filter(|id| seen.insert(*id)).collect();
        if ids.is_empty() {
            None
        } else {
            Some(Self { ids })
        }
    }

    pub fn ids(&self) -> &[InventoryItemId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Check the current state of the batch's items.
    ///
    /// `found` yields `(id, is_active)` for every batch item that exists.
    pub fn check(
        &self,
        found: impl IntoIterator<Item = (InventoryItemId, bool)>,
    ) -> Result<(), TakeoutRejection> {
        let state: HashMap<InventoryItemId, bool> = found.into_iter().collect();
        let mut missing = Vec::new();
        let mut taken_out = Vec::new();
        for id in &self.ids {
            match state.get(id) {
                None => missing.push(*id),
                Some(false) => taken_out.push(*id),
                Some(true) => {}
            }
        }
        if missing.is_empty() && taken_out.is_empty() {
            Ok(())
        } else {
            Err(TakeoutRejection { missing, taken_out })
        }
    }
}
