//! Shared list filters and pagination.

use chrono::{Duration, NaiveDate};

/// Free-text / dietary / expiry filters shared by meal-set and item listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilters {
    /// Case-insensitive substring query; empty matches everything.
    pub q: String,
    /// Keep only veggie (or vegan) entries.
    pub veggie: bool,
    /// Keep only entries that expire within the configured window.
    pub expiring: bool,
}

impl ListFilters {
    pub fn new(q: Option<&str>, veggie: bool, expiring: bool) -> Self {
        Self {
            q: q.map(str::trim).unwrap_or_default().to_string(),
            veggie,
            expiring,
        }
    }

    /// True if `q` is empty or any of `fields` contains it (case-insensitive).
    pub fn matches_text(&self, fields: &[&str]) -> bool {
        if self.q.is_empty() {
            return true;
        }
        let needle = self.q.to_lowercase();
        fields.iter().any(|f| f.to_lowercase().contains(&needle))
    }

    pub fn matches_diet(&self, is_veggie: bool, is_vegan: bool) -> bool {
        !self.veggie || is_veggie || is_vegan
    }

    pub fn matches_expiry(&self, is_expiring: bool) -> bool {
        !self.expiring || is_expiring
    }
}

/// Whether a best-before date falls within `window_days` of `today`.
///
/// Already expired dates count as expiring.
pub fn is_expiring(best_before: NaiveDate, today: NaiveDate, window_days: i64) -> bool {
    match Duration::try_days(window_days).and_then(|w| today.checked_add_signed(w)) {
        Some(limit) => best_before <= limit,
        // The window reaches past the calendar in either direction.
        None => window_days > 0,
    }
}

/// Limit/offset pagination.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Page {
    pub limit: usize,
    pub offset: usize,
}

impl Page {
    pub const DEFAULT_LIMIT: usize = 20;
    pub const MAX_LIMIT: usize = 100;

    /// Build a page from raw query values: limit defaults to 20 and is clamped
    /// to `1..=100`, negative offsets become 0.
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Self {
        let limit = limit
            .map(|l| l.clamp(1, Self::MAX_LIMIT as i64) as usize)
            .unwrap_or(Self::DEFAULT_LIMIT);
        let offset = offset.map(|o| o.max(0) as usize).unwrap_or(0);
        Self { limit, offset }
    }

    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        items.into_iter().skip(self.offset).take(self.limit).collect()
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn text_filter_is_case_insensitive() {
        let f = ListFilters::new(Some("  curry "), false, false);
        assert!(f.matches_text(&["Green CURRY"]));
        assert!(!f.matches_text(&["Lasagne", "F-000001"]));
        assert!(ListFilters::default().matches_text(&["anything"]));
    }

    #[test]
    fn veggie_filter_accepts_vegan() {
        let f = ListFilters::new(None, true, false);
        assert!(f.matches_diet(false, true));
        assert!(f.matches_diet(true, false));
        assert!(!f.matches_diet(false, false));
    }

    #[test]
    fn expiring_window_includes_past_dates() {
        let today = date("2024-03-01");
        assert!(is_expiring(date("2024-02-01"), today, 14));
        assert!(is_expiring(date("2024-03-15"), today, 14));
        assert!(!is_expiring(date("2024-03-16"), today, 14));
    }

    #[test]
    fn oversized_windows_do_not_overflow() {
        let today = date("2024-03-01");
        assert!(is_expiring(date("2030-01-01"), today, i64::MAX));
        assert!(!is_expiring(date("2024-02-01"), today, i64::MIN));
        assert!(is_expiring(NaiveDate::MAX, NaiveDate::MAX, 1));
    }

    #[test]
    fn page_clamps_limit_and_offset() {
        assert_eq!(Page::new(None, None), Page { limit: 20, offset: 0 });
        assert_eq!(Page::new(Some(0), Some(-5)), Page { limit: 1, offset: 0 });
        assert_eq!(Page::new(Some(1000), Some(3)), Page { limit: 100, offset: 3 });
    }

    #[test]
    fn page_slices_items() {
        let page = Page::new(Some(2), Some(1));
        assert_eq!(page.apply(vec![1, 2, 3, 4]), vec![2, 3]);
        assert!(page.apply(Vec::<i32>::new()).is_empty());
    }
}
