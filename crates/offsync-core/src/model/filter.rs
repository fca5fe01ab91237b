// ── Query restriction and cache signature ──
//
// A `FilterSpec` is both the remote query and the cache key. Its
// signature must be deterministic: equal field values produce equal
// keys regardless of the order categories were added in.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Inclusive date window on `created_at`. Either bound may be open.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn is_open(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }
}

/// Immutable query restriction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterSpec {
    #[serde(default)]
    pub date_range: DateRange,
    #[serde(default)]
    pub categories: BTreeSet<String>,
    pub resolved: Option<bool>,
    pub query: Option<String>,
}

impl FilterSpec {
    /// The unrestricted filter.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_date_range(
        mut self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Self {
        self.date_range = DateRange { from, to };
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.categories.insert(category.into());
        self
    }

    pub fn with_resolved(mut self, resolved: bool) -> Self {
        self.resolved = Some(resolved);
        self
    }

    /// Free-text query. Blank strings clear it.
    pub fn with_query(mut self, query: impl AsRef<str>) -> Self {
        self.query = normalize_query(Some(query.as_ref()));
        self
    }

    pub fn is_unrestricted(&self) -> bool {
        self.date_range.is_open()
            && self.categories.is_empty()
            && self.resolved.is_none()
            && self.query.is_none()
    }

    /// Deterministic serialization used as the cache key body.
    ///
    /// Built from a `serde_json::Value` whose object keys are sorted and
    /// whose categories come from an ordered set.
    pub fn signature(&self) -> String {
        json!({
            "from": self.date_range.from,
            "to": self.date_range.to,
            "categories": self.categories,
            "resolved": self.resolved,
            "query": normalize_query(self.query.as_deref()),
        })
        .to_string()
    }

    /// Apply a partial update, returning the merged filter.
    pub fn merged(&self, patch: FilterPatch) -> Self {
        let mut next = self.clone();
        if let Some(range) = patch.date_range {
            next.date_range = range;
        }
        if let Some(categories) = patch.categories {
            next.categories = categories;
        }
        if let Some(resolved) = patch.resolved {
            next.resolved = resolved;
        }
        if let Some(query) = patch.query {
            next.query = normalize_query(query.as_deref());
        }
        next
    }
}

/// Partial filter update. `None` leaves a field untouched; for the
/// optional fields, `Some(None)` clears them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterPatch {
    pub date_range: Option<DateRange>,
    pub categories: Option<BTreeSet<String>>,
    pub resolved: Option<Option<bool>>,
    pub query: Option<Option<String>>,
}

fn normalize_query(query: Option<&str>) -> Option<String> {
    query
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn signature_ignores_category_insertion_order() {
        let a = FilterSpec::all()
            .with_category("symptom")
            .with_category("medication");
        let b = FilterSpec::all()
            .with_category("medication")
            .with_category("symptom");
        assert_eq!(a.signature(), b.signature());
    }

    #[test]
    fn signature_distinguishes_fields() {
        let open = FilterSpec::all();
        let resolved = FilterSpec::all().with_resolved(true);
        let unresolved = FilterSpec::all().with_resolved(false);
        assert_ne!(open.signature(), resolved.signature());
        assert_ne!(resolved.signature(), unresolved.signature());
    }

    #[test]
    fn signature_includes_date_bounds() {
        let day = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let bounded = FilterSpec::all().with_date_range(Some(day), None);
        assert!(bounded.signature().contains("2024-05-01"));
        assert_ne!(bounded.signature(), FilterSpec::all().signature());
    }

    #[test]
    fn blank_query_is_no_query() {
        let f = FilterSpec::all().with_query("   ");
        assert!(f.query.is_none());
        assert!(f.is_unrestricted());
        assert_eq!(f.signature(), FilterSpec::all().signature());
    }

    #[test]
    fn merged_applies_only_present_fields() {
        let base = FilterSpec::all().with_category("symptom").with_query("knee");
        let merged = base.merged(FilterPatch {
            resolved: Some(Some(false)),
            query: Some(None),
            ..FilterPatch::default()
        });
        assert_eq!(merged.categories, base.categories);
        assert_eq!(merged.resolved, Some(false));
        assert!(merged.query.is_none());
    }
}
