//! Search/filter engine: a composable predicate set applied over an
//! in-memory item collection, plus a deterministic single-key sort.
//! Pure; same inputs always produce the same output.

use std::collections::HashMap;
use std::str::FromStr;

use crate::models::{EvidenceCounts, EvidenceKind, EvidenceModel, ItemModel};

/// Where evidence tallies come from. The filter logic is agnostic to
/// whether evidence rides inline on the items or sits in a prebuilt
/// cache keyed by item id.
pub trait EvidenceSource {
    fn counts(&self, item_id: i64) -> EvidenceCounts;
}

/// Inline evidence list.
impl EvidenceSource for [EvidenceModel] {
    fn counts(&self, item_id: i64) -> EvidenceCounts {
        let mut counts = EvidenceCounts::default();
        for entry in self.iter().filter(|e| e.item_id == item_id) {
            if let Ok(kind) = EvidenceKind::from_str(&entry.kind) {
                counts.add(kind);
            }
        }
        counts
    }
}

/// Prebuilt per-item cache.
impl EvidenceSource for HashMap<i64, EvidenceCounts> {
    fn counts(&self, item_id: i64) -> EvidenceCounts {
        self.get(&item_id).copied().unwrap_or_default()
    }
}

/// No evidence information available: every tally reads as zero.
pub struct NoEvidence;

impl EvidenceSource for NoEvidence {
    fn counts(&self, _item_id: i64) -> EvidenceCounts {
        EvidenceCounts::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Name,
    Value,
    Date,
    Category,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDir {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub key: SortKey,
    pub dir: SortDir,
}

/// Filters compose with implicit AND semantics. An inactive filter
/// (None, or an empty/whitespace string) is a no-op.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    pub name: Option<String>,
    pub description: Option<String>,
    pub serial_number: Option<String>,
    pub location: Option<String>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub has_photos: Option<bool>,
    pub has_videos: Option<bool>,
    pub has_documents: Option<bool>,
    pub sort: Option<Sort>,
}

/// Applies the filter set and optional sort over `items`.
pub fn apply<E>(items: &[ItemModel], filters: &FilterSet, evidence: &E) -> Vec<ItemModel>
where
    E: EvidenceSource + ?Sized,
{
    let mut matched: Vec<ItemModel> = items
        .iter()
        .filter(|item| matches(item, filters, evidence))
        .cloned()
        .collect();

    if let Some(sort) = filters.sort {
        // Stable sort: ties keep their input order.
        matched.sort_by(|a, b| {
            let ordering = match sort.key {
                SortKey::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
                SortKey::Value => a.estimated_value.total_cmp(&b.estimated_value),
                SortKey::Date => a.date_last_seen.cmp(&b.date_last_seen),
                SortKey::Category => a.category.to_lowercase().cmp(&b.category.to_lowercase()),
            };
            match sort.dir {
                SortDir::Asc => ordering,
                SortDir::Desc => ordering.reverse(),
            }
        });
    }

    matched
}

fn matches<E>(item: &ItemModel, filters: &FilterSet, evidence: &E) -> bool
where
    E: EvidenceSource + ?Sized,
{
    if !text_contains(&item.name, &filters.name)
        || !text_contains(&item.description, &filters.description)
        || !text_contains(&item.serial_number, &filters.serial_number)
        || !text_contains(&item.location_last_seen, &filters.location)
    {
        return false;
    }

    // Inclusive bounds; a missing value counts as zero, which the
    // storage layer guarantees via its column default.
    if let Some(min) = filters.min_value {
        if item.estimated_value < min {
            return false;
        }
    }
    if let Some(max) = filters.max_value {
        if item.estimated_value > max {
            return false;
        }
    }

    if filters.start_date.is_some() || filters.end_date.is_some() {
        let Some(date) = item.date_last_seen.as_deref() else {
            return false;
        };
        if let Some(start) = filters.start_date.as_deref() {
            if date < start {
                return false;
            }
        }
        if let Some(end) = filters.end_date.as_deref() {
            if date > end {
                return false;
            }
        }
    }

    if filters.has_photos.is_some() || filters.has_videos.is_some() || filters.has_documents.is_some()
    {
        let counts = evidence.counts(item.id);
        for (wanted, count) in [
            (filters.has_photos, counts.photos),
            (filters.has_videos, counts.videos),
            (filters.has_documents, counts.documents),
        ] {
            match wanted {
                Some(true) if count == 0 => return false,
                Some(false) if count > 0 => return false,
                _ => {}
            }
        }
    }

    true
}

/// Case-insensitive substring containment. An empty or absent needle is
/// a no-op; an absent haystack compares as the empty string.
fn text_contains(haystack: &str, needle: &Option<String>) -> bool {
    match needle.as_deref().map(str::trim) {
        Some(term) if !term.is_empty() => {
            haystack.to_lowercase().contains(&term.to_lowercase())
        }
        _ => true,
    }
}
