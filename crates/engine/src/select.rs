//! Ordering and selection over a normalized table.

use std::collections::BTreeMap;

use crate::model::CanonicalRecord;

/// Row order applied after normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Ascending by (product type, product name); ties keep input order.
    #[default]
    TypeThenName,
    /// Input order, untouched.
    Original,
}

pub fn sort_records(records: &mut [CanonicalRecord], order: SortOrder) {
    match order {
        SortOrder::TypeThenName => records.sort_by(|a, b| {
            a.product_type
                .cmp(&b.product_type)
                .then_with(|| a.product_name.cmp(&b.product_name))
        }),
        SortOrder::Original => {}
    }
}

/// Case-insensitive substring search over name, type, strain and source.
/// A blank query matches everything.
pub fn search<'a>(records: &'a [CanonicalRecord], query: &str) -> Vec<&'a CanonicalRecord> {
    let query = query.trim().to_lowercase();
    records
        .iter()
        .filter(|r| {
            query.is_empty()
                || [
                    r.product_name.as_str(),
                    r.product_type.as_str(),
                    r.strain_name.as_str(),
                    r.source_system.as_str(),
                ]
                .iter()
                .any(|field| field.to_lowercase().contains(&query))
        })
        .collect()
}

/// Keep records whose product type is one of `types` (case-insensitive).
/// An empty `types` keeps everything.
pub fn select_types<'a>(
    records: &[&'a CanonicalRecord],
    types: &[String],
) -> Vec<&'a CanonicalRecord> {
    if types.is_empty() {
        return records.to_vec();
    }
    let wanted: Vec<String> = types.iter().map(|t| t.trim().to_lowercase()).collect();
    records
        .iter()
        .copied()
        .filter(|r| wanted.contains(&r.product_type.to_lowercase()))
        .collect()
}

/// Records grouped by product type, groups in ascending type order and
/// records in input order within a group.
pub fn group_by_type(records: &[CanonicalRecord]) -> BTreeMap<&str, Vec<&CanonicalRecord>> {
    let mut groups: BTreeMap<&str, Vec<&CanonicalRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(record.product_type.as_str()).or_default().push(record);
    }
    groups
}
