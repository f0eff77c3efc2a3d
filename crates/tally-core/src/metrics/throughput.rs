//! Completed items per ISO week.

use std::collections::BTreeMap;

use super::Metric;
use crate::collection::ItemCollection;
use crate::model::item::Timestamp;

/// Week key of a timestamp: calendar year, `W`, two-digit ISO week.
///
/// The year is the calendar year, not the ISO week-numbering year, so the
/// days of ISO week 1 that fall in late December share a key with the first
/// week of that same calendar year (2024-12-30 → `2024W01`).
#[must_use]
pub fn week_key(at: Timestamp) -> String {
    at.format("%YW%V").to_string()
}

/// Count of items whose last completion falls in each ISO week.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Throughput;

impl Metric for Throughput {
    const NAME: &'static str = "throughput";
    type Output = BTreeMap<String, usize>;

    fn calculate(&self, items: &ItemCollection) -> Self::Output {
        let mut per_week = BTreeMap::new();
        for finished in items.iter().filter_map(|item| item.last_finish_status_at) {
            *per_week.entry(week_key(finished)).or_insert(0) += 1;
        }
        per_week
    }
}
