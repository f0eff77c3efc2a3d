//! Time spent in each status, per item.

use indexmap::IndexMap;

use super::{Bucketing, CALC_LIMIT, Metric, ONE_DAY};
use crate::collection::ItemCollection;

/// Bucketed samples per status, in first-seen status order.
pub type StatusSamples = IndexMap<String, Vec<u64>>;

/// Bucketed queue time per status: one sample per (item, status) pair.
///
/// Statuses no item ever left are absent from the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueTime(pub Bucketing);

impl QueueTime {
    #[must_use]
    pub const fn new(bucketing: Bucketing) -> Self {
        Self(bucketing)
    }
}

impl Default for QueueTime {
    fn default() -> Self {
        Self(Bucketing::new(ONE_DAY, CALC_LIMIT))
    }
}

impl Metric for QueueTime {
    const NAME: &'static str = "queue_time";
    type Output = StatusSamples;

    fn calculate(&self, items: &ItemCollection) -> Self::Output {
        let mut per_status = StatusSamples::new();
        for item in items {
            for (status, period) in &item.statuses_x_periods {
                per_status
                    .entry(status.clone())
                    .or_default()
                    .push(self.0.clamped(*period));
            }
        }
        per_status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::item::{ItemRecord, Timestamp};
    use chrono::{FixedOffset, TimeDelta, TimeZone};

    fn t0() -> Timestamp {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .unwrap()
    }

    fn item(key: &str, periods: &[(&str, TimeDelta)]) -> ItemRecord {
        let mut record = ItemRecord::new(key, "Done", t0());
        for (status, period) in periods {
            record.statuses_x_periods.insert((*status).to_string(), *period);
        }
        record
    }

    #[test]
    fn samples_grouped_per_status() {
        let items = ItemCollection::from_records([
            item("A-1", &[("To Do", TimeDelta::days(3)), ("In Progress", TimeDelta::hours(5))]),
            item("A-2", &[("To Do", TimeDelta::days(45))]),
        ]);
        let result = QueueTime::default().calculate(&items);

        assert_eq!(result.len(), 2);
        assert_eq!(result["To Do"], vec![3, 30]);
        assert_eq!(result["In Progress"], vec![1]);
        let order: Vec<&str> = result.keys().map(String::as_str).collect();
        assert_eq!(order, vec!["To Do", "In Progress"]);
    }

    #[test]
    fn items_without_status_history_contribute_nothing() {
        let items = ItemCollection::from_records([item("A-1", &[])]);
        assert!(QueueTime::default().calculate(&items).is_empty());
    }
}
