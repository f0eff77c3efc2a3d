//! How often items come back to a testing status.

use super::Metric;
use crate::collection::ItemCollection;
use crate::config::TestingConfig;
use crate::model::item::CREATED_SENTINEL;

/// Per-item count of testing visits, reported when above `min_count`.
///
/// Labels compare case-insensitively. The creation sentinel is never a visit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnToTesting {
    labels: Vec<String>,
    min_count: usize,
}

impl ReturnToTesting {
    pub fn new<I, S>(labels: I, min_count: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            labels: labels
                .into_iter()
                .map(|label| label.as_ref().to_lowercase())
                .collect(),
            min_count,
        }
    }

    fn is_testing(&self, status: &str) -> bool {
        let status = status.to_lowercase();
        self.labels.iter().any(|label| *label == status)
    }
}

impl Default for ReturnToTesting {
    fn default() -> Self {
        Self::new(["testing"], 1)
    }
}

impl From<&TestingConfig> for ReturnToTesting {
    fn from(config: &TestingConfig) -> Self {
        Self::new(&config.labels, config.min_count)
    }
}

impl Metric for ReturnToTesting {
    const NAME: &'static str = "return_to_testing";
    type Output = Vec<usize>;

    fn calculate(&self, items: &ItemCollection) -> Vec<usize> {
        items
            .iter()
            .filter(|item| !item.status_history.is_empty())
            .map(|item| {
                let visits = match item.status_history.split_first() {
                    Some((first, rest)) if first == CREATED_SENTINEL => rest,
                    _ => item.status_history.as_slice(),
                };
                visits.iter().filter(|status| self.is_testing(status)).count()
            })
            .filter(|count| *count > self.min_count)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::item::{ItemRecord, Timestamp};
    use chrono::{FixedOffset, TimeZone};

    fn t0() -> Timestamp {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .unwrap()
    }

    fn item(key: &str, history: &[&str]) -> ItemRecord {
        ItemRecord {
            status_history: history.iter().map(|s| (*s).to_string()).collect(),
            ..ItemRecord::new(key, "Done", t0())
        }
    }

    #[test]
    fn repeated_testing_is_reported() {
        let items =
            ItemCollection::from_records([item("A-1", &["created", "Testing", "In Progress", "Testing"])]);
        assert_eq!(ReturnToTesting::default().calculate(&items), vec![2]);
    }

    #[test]
    fn single_visit_is_not_reported() {
        let items = ItemCollection::from_records([item("A-1", &["created", "Testing", "Done"])]);
        assert!(ReturnToTesting::default().calculate(&items).is_empty());
    }

    #[test]
    fn custom_labels_are_case_insensitive() {
        let items = ItemCollection::from_records([
            item("A-1", &["created", "QA", "In Progress", "testing", "qa"]),
            item("A-2", &[]),
        ]);
        let metric = ReturnToTesting::new(["Testing", "qa"], 2);
        assert_eq!(metric.calculate(&items), vec![3]);
    }

    #[test]
    fn sentinel_never_counts() {
        let items = ItemCollection::from_records([item("A-1", &["created", "created", "Created"])]);
        let metric = ReturnToTesting::new(["created"], 0);
        assert_eq!(metric.calculate(&items), vec![2]);
    }

    #[test]
    fn threshold_zero_reports_every_visiting_item() {
        let items = ItemCollection::from_records([
            item("A-1", &["created", "Testing"]),
            item("A-2", &["created", "Done"]),
        ]);
        assert_eq!(ReturnToTesting::new(["testing"], 0).calculate(&items), vec![1]);
    }
}
