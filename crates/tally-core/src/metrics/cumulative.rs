//! Median time-in-status across the whole population.

use indexmap::IndexMap;
use serde::Serialize;

use super::{Bucketing, Metric, ONE_HOUR, median};
use crate::collection::ItemCollection;

/// One status row of the cumulative queue-time table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueTimeRow {
    pub status: String,
    pub median_hours: f64,
    pub count: usize,
}

/// Median bucketed queue time per status.
///
/// Unlike [`QueueTime`](super::QueueTime), samples are not clamped: a sample
/// of exactly one bucket or above the cap is discarded. Rows follow the
/// order in which statuses are first met while walking the items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CumulativeQueueTime(pub Bucketing);

impl CumulativeQueueTime {
    #[must_use]
    pub const fn new(bucketing: Bucketing) -> Self {
        Self(bucketing)
    }
}

impl Default for CumulativeQueueTime {
    fn default() -> Self {
        Self(Bucketing::new(ONE_HOUR, 1000))
    }
}

impl Metric for CumulativeQueueTime {
    const NAME: &'static str = "cumulative_queue_time";
    type Output = Vec<QueueTimeRow>;

    fn calculate(&self, items: &ItemCollection) -> Self::Output {
        let mut samples: IndexMap<&str, Vec<u64>> = IndexMap::new();
        for item in items {
            for (status, period) in &item.statuses_x_periods {
                let slots = self.0.slots(*period);
                if slots == 1 || slots > self.0.cap {
                    continue;
                }
                samples.entry(status.as_str()).or_default().push(slots);
            }
        }

        samples
            .into_iter()
            .filter_map(|(status, values)| {
                Some(QueueTimeRow {
                    status: status.to_string(),
                    median_hours: median(&values)?,
                    count: values.len(),
                })
            })
            .collect()
    }
}
