//! Cycle time and lead time distributions.

use chrono::TimeDelta;

use super::{Bucketing, CALC_LIMIT, Metric, ONE_DAY};
use crate::collection::ItemCollection;
use crate::model::item::ItemRecord;

fn bucketed(
    items: &ItemCollection,
    bucketing: Bucketing,
    duration: impl Fn(&ItemRecord) -> Option<TimeDelta>,
) -> Vec<u64> {
    items
        .iter()
        .filter_map(duration)
        .map(|elapsed| bucketing.clamped(elapsed))
        .collect()
}

/// First status change → last completion, one value per finished item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleTime(pub Bucketing);

impl CycleTime {
    #[must_use]
    pub const fn new(bucketing: Bucketing) -> Self {
        Self(bucketing)
    }
}

impl Default for CycleTime {
    fn default() -> Self {
        Self(Bucketing::new(ONE_DAY, CALC_LIMIT))
    }
}

impl Metric for CycleTime {
    const NAME: &'static str = "cycle_time";
    type Output = Vec<u64>;

    fn calculate(&self, items: &ItemCollection) -> Vec<u64> {
        bucketed(items, self.0, ItemRecord::cycle_time)
    }
}

/// Creation → last completion, one value per finished item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeadTime(pub Bucketing);

impl LeadTime {
    #[must_use]
    pub const fn new(bucketing: Bucketing) -> Self {
        Self(bucketing)
    }
}

impl Default for LeadTime {
    fn default() -> Self {
        Self(Bucketing::new(ONE_DAY, CALC_LIMIT))
    }
}

impl Metric for LeadTime {
    const NAME: &'static str = "lead_time";
    type Output = Vec<u64>;

    fn calculate(&self, items: &ItemCollection) -> Vec<u64> {
        bucketed(items, self.0, ItemRecord::lead_time)
    }
}
