//! Population-level flow metrics over an [`ItemCollection`].
//!
//! # Overview
//!
//! Six independent calculators, each implementing [`Metric`]:
//!
//! - [`CycleTime`] / [`LeadTime`] (`time`): bucketed per-item durations.
//! - [`QueueTime`] (`queue`): bucketed time per status, per visit total.
//! - [`Throughput`] (`throughput`): completions per ISO week.
//! - [`CumulativeQueueTime`] (`cumulative`): median hours per status.
//! - [`ReturnToTesting`] (`testing`): how often items re-enter testing.
//!
//! Calculators only read the collection. Items lacking the data a metric
//! needs are skipped; an empty collection yields empty results.
//!
//! [`MetricsService`] runs all six with parameters from [`MetricsConfig`]
//! and gathers the results into a [`MetricsReport`].

pub mod cumulative;
pub mod queue;
pub mod testing;
pub mod throughput;
pub mod time;

use std::collections::BTreeMap;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::collection::ItemCollection;
use crate::config::MetricsConfig;

pub use cumulative::{CumulativeQueueTime, QueueTimeRow};
pub use queue::{QueueTime, StatusSamples};
pub use testing::ReturnToTesting;
pub use throughput::Throughput;
pub use time::{CycleTime, LeadTime};

pub const ONE_HOUR: u64 = 60 * 60;
pub const ONE_DAY: u64 = ONE_HOUR * 24;
/// Default cap for day-bucketed metrics.
pub const CALC_LIMIT: u64 = 30;

/// Discretization of durations into fixed-width buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucketing {
    /// Bucket width in seconds.
    pub bucket_seconds: u64,
    /// Largest reported bucket value.
    pub cap: u64,
}

impl Bucketing {
    #[must_use]
    pub const fn new(bucket_seconds: u64, cap: u64) -> Self {
        Self {
            bucket_seconds,
            cap,
        }
    }

    /// Whole buckets in `duration`, floored, never below 1.
    ///
    /// Negative durations report 1. A zero width is treated as one second.
    #[must_use]
    pub fn slots(self, duration: TimeDelta) -> u64 {
        let width = i64::try_from(self.bucket_seconds.max(1)).unwrap_or(i64::MAX);
        let whole = duration.num_seconds().div_euclid(width);
        u64::try_from(whole).unwrap_or(0).max(1)
    }

    /// [`slots`](Self::slots) clamped to `cap`.
    #[must_use]
    pub fn clamped(self, duration: TimeDelta) -> u64 {
        self.slots(duration).min(self.cap)
    }
}

/// A population-level calculator.
pub trait Metric {
    /// Key of this metric in a [`MetricsReport`].
    const NAME: &'static str;

    type Output;

    fn calculate(&self, items: &ItemCollection) -> Self::Output;
}

/// Statistical median; mean of the two middle values for even lengths.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn median(values: &[u64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] as f64 + sorted[mid] as f64) / 2.0)
    } else {
        Some(sorted[mid] as f64)
    }
}

/// All six metrics, keyed by metric name when serialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsReport {
    pub cycle_time: Vec<u64>,
    pub lead_time: Vec<u64>,
    pub queue_time: StatusSamples,
    pub throughput: BTreeMap<String, usize>,
    pub cumulative_queue_time: Vec<QueueTimeRow>,
    pub return_to_testing: Vec<usize>,
}

/// Runs the six calculators against one collection.
#[derive(Debug, Clone)]
pub struct MetricsService<'a> {
    items: &'a ItemCollection,
    config: MetricsConfig,
}

impl<'a> MetricsService<'a> {
    /// Service with default calculator parameters.
    #[must_use]
    pub fn new(items: &'a ItemCollection) -> Self {
        Self::with_config(items, MetricsConfig::default())
    }

    #[must_use]
    pub const fn with_config(items: &'a ItemCollection, config: MetricsConfig) -> Self {
        Self { items, config }
    }

    #[must_use]
    pub fn cycle_time(&self) -> Vec<u64> {
        debug!("calculating cycle time");
        CycleTime::new(self.config.cycle_time).calculate(self.items)
    }

    #[must_use]
    pub fn lead_time(&self) -> Vec<u64> {
        debug!("calculating lead time");
        LeadTime::new(self.config.lead_time).calculate(self.items)
    }

    #[must_use]
    pub fn queue_time(&self) -> StatusSamples {
        debug!("calculating queue time");
        QueueTime::new(self.config.queue_time).calculate(self.items)
    }

    #[must_use]
    pub fn throughput(&self) -> BTreeMap<String, usize> {
        debug!("calculating throughput");
        Throughput.calculate(self.items)
    }

    #[must_use]
    pub fn cumulative_queue_time(&self) -> Vec<QueueTimeRow> {
        debug!("calculating cumulative queue time");
        CumulativeQueueTime::new(self.config.cumulative_queue_time).calculate(self.items)
    }

    #[must_use]
    pub fn return_to_testing(&self) -> Vec<usize> {
        debug!("calculating return to testing");
        ReturnToTesting::from(&self.config.return_to_testing).calculate(self.items)
    }

    /// Compute every metric.
    #[must_use]
    #[instrument(skip(self), fields(items = self.items.len()))]
    pub fn report(&self) -> MetricsReport {
        MetricsReport {
            cycle_time: self.cycle_time(),
            lead_time: self.lead_time(),
            queue_time: self.queue_time(),
            throughput: self.throughput(),
            cumulative_queue_time: self.cumulative_queue_time(),
            return_to_testing: self.return_to_testing(),
        }
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

    #[test]
    fn slots_floor_and_never_zero() {
        let daily = Bucketing::new(ONE_DAY, CALC_LIMIT);
        assert_eq!(daily.slots(TimeDelta::zero()), 1);
        assert_eq!(daily.slots(TimeDelta::hours(23)), 1);
        assert_eq!(daily.slots(TimeDelta::hours(47)), 1);
        assert_eq!(daily.slots(TimeDelta::hours(48)), 2);
        assert_eq!(daily.slots(TimeDelta::hours(-30)), 1);
    }

    #[test]
    fn clamp_boundary_is_exactly_cap() {
        let daily = Bucketing::new(ONE_DAY, CALC_LIMIT);
        let at_cap = TimeDelta::days(30);
        assert_eq!(daily.clamped(at_cap), 30);
        assert_eq!(daily.clamped(at_cap + TimeDelta::seconds(1)), 30);
        assert_eq!(daily.clamped(TimeDelta::days(400)), 30);
    }

    #[test]
    fn zero_width_bucket_does_not_panic() {
        let degenerate = Bucketing::new(0, 5);
        assert_eq!(degenerate.clamped(TimeDelta::seconds(3)), 3);
    }

    #[test]
    fn median_handles_odd_even_and_empty() {
        assert_eq!(median(&[]), None);
        assert_eq!(median(&[7]), Some(7.0));
        assert_eq!(median(&[5, 1, 3]), Some(3.0));
        assert_eq!(median(&[4, 1, 2, 3]), Some(2.5));
    }

    #[test]
    fn empty_collection_reports_empty_results() {
        let items = ItemCollection::default();
        let report = MetricsService::new(&items).report();
        assert!(report.cycle_time.is_empty());
        assert!(report.lead_time.is_empty());
        assert!(report.queue_time.is_empty());
        assert!(report.throughput.is_empty());
        assert!(report.cumulative_queue_time.is_empty());
        assert!(report.return_to_testing.is_empty());
    }

    #[test]
    fn report_serializes_with_metric_names() {
        let item = ItemRecord {
            first_status_change_at: Some(t0() + TimeDelta::hours(1)),
            last_finish_status_at: Some(t0() + TimeDelta::hours(2)),
            ..ItemRecord::new("ISSUE-1", "Done", t0())
        };
        let items = ItemCollection::from_records([item]);
        let report = MetricsService::new(&items).report();

        let json = serde_json::to_value(&report).unwrap();
        for name in [
            CycleTime::NAME,
            LeadTime::NAME,
            QueueTime::NAME,
            Throughput::NAME,
            CumulativeQueueTime::NAME,
            ReturnToTesting::NAME,
        ] {
            assert!(json.get(name).is_some(), "missing {name}");
        }
        assert_eq!(json["cycle_time"], serde_json::json!([1]));
        assert_eq!(json["throughput"]["2024W01"], 1);
    }

    #[test]
    fn service_honours_configured_parameters() {
        let item = ItemRecord {
            first_status_change_at: Some(t0()),
            last_finish_status_at: Some(t0() + TimeDelta::hours(5)),
            ..ItemRecord::new("ISSUE-2", "Done", t0())
        };
        let items = ItemCollection::from_records([item]);
        let config = MetricsConfig {
            cycle_time: Bucketing::new(ONE_HOUR, 3),
            ..MetricsConfig::default()
        };
        let service = MetricsService::with_config(&items, config);
        assert_eq!(service.cycle_time(), vec![3]);
        assert_eq!(service.lead_time(), vec![1]);
    }
}
