//! History reconstruction: change log → time spent in each value.
//!
//! # Overview
//!
//! [`reconstruct`] sorts an item's change-log entries by time and folds them
//! into a [`Reconstruction`]. Every tracked field owns an independent
//! [`DimensionTimeline`] with a running cursor: each event attributes the
//! gap since the previous event of the same field (or since creation) to the
//! value the field is leaving.
//!
//! Field names are routed through [`TrackedField::from_name`]; names that do
//! not map to a tracked field are skipped. Status events additionally extend
//! the status history and record the latest transition into a
//! done-equivalent status.
//!
//! # Ordering
//!
//! Events are sorted with a stable sort on their timestamp, so entries that
//! share a timestamp keep their input order. Such entries contribute
//! zero-length intervals to each other.

use chrono::TimeDelta;
use tracing::trace;

use crate::model::item::{
    CREATED_SENTINEL, DurationMap, HistoryEvent, Timestamp, is_done_status,
};

/// Change-log fields whose values are timed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackedField {
    Status,
    Assignee,
}

impl TrackedField {
    /// All tracked fields.
    pub const ALL: [Self; 2] = [Self::Status, Self::Assignee];

    /// Field name as it appears in the change log.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Assignee => "assignee",
        }
    }

    /// Resolve a change-log field name. Matching is exact.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.as_str() == name)
    }
}

/// Running state for one tracked field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionTimeline {
    /// Accumulated time per vacated value.
    pub periods: DurationMap,
    /// Earliest event seen for this field.
    pub first_changed_at: Option<Timestamp>,
    /// Cursor: time of the latest event, seeded with the creation time.
    pub last_changed_at: Timestamp,
}

impl DimensionTimeline {
    fn new(created_at: Timestamp) -> Self {
        Self {
            periods: DurationMap::new(),
            first_changed_at: None,
            last_changed_at: created_at,
        }
    }

    fn advance(&mut self, from: &str, at: Timestamp) {
        let elapsed = at.signed_duration_since(self.last_changed_at);
        *self
            .periods
            .entry(from.to_owned())
            .or_insert_with(TimeDelta::zero) += elapsed;
        self.last_changed_at = at;
        self.first_changed_at = Some(self.first_changed_at.map_or(at, |first| first.min(at)));
    }

    /// Sum of all attributed periods.
    #[must_use]
    pub fn total(&self) -> TimeDelta {
        self.periods
            .values()
            .fold(TimeDelta::zero(), |acc, period| acc + *period)
    }
}

/// Result of folding one item's change log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconstruction {
    pub status: DimensionTimeline,
    pub assignee: DimensionTimeline,
    /// Latest transition into a done-equivalent status.
    pub last_finish_status_at: Option<Timestamp>,
    /// `created` followed by every status destination, in event order.
    pub status_history: Vec<String>,
}

impl Reconstruction {
    /// Initial fold state for an item created at `created_at`.
    #[must_use]
    pub fn new(created_at: Timestamp) -> Self {
        Self {
            status: DimensionTimeline::new(created_at),
            assignee: DimensionTimeline::new(created_at),
            last_finish_status_at: None,
            status_history: vec![CREATED_SENTINEL.to_string()],
        }
    }

    /// Timeline owned by `field`.
    pub const fn timeline_mut(&mut self, field: TrackedField) -> &mut DimensionTimeline {
        match field {
            TrackedField::Status => &mut self.status,
            TrackedField::Assignee => &mut self.assignee,
        }
    }

    /// Fold step: apply one event. Events must arrive in time order.
    #[must_use]
    pub fn apply(mut self, event: &HistoryEvent) -> Self {
        let Some(field) = TrackedField::from_name(&event.field) else {
            trace!(field = %event.field, "skipping untracked change-log field");
            return self;
        };

        self.timeline_mut(field).advance(&event.from, event.at);

        if field == TrackedField::Status {
            self.status_history.push(event.to.clone());
            if is_done_status(&event.to) {
                self.last_finish_status_at = Some(event.at);
            }
        }

        self
    }
}

/// Reconstruct per-value timing from an item's change log.
///
/// `events` may be in any order; they are stably sorted by timestamp first.
#[must_use]
pub fn reconstruct(created_at: Timestamp, events: &[HistoryEvent]) -> Reconstruction {
    let mut ordered: Vec<&HistoryEvent> = events.iter().collect();
    ordered.sort_by_key(|event| event.at);
    ordered
        .into_iter()
        .fold(Reconstruction::new(created_at), Reconstruction::apply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    fn t0() -> Timestamp {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .unwrap()
    }

    fn hours(h: i64) -> Timestamp {
        t0() + TimeDelta::hours(h)
    }

    fn status(from: &str, to: &str, at: Timestamp) -> HistoryEvent {
        HistoryEvent::new("status", from, to, at)
    }

    fn assignee(from: &str, to: &str, at: Timestamp) -> HistoryEvent {
        HistoryEvent::new("assignee", from, to, at)
    }

    #[test]
    fn empty_log_yields_seeded_state() {
        let rebuilt = reconstruct(t0(), &[]);
        assert!(rebuilt.status.periods.is_empty());
        assert!(rebuilt.assignee.periods.is_empty());
        assert!(rebuilt.status.first_changed_at.is_none());
        assert!(rebuilt.assignee.first_changed_at.is_none());
        assert_eq!(rebuilt.status.last_changed_at, t0());
        assert_eq!(rebuilt.assignee.last_changed_at, t0());
        assert!(rebuilt.last_finish_status_at.is_none());
        assert_eq!(rebuilt.status_history, vec!["created"]);
    }

    #[test]
    fn status_walk_attributes_time_to_vacated_status() {
        let events = [
            status("In Progress", "Done", hours(3)),
            status("To Do", "In Progress", hours(1)),
        ];
        let rebuilt = reconstruct(t0(), &events);

        assert_eq!(rebuilt.status.periods["To Do"], TimeDelta::hours(1));
        assert_eq!(rebuilt.status.periods["In Progress"], TimeDelta::hours(2));
        assert_eq!(rebuilt.status.periods.len(), 2);
        assert_eq!(rebuilt.status_history, vec!["created", "In Progress", "Done"]);
        assert_eq!(rebuilt.status.first_changed_at, Some(hours(1)));
        assert_eq!(rebuilt.status.last_changed_at, hours(3));
        assert_eq!(rebuilt.last_finish_status_at, Some(hours(3)));
    }

    #[test]
    fn dimensions_keep_independent_cursors() {
        let events = [
            status("To Do", "In Progress", hours(2)),
            assignee("alice", "bob", hours(5)),
            status("In Progress", "Review", hours(6)),
        ];
        let rebuilt = reconstruct(t0(), &events);

        assert_eq!(rebuilt.assignee.periods["alice"], TimeDelta::hours(5));
        assert_eq!(rebuilt.status.periods["In Progress"], TimeDelta::hours(4));
        assert_eq!(rebuilt.assignee.first_changed_at, Some(hours(5)));
        assert_eq!(rebuilt.status_history.len(), 3);
    }

    #[test]
    fn revisited_values_accumulate() {
        let events = [
            status("To Do", "In Progress", hours(1)),
            status("In Progress", "To Do", hours(2)),
            status("To Do", "In Progress", hours(5)),
        ];
        let rebuilt = reconstruct(t0(), &events);
        assert_eq!(rebuilt.status.periods["To Do"], TimeDelta::hours(4));
        assert_eq!(rebuilt.status.periods["In Progress"], TimeDelta::hours(1));
    }

    #[test]
    fn last_done_transition_wins() {
        let events = [
            status("In Progress", "Done", hours(2)),
            status("Done", "In Progress", hours(3)),
            status("In Progress", "closed", hours(7)),
        ];
        let rebuilt = reconstruct(t0(), &events);
        assert_eq!(rebuilt.last_finish_status_at, Some(hours(7)));
    }

    #[test]
    fn reopened_item_keeps_last_done_timestamp() {
        let events = [
            status("In Progress", "Done", hours(2)),
            status("Done", "In Progress", hours(3)),
        ];
        let rebuilt = reconstruct(t0(), &events);
        assert_eq!(rebuilt.last_finish_status_at, Some(hours(2)));
    }

    #[test]
    fn untracked_fields_are_ignored() {
        let events = [
            HistoryEvent::new("priority", "Low", "High", hours(1)),
            HistoryEvent::new("Status", "To Do", "Done", hours(2)),
            status("To Do", "In Progress", hours(4)),
        ];
        let rebuilt = reconstruct(t0(), &events);
        assert_eq!(rebuilt.status_history, vec!["created", "In Progress"]);
        assert_eq!(rebuilt.status.periods["To Do"], TimeDelta::hours(4));
        assert!(rebuilt.last_finish_status_at.is_none());
    }

    #[test]
    fn no_op_transitions_still_extend_history() {
        let events = [
            status("To Do", "To Do", hours(1)),
            status("To Do", "In Progress", hours(2)),
        ];
        let rebuilt = reconstruct(t0(), &events);
        assert_eq!(rebuilt.status_history, vec!["created", "To Do", "In Progress"]);
        assert_eq!(rebuilt.status.periods["To Do"], TimeDelta::hours(2));
    }

    #[test]
    fn simultaneous_events_add_zero_intervals() {
        let events = [
            status("To Do", "In Progress", hours(1)),
            status("In Progress", "Review", hours(1)),
        ];
        let rebuilt = reconstruct(t0(), &events);
        let mut visited = rebuilt.status_history.clone();
        visited.sort();
        assert_eq!(visited, vec!["In Progress", "Review", "created"]);
        let mut periods: Vec<TimeDelta> = rebuilt.status.periods.values().copied().collect();
        periods.sort();
        assert_eq!(periods, vec![TimeDelta::zero(), TimeDelta::hours(1)]);
        assert_eq!(rebuilt.status.total(), TimeDelta::hours(1));
        assert_eq!(rebuilt.status.last_changed_at, hours(1));
    }

    #[test]
    fn events_before_creation_propagate_negative_intervals() {
        let events = [status("To Do", "In Progress", t0() - TimeDelta::hours(2))];
        let rebuilt = reconstruct(t0(), &events);
        assert_eq!(rebuilt.status.periods["To Do"], TimeDelta::hours(-2));
        assert_eq!(rebuilt.status.first_changed_at, Some(hours(-2)));
    }

    #[test]
    fn tracked_field_names_roundtrip() {
        for field in TrackedField::ALL {
            assert_eq!(TrackedField::from_name(field.as_str()), Some(field));
        }
        assert_eq!(TrackedField::from_name("resolution"), None);
    }
}
