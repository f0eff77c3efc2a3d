use chrono::{DateTime, FixedOffset, TimeDelta};
use indexmap::IndexMap;
use tracing::warn;

use crate::history::reconstruct;

/// Point in time as reported by the issue tracker, offset preserved.
pub type Timestamp = DateTime<FixedOffset>;

/// Accumulated time per value (status label or assignee), in first-seen order.
pub type DurationMap = IndexMap<String, TimeDelta>;

/// Synthetic first entry of every status history: the state at creation.
pub const CREATED_SENTINEL: &str = "created";

/// Status labels that mark an item as finished (compared case-insensitively).
pub const DONE_STATUSES: [&str; 4] = ["done", "completed", "cancelled", "closed"];

/// Returns true when `label` is one of the done-equivalent statuses.
#[must_use]
pub fn is_done_status(label: &str) -> bool {
    DONE_STATUSES
        .iter()
        .any(|done| label.eq_ignore_ascii_case(done))
}

/// One field transition from the tracker's change log.
///
/// A missing source or destination value (e.g. "unassigned") is the empty string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEvent {
    pub field: String,
    pub from: String,
    pub to: String,
    pub at: Timestamp,
}

impl HistoryEvent {
    pub fn new(
        field: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
        at: Timestamp,
    ) -> Self {
        Self {
            field: field.into(),
            from: from.into(),
            to: to.into(),
            at,
        }
    }
}

/// An item as delivered by an issue source, before reconstruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawItem {
    pub key: String,
    pub status: String,
    pub created_at: Timestamp,
    /// Change-log entries in arbitrary order.
    pub events: Vec<HistoryEvent>,
}

/// The reconstructed timing profile of one work item.
///
/// Empty period maps stand for "no history in that dimension".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRecord {
    pub key: String,
    /// Current status label. Informational; no metric reads it.
    pub status: String,
    pub created_at: Timestamp,
    pub first_status_change_at: Option<Timestamp>,
    /// Time of the latest status event, `created_at` when there is none.
    pub last_status_change_at: Timestamp,
    pub first_assignee_change_at: Option<Timestamp>,
    /// Time of the most recent transition into a done-equivalent status.
    pub last_finish_status_at: Option<Timestamp>,
    pub status_history: Vec<String>,
    pub doers_x_periods: DurationMap,
    pub statuses_x_periods: DurationMap,
}

impl ItemRecord {
    /// A record with no transitions: it has only ever been `created`.
    pub fn new(key: impl Into<String>, status: impl Into<String>, created_at: Timestamp) -> Self {
        Self {
            key: key.into(),
            status: status.into(),
            created_at,
            first_status_change_at: None,
            last_status_change_at: created_at,
            first_assignee_change_at: None,
            last_finish_status_at: None,
            status_history: vec![CREATED_SENTINEL.to_string()],
            doers_x_periods: DurationMap::new(),
            statuses_x_periods: DurationMap::new(),
        }
    }

    /// Reconstruct the timing profile of a raw item from its change log.
    #[must_use]
    pub fn from_raw(raw: &RawItem) -> Self {
        let skewed = raw
            .events
            .iter()
            .filter(|event| event.at < raw.created_at)
            .count();
        if skewed > 0 {
            warn!(
                key = %raw.key,
                skewed,
                "history events predate item creation; attributed intervals may be negative"
            );
        }

        let rebuilt = reconstruct(raw.created_at, &raw.events);
        Self {
            key: raw.key.clone(),
            status: raw.status.clone(),
            created_at: raw.created_at,
            first_status_change_at: rebuilt.status.first_changed_at,
            last_status_change_at: rebuilt.status.last_changed_at,
            first_assignee_change_at: rebuilt.assignee.first_changed_at,
            last_finish_status_at: rebuilt.last_finish_status_at,
            status_history: rebuilt.status_history,
            doers_x_periods: rebuilt.assignee.periods,
            statuses_x_periods: rebuilt.status.periods,
        }
    }

    /// True once the item has reached a done-equivalent status.
    #[must_use]
    pub const fn was_done(&self) -> bool {
        self.last_finish_status_at.is_some()
    }

    /// Creation to (last) completion.
    #[must_use]
    pub fn lead_time(&self) -> Option<TimeDelta> {
        self.last_finish_status_at
            .map(|finished| finished.signed_duration_since(self.created_at))
    }

    /// First status change to (last) completion.
    #[must_use]
    pub fn cycle_time(&self) -> Option<TimeDelta> {
        let started = self.first_status_change_at?;
        let finished = self.last_finish_status_at?;
        Some(finished.signed_duration_since(started))
    }
}
