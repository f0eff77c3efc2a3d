//! `tally show`: one reconstructed item.

use std::io::{self, Write};
use std::path::Path;

use chrono::TimeDelta;
use clap::Args;
use serde::Serialize;
use tally_core::error::ErrorCode;
use tally_core::model::item::{DurationMap, ItemRecord, Timestamp};

use super::{SourceArgs, load_collection, load_config};
use crate::output::{CliError, OutputMode, pretty_kv, pretty_rule, pretty_section, render_mode};

/// Arguments for `tally show`.
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Item key (e.g. OPS-123).
    pub key: String,

    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Debug, Serialize)]
pub struct PeriodView {
    pub name: String,
    pub seconds: i64,
}

/// Serializable view of an [`ItemRecord`]; durations in seconds.
#[derive(Debug, Serialize)]
pub struct ItemView {
    pub key: String,
    pub status: String,
    pub created_at: String,
    pub first_status_change_at: Option<String>,
    pub last_status_change_at: String,
    pub first_assignee_change_at: Option<String>,
    pub last_finish_status_at: Option<String>,
    pub lead_time_seconds: Option<i64>,
    pub cycle_time_seconds: Option<i64>,
    pub status_history: Vec<String>,
    pub statuses: Vec<PeriodView>,
    pub assignees: Vec<PeriodView>,
}

fn stamp(at: Timestamp) -> String {
    at.to_rfc3339()
}

fn periods(map: &DurationMap) -> Vec<PeriodView> {
    map.iter()
        .map(|(name, period)| PeriodView {
            name: name.clone(),
            seconds: period.num_seconds(),
        })
        .collect()
}

impl From<&ItemRecord> for ItemView {
    fn from(item: &ItemRecord) -> Self {
        Self {
            key: item.key.clone(),
            status: item.status.clone(),
            created_at: stamp(item.created_at),
            first_status_change_at: item.first_status_change_at.map(stamp),
            last_status_change_at: stamp(item.last_status_change_at),
            first_assignee_change_at: item.first_assignee_change_at.map(stamp),
            last_finish_status_at: item.last_finish_status_at.map(stamp),
            lead_time_seconds: item.lead_time().map(|d| d.num_seconds()),
            cycle_time_seconds: item.cycle_time().map(|d| d.num_seconds()),
            status_history: item.status_history.clone(),
            statuses: periods(&item.statuses_x_periods),
            assignees: periods(&item.doers_x_periods),
        }
    }
}

/// Execute `tally show`.
pub fn run_show(
    args: &ShowArgs,
    config_path: Option<&Path>,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let config = load_config(config_path, project_root)?;
    let items = load_collection(&args.source, &config)?;
    let item = items.get(&args.key).ok_or_else(|| {
        CliError::with_code(format!("item not found: {}", args.key), ErrorCode::ItemNotFound)
    })?;

    render_mode(output, &ItemView::from(item), render_item_text, render_item_pretty)
}

/// `1d 4h 30m`, `-2h`, `0s`.
fn human_duration(seconds: i64) -> String {
    let delta = TimeDelta::seconds(seconds.abs());
    let sign = if seconds < 0 { "-" } else { "" };
    let parts: Vec<String> = [
        (delta.num_days(), "d"),
        (delta.num_hours() % 24, "h"),
        (delta.num_minutes() % 60, "m"),
        (delta.num_seconds() % 60, "s"),
    ]
    .into_iter()
    .filter(|(value, _)| *value > 0)
    .map(|(value, unit)| format!("{value}{unit}"))
    .collect();

    if parts.is_empty() {
        "0s".to_string()
    } else {
        format!("{sign}{}", parts.join(" "))
    }
}

fn optional(value: Option<&String>) -> &str {
    value.map_or("-", String::as_str)
}

fn render_item_text(view: &ItemView, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "key\t{}", view.key)?;
    writeln!(w, "status\t{}", view.status)?;
    writeln!(w, "created_at\t{}", view.created_at)?;
    writeln!(w, "first_status_change_at\t{}", optional(view.first_status_change_at.as_ref()))?;
    writeln!(w, "last_status_change_at\t{}", view.last_status_change_at)?;
    writeln!(
        w,
        "first_assignee_change_at\t{}",
        optional(view.first_assignee_change_at.as_ref())
    )?;
    writeln!(w, "last_finish_status_at\t{}", optional(view.last_finish_status_at.as_ref()))?;
    writeln!(w, "status_history\t{}", view.status_history.join(" > "))?;
    for period in &view.statuses {
        writeln!(w, "status_period\t{}\t{}", period.name, period.seconds)?;
    }
    for period in &view.assignees {
        writeln!(w, "assignee_period\t{}\t{}", period.name, period.seconds)?;
    }
    Ok(())
}

fn render_periods(w: &mut dyn Write, heading: &str, periods: &[PeriodView]) -> io::Result<()> {
    writeln!(w)?;
    pretty_section(w, heading)?;
    if periods.is_empty() {
        return writeln!(w, "  (no history)");
    }
    for period in periods {
        let name = if period.name.is_empty() {
            "(none)"
        } else {
            period.name.as_str()
        };
        writeln!(w, "  {name:<28} {}", human_duration(period.seconds))?;
    }
    Ok(())
}

fn render_item_pretty(view: &ItemView, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, &format!("{} [{}]", view.key, view.status))?;
    pretty_kv(w, "Created", &view.created_at)?;
    pretty_kv(w, "First status change", optional(view.first_status_change_at.as_ref()))?;
    pretty_kv(w, "Last status change", &view.last_status_change_at)?;
    pretty_kv(w, "First assignee change", optional(view.first_assignee_change_at.as_ref()))?;
    pretty_kv(w, "Last finished", optional(view.last_finish_status_at.as_ref()))?;
    pretty_kv(
        w,
        "Lead time",
        view.lead_time_seconds.map_or_else(|| "-".to_string(), human_duration),
    )?;
    pretty_kv(
        w,
        "Cycle time",
        view.cycle_time_seconds.map_or_else(|| "-".to_string(), human_duration),
    )?;
    pretty_kv(w, "History", view.status_history.join(" > "))?;
    render_periods(w, "Time in status", &view.statuses)?;
    render_periods(w, "Time per assignee", &view.assignees)?;
    pretty_rule(w)
}
