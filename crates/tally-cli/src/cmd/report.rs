//! `tally report`: every flow metric for one population.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::Path;

use clap::Args;
use serde::Serialize;
use tally_core::config::MetricsConfig;
use tally_core::metrics::{Bucketing, MetricsReport, ONE_DAY, ONE_HOUR, median};
use tally_core::MetricsService;
use tracing::info;

use super::{SourceArgs, load_collection, load_config};
use crate::output::{OutputMode, pretty_rule, pretty_section, render_mode};

const BAR_WIDTH: usize = 40;

/// Arguments for `tally report`.
#[derive(Args, Debug, Default)]
pub struct ReportArgs {
    #[command(flatten)]
    pub source: SourceArgs,
}

/// Report payload: population size plus one entry per metric.
#[derive(Debug, Serialize)]
pub struct ReportPayload {
    pub items: usize,
    #[serde(flatten)]
    pub metrics: MetricsReport,
}

/// Execute `tally report`.
pub fn run_report(
    args: &ReportArgs,
    config_path: Option<&Path>,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let config = load_config(config_path, project_root)?;
    let items = load_collection(&args.source, &config)?;
    let metrics = MetricsService::with_config(&items, config.metrics.clone()).report();
    info!(items = items.len(), "report computed");

    let payload = ReportPayload {
        items: items.len(),
        metrics,
    };
    render_mode(output, &payload, render_report_text, |payload, w| {
        render_report_pretty(payload, &config.metrics, w)
    })
}

fn join(values: &[impl ToString]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn render_report_text(payload: &ReportPayload, w: &mut dyn Write) -> io::Result<()> {
    let metrics = &payload.metrics;
    writeln!(w, "items\t{}", payload.items)?;
    writeln!(w, "cycle_time\t{}", join(&metrics.cycle_time))?;
    writeln!(w, "lead_time\t{}", join(&metrics.lead_time))?;
    for (status, values) in &metrics.queue_time {
        writeln!(w, "queue_time\t{status}\t{}", join(values))?;
    }
    for (week, count) in &metrics.throughput {
        writeln!(w, "throughput\t{week}\t{count}")?;
    }
    for row in &metrics.cumulative_queue_time {
        writeln!(
            w,
            "cumulative_queue_time\t{}\t{:.1}\t{}",
            row.status, row.median_hours, row.count
        )?;
    }
    writeln!(w, "return_to_testing\t{}", join(&metrics.return_to_testing))
}

fn unit_label(bucketing: Bucketing) -> String {
    match bucketing.bucket_seconds {
        ONE_DAY => "days".to_string(),
        ONE_HOUR => "hours".to_string(),
        seconds => format!("x{seconds}s"),
    }
}

/// Count of samples per distinct value.
fn histogram<T: Ord + Copy>(values: &[T]) -> BTreeMap<T, usize> {
    let mut counts = BTreeMap::new();
    for value in values {
        *counts.entry(*value).or_insert(0) += 1;
    }
    counts
}

fn bar(count: usize, max: usize) -> String {
    let len = (count * BAR_WIDTH / max.max(1)).max(1);
    "#".repeat(len)
}

fn write_histogram<T: Ord + Copy + std::fmt::Display>(
    w: &mut dyn Write,
    values: &[T],
) -> io::Result<()> {
    let counts = histogram(values);
    if counts.is_empty() {
        return writeln!(w, "  (no data)");
    }
    let max = counts.values().copied().max().unwrap_or(1);
    for (value, count) in counts {
        writeln!(w, "  {value:>5} | {} {count}", bar(count, max))?;
    }
    Ok(())
}

fn render_report_pretty(
    payload: &ReportPayload,
    config: &MetricsConfig,
    w: &mut dyn Write,
) -> io::Result<()> {
    let metrics = &payload.metrics;
    pretty_section(w, &format!("Flow metrics ({} items)", payload.items))?;
    writeln!(w)?;

    writeln!(w, "Cycle time ({})", unit_label(config.cycle_time))?;
    write_histogram(w, &metrics.cycle_time)?;
    writeln!(w)?;

    writeln!(w, "Lead time ({})", unit_label(config.lead_time))?;
    write_histogram(w, &metrics.lead_time)?;
    writeln!(w)?;

    writeln!(w, "Queue time ({})", unit_label(config.queue_time))?;
    if metrics.queue_time.is_empty() {
        writeln!(w, "  (no data)")?;
    }
    for (status, values) in &metrics.queue_time {
        let median = median(values).unwrap_or_default();
        let max = values.iter().copied().max().unwrap_or_default();
        writeln!(
            w,
            "  {status:<24} median {median:>6.1}  max {max:>4}  n={}",
            values.len()
        )?;
    }
    writeln!(w)?;

    writeln!(w, "Throughput (items per ISO week)")?;
    if metrics.throughput.is_empty() {
        writeln!(w, "  (no data)")?;
    }
    let max = metrics.throughput.values().copied().max().unwrap_or(1);
    for (week, count) in &metrics.throughput {
        writeln!(w, "  {week} | {} {count}", bar(*count, max))?;
    }
    writeln!(w)?;

    writeln!(w, "Cumulative queue time (median hours)")?;
    if metrics.cumulative_queue_time.is_empty() {
        writeln!(w, "  (no data)")?;
    }
    for row in &metrics.cumulative_queue_time {
        writeln!(
            w,
            "  {:<24} {:>8.1}h  n={}",
            row.status, row.median_hours, row.count
        )?;
    }
    writeln!(w)?;

    writeln!(
        w,
        "Return to testing (items above {} visits)",
        config.return_to_testing.min_count
    )?;
    write_histogram(w, &metrics.return_to_testing)?;
    pretty_rule(w)
}
