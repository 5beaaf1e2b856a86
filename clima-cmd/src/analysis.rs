//! Rendering of the result documents for each command.

use anyhow::Context;
use clima_data::{aggregate, extreme_frequency, percentile, GroupKey, Operator};
use clima_station::{DateBounds, StationSeries};
use serde::Serialize;

fn render<T: Serialize>(document: &T) -> anyhow::Result<String> {
    serde_json::to_string_pretty(document).context("failed to serialize result document")
}

/// Raw-data view of the whole series.
pub fn station_data(series: &StationSeries) -> anyhow::Result<String> {
    log::info!(
        "[Clima] command: data for station {} ({} records)",
        series.station_id,
        series.len()
    );
    render(&series.document())
}

pub fn aggregate_station(series: &StationSeries, mode: GroupKey, bounds: &DateBounds) -> anyhow::Result<String> {
    let narrowed = series.filter(bounds);
    let document = aggregate(&narrowed, mode, None);
    log::info!(
        "[Clima] command: {} aggregation of station {} -> {} groups",
        mode,
        series.station_id,
        document.records.len()
    );
    render(&document)
}

pub fn percentile_station(series: &StationSeries, variable: &str, p: i32, bounds: &DateBounds) -> anyhow::Result<String> {
    let narrowed = series.filter(bounds);
    let document = percentile(&narrowed, variable, p).context("invalid percentile request")?;
    render(&document)
}

pub fn extremes_station(
    series: &StationSeries,
    variable: &str,
    p: i32,
    operator: Operator,
    bounds: &DateBounds,
) -> anyhow::Result<String> {
    let narrowed = series.filter(bounds);
    let document = extreme_frequency(&narrowed, variable, p, operator).context("invalid extremes request")?;
    render(&document)
}
