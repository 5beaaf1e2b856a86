//! Yearly counts of days beyond a day-of-year percentile threshold.

use crate::error::{AnalysisError, Result};
use crate::percentile::Thresholds;
use crate::trend::Trend;
use chrono::Datelike;
use clima_station::StationSeries;
use serde::Serialize;
use std::{collections::BTreeMap, fmt, str::FromStr};

/// Direction of the comparison against the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    Greater,
    Less,
}

impl Operator {
    /// Strict comparison; a value equal to the threshold is never an event.
    pub fn is_event(&self, value: f64, threshold: f64) -> bool {
        match self {
            Operator::Greater => value > threshold,
            Operator::Less => value < threshold,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operator::Greater => "greater",
            Operator::Less => "less",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operator {
    type Err = AnalysisError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "greater" => Ok(Operator::Greater),
            "less" => Ok(Operator::Less),
            other => Err(AnalysisError::UnknownOperator(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct YearFrequency {
    pub year: i32,
    pub frequency: u32,
}

/// Result document of an extreme-event request.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ExtremeDocument {
    pub variable: String,
    pub percentile: i32,
    pub operator: Operator,
    pub records: Vec<YearFrequency>,
    pub trend: Trend,
}

/// Count, per calendar year, the observations of `variable` beyond the
/// `p`th percentile of their calendar day, and fit a trend to the counts.
///
/// Thresholds come from the same series, so callers narrow the series to
/// the requested range first. Only years with at least one event are
/// reported; a year without events is absent, not 0.
pub fn extreme_frequency(series: &StationSeries, variable: &str, p: i32, operator: Operator) -> Result<ExtremeDocument> {
    let thresholds = Thresholds::compute(series, variable, p)?;

    let mut counts: BTreeMap<i32, u32> = BTreeMap::new();
    for record in &series.records {
        let Some(value) = record.get(variable) else {
            continue;
        };
        let Some(threshold) = thresholds.get(record.date.month(), record.date.day()) else {
            continue;
        };
        if operator.is_event(value, threshold) {
            *counts.entry(record.date.year()).or_insert(0) += 1;
        }
    }

    let records: Vec<YearFrequency> = counts
        .into_iter()
        .map(|(year, frequency)| YearFrequency { year, frequency })
        .collect();
    let points: Vec<(i32, f64)> = records
        .iter()
        .map(|r| (r.year, f64::from(r.frequency)))
        .collect();
    let trend = Trend::from_yearly(&points);

    log::debug!(
        "[Clima] extremes: station {} {} {} p{} -> {} years, trend fitted: {}",
        series.station_id,
        variable,
        operator,
        p,
        records.len(),
        !trend.is_empty()
    );

    Ok(ExtremeDocument {
        variable: variable.to_string(),
        percentile: p,
        operator,
        records,
        trend,
    })
}
