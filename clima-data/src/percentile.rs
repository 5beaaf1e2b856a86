//! Day-of-year percentile thresholds.

use crate::error::{AnalysisError, Result};
use chrono::Datelike;
use clima_station::StationSeries;
use clima_utils::{dates::day_month_label, numbers::finite_round2};
use serde::Serialize;
use std::collections::BTreeMap;

/// Quantile of an ascending slice with linear interpolation between order
/// statistics. `q` is a fraction in 0..=1.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let position = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Reject percentiles outside 0..=100.
pub fn validate_percentile(p: i32) -> Result<f64> {
    if (0..=100).contains(&p) {
        Ok(f64::from(p) / 100.0)
    } else {
        Err(AnalysisError::InvalidPercentile(p))
    }
}

/// Threshold per (month, day) for one variable and percentile.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Thresholds(pub BTreeMap<(u32, u32), f64>);

impl Thresholds {
    /// Compute the `p`th percentile of `variable` for every calendar day
    /// that has at least one numeric observation.
    pub fn compute(series: &StationSeries, variable: &str, p: i32) -> Result<Self> {
        let q = validate_percentile(p)?;
        let mut samples: BTreeMap<(u32, u32), Vec<f64>> = BTreeMap::new();
        for record in &series.records {
            if let Some(value) = record.get(variable) {
                samples
                    .entry((record.date.month(), record.date.day()))
                    .or_default()
                    .push(value);
            }
        }
        let thresholds = samples
            .into_iter()
            .filter_map(|(day, mut values)| {
                values.sort_by(f64::total_cmp);
                quantile(&values, q).map(|threshold| (day, threshold))
            })
            .collect();
        Ok(Thresholds(thresholds))
    }

    pub fn get(&self, month: u32, day: u32) -> Option<f64> {
        self.0.get(&(month, day)).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ThresholdRow {
    pub label: String,
    pub month: u32,
    pub day: u32,
    pub value: Option<f64>,
}

/// Result document of a percentile request; `variable` reads "p{p}".
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PercentileDocument {
    pub variable: String,
    pub records: Vec<ThresholdRow>,
}

/// Day-of-year `p`th percentile of `variable`.
///
/// An unknown variable or an empty series gives an empty document.
pub fn percentile(series: &StationSeries, variable: &str, p: i32) -> Result<PercentileDocument> {
    let thresholds = Thresholds::compute(series, variable, p)?;
    let records = thresholds
        .0
        .iter()
        .map(|(&(month, day), &value)| ThresholdRow {
            label: day_month_label(month, day),
            month,
            day,
            value: finite_round2(value),
        })
        .collect();
    Ok(PercentileDocument {
        variable: format!("p{p}"),
        records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use clima_station::DailyRecord;

    fn series_for_day(values: &[Option<f64>]) -> StationSeries {
        let records = values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let date = NaiveDate::from_ymd_opt(1980 + i as i32, 8, 15).unwrap();
                DailyRecord::new(date).with("TMAX", *v)
            })
            .collect();
        StationSeries::from_records("T1", vec!["TMAX".to_string()], records)
    }

    #[test]
    fn test_quantile_linear_interpolation() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&sorted, 0.0), Some(1.0));
        assert_eq!(quantile(&sorted, 1.0), Some(4.0));
        assert_eq!(quantile(&sorted, 0.5), Some(2.5));
        assert!((quantile(&sorted, 0.9).unwrap() - 3.7).abs() < 1e-12);
        assert_eq!(quantile(&[], 0.5), None);
        assert_eq!(quantile(&[7.0], 0.3), Some(7.0));
    }

    #[test]
    fn test_out_of_range_percentile() {
        let s = series_for_day(&[Some(1.0)]);
        assert_eq!(
            percentile(&s, "TMAX", 101),
            Err(AnalysisError::InvalidPercentile(101))
        );
        assert_eq!(
            percentile(&s, "TMAX", -1),
            Err(AnalysisError::InvalidPercentile(-1))
        );
        assert!(percentile(&s, "TMAX", 0).is_ok());
        assert!(percentile(&s, "TMAX", 100).is_ok());
    }

    #[test]
    fn test_nulls_are_excluded_not_zero() {
        let s = series_for_day(&[Some(10.0), None, Some(20.0), None]);
        let doc = percentile(&s, "TMAX", 0).unwrap();
        assert_eq!(doc.variable, "p0");
        assert_eq!(doc.records.len(), 1);
        assert_eq!(doc.records[0].label, "15-08");
        assert_eq!(doc.records[0].value, Some(10.0));
    }

    #[test]
    fn test_monotonic_in_percentile() {
        let values: Vec<Option<f64>> = [3.0, 9.5, 1.0, 7.25, 4.0, 12.0, 5.5].iter().map(|v| Some(*v)).collect();
        let s = series_for_day(&values);
        let p50 = Thresholds::compute(&s, "TMAX", 50).unwrap().get(8, 15).unwrap();
        let p90 = Thresholds::compute(&s, "TMAX", 90).unwrap().get(8, 15).unwrap();
        assert!(p50 <= p90);
        assert_eq!(p50, 5.5);
    }

    #[test]
    fn test_unknown_variable_and_empty_series() {
        let s = series_for_day(&[Some(1.0)]);
        assert!(percentile(&s, "EVAP", 90).unwrap().records.is_empty());
        assert!(percentile(&s.empty_like(), "TMAX", 90).unwrap().records.is_empty());
    }
}
