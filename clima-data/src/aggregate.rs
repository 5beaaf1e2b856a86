//! Calendar groupings of a station series.
//!
//! Every mode is one or two applications of [`reduce_groups`]:
//!
//! - `DayOfYear`: by (month, day), averaging every variable
//! - `CalendarMonth` / `CalendarYear`: by year-month or year, with the policy
//! - `Season`: by (year, season), with the policy
//! - `MonthAcrossYears` / `SeasonAcrossYears`: by (year, month) or
//!   (year, season) with the policy, then by month or season averaging the
//!   per-year values

use crate::error::AnalysisError;
use crate::policy::{reduce_groups, AggregationPolicy, Values};
use crate::season::Season;
use chrono::Datelike;
use clima_station::StationSeries;
use clima_utils::{
    dates::{day_month_label, year_month_label},
    numbers::finite_round2,
};
use serde::Serialize;
use std::{fmt, str::FromStr};

/// The calendar key records are grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKey {
    DayOfYear,
    CalendarMonth,
    CalendarYear,
    MonthAcrossYears,
    Season,
    SeasonAcrossYears,
}

impl GroupKey {
    pub const ALL: [GroupKey; 6] = [
        GroupKey::DayOfYear,
        GroupKey::CalendarMonth,
        GroupKey::CalendarYear,
        GroupKey::MonthAcrossYears,
        GroupKey::Season,
        GroupKey::SeasonAcrossYears,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            GroupKey::DayOfYear => "day-of-year",
            GroupKey::CalendarMonth => "calendar-month",
            GroupKey::CalendarYear => "calendar-year",
            GroupKey::MonthAcrossYears => "month-across-years",
            GroupKey::Season => "season",
            GroupKey::SeasonAcrossYears => "season-across-years",
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GroupKey {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GroupKey::ALL
            .into_iter()
            .find(|key| key.name() == s.trim())
            .ok_or_else(|| AnalysisError::UnknownGroupKey(s.to_string()))
    }
}

/// One reduced group. The key fields that do not apply to the grouping mode
/// are left out of the serialized row.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AggregateRow {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season: Option<Season>,
    #[serde(flatten)]
    pub values: Values,
}

impl AggregateRow {
    fn new(label: String, values: Values) -> Self {
        AggregateRow {
            label,
            year: None,
            month: None,
            day: None,
            season: None,
            values: values
                .into_iter()
                .map(|(variable, value)| (variable, value.and_then(finite_round2)))
                .collect(),
        }
    }

    /// Rounded value of `variable` in this group.
    pub fn get(&self, variable: &str) -> Option<f64> {
        self.values.get(variable).copied().flatten()
    }
}

/// Result document of an aggregation.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AggregateDocument {
    pub variables: Vec<String>,
    pub records: Vec<AggregateRow>,
}

/// Group `series` by `key`.
///
/// `policy` overrides the standard additive/intensive table; day-of-year
/// always averages. `variables` in the result is the numeric columns of the
/// series whatever the grouping, and an empty series gives empty records.
pub fn aggregate(series: &StationSeries, key: GroupKey, policy: Option<&AggregationPolicy>) -> AggregateDocument {
    let standard = AggregationPolicy::standard();
    let policy = policy.unwrap_or(&standard);
    let variables = &series.numeric_variables;
    let rows = series.records.iter();

    let records: Vec<AggregateRow> = match key {
        GroupKey::DayOfYear => {
            let by_day = reduce_groups(
                rows.map(|r| ((r.date.month(), r.date.day()), &r.values)),
                variables,
                &policy.climatology(),
            );
            by_day
                .into_iter()
                .map(|((month, day), values)| AggregateRow {
                    month: Some(month),
                    day: Some(day),
                    ..AggregateRow::new(day_month_label(month, day), values)
                })
                .collect()
        }
        GroupKey::CalendarMonth => {
            let by_month = reduce_groups(
                rows.map(|r| ((r.date.year(), r.date.month()), &r.values)),
                variables,
                policy,
            );
            by_month
                .into_iter()
                .map(|((year, month), values)| AggregateRow {
                    year: Some(year),
                    month: Some(month),
                    ..AggregateRow::new(year_month_label(year, month), values)
                })
                .collect()
        }
        GroupKey::CalendarYear => {
            let by_year = reduce_groups(rows.map(|r| (r.date.year(), &r.values)), variables, policy);
            by_year
                .into_iter()
                .map(|(year, values)| AggregateRow {
                    year: Some(year),
                    ..AggregateRow::new(format!("{year:04}"), values)
                })
                .collect()
        }
        GroupKey::MonthAcrossYears => {
            let by_year_month = reduce_groups(
                rows.map(|r| ((r.date.year(), r.date.month()), &r.values)),
                variables,
                policy,
            );
            let by_month = reduce_groups(
                by_year_month.iter().map(|((_, month), values)| (*month, values)),
                variables,
                &AggregationPolicy::uniform_mean(),
            );
            by_month
                .into_iter()
                .map(|(month, values)| AggregateRow {
                    month: Some(month),
                    ..AggregateRow::new(format!("{month:02}"), values)
                })
                .collect()
        }
        GroupKey::Season => {
            let by_year_season = reduce_groups(
                rows.map(|r| ((r.date.year(), Season::from_month(r.date.month())), &r.values)),
                variables,
                policy,
            );
            by_year_season
                .into_iter()
                .map(|((year, season), values)| AggregateRow {
                    year: Some(year),
                    season: Some(season),
                    ..AggregateRow::new(format!("{season} {year}"), values)
                })
                .collect()
        }
        GroupKey::SeasonAcrossYears => {
            let by_year_season = reduce_groups(
                rows.map(|r| ((r.date.year(), Season::from_month(r.date.month())), &r.values)),
                variables,
                policy,
            );
            let by_season = reduce_groups(
                by_year_season.iter().map(|((_, season), values)| (*season, values)),
                variables,
                &AggregationPolicy::uniform_mean(),
            );
            by_season
                .into_iter()
                .map(|(season, values)| AggregateRow {
                    season: Some(season),
                    ..AggregateRow::new(season.to_string(), values)
                })
                .collect()
        }
    };

    log::debug!(
        "[Clima] aggregate: station {} by {} -> {} groups",
        series.station_id,
        key,
        records.len()
    );

    AggregateDocument {
        variables: variables.clone(),
        records,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use clima_station::{DailyRecord, DateBounds};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn day(y: i32, m: u32, d: u32, precip: f64, tmax: f64) -> DailyRecord {
        DailyRecord::new(date(y, m, d))
            .with("PRECIP", Some(precip))
            .with("TMAX", Some(tmax))
    }

    fn series(records: Vec<DailyRecord>) -> StationSeries {
        StationSeries::from_records("T1", vec!["PRECIP".to_string(), "TMAX".to_string()], records)
    }

    #[test]
    fn test_group_key_names() {
        for key in GroupKey::ALL {
            assert_eq!(key.name().parse::<GroupKey>().unwrap(), key);
        }
        assert_eq!(
            "weekly".parse::<GroupKey>(),
            Err(AnalysisError::UnknownGroupKey("weekly".to_string()))
        );
    }

    #[test]
    fn test_calendar_month_sums_additive_and_averages_intensive() {
        let s = series(vec![day(2020, 5, 1, 1.0, 10.0), day(2020, 5, 2, 3.0, 20.0)]);
        let doc = aggregate(&s, GroupKey::CalendarMonth, None);
        assert_eq!(doc.records.len(), 1);
        let row = &doc.records[0];
        assert_eq!(row.label, "2020-05");
        assert_eq!(row.get("PRECIP"), Some(4.0));
        assert_eq!(row.get("TMAX"), Some(15.0));
    }

    #[test]
    fn test_day_of_year_averages_additive_variables() {
        let s = series(vec![day(2019, 7, 4, 1.0, 30.0), day(2020, 7, 4, 3.0, 32.0)]);
        let doc = aggregate(&s, GroupKey::DayOfYear, None);
        assert_eq!(doc.records.len(), 1);
        let row = &doc.records[0];
        assert_eq!(row.label, "04-07");
        assert_eq!(row.month, Some(7));
        assert_eq!(row.day, Some(4));
        assert_eq!(row.get("PRECIP"), Some(2.0));
        assert_eq!(row.get("TMAX"), Some(31.0));
    }

    #[test]
    fn test_day_of_year_ignores_policy_override() {
        let s = series(vec![day(2019, 7, 4, 1.0, 30.0), day(2020, 7, 4, 3.0, 32.0)]);
        let all_additive = AggregationPolicy::with_additive(["PRECIP", "TMAX"]);
        let doc = aggregate(&s, GroupKey::DayOfYear, Some(&all_additive));
        assert_eq!(doc.records[0].get("PRECIP"), Some(2.0));
    }

    #[test]
    fn test_policy_override_applies_to_calendar_modes() {
        let s = series(vec![day(2020, 5, 1, 1.0, 10.0), day(2020, 5, 2, 3.0, 20.0)]);
        let tmax_additive = AggregationPolicy::with_additive(["TMAX"]);

        let monthly = aggregate(&s, GroupKey::CalendarMonth, Some(&tmax_additive));
        assert_eq!(monthly.records[0].get("TMAX"), Some(30.0));
        assert_eq!(monthly.records[0].get("PRECIP"), Some(2.0));

        let seasonal = aggregate(&s, GroupKey::Season, Some(&tmax_additive));
        assert_eq!(seasonal.records[0].label, "Spring 2020");
        assert_eq!(seasonal.records[0].get("TMAX"), Some(30.0));
        assert_eq!(seasonal.records[0].get("PRECIP"), Some(2.0));
    }

    #[test]
    fn test_policy_override_drives_first_pass_of_across_years() {
        let s = series(vec![
            day(2001, 3, 1, 1.0, 10.0),
            day(2001, 3, 2, 1.0, 10.0),
            day(2002, 3, 1, 4.0, 20.0),
        ]);
        let tmax_additive = AggregationPolicy::with_additive(["TMAX"]);
        let doc = aggregate(&s, GroupKey::MonthAcrossYears, Some(&tmax_additive));
        // yearly TMAX totals 20.0 and 20.0, yearly PRECIP means 1.0 and 4.0
        assert_eq!(doc.records[0].get("TMAX"), Some(20.0));
        assert_eq!(doc.records[0].get("PRECIP"), Some(2.5));

        let by_season = aggregate(&s, GroupKey::SeasonAcrossYears, Some(&tmax_additive));
        assert_eq!(by_season.records[0].get("TMAX"), Some(20.0));
        assert_eq!(by_season.records[0].get("PRECIP"), Some(2.5));
    }

    #[test]
    fn test_calendar_year_labels() {
        let s = series(vec![day(1999, 12, 31, 1.0, 10.0), day(2000, 1, 1, 2.0, 20.0)]);
        let doc = aggregate(&s, GroupKey::CalendarYear, None);
        let labels: Vec<&str> = doc.records.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["1999", "2000"]);
        assert_eq!(doc.records[1].year, Some(2000));
    }

    #[test]
    fn test_month_across_years_matches_single_year_for_identical_years() {
        let mut records = Vec::new();
        for year in 2001..=2003 {
            records.push(day(year, 1, 10, 2.0, 11.0));
            records.push(day(year, 1, 20, 5.0, 14.0));
            records.push(day(year, 6, 15, 0.5, 30.0));
        }
        let all_years = series(records);
        let single_year = all_years.filter(&DateBounds::new(Some(date(2001, 1, 1)), Some(date(2001, 12, 31))));

        let across = aggregate(&all_years, GroupKey::MonthAcrossYears, None);
        let monthly = aggregate(&single_year, GroupKey::CalendarMonth, None);
        assert_eq!(across.records.len(), monthly.records.len());
        for (a, m) in across.records.iter().zip(monthly.records.iter()) {
            assert_eq!(a.month, m.month);
            assert_eq!(a.values, m.values);
        }
        assert_eq!(across.records[0].label, "01");
        assert_eq!(across.records[0].get("PRECIP"), Some(7.0));
        assert_eq!(across.records[0].get("TMAX"), Some(12.5));
    }

    #[test]
    fn test_month_across_years_averages_yearly_totals() {
        let s = series(vec![
            day(2001, 3, 1, 1.0, 10.0),
            day(2001, 3, 2, 1.0, 10.0),
            day(2002, 3, 1, 4.0, 20.0),
        ]);
        let doc = aggregate(&s, GroupKey::MonthAcrossYears, None);
        // 2001 total 2.0, 2002 total 4.0
        assert_eq!(doc.records[0].get("PRECIP"), Some(3.0));
        assert_eq!(doc.records[0].get("TMAX"), Some(15.0));
    }

    #[test]
    fn test_season_single_pass_sorting_and_labels() {
        let s = series(vec![
            day(2001, 1, 15, 1.0, 5.0),
            day(2001, 4, 15, 2.0, 15.0),
            day(2001, 12, 15, 3.0, 7.0),
            day(2001, 10, 1, 4.0, 18.0),
            day(2000, 7, 1, 5.0, 25.0),
        ]);
        let doc = aggregate(&s, GroupKey::Season, None);
        let labels: Vec<&str> = doc.records.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["Summer 2000", "Spring 2001", "Autumn 2001", "Winter 2001"]);
        let winter = &doc.records[3];
        assert_eq!(winter.season, Some(Season::Winter));
        assert_eq!(winter.get("PRECIP"), Some(4.0));
        assert_eq!(winter.get("TMAX"), Some(6.0));
    }

    #[test]
    fn test_season_across_years() {
        let s = series(vec![
            day(2001, 6, 1, 1.0, 20.0),
            day(2001, 7, 1, 1.0, 22.0),
            day(2002, 6, 1, 5.0, 30.0),
            day(2002, 3, 1, 0.0, 12.0),
        ]);
        let doc = aggregate(&s, GroupKey::SeasonAcrossYears, None);
        let labels: Vec<&str> = doc.records.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["Spring", "Summer"]);
        let summer = &doc.records[1];
        // per-year totals 2.0 and 5.0, per-year means 21.0 and 30.0
        assert_eq!(summer.get("PRECIP"), Some(3.5));
        assert_eq!(summer.get("TMAX"), Some(25.5));
    }

    #[test]
    fn test_rounding_to_two_decimals() {
        let s = series(vec![
            day(2020, 1, 1, 0.0, 3.0),
            day(2020, 1, 2, 0.0, 3.0),
            day(2020, 1, 3, 0.0, 4.0),
        ]);
        let doc = aggregate(&s, GroupKey::CalendarMonth, None);
        assert_eq!(doc.records[0].get("TMAX"), Some(3.33));
    }

    #[test]
    fn test_all_null_group_is_null() {
        let records = vec![DailyRecord::new(date(2020, 2, 1))
            .with("PRECIP", None)
            .with("TMAX", Some(1.0))];
        let doc = aggregate(&series(records), GroupKey::CalendarMonth, None);
        assert_eq!(doc.records[0].values["PRECIP"], None);
        let json = serde_json::to_value(&doc).unwrap();
        assert!(json["records"][0]["PRECIP"].is_null());
    }

    #[test]
    fn test_empty_series_yields_empty_records() {
        let s = series(vec![day(2020, 1, 1, 1.0, 2.0)]);
        let empty = s.filter(&DateBounds::new(Some(date(2021, 1, 1)), Some(date(2020, 1, 1))));
        for key in GroupKey::ALL {
            let doc = aggregate(&empty, key, None);
            assert!(doc.records.is_empty());
            assert_eq!(doc.variables, vec!["PRECIP", "TMAX"]);
        }
    }

    #[test]
    fn test_serialized_row_shape() {
        let s = series(vec![day(2020, 5, 1, 1.0, 10.0)]);
        let json = serde_json::to_value(aggregate(&s, GroupKey::CalendarMonth, None)).unwrap();
        let row = &json["records"][0];
        assert_eq!(row["label"], "2020-05");
        assert_eq!(row["year"], 2020);
        assert_eq!(row["month"], 5);
        assert!(row.get("day").is_none());
        assert_eq!(row["PRECIP"], 1.0);
    }
}
