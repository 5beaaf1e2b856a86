use crate::error::{Result, SeriesError};
use chrono::NaiveDate;
use clima_utils::{
    dates::{format_station_date, parse_station_date},
    numbers::{parse_cell, round2},
};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::{Serialize, Serializer};
use std::{
    collections::BTreeMap,
    io::Read,
    path::{Path, PathBuf},
};

/// Name of the date column in station files.
pub const DATE_COLUMN: &str = "Fecha";

/// Daily maximum temperature.
pub const TMAX: &str = "TMAX";

/// Daily minimum temperature.
pub const TMIN: &str = "TMIN";

/// Derived daily mean temperature, (TMAX + TMIN) / 2.
pub const TPROM: &str = "TProm";

/// Derived daily temperature range, TMAX - TMIN.
pub const TRANGO: &str = "TRango";

/// One day of observations for a station.
///
/// `values` holds one entry per variable of the series; a `None` entry is a
/// missing or unparsable cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyRecord {
    #[serde(rename = "Fecha", serialize_with = "serialize_station_date")]
    pub date: NaiveDate,
    #[serde(flatten)]
    pub values: BTreeMap<String, Option<f64>>,
}

fn serialize_station_date<S: Serializer>(date: &NaiveDate, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_station_date(date))
}

impl DailyRecord {
    pub fn new(date: NaiveDate) -> Self {
        DailyRecord {
            date,
            values: BTreeMap::new(),
        }
    }

    /// Builder-style setter, mostly for fixtures.
    pub fn with(mut self, variable: &str, value: Option<f64>) -> Self {
        self.values.insert(variable.to_string(), value);
        self
    }

    /// The numeric value of `variable`, if present and not null.
    pub fn get(&self, variable: &str) -> Option<f64> {
        self.values.get(variable).copied().flatten()
    }

    fn derive_temperatures(&mut self) {
        let (tprom, trango) = match (self.get(TMAX), self.get(TMIN)) {
            (Some(tmax), Some(tmin)) => (Some(round2((tmax + tmin) / 2.0)), Some(round2(tmax - tmin))),
            _ => (None, None),
        };
        self.values.insert(TPROM.to_string(), tprom);
        self.values.insert(TRANGO.to_string(), trango);
    }
}

/// First and last observed dates, formatted as in the station file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Period {
    pub start: Option<String>,
    pub end: Option<String>,
}

/// The full daily series of one station, ascending by date.
#[derive(Debug, Clone, PartialEq)]
pub struct StationSeries {
    pub station_id: String,
    /// Every variable column in file order (date excluded), derived ones last.
    pub variables: Vec<String>,
    /// The subset of `variables` whose non-empty cells are all numbers.
    pub numeric_variables: Vec<String>,
    pub records: Vec<DailyRecord>,
}

/// Raw-data view of a series: variables, period and every record.
#[derive(Debug, Serialize)]
pub struct StationDocument<'a> {
    pub station_id: &'a str,
    pub variables: &'a [String],
    pub period: Period,
    pub records: &'a [DailyRecord],
}

/// Per-column bookkeeping while reading a file.
#[derive(Debug, Default, Clone, Copy)]
struct ColumnKind {
    seen_number: bool,
    seen_text: bool,
}

impl ColumnKind {
    fn is_numeric(&self) -> bool {
        self.seen_number && !self.seen_text
    }
}

impl StationSeries {
    /// Build a series from records that may be out of order.
    ///
    /// Records are sorted by date (stable, so duplicate dates keep their
    /// relative order). Every variable is treated as numeric.
    pub fn from_records(station_id: &str, variables: Vec<String>, mut records: Vec<DailyRecord>) -> Self {
        records.sort_by_key(|r| r.date);
        StationSeries {
            station_id: station_id.to_string(),
            numeric_variables: variables.clone(),
            variables,
            records,
        }
    }

    /// An empty series that keeps the variable lists of `self`.
    pub fn empty_like(&self) -> Self {
        StationSeries {
            station_id: self.station_id.clone(),
            variables: self.variables.clone(),
            numeric_variables: self.numeric_variables.clone(),
            records: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn has_variable(&self, variable: &str) -> bool {
        self.variables.iter().any(|v| v == variable)
    }

    /// First and last dates of the series.
    pub fn period(&self) -> Period {
        Period {
            start: self.records.first().map(|r| format_station_date(&r.date)),
            end: self.records.last().map(|r| format_station_date(&r.date)),
        }
    }

    /// Raw-data view of the whole series.
    pub fn document(&self) -> StationDocument<'_> {
        StationDocument {
            station_id: &self.station_id,
            variables: &self.variables,
            period: self.period(),
            records: &self.records,
        }
    }

    /// Parse a station CSV held in memory.
    pub fn from_csv_str(station_id: &str, csv_data: &str) -> Result<Self> {
        Self::from_reader(station_id, csv_data.as_bytes(), Path::new("<memory>"))
    }

    /// Parse a station CSV from any reader.
    ///
    /// `origin` is only used to label errors and log lines.
    ///
    /// Rows that are entirely empty are skipped, then rows whose `Fecha` is
    /// not a valid "DD/MM/YYYY" date. Cells that are not numbers become
    /// `None`. When both TMAX and TMIN columns exist, TProm and TRango are
    /// appended as derived variables.
    pub fn from_reader<R: Read>(station_id: &str, reader: R, origin: &Path) -> Result<Self> {
        let unreadable = |source: csv::Error| SeriesError::Unreadable {
            path: PathBuf::from(origin),
            source,
        };
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = rdr
            .headers()
            .map_err(unreadable)?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();
        let date_index = headers
            .iter()
            .position(|h| h == DATE_COLUMN)
            .ok_or_else(|| SeriesError::Malformed {
                path: PathBuf::from(origin),
                column: DATE_COLUMN,
            })?;
        let columns: Vec<(usize, String)> = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != date_index)
            .map(|(i, h)| (i, h.clone()))
            .collect();

        let mut kinds = vec![ColumnKind::default(); columns.len()];
        let mut records = Vec::new();
        let mut blank_rows = 0u32;
        let mut bad_dates = 0u32;
        let mut row = StringRecord::new();
        while rdr.read_record(&mut row).map_err(unreadable)? {
            if row.iter().all(|cell| cell.is_empty()) {
                blank_rows += 1;
                continue;
            }
            let date = match row.get(date_index).and_then(parse_station_date) {
                Some(d) => d,
                None => {
                    bad_dates += 1;
                    continue;
                }
            };
            let mut record = DailyRecord::new(date);
            for ((index, name), kind) in columns.iter().zip(kinds.iter_mut()) {
                let cell = row.get(*index).unwrap_or("");
                let value = parse_cell(cell);
                match value {
                    Some(_) => kind.seen_number = true,
                    None if !cell.is_empty() => kind.seen_text = true,
                    None => {}
                }
                record.values.insert(name.clone(), value);
            }
            records.push(record);
        }

        records.sort_by_key(|r| r.date);

        let mut variables: Vec<String> = columns.iter().map(|(_, name)| name.clone()).collect();
        let mut numeric_variables: Vec<String> = columns
            .iter()
            .zip(kinds.iter())
            .filter(|(_, kind)| kind.is_numeric())
            .map(|((_, name), _)| name.clone())
            .collect();

        let has_temperatures = variables.iter().any(|v| v == TMAX) && variables.iter().any(|v| v == TMIN);
        if has_temperatures {
            for record in records.iter_mut() {
                record.derive_temperatures();
            }
            for forced in [TMAX, TMIN, TPROM, TRANGO] {
                if !variables.iter().any(|v| v == forced) {
                    variables.push(forced.to_string());
                }
            }
            // TMAX and TMIN are coerced; keep the numeric list in column order.
            numeric_variables = variables
                .iter()
                .filter(|v| {
                    numeric_variables.contains(v) || [TMAX, TMIN, TPROM, TRANGO].contains(&v.as_str())
                })
                .cloned()
                .collect();
        }

        log::info!(
            "[Clima] loader: {} -> {} records, skipped {} blank rows and {} undated rows",
            origin.display(),
            records.len(),
            blank_rows,
            bad_dates
        );

        Ok(StationSeries {
            station_id: station_id.to_string(),
            variables,
            numeric_variables,
            records,
        })
    }
}
