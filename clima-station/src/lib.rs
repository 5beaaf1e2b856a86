//! Core types and file loader for daily climate-station series.
//!
//! A station file is a CSV with a `Fecha` column ("DD/MM/YYYY") and an open
//! set of variable columns (TMAX, TMIN, PRECIP, EVAP, ...). Loading it yields
//! a [`StationSeries`]: records sorted by date, missing cells as `None`, and
//! the derived TProm/TRango temperatures.

pub mod date_range;
pub mod error;
pub mod locate;
pub mod series;

pub use date_range::DateBounds;
pub use error::SeriesError;
pub use locate::{file_pattern, load_station, locate_station_file};
pub use series::{DailyRecord, Period, StationDocument, StationSeries};
