//! Temporal aggregation and extreme-event analytics for station series.
//!
//! This crate turns a [`clima_station::StationSeries`] into the result
//! documents served to clients: calendar aggregations under an
//! additive/intensive policy, day-of-year percentile thresholds, and yearly
//! exceedance counts with a least squares trend.
//!
//! Every function here works on an already narrowed series; apply
//! [`clima_station::StationSeries::filter`] first to honour date bounds.

pub mod aggregate;
pub mod error;
pub mod extremes;
pub mod percentile;
pub mod policy;
pub mod season;
pub mod trend;

pub use aggregate::{aggregate, AggregateDocument, AggregateRow, GroupKey};
pub use error::AnalysisError;
pub use extremes::{extreme_frequency, ExtremeDocument, Operator, YearFrequency};
pub use percentile::{percentile, PercentileDocument, ThresholdRow, Thresholds};
pub use policy::{AggregationPolicy, Reducer};
pub use season::Season;
pub use trend::{Trend, TrendResult};
