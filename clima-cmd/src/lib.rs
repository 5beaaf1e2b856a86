//! Command implementations for the Clima CLI.
//!
//! Every command resolves its station through a [`StationCache`], narrows
//! the series to the requested dates and renders the result document as
//! pretty JSON.

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Subcommand};
use clima_data::{GroupKey, Operator};
use clima_station::DateBounds;
use clima_store::{SeriesSource, StationCache};
use clima_utils::dates::parse_date;

pub mod analysis;

/// Optional inclusive date bounds shared by the analytics commands.
#[derive(Args, Debug, Clone, Default)]
pub struct RangeArgs {
    /// First day to include (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub start: Option<NaiveDate>,

    /// Last day to include (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub end: Option<NaiveDate>,
}

impl RangeArgs {
    pub fn bounds(&self) -> DateBounds {
        DateBounds::new(self.start, self.end)
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the full daily series of a station
    Data {
        /// Station identifier
        station: String,
    },

    /// Aggregate a station's series by a calendar key
    Aggregate {
        /// Station identifier
        station: String,

        /// Grouping mode: day-of-year, calendar-month, calendar-year,
        /// month-across-years, season or season-across-years
        #[arg(long)]
        mode: GroupKey,

        #[command(flatten)]
        range: RangeArgs,
    },

    /// Day-of-year percentile thresholds of one variable
    Percentile {
        /// Station identifier
        station: String,

        /// Variable column, e.g. TMAX
        #[arg(long)]
        variable: String,

        /// Percentile between 0 and 100
        #[arg(long, allow_negative_numbers = true)]
        percentile: i32,

        #[command(flatten)]
        range: RangeArgs,
    },

    /// Yearly count of days beyond a percentile threshold, with its trend
    Extremes {
        /// Station identifier
        station: String,

        /// Variable column, e.g. TMAX
        #[arg(long)]
        variable: String,

        /// Percentile between 0 and 100
        #[arg(long, allow_negative_numbers = true)]
        percentile: i32,

        /// Event direction: greater or less
        #[arg(long)]
        operator: Operator,

        #[command(flatten)]
        range: RangeArgs,
    },
}

impl Command {
    pub fn station(&self) -> &str {
        match self {
            Command::Data { station }
            | Command::Aggregate { station, .. }
            | Command::Percentile { station, .. }
            | Command::Extremes { station, .. } => station,
        }
    }
}

/// Run `command` against `cache` and return the rendered JSON document.
pub async fn run<S: SeriesSource>(cache: &StationCache<S>, command: Command) -> anyhow::Result<String> {
    match &command {
        Command::Percentile { percentile, .. } | Command::Extremes { percentile, .. } => {
            clima_data::percentile::validate_percentile(*percentile)
                .with_context(|| format!("invalid parameters for station {}", command.station()))?;
        }
        Command::Data { .. } | Command::Aggregate { .. } => {}
    }

    let station = command.station().to_string();
    let series = cache
        .get_or_load(&station)
        .await
        .with_context(|| format!("no data for station {station}"))?;
    log::info!("[Clima] command: {:?}", command);

    match command {
        Command::Data { .. } => analysis::station_data(&series),
        Command::Aggregate { mode, range, .. } => analysis::aggregate_station(&series, mode, &range.bounds()),
        Command::Percentile {
            variable,
            percentile,
            range,
            ..
        } => analysis::percentile_station(&series, &variable, percentile, &range.bounds()),
        Command::Extremes {
            variable,
            percentile,
            operator,
            range,
            ..
        } => analysis::extremes_station(&series, &variable, percentile, operator, &range.bounds()),
    }
}
