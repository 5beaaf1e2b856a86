/// Error types for loading station series
use std::path::PathBuf;
use thiserror::Error;

/// Why a station series could not be produced.
///
/// Every variant means "no data" to a caller that only cares about the
/// response; the variants stay distinct so logs and tests can tell an absent
/// station from a broken file.
#[derive(Error, Debug)]
pub enum SeriesError {
    /// No backing file resolves for the station id
    #[error("No data file found for station {station_id} (pattern {pattern})")]
    NotFound { station_id: String, pattern: String },

    /// The backing file has no date column
    #[error("File {} has no '{column}' column", path.display())]
    Malformed { path: PathBuf, column: &'static str },

    /// Any other failure while reading or framing the file
    #[error("Failed to process {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// The load task stopped before producing a series
    #[error("Loading station {station_id} was interrupted: {reason}")]
    Interrupted { station_id: String, reason: String },
}

impl SeriesError {
    /// True for every failure that surfaces to callers as "no data".
    pub fn is_no_data(&self) -> bool {
        matches!(
            self,
            SeriesError::NotFound { .. }
                | SeriesError::Malformed { .. }
                | SeriesError::Unreadable { .. }
        )
    }

    /// True only when no backing file exists for the station id.
    pub fn is_not_found(&self) -> bool {
        matches!(self, SeriesError::NotFound { .. })
    }
}

/// Type alias for Results using SeriesError
pub type Result<T> = std::result::Result<T, SeriesError>;
