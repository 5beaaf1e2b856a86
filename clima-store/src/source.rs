//! Where station series come from on a cache miss.

use clima_station::{load_station, SeriesError, StationSeries};
use std::path::{Path, PathBuf};

/// Loads the full series of a station.
///
/// Implementations run on the blocking thread pool, so they may do plain
/// file I/O.
pub trait SeriesSource: Send + Sync + 'static {
    fn load(&self, station_id: &str) -> Result<StationSeries, SeriesError>;
}

/// Station CSV files below a data directory.
#[derive(Debug, Clone)]
pub struct CsvDirectory {
    root: PathBuf,
}

impl CsvDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        CsvDirectory { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl SeriesSource for CsvDirectory {
    fn load(&self, station_id: &str) -> Result<StationSeries, SeriesError> {
        load_station(&self.root, station_id)
    }
}
