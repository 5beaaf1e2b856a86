//! Resolve a station id to its daily CSV file and load it.
//!
//! Station files are named `dia0{id}.csv` for numeric ids (the id is
//! zero-padded on disk) and `dia{id}.csv` for alphanumeric ones. They may sit
//! anywhere below the data directory, usually grouped by state.

use crate::error::{Result, SeriesError};
use crate::series::StationSeries;
use std::{
    fs::{self, File},
    io::BufReader,
    path::{Path, PathBuf},
};

/// File name that holds the daily series of `station_id`.
pub fn file_pattern(station_id: &str) -> String {
    let is_numeric = !station_id.is_empty() && station_id.chars().all(|c| c.is_ascii_digit());
    if is_numeric {
        format!("dia0{station_id}.csv")
    } else {
        format!("dia{station_id}.csv")
    }
}

/// Find the backing file of `station_id` below `root`.
///
/// Directories are walked in sorted order so the choice is stable when a
/// name appears more than once; extra matches are logged and ignored.
pub fn locate_station_file(root: &Path, station_id: &str) -> Result<PathBuf> {
    let pattern = file_pattern(station_id);
    let mut matches = Vec::new();
    collect_matches(root, &pattern, &mut matches);
    match matches.len() {
        0 => {
            log::error!(
                "[Clima] loader: no file for station {} with pattern {} under {}",
                station_id,
                pattern,
                root.display()
            );
            Err(SeriesError::NotFound {
                station_id: station_id.to_string(),
                pattern,
            })
        }
        1 => Ok(matches.remove(0)),
        n => {
            log::warn!(
                "[Clima] loader: {} files match {}, using {}",
                n,
                pattern,
                matches[0].display()
            );
            Ok(matches.remove(0))
        }
    }
}

fn collect_matches(dir: &Path, file_name: &str, matches: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("[Clima] loader: cannot read {}: {}", dir.display(), e);
            return;
        }
    };
    let mut paths: Vec<PathBuf> = entries.filter_map(|e| e.ok().map(|e| e.path())).collect();
    paths.sort();
    for path in paths {
        if path.is_dir() {
            collect_matches(&path, file_name, matches);
        } else if path.file_name().is_some_and(|name| name == file_name) {
            matches.push(path);
        }
    }
}

/// Parse one station file.
pub fn load_station_file(station_id: &str, path: &Path) -> Result<StationSeries> {
    let file = File::open(path).map_err(|e| SeriesError::Unreadable {
        path: path.to_path_buf(),
        source: csv::Error::from(e),
    })?;
    StationSeries::from_reader(station_id, BufReader::new(file), path)
}

/// Locate and parse the series of `station_id` under `root`.
pub fn load_station(root: &Path, station_id: &str) -> Result<StationSeries> {
    log::info!("[Clima] loader: loading station {}", station_id);
    let path = locate_station_file(root, station_id)?;
    let series = load_station_file(station_id, &path).inspect_err(|e| {
        log::error!("[Clima] loader: {}", e);
    })?;
    log::info!(
        "[Clima] loader: station {} variables {:?}, period {:?} to {:?}",
        station_id,
        series.variables,
        series.period().start,
        series.period().end
    );
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const STATION_CSV: &str = "Fecha,TMAX,TMIN,PRECIP\n01/01/2000,30.0,10.0,0.5\n";

    #[test]
    fn test_file_pattern() {
        assert_eq!(file_pattern("15001"), "dia015001.csv");
        assert_eq!(file_pattern("AGS01"), "diaAGS01.csv");
        assert_eq!(file_pattern(""), "dia.csv");
    }

    #[test]
    fn test_locate_in_nested_directory() {
        let dir = tempfile::tempdir().unwrap();
        let state_dir = dir.path().join("mex");
        fs::create_dir_all(&state_dir).unwrap();
        fs::write(state_dir.join("dia015001.csv"), STATION_CSV).unwrap();
        fs::write(state_dir.join("dia015002.csv"), STATION_CSV).unwrap();

        let path = locate_station_file(dir.path(), "15001").unwrap();
        assert_eq!(path, state_dir.join("dia015001.csv"));
    }

    #[test]
    fn test_first_sorted_match_wins() {
        let dir = tempfile::tempdir().unwrap();
        for state in ["b", "a"] {
            let state_dir = dir.path().join(state);
            fs::create_dir_all(&state_dir).unwrap();
            fs::write(state_dir.join("dia015001.csv"), STATION_CSV).unwrap();
        }
        let path = locate_station_file(dir.path(), "15001").unwrap();
        assert_eq!(path, dir.path().join("a").join("dia015001.csv"));
    }

    #[test]
    fn test_missing_station_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_station(dir.path(), "99999").unwrap_err();
        assert!(err.is_not_found());
        assert!(err.is_no_data());
    }

    #[test]
    fn test_missing_root_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_station(&dir.path().join("absent"), "1").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_load_station_parses_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("diaAGS01.csv"), STATION_CSV).unwrap();
        let series = load_station(dir.path(), "AGS01").unwrap();
        assert_eq!(series.station_id, "AGS01");
        assert_eq!(series.len(), 1);
        assert_eq!(series.records[0].get("TProm"), Some(20.0));
        assert_eq!(series.records[0].get("TRango"), Some(20.0));
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("dia01.csv"), "Date,TMAX\n01/01/2000,1\n").unwrap();
        let err = load_station(dir.path(), "1").unwrap_err();
        assert!(matches!(err, SeriesError::Malformed { .. }));
    }
}
