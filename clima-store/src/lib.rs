//! In-memory read-through cache of station series.
//!
//! A [`StationCache`] is owned by whatever serves requests and handed to the
//! analytics as a `get_or_load` capability. Series are loaded once per
//! station and kept for the life of the process:
//!
//! - no eviction and no expiry
//! - at most one load in flight per station id; concurrent callers wait for
//!   it and receive the same `Arc`
//! - failed loads are not remembered, the next request tries again
//!
//! # Usage
//!
//! ```no_run
//! use clima_store::{CsvDirectory, StationCache};
//!
//! # async fn example() -> Result<(), clima_station::SeriesError> {
//! let cache = StationCache::new(CsvDirectory::new("data/csv"));
//! let series = cache.get_or_load("15001").await?;
//! println!("{} records", series.len());
//! # Ok(())
//! # }
//! ```

pub mod source;

pub use source::{CsvDirectory, SeriesSource};

use clima_station::{SeriesError, StationSeries};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OnceCell;

type Slot = Arc<OnceCell<Arc<StationSeries>>>;

pub struct StationCache<S> {
    source: Arc<S>,
    slots: Mutex<HashMap<String, Slot>>,
}

impl<S: SeriesSource> StationCache<S> {
    pub fn new(source: S) -> Self {
        StationCache {
            source: Arc::new(source),
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    fn slot(&self, station_id: &str) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(station_id.to_string()).or_default())
    }

    /// The cached series of `station_id`, loading it on first use.
    pub async fn get_or_load(&self, station_id: &str) -> Result<Arc<StationSeries>, SeriesError> {
        let slot = self.slot(station_id);
        let series = slot
            .get_or_try_init(|| async {
                log::info!("[Clima] cache: miss for station {}", station_id);
                let source = Arc::clone(&self.source);
                let id = station_id.to_string();
                let loaded = match tokio::task::spawn_blocking(move || source.load(&id)).await {
                    Ok(result) => result,
                    Err(e) => Err(SeriesError::Interrupted {
                        station_id: station_id.to_string(),
                        reason: e.to_string(),
                    }),
                };
                loaded.map(Arc::new).inspect_err(|e| {
                    log::warn!("[Clima] cache: station {} not cached: {}", station_id, e);
                })
            })
            .await
            .map(Arc::clone);
        if series.is_err() {
            self.release(station_id, &slot);
        }
        series
    }

    /// Drop the slot of a failed load so unknown ids do not accumulate.
    fn release(&self, station_id: &str, slot: &Slot) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let stale = slots
            .get(station_id)
            .is_some_and(|current| Arc::ptr_eq(current, slot) && !current.initialized());
        if stale {
            slots.remove(station_id);
        }
    }

    /// The series of `station_id` if it is already cached.
    pub fn get(&self, station_id: &str) -> Option<Arc<StationSeries>> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.get(station_id).and_then(|slot| slot.get().cloned())
    }

    /// Number of stations currently cached.
    pub fn len(&self) -> usize {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.values().filter(|slot| slot.initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Load `station_ids` up front. Returns the failures; successful loads
    /// stay cached.
    pub async fn preload<I, T>(&self, station_ids: I) -> Vec<SeriesError>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut failures = Vec::new();
        let mut loaded = 0usize;
        for station_id in station_ids {
            match self.get_or_load(station_id.as_ref()).await {
                Ok(_) => loaded += 1,
                Err(e) => failures.push(e),
            }
        }
        log::info!(
            "[Clima] cache: preloaded {} stations, {} failed",
            loaded,
            failures.len()
        );
        failures
    }
}
