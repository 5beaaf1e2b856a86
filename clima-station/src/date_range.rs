use crate::series::StationSeries;
use chrono::NaiveDate;

/// Optional inclusive date bounds for narrowing a series.
///
/// A missing bound leaves that side open. A start after the end matches
/// nothing.
#[derive(Clone, Eq, PartialEq, Copy, Debug, Default)]
pub struct DateBounds {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateBounds {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        DateBounds { start, end }
    }

    /// Bounds that keep every record.
    pub fn unbounded() -> Self {
        DateBounds::default()
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |start| date >= start) && self.end.map_or(true, |end| date <= end)
    }
}

impl StationSeries {
    /// Keep only the records whose date falls inside `bounds`.
    ///
    /// The variable lists are carried over unchanged so an empty result
    /// still reports what the station measures.
    pub fn filter(&self, bounds: &DateBounds) -> StationSeries {
        if bounds.is_unbounded() {
            return self.clone();
        }
        let mut filtered = self.empty_like();
        filtered.records = self
            .records
            .iter()
            .filter(|record| bounds.contains(record.date))
            .cloned()
            .collect();
        filtered
    }
}
