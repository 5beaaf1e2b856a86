//! Shared utility functions for Clima crates.

/// Date utility functions
pub mod dates {
    use chrono::NaiveDate;

    /// Date format of the `Fecha` column in station files: "DD/MM/YYYY"
    pub const STATION_DATE_FORMAT: &str = "%d/%m/%Y";

    /// Date format accepted for request bounds: "YYYY-MM-DD"
    pub const REQUEST_DATE_FORMAT: &str = "%Y-%m-%d";

    /// Format a NaiveDate as "YYYY-MM-DD"
    pub fn format_date(date: &NaiveDate) -> String {
        date.format(REQUEST_DATE_FORMAT).to_string()
    }

    /// Parse a date string in "YYYY-MM-DD" format
    pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
        Ok(NaiveDate::parse_from_str(s.trim(), REQUEST_DATE_FORMAT)?)
    }

    /// Format a NaiveDate the way station files write it: "DD/MM/YYYY"
    pub fn format_station_date(date: &NaiveDate) -> String {
        date.format(STATION_DATE_FORMAT).to_string()
    }

    /// Parse a `Fecha` cell. Returns `None` for anything that is not a
    /// valid "DD/MM/YYYY" calendar day.
    pub fn parse_station_date(s: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(s.trim(), STATION_DATE_FORMAT).ok()
    }

    /// Label for a (month, day) pair: "DD-MM"
    pub fn day_month_label(month: u32, day: u32) -> String {
        format!("{day:02}-{month:02}")
    }

    /// Label for a calendar month of a given year: "YYYY-MM"
    pub fn year_month_label(year: i32, month: u32) -> String {
        format!("{year:04}-{month:02}")
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use chrono::NaiveDate;

        #[test]
        fn test_format_and_parse() {
            let date = NaiveDate::from_ymd_opt(2023, 6, 15).unwrap();
            let formatted = format_date(&date);
            assert_eq!(formatted, "2023-06-15");
            let parsed = parse_date(&formatted).unwrap();
            assert_eq!(parsed, date);
        }

        #[test]
        fn test_parse_date_rejects_station_format() {
            assert!(parse_date("15/06/2023").is_err());
        }

        #[test]
        fn test_station_date_round_trip() {
            let date = NaiveDate::from_ymd_opt(1961, 2, 3).unwrap();
            assert_eq!(format_station_date(&date), "03/02/1961");
            assert_eq!(parse_station_date(" 03/02/1961 "), Some(date));
        }

        #[test]
        fn test_parse_station_date_invalid() {
            assert_eq!(parse_station_date("31/02/2001"), None);
            assert_eq!(parse_station_date("2001-02-01"), None);
            assert_eq!(parse_station_date(""), None);
        }

        #[test]
        fn test_labels() {
            assert_eq!(day_month_label(3, 7), "07-03");
            assert_eq!(year_month_label(1985, 11), "1985-11");
        }
    }
}

/// Numeric helpers shared by loaders and aggregations
pub mod numbers {
    /// Round to two decimal places, halves to even.
    pub fn round2(value: f64) -> f64 {
        (value * 100.0).round_ties_even() / 100.0
    }

    /// Round to two decimal places, mapping NaN and infinities to `None`.
    pub fn finite_round2(value: f64) -> Option<f64> {
        if value.is_finite() {
            Some(round2(value))
        } else {
            None
        }
    }

    /// Parse a numeric cell. Empty or non-numeric text yields `None`.
    pub fn parse_cell(s: &str) -> Option<f64> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return None;
        }
        trimmed.parse::<f64>().ok().filter(|v| !v.is_nan())
    }

}
