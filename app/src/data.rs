// In app/src/data.rs

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use core_types::MarketBar;
use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Deserialize, Debug)]
struct BarRecord {
    timestamp: i64,
    price: Decimal,
}

/// Loads historical bars from a `timestamp,price` CSV file.
///
/// Timestamps are unix milliseconds. Ordering is not enforced here; the
/// engine rejects out-of-order input before a run starts.
pub fn load_bars(path: &Path) -> Result<Vec<MarketBar>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open data file {}", path.display()))?;

    let mut bars = Vec::new();
    for (index, record) in reader.deserialize().enumerate() {
        let record: BarRecord = record.with_context(|| {
            format!("Failed to parse row {} of {}", index + 1, path.display())
        })?;
        bars.push(MarketBar {
            timestamp: record.timestamp,
            price: record.price,
        });
    }

    Ok(bars)
}

/// Parses a date as either `YYYY-MM-DDTHH:MM:SS` or bare `YYYY-MM-DD`.
///
/// Bare dates expand to the start or the end of that day, so a
/// `--start-date`/`--end-date` pair covers both days fully.
pub fn parse_date(value: &str, is_start: bool) -> Result<DateTime<Utc>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        let time = if is_start {
            NaiveTime::from_hms_opt(0, 0, 0).unwrap()
        } else {
            NaiveTime::from_hms_opt(23, 59, 59).unwrap()
        };
        return Ok(Utc.from_utc_datetime(&date.and_time(time)));
    }
    anyhow::bail!("Invalid date format: {}", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_dates_expand_to_day_boundaries() {
        let start = parse_date("2024-03-01", true).unwrap();
        let end = parse_date("2024-03-01", false).unwrap();
        assert_eq!(start.to_rfc3339(), "2024-03-01T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2024-03-01T23:59:59+00:00");
    }

    #[test]
    fn explicit_timestamps_are_taken_as_is() {
        let parsed = parse_date("2024-03-01T12:30:00", true).unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-03-01T12:30:00+00:00");
    }

    #[test]
    fn garbage_dates_are_rejected() {
        assert!(parse_date("not-a-date", true).is_err());
        assert!(parse_date("2024/03/01", false).is_err());
    }
}
