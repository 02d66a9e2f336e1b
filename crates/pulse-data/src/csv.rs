//! CSV seed loading implementation.

use std::path::{Path, PathBuf};

use crate::seed::{SeedCandle, SeedError};
use crate::DataSource;

/// Loads a historical seed from a CSV file.
pub struct CsvLoader {
    path: PathBuf,
}

impl CsvLoader {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl DataSource for CsvLoader {
    fn load(&self) -> anyhow::Result<Vec<SeedCandle>> {
        load_seed_from_csv(&self.path)
    }
}

/// Parse datetime string "YYYY-MM-DD HH:MM:SS" or a Unix timestamp into
/// Unix seconds. Millisecond timestamps (13+ digits) are scaled down.
pub fn parse_datetime(s: &str) -> Option<i64> {
    if let Ok(ts) = s.trim().parse::<f64>() {
        if !ts.is_finite() {
            return None;
        }
        let secs = if ts.abs() > 1e12 { ts / 1000.0 } else { ts };
        return Some(secs.floor() as i64);
    }

    let parts: Vec<&str> = s.trim().split(&['-', ' ', ':', 'T']).collect();
    if parts.len() < 6 {
        return None;
    }
    let year: i32 = parts[0].parse().ok()?;
    let month: usize = parts[1].parse().ok()?;
    let day: i64 = parts[2].parse().ok()?;
    let hour: i64 = parts[3].parse().ok()?;
    let min: i64 = parts[4].parse().ok()?;
    let sec: i64 = parts[5].parse().ok()?;
    if !(1..=12).contains(&month) || day < 1 {
        return None;
    }

    let is_leap = |y: i32| y % 4 == 0 && (y % 100 != 0 || y % 400 == 0);
    let mut days: i64 = (1970..year).map(|y| if is_leap(y) { 366 } else { 365 }).sum();
    let month_days = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];
    days += month_days[month - 1];
    if month > 2 && is_leap(year) {
        days += 1;
    }
    days += day - 1;

    Some(days * 86_400 + hour * 3_600 + min * 60 + sec)
}

fn parse_price(
    record: &::csv::StringRecord,
    row: usize,
    col: usize,
    column: &'static str,
) -> Result<f64, SeedError> {
    let raw = record
        .get(col)
        .ok_or(SeedError::MissingField { row, column })?;
    raw.trim().parse().map_err(|_| SeedError::InvalidField {
        row,
        column,
        value: raw.to_string(),
    })
}

/// Load seed candles from a CSV file.
///
/// Columns are located by header name (`timestamp`/`time`/`bucketstart`,
/// `open`, `high`, `low`, `close`, optional `volume`), falling back to
/// positional order.
pub fn load_seed_from_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<SeedCandle>> {
    let mut reader = ::csv::ReaderBuilder::new().delimiter(b',').from_path(path)?;

    let headers = reader.headers()?.clone();
    let headers_lower: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
    let find = |name: &str| headers_lower.iter().position(|h| h == name);

    let ts_col = headers_lower
        .iter()
        .position(|h| h.contains("timestamp") || h == "time" || h == "bucketstart")
        .unwrap_or(0);
    let open_col = find("open").unwrap_or(1);
    let high_col = find("high").unwrap_or(2);
    let low_col = find("low").unwrap_or(3);
    let close_col = find("close").unwrap_or(4);
    let volume_col = find("volume");

    let mut seed = Vec::new();

    for (row, result) in reader.records().enumerate() {
        let record = result?;

        let raw_ts = record.get(ts_col).ok_or(SeedError::MissingField {
            row,
            column: "timestamp",
        })?;
        let bucket_start = parse_datetime(raw_ts).ok_or_else(|| SeedError::InvalidField {
            row,
            column: "timestamp",
            value: raw_ts.to_string(),
        })?;

        let volume = match volume_col {
            Some(col) => Some(parse_price(&record, row, col, "volume")?),
            None => None,
        };

        seed.push(SeedCandle {
            bucket_start,
            open: parse_price(&record, row, open_col, "open")?,
            high: parse_price(&record, row, high_col, "high")?,
            low: parse_price(&record, row, low_col, "low")?,
            close: parse_price(&record, row, close_col, "close")?,
            volume,
        });
    }

    log::info!("Loaded {} seed candles from CSV", seed.len());
    Ok(seed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(name: &str, body: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("pulse-{}-{name}.csv", std::process::id()));
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_parse_datetime_formats() {
        assert_eq!(parse_datetime("1700000000"), Some(1_700_000_000));
        assert_eq!(parse_datetime("1700000000000"), Some(1_700_000_000));
        assert_eq!(parse_datetime("1970-01-02 00:00:10"), Some(86_410));
        assert_eq!(parse_datetime("2024-03-01 00:00:00"), Some(1_709_251_200));
        assert_eq!(parse_datetime("garbage"), None);
    }

    #[test]
    fn test_load_with_headers() {
        let path = write_temp(
            "headers",
            "time,open,high,low,close,volume\n60,1.0,1.2,0.9,1.1,5\n120,1.1,1.3,1.0,1.2,7\n",
        );
        let seed = CsvLoader::new(&path).load().unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(seed.len(), 2);
        assert_eq!(seed[0].bucket_start, 60);
        assert_eq!(seed[1].close, 1.2);
        assert_eq!(seed[1].volume, Some(7.0));
    }

    #[test]
    fn test_load_without_volume() {
        let path = write_temp("novol", "timestamp,open,high,low,close\n0,1,1,1,1\n");
        let seed = load_seed_from_csv(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(seed[0].volume, None);
    }

    #[test]
    fn test_bad_number_is_an_error() {
        let path = write_temp("bad", "time,open,high,low,close\n0,1,x,1,1\n");
        let err = load_seed_from_csv(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(err.to_string().contains("high"));
    }
}
