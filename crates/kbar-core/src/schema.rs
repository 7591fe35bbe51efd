use std::io::{Read, Write};
use std::path::Path;

use chrono::{DateTime, Timelike, Utc};
use rust_decimal::Decimal;

use crate::candle::{Candle, PRICE_DP, VOLUME_DP};
use crate::error::KbarError;

/// Column order of a candle table.
pub const CANDLE_COLUMNS: [&str; 6] = ["timestamp", "open", "high", "low", "close", "volume"];

/// ISO-8601 UTC timestamp with a literal `Z` suffix.
///
/// Fractional seconds are written with microsecond precision, and omitted
/// entirely when the instant falls on a whole second.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    if ts.nanosecond() == 0 {
        ts.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    } else {
        ts.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
    }
}

pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, KbarError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| KbarError::InvalidData(format!("invalid timestamp {value}: {e}")))
}

fn candle_record(candle: &Candle) -> [String; 6] {
    let p = PRICE_DP as usize;
    let v = VOLUME_DP as usize;
    [
        format_timestamp(&candle.timestamp),
        format!("{:.p$}", candle.open),
        format!("{:.p$}", candle.high),
        format!("{:.p$}", candle.low),
        format!("{:.p$}", candle.close),
        format!("{:.v$}", candle.volume),
    ]
}

/// Serialize candles as CSV (header included) into any writer.
pub fn write_candles_to<W: Write>(writer: W, candles: &[Candle]) -> Result<(), KbarError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(CANDLE_COLUMNS)?;
    for candle in candles {
        wtr.write_record(candle_record(candle))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Parse a candle table. Columns are located by header name.
pub fn read_candles_from<R: Read>(reader: R) -> Result<Vec<Candle>, KbarError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let mut idx = [0usize; 6];
    for (slot, column) in idx.iter_mut().zip(CANDLE_COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| KbarError::InvalidData(format!("expected {column} column")))?;
    }

    let mut candles = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let field = |i: usize| record.get(idx[i]).unwrap_or_default();
        let decimal = |i: usize| -> Result<Decimal, KbarError> {
            field(i).parse().map_err(|e| {
                KbarError::InvalidData(format!("invalid {}: {e}", CANDLE_COLUMNS[i]))
            })
        };

        candles.push(Candle {
            timestamp: parse_timestamp(field(0))?,
            open: decimal(1)?,
            high: decimal(2)?,
            low: decimal(3)?,
            close: decimal(4)?,
            volume: decimal(5)?,
        });
    }

    Ok(candles)
}

/// Write a candle table to `path`, overwriting any existing file.
pub fn write_csv(path: &Path, candles: &[Candle]) -> Result<(), KbarError> {
    let file = std::fs::File::create(path)?;
    write_candles_to(std::io::BufWriter::new(file), candles)
}

pub fn read_csv(path: &Path) -> Result<Vec<Candle>, KbarError> {
    let file = std::fs::File::open(path)?;
    read_candles_from(std::io::BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn sample_candles() -> Vec<Candle> {
        vec![
            Candle {
                timestamp: Utc.with_ymd_and_hms(2025, 1, 15, 14, 30, 0).unwrap(),
                open: dec!(150.1234),
                high: dec!(151.5678),
                low: dec!(149.0001),
                close: dec!(150.9999),
                volume: dec!(1000),
            },
            Candle {
                timestamp: Utc.with_ymd_and_hms(2025, 1, 15, 14, 31, 0).unwrap(),
                open: dec!(150.9999),
                high: dec!(152.00),
                low: dec!(150.50),
                close: dec!(151.75),
                volume: dec!(2000.5),
            },
        ]
    }

    fn to_string(candles: &[Candle]) -> String {
        let mut buf = Vec::new();
        write_candles_to(&mut buf, candles).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn timestamp_uses_z_suffix() {
        let ts = Utc.with_ymd_and_hms(2025, 1, 15, 14, 30, 0).unwrap();
        assert_eq!(format_timestamp(&ts), "2025-01-15T14:30:00Z");
    }

    #[test]
    fn timestamp_keeps_microseconds() {
        let ts = Utc.with_ymd_and_hms(2025, 1, 15, 14, 30, 0).unwrap()
            + chrono::TimeDelta::microseconds(123_456);
        assert_eq!(format_timestamp(&ts), "2025-01-15T14:30:00.123456Z");
    }

    #[test]
    fn parse_timestamp_accepts_z_and_offset() {
        let z = parse_timestamp("2025-01-15T14:30:00Z").unwrap();
        let offset = parse_timestamp("2025-01-15T14:30:00+00:00").unwrap();
        assert_eq!(z, offset);
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn header_and_fixed_precision() {
        let out = to_string(&sample_candles());
        let mut lines = out.lines();
        assert_eq!(lines.next(), Some("timestamp,open,high,low,close,volume"));
        assert_eq!(
            lines.next(),
            Some("2025-01-15T14:30:00Z,150.123400,151.567800,149.000100,150.999900,1000.00")
        );
        assert_eq!(
            lines.next(),
            Some("2025-01-15T14:31:00Z,150.999900,152.000000,150.500000,151.750000,2000.50")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn empty_table_has_header_only() {
        let out = to_string(&[]);
        assert_eq!(out, "timestamp,open,high,low,close,volume\n");
        let result = read_candles_from(out.as_bytes()).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn csv_file_roundtrip() {
        let candles = sample_candles();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("AAPL.csv");

        write_csv(&path, &candles).unwrap();
        let result = read_csv(&path).unwrap();
        assert_eq!(candles, result);
    }

    #[test]
    fn read_rejects_missing_column() {
        let input = "timestamp,open,high,low,close\n2025-01-15T14:30:00Z,1,1,1,1\n";
        let err = read_candles_from(input.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("volume"));
    }

    #[test]
    fn read_rejects_bad_number() {
        let input = "timestamp,open,high,low,close,volume\n2025-01-15T14:30:00Z,abc,1,1,1,1\n";
        let err = read_candles_from(input.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("open"));
    }
}
