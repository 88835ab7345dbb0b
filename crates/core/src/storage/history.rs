use std::fs::OpenOptions;
use std::path::Path;

use chrono::NaiveDateTime;
use csv::{ReaderBuilder, Trim, WriterBuilder};
use tracing::warn;

use crate::errors::CoreError;
use crate::models::history::{HistoryPoint, TIMESTAMP_FORMAT};

/// Header row of the history file.
pub const HISTORY_HEADER: [&str; 3] = ["CryptoID", "Price", "Timestamp"];

/// Append one observation, writing the header first if the file is empty.
/// Creates the parent directory when needed.
pub fn append_point(path: &Path, point: &HistoryPoint) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let is_empty = file.metadata()?.len() == 0;

    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(file);

    if is_empty {
        writer.write_record(HISTORY_HEADER)?;
    }

    let price = format!("{:.2}", point.price);
    let timestamp = point.formatted_timestamp();
    match (point.volume, point.market_cap) {
        (Some(volume), Some(market_cap)) => {
            let volume = format!("{volume:.2}");
            let market_cap = format!("{market_cap:.2}");
            writer.write_record([
                point.crypto_id.as_str(),
                price.as_str(),
                timestamp.as_str(),
                volume.as_str(),
                market_cap.as_str(),
            ])?;
        }
        _ => {
            writer.write_record([point.crypto_id.as_str(), price.as_str(), timestamp.as_str()])?;
        }
    }

    writer.flush()?;
    Ok(())
}

/// Read every observation for `crypto_id`.
///
/// A missing file is an empty history. Rows with an unparsable price or
/// timestamp are skipped with a warning.
pub fn read_points(path: &Path, crypto_id: &str) -> Result<Vec<HistoryPoint>, CoreError> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_path(path)?;

    let mut points = Vec::new();
    for result in reader.records() {
        let row = match result {
            Ok(row) => row,
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                warn!(error = %e, "Skipping unreadable history row");
                continue;
            }
        };

        if row.len() < HISTORY_HEADER.len() || row.get(0) != Some(crypto_id) {
            continue;
        }

        let line = row.position().map(|p| p.line()).unwrap_or(0);
        let price = match row.get(1).unwrap_or("").parse::<f64>() {
            Ok(p) if p.is_finite() => p,
            _ => {
                warn!(line, "Skipping history row with invalid price");
                continue;
            }
        };
        let timestamp =
            match NaiveDateTime::parse_from_str(row.get(2).unwrap_or(""), TIMESTAMP_FORMAT) {
                Ok(ts) => ts,
                Err(e) => {
                    warn!(line, error = %e, "Skipping history row with invalid timestamp");
                    continue;
                }
            };

        let mut point = HistoryPoint::new(crypto_id, price, timestamp);
        point.volume = row.get(3).and_then(|v| v.parse().ok());
        point.market_cap = row.get(4).and_then(|v| v.parse().ok());
        points.push(point);
    }

    Ok(points)
}
