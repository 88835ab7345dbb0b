use std::collections::HashSet;

use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use tracing::warn;

use crate::errors::{CoreError, ParseError};
use crate::models::crypto::CryptoRecord;

/// Header row of the records file.
pub const HEADER: [&str; 8] = [
    "ID",
    "Name",
    "Symbol",
    "Category",
    "Price",
    "Change24h",
    "ChangePercent24h",
    "IsFavorite",
];

/// Rows with fewer fields than this are rejected. The 7-column layout
/// predates the `IsFavorite` column, which then defaults to `false`.
pub const MIN_COLUMNS: usize = 7;

/// Result of decoding a records file.
#[derive(Debug, Default)]
pub struct ParsedRecords {
    /// Rows that loaded, in file order
    pub records: Vec<CryptoRecord>,

    /// Rows that were dropped entirely
    pub skipped: Vec<ParseError>,

    /// Rows that loaded with a field replaced by its default
    pub repaired: Vec<ParseError>,
}

/// Serialize the full record list, header included.
///
/// Numbers are written with exactly two decimals and the favorite flag as
/// `true`/`false`. Text containing `,`, `"` or a line break is quoted with
/// inner quotes doubled.
pub fn encode_records(records: &[CryptoRecord]) -> Result<Vec<u8>, CoreError> {
    let mut writer = WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer
        .write_record(HEADER)
        .map_err(|e| CoreError::Serialization(format!("Failed to write header: {e}")))?;

    for record in records {
        let price = format!("{:.2}", record.current_price());
        let change = format!("{:.2}", record.price_change_24h());
        let change_pct = format!("{:.2}", record.price_change_percentage_24h());
        writer
            .write_record([
                record.id.as_str(),
                record.name.as_str(),
                record.symbol.as_str(),
                record.category.as_str(),
                price.as_str(),
                change.as_str(),
                change_pct.as_str(),
                if record.is_favorite { "true" } else { "false" },
            ])
            .map_err(|e| {
                CoreError::Serialization(format!("Failed to write record {}: {e}", record.id))
            })?;
    }

    writer
        .into_inner()
        .map_err(|e| CoreError::Serialization(format!("Failed to flush records: {e}")))
}

/// Decode a records file.
///
/// The first row is always treated as the header. Problems stay local to
/// their row: a malformed number becomes `0.0` and the row still loads; a
/// row that is too short, lacks an id or symbol, or repeats an id/symbol
/// already seen is skipped.
pub fn decode_records(data: &[u8]) -> ParsedRecords {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(data);

    let mut parsed = ParsedRecords::default();
    let mut seen_ids = HashSet::new();
    let mut seen_symbols = HashSet::new();

    for result in reader.records() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                let line = e.position().map(|p| p.line()).unwrap_or(0);
                warn!(line, error = %e, "Unreadable row in records file");
                parsed.skipped.push(ParseError {
                    line,
                    reason: e.to_string(),
                });
                if e.is_io_error() {
                    break;
                }
                continue;
            }
        };

        let line = row.position().map(|p| p.line()).unwrap_or(0);
        match decode_row(&row, line, &mut parsed.repaired) {
            Ok(record) => {
                if !seen_ids.insert(record.id.clone()) {
                    skip(&mut parsed, line, format!("duplicate id '{}'", record.id));
                } else if !seen_symbols.insert(record.symbol.clone()) {
                    skip(
                        &mut parsed,
                        line,
                        format!("duplicate symbol '{}'", record.symbol),
                    );
                } else {
                    parsed.records.push(record);
                }
            }
            Err(reason) => skip(&mut parsed, line, reason),
        }
    }

    parsed
}

fn skip(parsed: &mut ParsedRecords, line: u64, reason: String) {
    warn!(line, %reason, "Skipping row in records file");
    parsed.skipped.push(ParseError { line, reason });
}

fn decode_row(
    row: &StringRecord,
    line: u64,
    repaired: &mut Vec<ParseError>,
) -> Result<CryptoRecord, String> {
    if row.len() < MIN_COLUMNS {
        return Err(format!(
            "expected at least {MIN_COLUMNS} fields, found {}",
            row.len()
        ));
    }

    let field = |idx: usize| row.get(idx).unwrap_or("");
    let id = field(0);
    let symbol = field(2);
    if id.is_empty() {
        return Err("missing id".into());
    }
    if symbol.is_empty() {
        return Err("missing symbol".into());
    }

    let mut record = CryptoRecord::new(id, field(1), symbol, field(3));

    let mut number = |idx: usize| -> f64 {
        let raw = field(idx);
        match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => v,
            _ => {
                warn!(line, column = HEADER[idx], value = raw, "Invalid number, using 0.0");
                repaired.push(ParseError {
                    line,
                    reason: format!("invalid {} '{raw}', using 0.0", HEADER[idx]),
                });
                0.0
            }
        }
    };

    let price = number(4);
    let change = number(5);
    let change_pct = number(6);

    if price < 0.0 {
        warn!(line, price, "Negative price, clamping to 0.0");
        repaired.push(ParseError {
            line,
            reason: format!("negative Price {price}, using 0.0"),
        });
    }
    record.set_current_price(price);
    record.set_price_change(change, change_pct);
    record.is_favorite = row
        .get(7)
        .is_some_and(|v| v.eq_ignore_ascii_case("true"));

    Ok(record)
}
