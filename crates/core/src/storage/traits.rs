use chrono::NaiveDateTime;

use crate::errors::CoreError;
use crate::models::crypto::CryptoRecord;
use crate::models::history::HistoryPoint;

/// Persistence boundary for the catalog.
///
/// The CSV implementation lives in `manager`; tests substitute their own
/// stores to simulate disk failures. I/O problems never cross this trait
/// as panics: `load` degrades to a seed set, everything else returns `Err`.
pub trait RecordStore: Send {
    /// Read the full record list. Never fails; falls back to the seed set.
    fn load(&mut self) -> Vec<CryptoRecord>;

    /// Replace the persisted list with `records`.
    /// On `Err` the previously persisted list is still intact.
    fn save(&mut self, records: &[CryptoRecord]) -> Result<(), CoreError>;

    /// Append one observation to the price history.
    fn append_history(
        &mut self,
        crypto_id: &str,
        price: f64,
        timestamp: NaiveDateTime,
    ) -> Result<(), CoreError>;

    /// All observations recorded for `crypto_id`, in file order.
    /// A missing history file yields an empty list.
    fn load_history(&self, crypto_id: &str) -> Result<Vec<HistoryPoint>, CoreError>;
}
