use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Timestamp layout used in the history file (`yyyy-MM-dd HH:mm:ss`).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One append-only price observation for an asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    /// Id of the `CryptoRecord` this observation belongs to
    pub crypto_id: String,

    pub price: f64,

    /// Local wall-clock time, second precision
    pub timestamp: NaiveDateTime,

    #[serde(default)]
    pub volume: Option<f64>,

    #[serde(default)]
    pub market_cap: Option<f64>,
}

impl HistoryPoint {
    pub fn new(crypto_id: impl Into<String>, price: f64, timestamp: NaiveDateTime) -> Self {
        Self {
            crypto_id: crypto_id.into(),
            price,
            timestamp,
            volume: None,
            market_cap: None,
        }
    }

    /// Attach volume and market cap figures.
    pub fn with_market_data(mut self, volume: f64, market_cap: f64) -> Self {
        self.volume = Some(volume);
        self.market_cap = Some(market_cap);
        self
    }

    #[must_use]
    pub fn formatted_timestamp(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }
}
