use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::history::TIMESTAMP_FORMAT;

/// Snapshot of the whole catalog for the market report view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSummary {
    /// When this summary was computed
    pub generated_at: NaiveDateTime,

    /// Number of tracked cryptocurrencies
    pub total: usize,

    /// Records with a zero or positive 24h change
    pub gainers: usize,

    /// Records with a negative 24h change
    pub losers: usize,

    pub favorites: usize,

    /// Rough market cap: sum of price × 1,000,000
    pub estimated_market_cap: f64,

    /// Rough 24h volume: sum of |24h change| × 100,000
    pub estimated_volume_24h: f64,

    /// Mean change percentage (0.0 for an empty catalog)
    pub average_change_pct: f64,

    /// Up to five best performers, biggest gain first
    pub top_performers: Vec<Performer>,
}

/// A single row of the top performers table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Performer {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub change_pct: f64,
}

impl MarketSummary {
    /// Plain-text rendering of the report.
    #[must_use]
    pub fn to_report_text(&self) -> String {
        let mut out = String::from("=== CRYPTOCURRENCY MARKET REPORT ===\n\n");
        out.push_str(&format!(
            "Report Date: {}\n",
            self.generated_at.format(TIMESTAMP_FORMAT)
        ));
        out.push_str(&format!("Total Cryptocurrencies: {}\n", self.total));
        out.push_str(&format!(
            "Market Cap: ${:.2}B\n",
            self.estimated_market_cap / 1_000_000_000.0
        ));
        out.push_str(&format!(
            "24h Volume: ${:.2}B\n",
            self.estimated_volume_24h / 1_000_000_000.0
        ));
        out.push_str(&format!(
            "Gainers: {} | Losers: {}\n\n",
            self.gainers, self.losers
        ));
        out.push_str("Top Performers (24h):\n");
        out.push_str("----------------------\n");
        for p in &self.top_performers {
            out.push_str(&format!(
                "{}: {:+.2}% (${:.2})\n",
                p.symbol, p.change_pct, p.price
            ));
        }
        out
    }
}

/// Outcome of one successful refresh tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshReport {
    /// Number of records repriced
    pub updated: usize,

    /// History appends that failed (the prices themselves were saved)
    pub history_failures: usize,

    pub refreshed_at: DateTime<Utc>,
}
