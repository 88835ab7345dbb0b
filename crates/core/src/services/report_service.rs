use chrono::NaiveDateTime;

use crate::models::crypto::CryptoRecord;
use crate::models::report::{MarketSummary, Performer};

/// Simplified market cap multiplier applied to each price.
pub const MARKET_CAP_FACTOR: f64 = 1_000_000.0;

/// Simplified volume multiplier applied to each absolute 24h change.
pub const VOLUME_FACTOR: f64 = 100_000.0;

/// How many rows the top performers table holds.
pub const TOP_PERFORMERS: usize = 5;

/// Computes the market report from a catalog snapshot.
///
/// Pure: no I/O, no randomness.
pub struct ReportService;

impl ReportService {
    pub fn new() -> Self {
        Self
    }

    pub fn summary(&self, records: &[CryptoRecord], generated_at: NaiveDateTime) -> MarketSummary {
        let total = records.len();
        let gainers = records
            .iter()
            .filter(|r| r.price_change_percentage_24h() >= 0.0)
            .count();
        let favorites = records.iter().filter(|r| r.is_favorite).count();

        let estimated_market_cap = records
            .iter()
            .map(|r| r.current_price() * MARKET_CAP_FACTOR)
            .sum();
        let estimated_volume_24h = records
            .iter()
            .map(|r| r.price_change_24h().abs() * VOLUME_FACTOR)
            .sum();
        let average_change_pct = if total == 0 {
            0.0
        } else {
            records
                .iter()
                .map(CryptoRecord::price_change_percentage_24h)
                .sum::<f64>()
                / total as f64
        };

        let mut ranked: Vec<&CryptoRecord> = records.iter().collect();
        ranked.sort_by(|a, b| {
            b.price_change_percentage_24h()
                .total_cmp(&a.price_change_percentage_24h())
        });
        let top_performers = ranked
            .into_iter()
            .take(TOP_PERFORMERS)
            .map(|r| Performer {
                symbol: r.symbol.clone(),
                name: r.name.clone(),
                price: r.current_price(),
                change_pct: r.price_change_percentage_24h(),
            })
            .collect();

        MarketSummary {
            generated_at,
            total,
            gainers,
            losers: total - gainers,
            favorites,
            estimated_market_cap,
            estimated_volume_24h,
            average_change_pct,
            top_performers,
        }
    }
}

impl Default for ReportService {
    fn default() -> Self {
        Self::new()
    }
}
