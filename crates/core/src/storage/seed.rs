use tracing::debug;

use crate::models::crypto::CryptoRecord;
use crate::providers::simulator::PriceSimulator;

/// Assets written on first run: (symbol, name, category).
pub const DEFAULT_ASSETS: [(&str, &str, &str); 10] = [
    ("BTC", "Bitcoin", "Currency"),
    ("ETH", "Ethereum", "Platform"),
    ("BNB", "Binance Coin", "Exchange"),
    ("ADA", "Cardano", "Platform"),
    ("SOL", "Solana", "Platform"),
    ("XRP", "Ripple", "Payment"),
    ("DOT", "Polkadot", "Platform"),
    ("DOGE", "Dogecoin", "Meme"),
    ("AVAX", "Avalanche", "Platform"),
    ("LINK", "Chainlink", "Oracle"),
];

/// Build the default record set with simulated prices.
///
/// Ids follow `SYMBOL-NNN` in table order (`BTC-001`, `ETH-002`, ...).
pub fn seed_records(simulator: &mut PriceSimulator) -> Vec<CryptoRecord> {
    let records: Vec<CryptoRecord> = DEFAULT_ASSETS
        .iter()
        .enumerate()
        .map(|(idx, (symbol, name, category))| {
            let mut record =
                CryptoRecord::new(format!("{symbol}-{:03}", idx + 1), *name, *symbol, *category);
            let price = simulator.price_for(symbol);
            let change_pct = simulator.change_for(symbol);
            record.seed_price(price, change_pct);
            record
        })
        .collect();

    debug!(count = records.len(), "Synthesized seed records");
    records
}
