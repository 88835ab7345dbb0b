use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Direction of the last 24h move, derived from the change percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceStatus {
    /// Change percentage is zero or positive
    Up,
    /// Change percentage is negative
    Down,
}

impl std::fmt::Display for PriceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PriceStatus::Up => write!(f, "up"),
            PriceStatus::Down => write!(f, "down"),
        }
    }
}

/// Ordering applied by `Catalog::sort_by`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// Lexicographic by name
    Name,
    /// Highest current price first
    Price,
    /// Biggest 24h gainers first
    Change,
}

/// One tracked cryptocurrency.
///
/// Price fields are private: every price write goes through a setter so
/// that `current_price` stays non-negative and `last_updated` always
/// reflects the most recent write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CryptoRecord {
    /// Unique identifier, e.g. "BTC-001" or "TST-3f9a1c2e"
    pub id: String,

    /// Human-readable name (e.g., "Bitcoin")
    pub name: String,

    /// Ticker symbol, uppercased (e.g., "BTC")
    pub symbol: String,

    /// Freeform category (e.g., "Currency", "Platform", "Exchange")
    pub category: String,

    current_price: f64,
    price_change_24h: f64,
    price_change_percentage_24h: f64,
    last_updated: DateTime<Utc>,

    /// User-settable favorite flag
    #[serde(default)]
    pub is_favorite: bool,
}

impl CryptoRecord {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        symbol: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            symbol: symbol.into().to_uppercase(),
            category: category.into(),
            current_price: 0.0,
            price_change_24h: 0.0,
            price_change_percentage_24h: 0.0,
            last_updated: Utc::now(),
            is_favorite: false,
        }
    }

    #[must_use]
    pub fn current_price(&self) -> f64 {
        self.current_price
    }

    #[must_use]
    pub fn price_change_24h(&self) -> f64 {
        self.price_change_24h
    }

    #[must_use]
    pub fn price_change_percentage_24h(&self) -> f64 {
        self.price_change_percentage_24h
    }

    #[must_use]
    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    /// Set the current price and stamp `last_updated`.
    /// Negative and non-finite inputs are stored as 0.0.
    pub fn set_current_price(&mut self, price: f64) {
        self.current_price = if price.is_finite() { price.max(0.0) } else { 0.0 };
        self.last_updated = Utc::now();
    }

    /// Set the absolute and percentage 24h change. Non-finite inputs become 0.0.
    pub fn set_price_change(&mut self, change: f64, change_pct: f64) {
        self.price_change_24h = finite_or_zero(change);
        self.price_change_percentage_24h = finite_or_zero(change_pct);
    }

    /// Seed price and change from a percentage draw: the absolute change
    /// is `price * pct / 100`.
    pub fn seed_price(&mut self, price: f64, change_pct: f64) {
        self.set_current_price(price);
        let change = self.current_price * change_pct / 100.0;
        self.set_price_change(change, change_pct);
    }

    /// Move to `new_price`, deriving the change from the previous price.
    ///
    /// A previous price of zero yields a 0% change rather than a
    /// non-finite percentage.
    pub fn reprice(&mut self, new_price: f64) {
        let old_price = self.current_price;
        self.set_current_price(new_price);
        let new_price = self.current_price;

        let change_pct = if old_price > 0.0 {
            (new_price - old_price) / old_price * 100.0
        } else {
            0.0
        };
        self.set_price_change(new_price - old_price, change_pct);
    }

    #[must_use]
    pub fn status(&self) -> PriceStatus {
        if self.price_change_percentage_24h >= 0.0 {
            PriceStatus::Up
        } else {
            PriceStatus::Down
        }
    }

    /// Price as shown in the dashboard table, e.g. `$45,123.40`.
    #[must_use]
    pub fn formatted_price(&self) -> String {
        format!("${}", group_thousands(self.current_price))
    }

    /// Change percentage with explicit sign, e.g. `+1.25%` or `-0.40%`.
    #[must_use]
    pub fn formatted_change(&self) -> String {
        let sign = if self.price_change_percentage_24h >= 0.0 { "+" } else { "" };
        format!("{sign}{:.2}%", self.price_change_percentage_24h)
    }

    /// All text a user can see for this record, lowercased, for search.
    pub(crate) fn searchable_fields(&self) -> [String; 7] {
        [
            self.id.to_lowercase(),
            self.name.to_lowercase(),
            self.symbol.to_lowercase(),
            self.category.to_lowercase(),
            self.status().to_string(),
            self.formatted_price().to_lowercase(),
            self.formatted_change(),
        ]
    }
}

/// Field values for `Catalog::update`.
///
/// `name`, `symbol` and `category` are validated exactly like a create.
/// `id` is only set when the caller is correcting a wrong identifier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordUpdate {
    pub name: String,
    pub symbol: String,
    pub category: String,
    pub is_favorite: Option<bool>,
    pub id: Option<String>,
}

impl RecordUpdate {
    pub fn new(
        name: impl Into<String>,
        symbol: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            category: category.into(),
            is_favorite: None,
            id: None,
        }
    }

    pub fn with_favorite(mut self, is_favorite: bool) -> Self {
        self.is_favorite = Some(is_favorite);
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Two-decimal rendering with `,` thousands separators.
fn group_thousands(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}{grouped}.{frac_part}")
}
