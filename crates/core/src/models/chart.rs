use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A single data point for price chart rendering.
///
/// The core generates these; the frontend just renders them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDataPoint {
    pub timestamp: NaiveDateTime,
    pub price: f64,
}
