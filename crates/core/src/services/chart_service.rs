use chrono::{Duration, NaiveDateTime};

use crate::models::chart::ChartDataPoint;
use crate::models::history::HistoryPoint;
use crate::providers::simulator::PriceSimulator;

/// Total drift of a simulated series, from -5% at the start to +5% at the end.
pub const TREND_SPAN: f64 = 0.1;

/// Per-point noise amplitude (±1%).
pub const NOISE: f64 = 0.01;

/// Generates chart-ready series.
///
/// The core computes all the numbers; the frontend only renders.
pub struct ChartService;

impl ChartService {
    pub fn new() -> Self {
        Self
    }

    /// Simulated price series for the detail chart.
    ///
    /// `points` values around one simulated base price, following a linear
    /// trend plus noise. The last point is stamped `end`, earlier points
    /// are spaced `step` apart. Never negative.
    pub fn simulated_series(
        &self,
        simulator: &mut PriceSimulator,
        identifier: &str,
        points: usize,
        end: NaiveDateTime,
        step: Duration,
    ) -> Vec<ChartDataPoint> {
        if points == 0 {
            return Vec::new();
        }

        let base = simulator.price_for(identifier);
        let n = points as f64;

        (0..points)
            .map(|i| {
                let trend = (i as f64 - n / 2.0) / n * TREND_SPAN;
                let noise = simulator.fluctuation(NOISE);
                let back = step * (points - 1 - i) as i32;
                ChartDataPoint {
                    timestamp: end - back,
                    price: (base * (1.0 + trend + noise)).max(0.0),
                }
            })
            .collect()
    }

    /// Stored observations as a chart series, oldest first.
    pub fn history_series(&self, history: &[HistoryPoint]) -> Vec<ChartDataPoint> {
        let mut series: Vec<ChartDataPoint> = history
            .iter()
            .map(|p| ChartDataPoint {
                timestamp: p.timestamp,
                price: p.price,
            })
            .collect();
        series.sort_by_key(|p| p.timestamp);
        series
    }
}

impl Default for ChartService {
    fn default() -> Self {
        Self::new()
    }
}
