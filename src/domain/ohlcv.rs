//! Price bar and immutable price series.

use crate::domain::error::LevelscanError;
use chrono::NaiveDateTime;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricePoint {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<f64>,
}

impl PricePoint {
    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }

    pub fn body_low(&self) -> f64 {
        self.open.min(self.close)
    }

    pub fn body_high(&self) -> f64 {
        self.open.max(self.close)
    }

    /// high >= low, high >= max(open, close), low <= min(open, close), all finite.
    pub fn is_consistent(&self) -> bool {
        let finite = self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite();
        finite && self.high >= self.low && self.high >= self.body_high() && self.low <= self.body_low()
    }
}

/// Ordered bars with strictly increasing timestamps. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(points: Vec<PricePoint>) -> Result<Self, LevelscanError> {
        for (i, point) in points.iter().enumerate() {
            if !point.is_consistent() {
                return Err(LevelscanError::InvalidSeries {
                    reason: format!("bar {} at {} violates OHLC bounds", i, point.timestamp),
                });
            }
        }
        if let Some(w) = points.windows(2).find(|w| w[1].timestamp <= w[0].timestamp) {
            return Err(LevelscanError::InvalidSeries {
                reason: format!(
                    "timestamps not strictly increasing at {} -> {}",
                    w[0].timestamp, w[1].timestamp
                ),
            });
        }
        Ok(Self { points })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn get(&self, index: usize) -> Option<&PricePoint> {
        self.points.get(index)
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.low).collect()
    }
}
