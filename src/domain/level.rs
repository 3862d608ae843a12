//! Liquidity level: the scored, emitted form of a swing extremum.

use crate::domain::extremum::{Extremum, ExtremumKind};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    /// Swing highs are sold into, swing lows bought.
    pub fn for_kind(kind: ExtremumKind) -> Self {
        match kind {
            ExtremumKind::High => Direction::Sell,
            ExtremumKind::Low => Direction::Buy,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Buy => write!(f, "BUY"),
            Direction::Sell => write!(f, "SELL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TakeProfitTarget {
    pub price: f64,
    pub reward_risk: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiquidityLevel {
    pub symbol: String,
    pub timeframe: String,
    pub direction: Direction,
    pub zone_high: f64,
    pub zone_low: f64,
    pub stop_loss: Option<f64>,
    pub take_profit_targets: Vec<TakeProfitTarget>,
    pub confidence_score: f64,
    pub thesis_factors: Vec<String>,
    pub source: Extremum,
}

impl LiquidityLevel {
    pub fn thesis(&self) -> String {
        self.thesis_factors.join(" + ")
    }
}
