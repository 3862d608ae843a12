//! Builds a `LiquidityLevel` from a scored extremum, optionally with a trade plan.
//!
//! Without a plan the zone is the extremum's wick. With a plan the zone is the
//! bar body, the stop sits a fraction of ATR beyond the level, and targets are
//! earlier opposite-kind extrema on the profitable side, nearest first.

use crate::domain::config::AnalysisConfig;
use crate::domain::extremum::{Extremum, ExtremumKind};
use crate::domain::level::{Direction, LiquidityLevel, TakeProfitTarget};
use crate::domain::ohlcv::PricePoint;
use crate::domain::scoring::Score;

fn wick_zone(kind: ExtremumKind, bar: &PricePoint) -> (f64, f64) {
    match kind {
        ExtremumKind::High => (bar.high, bar.body_high()),
        ExtremumKind::Low => (bar.body_low(), bar.low),
    }
}

pub fn stop_loss(extremum: &Extremum, fraction: f64) -> f64 {
    let offset = fraction * extremum.atr_at_point;
    match extremum.kind {
        ExtremumKind::High => extremum.price + offset,
        ExtremumKind::Low => extremum.price - offset,
    }
}

pub fn take_profit_targets(
    extremum: &Extremum,
    stop: f64,
    extrema: &[Extremum],
    max_targets: usize,
) -> Vec<TakeProfitTarget> {
    let risk = (stop - extremum.price).abs();
    let mut candidates: Vec<f64> = extrema
        .iter()
        .filter(|e| e.index < extremum.index && e.kind == extremum.kind.opposite())
        .map(|e| e.price)
        .filter(|&p| match extremum.kind {
            ExtremumKind::High => p < extremum.price,
            ExtremumKind::Low => p > extremum.price,
        })
        .collect();
    candidates.sort_by(|a, b| {
        (a - extremum.price)
            .abs()
            .total_cmp(&(b - extremum.price).abs())
    });
    candidates.dedup();

    candidates
        .into_iter()
        .take(max_targets)
        .map(|price| {
            let reward = (price - extremum.price).abs();
            TakeProfitTarget {
                price,
                reward_risk: if risk > 0.0 { reward / risk } else { 0.0 },
            }
        })
        .collect()
}

pub fn build_level(
    symbol: &str,
    timeframe: &str,
    extremum: &Extremum,
    score: Score,
    bar: &PricePoint,
    extrema: &[Extremum],
    config: &AnalysisConfig,
) -> LiquidityLevel {
    let (zone_high, zone_low, stop, targets) = if config.enable_trade_plan {
        let stop = stop_loss(extremum, config.stop_atr_fraction);
        let targets = take_profit_targets(extremum, stop, extrema, config.max_targets);
        (bar.body_high(), bar.body_low(), Some(stop), targets)
    } else {
        let (high, low) = wick_zone(extremum.kind, bar);
        (high, low, None, Vec::new())
    };

    LiquidityLevel {
        symbol: symbol.to_string(),
        timeframe: timeframe.to_string(),
        direction: Direction::for_kind(extremum.kind),
        zone_high,
        zone_low,
        stop_loss: stop,
        take_profit_targets: targets,
        confidence_score: score.value,
        thesis_factors: score.factors,
        source: extremum.clone(),
    }
}
