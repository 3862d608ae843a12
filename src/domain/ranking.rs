//! Ranking and selection of liquidity levels.
//!
//! Order: confidence desc, prominence desc, most recent first, then symbol,
//! timeframe and direction so the order is total and runs are reproducible.

use crate::domain::config::{AnalysisConfig, SelectionMode};
use crate::domain::level::{Direction, LiquidityLevel};
use std::cmp::Ordering;
use std::collections::HashMap;

pub fn compare_levels(a: &LiquidityLevel, b: &LiquidityLevel) -> Ordering {
    b.confidence_score
        .total_cmp(&a.confidence_score)
        .then_with(|| b.source.prominence.total_cmp(&a.source.prominence))
        .then_with(|| b.source.timestamp.cmp(&a.source.timestamp))
        .then_with(|| a.symbol.cmp(&b.symbol))
        .then_with(|| a.timeframe.cmp(&b.timeframe))
        .then_with(|| a.direction.cmp(&b.direction))
}

pub fn rank(mut levels: Vec<LiquidityLevel>) -> Vec<LiquidityLevel> {
    levels.sort_by(compare_levels);
    levels
}

pub fn apply_floor(levels: Vec<LiquidityLevel>, floor: f64) -> Vec<LiquidityLevel> {
    levels
        .into_iter()
        .filter(|l| l.confidence_score >= floor)
        .collect()
}

/// Top `n` per (symbol, timeframe, direction). Output is grouped by symbol then
/// timeframe, each group in rank order.
pub fn select_per_symbol(levels: Vec<LiquidityLevel>, n: usize) -> Vec<LiquidityLevel> {
    let mut taken: HashMap<(String, String, Direction), usize> = HashMap::new();
    let mut selected: Vec<LiquidityLevel> = rank(levels)
        .into_iter()
        .filter(|l| {
            let key = (l.symbol.clone(), l.timeframe.clone(), l.direction);
            let count = taken.entry(key).or_insert(0);
            *count += 1;
            *count <= n
        })
        .collect();
    selected.sort_by(|a, b| a.symbol.cmp(&b.symbol).then_with(|| a.timeframe.cmp(&b.timeframe)));
    selected
}

/// Top `n` over the pooled, globally ranked set.
pub fn select_global(levels: Vec<LiquidityLevel>, n: usize) -> Vec<LiquidityLevel> {
    let mut ranked = rank(levels);
    ranked.truncate(n);
    ranked
}

/// Floor, then select according to the configured mode.
pub fn select(levels: Vec<LiquidityLevel>, config: &AnalysisConfig) -> Vec<LiquidityLevel> {
    let eligible = apply_floor(levels, config.score_floor);
    match config.selection {
        SelectionMode::PerSymbol { top_n_per_side } => select_per_symbol(eligible, top_n_per_side),
        SelectionMode::Global { top_n } => select_global(eligible, top_n),
    }
}
