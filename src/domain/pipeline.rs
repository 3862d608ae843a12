//! Per-symbol analysis and the parallel batch coordinator.
//!
//! A symbol run is pure: normalized series in, candidate levels out. The batch
//! fans (symbol, timeframe) pairs out over rayon, converts each failure into a
//! skip outcome, then pools the survivors and applies the configured selection.

use crate::domain::config::AnalysisConfig;
use crate::domain::context::ContextSignals;
use crate::domain::error::LevelscanError;
use crate::domain::extremum::detect_extrema;
use crate::domain::indicator::IndicatorSet;
use crate::domain::level::LiquidityLevel;
use crate::domain::normalizer::normalize;
use crate::domain::ohlcv::PriceSeries;
use crate::domain::ranking::select;
use crate::domain::scoring::score_extrema;
use crate::domain::trade_plan::build_level;
use crate::ports::data_port::DataPort;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Every candidate level for one normalized series, in detection order.
pub fn analyze_series(
    symbol: &str,
    timeframe: &str,
    series: &PriceSeries,
    signals: &ContextSignals,
    config: &AnalysisConfig,
) -> Result<Vec<LiquidityLevel>, LevelscanError> {
    let minimum = config.longest_window();
    if series.len() < minimum {
        return Err(LevelscanError::DataInsufficient {
            symbol: symbol.to_string(),
            bars: series.len(),
            minimum,
        });
    }

    let indicators = IndicatorSet::compute(series, config);
    let detection = detect_extrema(series, &indicators, config);
    debug!(
        symbol,
        extrema = detection.extrema.len(),
        threshold = detection.threshold,
        window_start = detection.window.start,
        "detection complete"
    );

    let levels = score_extrema(symbol, series, &indicators, &detection, signals, config)
        .into_iter()
        .filter_map(|(extremum, score)| {
            let bar = series.get(extremum.index)?;
            Some(build_level(
                symbol,
                timeframe,
                &extremum,
                score,
                bar,
                &detection.extrema,
                config,
            ))
        })
        .collect();
    Ok(levels)
}

/// Fetch, normalize and analyze one symbol.
pub fn analyze_symbol(
    port: &dyn DataPort,
    symbol: &str,
    timeframe: &str,
    signals: &ContextSignals,
    config: &AnalysisConfig,
) -> Result<Vec<LiquidityLevel>, LevelscanError> {
    let rows = port.fetch_raw(symbol, timeframe)?;
    let series = normalize(symbol, &rows, config.longest_window())?;
    analyze_series(symbol, timeframe, &series, signals, config)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SymbolOutcome {
    Analyzed {
        symbol: String,
        timeframe: String,
        candidates: usize,
    },
    Skipped {
        symbol: String,
        timeframe: String,
        reason: String,
    },
}

impl SymbolOutcome {
    pub fn symbol(&self) -> &str {
        match self {
            SymbolOutcome::Analyzed { symbol, .. } | SymbolOutcome::Skipped { symbol, .. } => {
                symbol
            }
        }
    }

    pub fn timeframe(&self) -> &str {
        match self {
            SymbolOutcome::Analyzed { timeframe, .. }
            | SymbolOutcome::Skipped { timeframe, .. } => timeframe,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, SymbolOutcome::Skipped { .. })
    }
}

/// Result of a batch: one outcome per (symbol, timeframe) pair, symbol-major in
/// request order, and the levels selected from the pooled candidates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub timeframes: Vec<String>,
    pub outcomes: Vec<SymbolOutcome>,
    pub levels: Vec<LiquidityLevel>,
}

impl BatchReport {
    pub fn skipped(&self) -> impl Iterator<Item = &SymbolOutcome> {
        self.outcomes.iter().filter(|o| o.is_skipped())
    }

    pub fn levels_for<'a>(&'a self, symbol: &'a str) -> impl Iterator<Item = &'a LiquidityLevel> {
        self.levels.iter().filter(move |l| l.symbol == symbol)
    }
}

/// Analyzes every symbol on every timeframe in parallel, then applies the
/// configured selection to the pooled candidates.
pub fn analyze_batch(
    port: &dyn DataPort,
    symbols: &[String],
    timeframes: &[String],
    signals: &ContextSignals,
    config: &AnalysisConfig,
) -> BatchReport {
    info!(
        symbols = symbols.len(),
        timeframes = %timeframes.join(","),
        "starting batch"
    );

    let work: Vec<(&String, &String)> = symbols
        .iter()
        .flat_map(|symbol| timeframes.iter().map(move |tf| (symbol, tf)))
        .collect();

    let results: Vec<(&String, &String, Result<Vec<LiquidityLevel>, LevelscanError>)> = work
        .par_iter()
        .map(|&(symbol, timeframe)| {
            let result = analyze_symbol(port, symbol, timeframe, signals, config);
            (symbol, timeframe, result)
        })
        .collect();

    let mut outcomes = Vec::with_capacity(results.len());
    let mut candidates = Vec::new();
    for (symbol, timeframe, result) in results {
        match result {
            Ok(levels) => {
                info!(symbol = %symbol, timeframe = %timeframe, candidates = levels.len(), "analyzed");
                outcomes.push(SymbolOutcome::Analyzed {
                    symbol: symbol.clone(),
                    timeframe: timeframe.clone(),
                    candidates: levels.len(),
                });
                candidates.extend(levels);
            }
            Err(e) => {
                warn!(symbol = %symbol, timeframe = %timeframe, error = %e, "skipping symbol");
                outcomes.push(SymbolOutcome::Skipped {
                    symbol: symbol.clone(),
                    timeframe: timeframe.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    let levels = select(candidates, config);
    info!(selected = levels.len(), "batch complete");

    BatchReport {
        timeframes: timeframes.to_vec(),
        outcomes,
        levels,
    }
}
