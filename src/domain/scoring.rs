//! Confluence scoring.
//!
//! Each extremum is reduced to an [`Evidence`] record, then a table of
//! [`ConfluenceRule`]s is evaluated over it uniformly. A triggered rule adds
//! its weight to the base score and appends its label to the thesis. Adding a
//! rule means adding a row to [`default_rules`]; detection is untouched.

use crate::domain::config::{AnalysisConfig, BASE_SCORE};
use crate::domain::context::{net_pair_bias, Bias, ContextSignals};
use crate::domain::extremum::{Detection, Extremum, ExtremumKind};
use crate::domain::indicator::IndicatorSet;
use crate::domain::ohlcv::PriceSeries;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
}

/// Facts about one extremum that the rules are evaluated against.
#[derive(Debug, Clone, PartialEq)]
pub struct Evidence {
    pub kind: ExtremumKind,
    pub trend: Option<Trend>,
    pub pair_bias: Bias,
    pub fibonacci_hit: bool,
    pub ema_hit: bool,
    pub rsi: Option<f64>,
    /// Volume at the bar over its rolling average.
    pub volume_ratio: Option<f64>,
    /// Bars between the extremum and the last bar of the series.
    pub bars_ago: usize,
}

impl Evidence {
    /// Evidence with nothing triggered; handy as a base for overrides.
    pub fn neutral(kind: ExtremumKind) -> Self {
        Self {
            kind,
            trend: None,
            pair_bias: Bias::Unknown,
            fibonacci_hit: false,
            ema_hit: false,
            rsi: None,
            volume_ratio: None,
            bars_ago: usize::MAX,
        }
    }
}

pub struct ConfluenceRule {
    pub label: &'static str,
    pub weight: f64,
    /// `None` applies to both highs and lows.
    pub applies_to: Option<ExtremumKind>,
    pub predicate: fn(&Evidence, &AnalysisConfig) -> bool,
}

fn trend_aligned(e: &Evidence, _: &AnalysisConfig) -> bool {
    matches!(
        (e.kind, e.trend),
        (ExtremumKind::High, Some(Trend::Down)) | (ExtremumKind::Low, Some(Trend::Up))
    )
}

fn context_aligned(e: &Evidence, _: &AnalysisConfig) -> bool {
    matches!(
        (e.kind, e.pair_bias),
        (ExtremumKind::High, Bias::Bearish) | (ExtremumKind::Low, Bias::Bullish)
    )
}

fn fibonacci(e: &Evidence, _: &AnalysisConfig) -> bool {
    e.fibonacci_hit
}

fn near_ema(e: &Evidence, _: &AnalysisConfig) -> bool {
    e.ema_hit
}

fn overbought(e: &Evidence, c: &AnalysisConfig) -> bool {
    e.rsi.is_some_and(|r| r > c.overbought)
}

fn oversold(e: &Evidence, c: &AnalysisConfig) -> bool {
    e.rsi.is_some_and(|r| r < c.oversold)
}

fn volume_spike(e: &Evidence, c: &AnalysisConfig) -> bool {
    c.enable_volume_rule && e.volume_ratio.is_some_and(|r| r > c.volume_spike_ratio)
}

fn recent(e: &Evidence, c: &AnalysisConfig) -> bool {
    e.bars_ago < c.recency_bars
}

pub fn default_rules(config: &AnalysisConfig) -> Vec<ConfluenceRule> {
    let w = &config.weights;
    vec![
        ConfluenceRule { label: "Trend", weight: w.trend, applies_to: None, predicate: trend_aligned },
        ConfluenceRule { label: "Context", weight: w.context, applies_to: None, predicate: context_aligned },
        ConfluenceRule { label: "Fibonacci", weight: w.fibonacci, applies_to: None, predicate: fibonacci },
        ConfluenceRule { label: "EMA", weight: w.ema, applies_to: None, predicate: near_ema },
        ConfluenceRule {
            label: "Overbought",
            weight: w.momentum,
            applies_to: Some(ExtremumKind::High),
            predicate: overbought,
        },
        ConfluenceRule {
            label: "Oversold",
            weight: w.momentum,
            applies_to: Some(ExtremumKind::Low),
            predicate: oversold,
        },
        ConfluenceRule { label: "Volume", weight: w.volume, applies_to: None, predicate: volume_spike },
        ConfluenceRule { label: "Recent", weight: w.recency, applies_to: None, predicate: recent },
    ]
}

#[derive(Debug, Clone, PartialEq)]
pub struct Score {
    pub value: f64,
    pub factors: Vec<String>,
}

pub fn evaluate(evidence: &Evidence, rules: &[ConfluenceRule], config: &AnalysisConfig) -> Score {
    let mut value = BASE_SCORE;
    let mut factors = Vec::new();
    for rule in rules {
        if rule.applies_to.is_some_and(|k| k != evidence.kind) {
            continue;
        }
        if (rule.predicate)(evidence, config) {
            value += rule.weight;
            factors.push(rule.label.to_string());
        }
    }
    Score {
        value: value.clamp(0.0, 100.0),
        factors,
    }
}

/// Up when the last close is above the longest EMA, Down otherwise.
pub fn series_trend(
    series: &PriceSeries,
    indicators: &IndicatorSet,
    config: &AnalysisConfig,
) -> Option<Trend> {
    let period = config.trend_ema_period()?;
    let last = series.len().checked_sub(1)?;
    let ema = indicators.ema(period, last)?;
    let close = series.last()?.close;
    Some(if close > ema { Trend::Up } else { Trend::Down })
}

/// The leg an extremum may be retracing: `(start, end)` where `end` is the most
/// recent earlier extremum of the opposite kind and `start` the most recent
/// same-kind extremum before `end`. Only bars before `candidate` are consulted.
pub fn prior_leg<'a>(
    candidate: &Extremum,
    extrema: &'a [Extremum],
) -> Option<(&'a Extremum, &'a Extremum)> {
    let end = extrema
        .iter()
        .rev()
        .find(|e| e.index < candidate.index && e.kind == candidate.kind.opposite())?;
    let start = extrema
        .iter()
        .rev()
        .find(|e| e.index < end.index && e.kind == candidate.kind)?;
    Some((start, end))
}

pub fn fibonacci_confluence(
    candidate: &Extremum,
    extrema: &[Extremum],
    ratios: &[f64],
    tolerance: f64,
) -> bool {
    let Some((start, end)) = prior_leg(candidate, extrema) else {
        return false;
    };
    let range = start.price - end.price;
    ratios
        .iter()
        .map(|r| end.price + r * range)
        .any(|level| (candidate.price - level).abs() <= tolerance)
}

pub fn gather_evidence(
    extremum: &Extremum,
    series: &PriceSeries,
    indicators: &IndicatorSet,
    detection: &Detection,
    trend: Option<Trend>,
    pair_bias: Bias,
    config: &AnalysisConfig,
) -> Evidence {
    let tolerance = config.confluence_tolerance * detection.dispersion;
    let i = extremum.index;

    let volume_ratio = match (series.get(i).and_then(|p| p.volume), indicators.volume_avg(i)) {
        (Some(v), Some(avg)) if avg > 0.0 => Some(v / avg),
        _ => None,
    };

    Evidence {
        kind: extremum.kind,
        trend,
        pair_bias,
        fibonacci_hit: fibonacci_confluence(
            extremum,
            &detection.extrema,
            &config.fibonacci_levels,
            tolerance,
        ),
        ema_hit: indicators
            .emas_at(i)
            .any(|(_, ema)| (extremum.price - ema).abs() <= tolerance),
        rsi: indicators.rsi(i),
        volume_ratio,
        bars_ago: series.len().saturating_sub(1).saturating_sub(i),
    }
}

/// Scores every detected extremum of one symbol, in detection order.
pub fn score_extrema(
    symbol: &str,
    series: &PriceSeries,
    indicators: &IndicatorSet,
    detection: &Detection,
    signals: &ContextSignals,
    config: &AnalysisConfig,
) -> Vec<(Extremum, Score)> {
    let rules = default_rules(config);
    let trend = series_trend(series, indicators, config);
    let pair_bias = net_pair_bias(symbol, &config.proxies, signals);

    detection
        .extrema
        .iter()
        .map(|e| {
            let evidence =
                gather_evidence(e, series, indicators, detection, trend, pair_bias, config);
            (e.clone(), evaluate(&evidence, &rules, config))
        })
        .collect()
}
