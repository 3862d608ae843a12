//! Immutable analysis configuration passed into the pipeline entry point.

use serde::Serialize;

/// How the prominence threshold's volatility measure is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DispersionMethod {
    /// Sample standard deviation of closes over the detection window.
    StdDevClose,
    /// Mean ATR over the detection window.
    MeanAtr,
}

impl DispersionMethod {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "stddev" | "std" | "stddev_close" => Some(DispersionMethod::StdDevClose),
            "atr" | "mean_atr" => Some(DispersionMethod::MeanAtr),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SelectionMode {
    PerSymbol { top_n_per_side: usize },
    Global { top_n: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RuleWeights {
    pub trend: f64,
    pub context: f64,
    pub fibonacci: f64,
    pub ema: f64,
    pub momentum: f64,
    pub volume: f64,
    pub recency: f64,
}

impl Default for RuleWeights {
    fn default() -> Self {
        Self {
            trend: 25.0,
            context: 25.0,
            fibonacci: 15.0,
            ema: 10.0,
            momentum: 15.0,
            volume: 10.0,
            recency: 10.0,
        }
    }
}

/// A correlated instrument whose bias feeds the context rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextProxy {
    /// Name used as the key in `ContextSignals`, e.g. `DXY`.
    pub name: String,
    /// Symbol the data port fetches for this proxy.
    pub ticker: String,
    /// Currency the proxy tracks, e.g. `USD`.
    pub currency: String,
}

impl ContextProxy {
    /// Parses `NAME:TICKER:CURRENCY`.
    pub fn parse(spec: &str) -> Option<Self> {
        let parts: Vec<&str> = spec.split(':').map(str::trim).collect();
        match parts.as_slice() {
            [name, ticker, currency]
                if !name.is_empty() && !ticker.is_empty() && currency.len() == 3 =>
            {
                Some(Self {
                    name: name.to_string(),
                    ticker: ticker.to_string(),
                    currency: currency.to_uppercase(),
                })
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisConfig {
    pub lookback_window: usize,
    pub ema_periods: Vec<usize>,
    pub atr_period: usize,
    pub rsi_period: usize,
    pub dispersion: DispersionMethod,
    pub prominence_multiplier: f64,
    pub min_extremum_spacing: usize,
    pub fibonacci_levels: Vec<f64>,
    /// Fibonacci and EMA proximity, as a fraction of dispersion.
    pub confluence_tolerance: f64,
    pub overbought: f64,
    pub oversold: f64,
    pub volume_period: usize,
    pub volume_spike_ratio: f64,
    pub recency_bars: usize,
    pub weights: RuleWeights,
    pub score_floor: f64,
    pub selection: SelectionMode,
    pub enable_volume_rule: bool,
    pub enable_trade_plan: bool,
    pub stop_atr_fraction: f64,
    pub max_targets: usize,
    pub proxies: Vec<ContextProxy>,
}

pub const BASE_SCORE: f64 = 50.0;

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            lookback_window: 250,
            ema_periods: vec![50, 200],
            atr_period: 14,
            rsi_period: 14,
            dispersion: DispersionMethod::StdDevClose,
            prominence_multiplier: 0.5,
            min_extremum_spacing: 5,
            fibonacci_levels: vec![0.382, 0.5, 0.618],
            confluence_tolerance: 0.25,
            overbought: 65.0,
            oversold: 35.0,
            volume_period: 20,
            volume_spike_ratio: 1.5,
            recency_bars: 30,
            weights: RuleWeights::default(),
            score_floor: 0.0,
            selection: SelectionMode::PerSymbol { top_n_per_side: 5 },
            enable_volume_rule: false,
            enable_trade_plan: false,
            stop_atr_fraction: 0.5,
            max_targets: 3,
            proxies: vec![ContextProxy {
                name: "DXY".into(),
                ticker: "DX-Y.NYB".into(),
                currency: "USD".into(),
            }],
        }
    }
}

impl AnalysisConfig {
    /// The longest indicator window; series shorter than this are rejected.
    pub fn longest_window(&self) -> usize {
        let ema_max = self.ema_periods.iter().copied().max().unwrap_or(0);
        let mut longest = ema_max.max(self.atr_period).max(self.rsi_period);
        if self.enable_volume_rule {
            longest = longest.max(self.volume_period);
        }
        longest
    }

    /// The longest configured EMA period, used for the trend rule.
    pub fn trend_ema_period(&self) -> Option<usize> {
        self.ema_periods.iter().copied().max()
    }
}
