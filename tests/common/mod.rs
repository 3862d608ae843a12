#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use levelscan::domain::config::AnalysisConfig;
use levelscan::domain::error::LevelscanError;
pub use levelscan::domain::normalizer::RawBar;
use levelscan::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<RawBar>>,
    pub by_timeframe: HashMap<(String, String), Vec<RawBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            by_timeframe: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<RawBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    /// Bars served only for `timeframe`; other timeframes fall back to `with_bars` data.
    pub fn with_timeframe_bars(mut self, symbol: &str, timeframe: &str, bars: Vec<RawBar>) -> Self {
        self.by_timeframe
            .insert((symbol.to_string(), timeframe.to_string()), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_raw(&self, symbol: &str, timeframe: &str) -> Result<Vec<RawBar>, LevelscanError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(LevelscanError::DataSource {
                reason: reason.clone(),
            });
        }
        if let Some(bars) = self
            .by_timeframe
            .get(&(symbol.to_string(), timeframe.to_string()))
        {
            return Ok(bars.clone());
        }
        self.data
            .get(symbol)
            .cloned()
            .ok_or_else(|| LevelscanError::DataSource {
                reason: format!("no data for {symbol}"),
            })
    }

    fn list_symbols(&self, timeframe: &str) -> Result<Vec<String>, LevelscanError> {
        let mut symbols: Vec<String> = self
            .data
            .keys()
            .cloned()
            .chain(
                self.by_timeframe
                    .keys()
                    .filter(|(_, tf)| tf == timeframe)
                    .map(|(symbol, _)| symbol.clone()),
            )
            .collect();
        symbols.sort();
        symbols.dedup();
        Ok(symbols)
    }
}

pub fn timestamp(day: i64) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2023, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + Duration::days(day)
}

/// Bars around `closes` with a fixed wick on both sides.
pub fn bars_from_closes(closes: &[f64], wick: f64) -> Vec<RawBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            RawBar::new(timestamp(i as i64))
                .with("Open", Some(open))
                .with("High", Some(open.max(close) + wick))
                .with("Low", Some(open.min(close) - wick))
                .with("Close", Some(close))
                .with("Volume", Some(1000.0 + (i % 7) as f64 * 150.0))
        })
        .collect()
}

/// An oscillating series with drift; enough swings for every rule to matter.
pub fn swing_closes(len: usize, base: f64, amplitude: f64, drift: f64) -> Vec<f64> {
    (0..len)
        .map(|i| {
            let t = i as f64;
            base + amplitude * (t * 0.3).sin() + 0.4 * amplitude * (t * 0.11).cos() + drift * t
        })
        .collect()
}

/// Short indicator windows so modest fixtures clear the warm-up.
pub fn fast_config() -> AnalysisConfig {
    AnalysisConfig {
        lookback_window: 150,
        ema_periods: vec![10, 30],
        atr_period: 7,
        rsi_period: 7,
        min_extremum_spacing: 3,
        ..AnalysisConfig::default()
    }
}
