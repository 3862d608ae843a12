//! Technical indicators aligned to a price series.
//!
//! - `IndicatorType`: indicator identity + parameters
//! - `IndicatorSeries`: one value per bar, `None` inside the warm-up window
//! - `IndicatorSet`: everything the detector and scorer read for one run

pub mod atr;
pub mod ema;
pub mod rsi;
pub mod stddev;
pub mod volume;

use crate::domain::config::AnalysisConfig;
use crate::domain::ohlcv::PriceSeries;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndicatorType {
    Ema(usize),
    Atr(usize),
    Rsi(usize),
    VolumeSma(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<Option<f64>>,
}

impl IndicatorSeries {
    pub fn undefined(indicator_type: IndicatorType, len: usize) -> Self {
        Self {
            indicator_type,
            values: vec![None; len],
        }
    }

    pub fn at(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().flatten()
    }

    /// Index of the first defined value.
    pub fn first_valid(&self) -> Option<usize> {
        self.values.iter().position(Option::is_some)
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Atr(period) => write!(f, "ATR({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::VolumeSma(period) => write!(f, "VOLUME_SMA({})", period),
        }
    }
}

/// Indicators for one analysis run. Built once, never mutated.
#[derive(Debug, Clone)]
pub struct IndicatorSet {
    emas: BTreeMap<usize, IndicatorSeries>,
    atr: IndicatorSeries,
    rsi: IndicatorSeries,
    volume_avg: IndicatorSeries,
    len: usize,
}

impl IndicatorSet {
    pub fn compute(series: &PriceSeries, config: &AnalysisConfig) -> Self {
        let points = series.points();
        let emas = config
            .ema_periods
            .iter()
            .map(|&p| (p, ema::calculate_ema(points, p)))
            .collect();
        Self {
            emas,
            atr: atr::calculate_atr(points, config.atr_period),
            rsi: rsi::calculate_rsi(points, config.rsi_period),
            volume_avg: volume::calculate_volume_sma(points, config.volume_period),
            len: points.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn ema(&self, period: usize, index: usize) -> Option<f64> {
        self.emas.get(&period).and_then(|s| s.at(index))
    }

    /// Every configured EMA value defined at `index`, shortest period first.
    pub fn emas_at(&self, index: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.emas
            .iter()
            .filter_map(move |(&p, s)| s.at(index).map(|v| (p, v)))
    }

    pub fn atr(&self, index: usize) -> Option<f64> {
        self.atr.at(index)
    }

    pub fn rsi(&self, index: usize) -> Option<f64> {
        self.rsi.at(index)
    }

    pub fn volume_avg(&self, index: usize) -> Option<f64> {
        self.volume_avg.at(index)
    }

    /// First index at which EMA, ATR and RSI are all defined.
    /// Returns `len` when some indicator never becomes defined.
    pub fn warmup(&self) -> usize {
        self.emas
            .values()
            .chain([&self.atr, &self.rsi])
            .map(|s| s.first_valid().unwrap_or(self.len))
            .max()
            .unwrap_or(0)
    }
}
