//! Swing extremum detection with topographic prominence and spacing filters.
//!
//! Highs are found on the `high` series, lows on the negated `low` series, so
//! one peak finder serves both. Only bars past the indicator warm-up and
//! inside the lookback window can become extrema, but prominence is measured
//! against the whole series. The first and last bars can never be extrema.

use crate::domain::config::{AnalysisConfig, DispersionMethod};
use crate::domain::indicator::stddev::sample_stddev;
use crate::domain::indicator::IndicatorSet;
use crate::domain::ohlcv::PriceSeries;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ExtremumKind {
    High,
    Low,
}

impl ExtremumKind {
    pub fn opposite(self) -> Self {
        match self {
            ExtremumKind::High => ExtremumKind::Low,
            ExtremumKind::Low => ExtremumKind::High,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extremum {
    pub index: usize,
    pub timestamp: NaiveDateTime,
    pub kind: ExtremumKind,
    pub price: f64,
    pub prominence: f64,
    pub atr_at_point: f64,
}

/// A peak on a plain value slice; `index` is relative to that slice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    pub index: usize,
    pub prominence: f64,
}

/// Indices of strict local maxima, boundary points excluded.
pub fn local_maxima(values: &[f64]) -> Vec<usize> {
    if values.len() < 3 {
        return Vec::new();
    }
    (1..values.len() - 1)
        .filter(|&i| values[i] > values[i - 1] && values[i] > values[i + 1])
        .collect()
}

/// Height of `values[peak]` above the higher of the two valley floors found by
/// scanning outward until a strictly higher point (or the slice edge).
pub fn prominence(values: &[f64], peak: usize) -> f64 {
    let height = values[peak];

    let mut left_min = height;
    for &v in values[..peak].iter().rev() {
        if v > height {
            break;
        }
        left_min = left_min.min(v);
    }

    let mut right_min = height;
    for &v in &values[peak + 1..] {
        if v > height {
            break;
        }
        right_min = right_min.min(v);
    }

    height - left_min.max(right_min)
}

/// Keeps peaks by descending prominence (earlier index wins ties); each kept
/// peak suppresses every other peak fewer than `distance` bars away.
/// `peaks` must be ordered by index.
fn enforce_spacing(peaks: Vec<Peak>, distance: usize) -> Vec<Peak> {
    if distance <= 1 || peaks.len() < 2 {
        return peaks;
    }

    let mut order: Vec<usize> = (0..peaks.len()).collect();
    order.sort_by(|&a, &b| {
        peaks[b]
            .prominence
            .total_cmp(&peaks[a].prominence)
            .then(peaks[a].index.cmp(&peaks[b].index))
    });

    let mut keep = vec![true; peaks.len()];
    for &i in &order {
        if !keep[i] {
            continue;
        }
        let centre = peaks[i].index;
        for j in (0..i).rev() {
            if centre - peaks[j].index >= distance {
                break;
            }
            keep[j] = false;
        }
        for j in i + 1..peaks.len() {
            if peaks[j].index - centre >= distance {
                break;
            }
            keep[j] = false;
        }
    }

    peaks
        .into_iter()
        .zip(keep)
        .filter_map(|(p, k)| k.then_some(p))
        .collect()
}

/// Local maxima with prominence >= `threshold`, thinned to `distance` spacing,
/// ordered by index.
pub fn find_peaks(values: &[f64], threshold: f64, distance: usize) -> Vec<Peak> {
    find_peaks_in(values, 0..values.len(), threshold, distance)
}

/// As [`find_peaks`], but only maxima whose index lies in `range` are
/// candidates. Prominence still scans the full slice.
pub fn find_peaks_in(
    values: &[f64],
    range: Range<usize>,
    threshold: f64,
    distance: usize,
) -> Vec<Peak> {
    let candidates = local_maxima(values)
        .into_iter()
        .filter(|i| range.contains(i))
        .map(|i| Peak {
            index: i,
            prominence: prominence(values, i),
        })
        .filter(|p| p.prominence >= threshold)
        .collect();
    enforce_spacing(candidates, distance)
}

/// Bars eligible for detection: past the warm-up and within the lookback.
pub fn detection_window(len: usize, warmup: usize, lookback: usize) -> Range<usize> {
    let start = warmup.max(len.saturating_sub(lookback)).min(len);
    start..len
}

pub fn dispersion(
    series: &PriceSeries,
    indicators: &IndicatorSet,
    window: &Range<usize>,
    method: DispersionMethod,
) -> f64 {
    match method {
        DispersionMethod::StdDevClose => {
            let closes: Vec<f64> = series.points()[window.clone()]
                .iter()
                .map(|p| p.close)
                .collect();
            sample_stddev(&closes)
        }
        DispersionMethod::MeanAtr => {
            let atrs: Vec<f64> = window.clone().filter_map(|i| indicators.atr(i)).collect();
            if atrs.is_empty() {
                0.0
            } else {
                atrs.iter().sum::<f64>() / atrs.len() as f64
            }
        }
    }
}

/// Output of one detection pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub extrema: Vec<Extremum>,
    pub dispersion: f64,
    pub threshold: f64,
    pub window: Range<usize>,
}

pub fn detect_extrema(
    series: &PriceSeries,
    indicators: &IndicatorSet,
    config: &AnalysisConfig,
) -> Detection {
    let window = detection_window(series.len(), indicators.warmup(), config.lookback_window);
    let dispersion = dispersion(series, indicators, &window, config.dispersion);
    let threshold = dispersion * config.prominence_multiplier;

    let points = series.points();
    let highs = series.highs();
    let neg_lows: Vec<f64> = series.lows().iter().map(|v| -v).collect();

    let to_extremum = |peak: Peak, kind: ExtremumKind| {
        let point = &points[peak.index];
        Extremum {
            index: peak.index,
            timestamp: point.timestamp,
            kind,
            price: match kind {
                ExtremumKind::High => point.high,
                ExtremumKind::Low => point.low,
            },
            prominence: peak.prominence,
            atr_at_point: indicators.atr(peak.index).unwrap_or(0.0),
        }
    };

    let distance = config.min_extremum_spacing;
    let mut extrema: Vec<Extremum> = find_peaks_in(&highs, window.clone(), threshold, distance)
        .into_iter()
        .map(|p| to_extremum(p, ExtremumKind::High))
        .chain(
            find_peaks_in(&neg_lows, window.clone(), threshold, distance)
                .into_iter()
                .map(|p| to_extremum(p, ExtremumKind::Low)),
        )
        .collect();
    extrema.sort_by_key(|e| (e.index, e.kind));

    Detection {
        extrema,
        dispersion,
        threshold,
        window,
    }
}
