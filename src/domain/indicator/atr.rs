//! Average True Range with Wilder smoothing.
//!
//! TR[0] = high - low, TR[i] = true_range(prev_close).
//! Seed: mean of the first n true ranges, then ATR[i] = (ATR[i-1]*(n-1) + TR[i]) / n,
//! i.e. an exponential average with alpha = 1/n.
//! Warmup: first (n-1) bars are undefined.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::PricePoint;

pub fn calculate_atr(points: &[PricePoint], period: usize) -> IndicatorSeries {
    if period == 0 || points.len() < period {
        return IndicatorSeries::undefined(IndicatorType::Atr(period), points.len());
    }

    let tr: Vec<f64> = points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            if i == 0 {
                p.high - p.low
            } else {
                p.true_range(points[i - 1].close)
            }
        })
        .collect();

    let n = period as f64;
    let mut values = vec![None; period - 1];
    let mut atr = tr[..period].iter().sum::<f64>() / n;
    values.push(Some(atr));

    for &range in &tr[period..] {
        atr = (atr * (n - 1.0) + range) / n;
        values.push(Some(atr));
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Atr(period),
        values,
    }
}
