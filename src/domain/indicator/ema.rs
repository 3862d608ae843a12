//! Exponential Moving Average.
//!
//! k = 2/(n+1), seeded with the first close, then EMA[i] = C[i]*k + EMA[i-1]*(1-k).
//! Warmup: first (n-1) bars are undefined.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::PricePoint;

pub fn calculate_ema(points: &[PricePoint], period: usize) -> IndicatorSeries {
    if period == 0 || points.is_empty() {
        return IndicatorSeries::undefined(IndicatorType::Ema(period), points.len());
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut ema = points[0].close;
    let mut values = Vec::with_capacity(points.len());

    for (i, point) in points.iter().enumerate() {
        if i > 0 {
            ema = point.close * k + ema * (1.0 - k);
        }
        values.push(if i + 1 >= period { Some(ema) } else { None });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Ema(period),
        values,
    }
}
