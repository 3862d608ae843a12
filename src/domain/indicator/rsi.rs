//! RSI (Relative Strength Index) with Wilder's smoothing.
//!
//! - First average: simple mean of gains/losses over the first n changes
//! - Subsequent: avg = (prev_avg * (n-1) + current) / n  (alpha = 1/n)
//!
//! RSI = 100 - (100 / (1 + avg_gain / avg_loss)); if avg_loss == 0, RSI = 100.
//! Warmup: first n bars are undefined (n changes are needed for the seed).

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::PricePoint;

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}

pub fn calculate_rsi(points: &[PricePoint], period: usize) -> IndicatorSeries {
    if period == 0 || points.len() <= period {
        return IndicatorSeries::undefined(IndicatorType::Rsi(period), points.len());
    }

    let (gains, losses): (Vec<f64>, Vec<f64>) = points
        .windows(2)
        .map(|w| {
            let change = w[1].close - w[0].close;
            (change.max(0.0), (-change).max(0.0))
        })
        .unzip();

    let n = period as f64;
    let mut avg_gain = gains[..period].iter().sum::<f64>() / n;
    let mut avg_loss = losses[..period].iter().sum::<f64>() / n;

    let mut values = vec![None; period];
    values.push(Some(rsi_value(avg_gain, avg_loss)));

    for (gain, loss) in gains[period..].iter().zip(&losses[period..]) {
        avg_gain = (avg_gain * (n - 1.0) + gain) / n;
        avg_loss = (avg_loss * (n - 1.0) + loss) / n;
        values.push(Some(rsi_value(avg_gain, avg_loss)));
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Rsi(period),
        values,
    }
}
