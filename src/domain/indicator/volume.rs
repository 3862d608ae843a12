//! Rolling simple mean of volume over the n bars ending at each bar.
//!
//! Undefined for the first (n-1) bars and for any window containing a bar
//! without volume.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::PricePoint;

pub fn calculate_volume_sma(points: &[PricePoint], period: usize) -> IndicatorSeries {
    if period == 0 {
        return IndicatorSeries::undefined(IndicatorType::VolumeSma(period), points.len());
    }

    let values = (0..points.len())
        .map(|i| {
            if i + 1 < period {
                return None;
            }
            let window = &points[i + 1 - period..=i];
            let sum: Option<f64> = window.iter().map(|p| p.volume).sum();
            sum.map(|s| s / period as f64)
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::VolumeSma(period),
        values,
    }
}
