//! Series normalizer: raw rows with arbitrary column casing into a `PriceSeries`.
//!
//! Required columns are matched case-insensitively. Rows with a missing or
//! non-finite required value, or inconsistent OHLC bounds, are dropped.
//! Duplicate timestamps keep the first row. Nothing is synthesized.

use crate::domain::error::LevelscanError;
use crate::domain::ohlcv::{PricePoint, PriceSeries};
use chrono::NaiveDateTime;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

pub const REQUIRED_FIELDS: [&str; 4] = ["open", "high", "low", "close"];

#[derive(Debug, Clone, PartialEq)]
pub struct RawBar {
    pub timestamp: NaiveDateTime,
    pub fields: HashMap<String, Option<f64>>,
}

impl RawBar {
    pub fn new(timestamp: NaiveDateTime) -> Self {
        Self {
            timestamp,
            fields: HashMap::new(),
        }
    }

    pub fn with(mut self, column: &str, value: Option<f64>) -> Self {
        self.fields.insert(column.to_string(), value);
        self
    }

    fn lowered(&self) -> HashMap<String, Option<f64>> {
        self.fields
            .iter()
            .map(|(k, v)| (k.trim().to_lowercase(), *v))
            .collect()
    }
}

fn finite(value: Option<&Option<f64>>) -> Option<f64> {
    value.copied().flatten().filter(|v| v.is_finite())
}

pub fn normalize(
    symbol: &str,
    rows: &[RawBar],
    min_bars: usize,
) -> Result<PriceSeries, LevelscanError> {
    let lowered: Vec<(NaiveDateTime, HashMap<String, Option<f64>>)> =
        rows.iter().map(|r| (r.timestamp, r.lowered())).collect();

    for field in REQUIRED_FIELDS {
        if !lowered.iter().any(|(_, f)| f.contains_key(field)) {
            return Err(LevelscanError::MissingField {
                symbol: symbol.to_string(),
                field: field.to_string(),
            });
        }
    }

    let mut by_time: BTreeMap<NaiveDateTime, PricePoint> = BTreeMap::new();
    let mut dropped = 0usize;

    for (timestamp, fields) in &lowered {
        let values: Vec<f64> = REQUIRED_FIELDS
            .iter()
            .filter_map(|f| finite(fields.get(*f)))
            .collect();
        let [open, high, low, close] = values.as_slice() else {
            dropped += 1;
            continue;
        };

        let point = PricePoint {
            timestamp: *timestamp,
            open: *open,
            high: *high,
            low: *low,
            close: *close,
            volume: finite(fields.get("volume")),
        };
        if !point.is_consistent() || by_time.contains_key(timestamp) {
            dropped += 1;
            continue;
        }
        by_time.insert(*timestamp, point);
    }

    if dropped > 0 {
        debug!(symbol, dropped, "dropped unusable rows");
    }

    if by_time.len() < min_bars {
        return Err(LevelscanError::DataInsufficient {
            symbol: symbol.to_string(),
            bars: by_time.len(),
            minimum: min_bars,
        });
    }

    PriceSeries::new(by_time.into_values().collect())
}
