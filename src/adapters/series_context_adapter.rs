//! Context adapter that derives a proxy's bias from its own price series.

use crate::domain::config::ContextProxy;
use crate::domain::context::{bias_from_series, Bias};
use crate::domain::error::LevelscanError;
use crate::domain::normalizer::normalize;
use crate::ports::context_port::ContextPort;
use crate::ports::data_port::DataPort;
use tracing::debug;

pub const DEFAULT_CONTEXT_EMA: usize = 50;

/// Bullish when the proxy's last close is above its EMA, Bearish otherwise.
pub struct SeriesContextAdapter<'a> {
    data: &'a dyn DataPort,
    timeframe: String,
    ema_period: usize,
}

impl<'a> SeriesContextAdapter<'a> {
    pub fn new(data: &'a dyn DataPort, timeframe: &str, ema_period: usize) -> Self {
        Self {
            data,
            timeframe: timeframe.to_string(),
            ema_period,
        }
    }
}

impl ContextPort for SeriesContextAdapter<'_> {
    fn resolve(&self, proxy: &ContextProxy) -> Result<Bias, LevelscanError> {
        let unavailable = |e: LevelscanError| LevelscanError::ContextUnavailable {
            proxy: proxy.name.clone(),
            reason: e.to_string(),
        };

        let rows = self
            .data
            .fetch_raw(&proxy.ticker, &self.timeframe)
            .map_err(unavailable)?;
        let series = normalize(&proxy.ticker, &rows, self.ema_period).map_err(unavailable)?;
        let bias = bias_from_series(&series, self.ema_period);
        debug!(proxy = %proxy.name, ?bias, "resolved context");
        Ok(bias)
    }
}
