//! Market-context signals from correlated proxies and their mapping onto a pair.

use crate::domain::config::ContextProxy;
use crate::domain::indicator::ema::calculate_ema;
use crate::domain::ohlcv::PriceSeries;
use crate::ports::context_port::ContextPort;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Bias {
    Bullish,
    Bearish,
    Unknown,
}

impl Bias {
    pub fn inverted(self) -> Self {
        match self {
            Bias::Bullish => Bias::Bearish,
            Bias::Bearish => Bias::Bullish,
            Bias::Unknown => Bias::Unknown,
        }
    }
}

/// Proxy name → bias, built once per batch and shared read-only.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContextSignals {
    signals: BTreeMap<String, Bias>,
}

impl ContextSignals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, proxy: &str, bias: Bias) -> Self {
        self.signals.insert(proxy.to_string(), bias);
        self
    }

    /// Missing proxies read as `Unknown`.
    pub fn get(&self, proxy: &str) -> Bias {
        self.signals.get(proxy).copied().unwrap_or(Bias::Unknown)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Bias)> {
        self.signals.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}

/// A six-letter currency pair such as `EURUSD`, `EUR/USD` or `EURUSD=X`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyPair {
    pub base: String,
    pub quote: String,
}

impl CurrencyPair {
    pub fn parse(symbol: &str) -> Option<Self> {
        let upper = symbol.trim().to_uppercase();
        let cleaned: String = upper
            .trim_end_matches("=X")
            .chars()
            .filter(|c| !matches!(c, '/' | '_' | '-'))
            .collect();
        if cleaned.len() != 6 || !cleaned.chars().all(|c| c.is_ascii_alphabetic()) {
            return None;
        }
        Some(Self {
            base: cleaned[..3].to_string(),
            quote: cleaned[3..].to_string(),
        })
    }
}

/// Direction a proxy's bias implies for the pair itself.
///
/// A strengthening base currency lifts the pair; a strengthening quote
/// currency depresses it. A proxy on neither side says nothing.
pub fn pair_bias(pair: &CurrencyPair, proxy_currency: &str, proxy_bias: Bias) -> Bias {
    if pair.base.eq_ignore_ascii_case(proxy_currency) {
        proxy_bias
    } else if pair.quote.eq_ignore_ascii_case(proxy_currency) {
        proxy_bias.inverted()
    } else {
        Bias::Unknown
    }
}

/// Net pair bias from every resolvable proxy: the majority wins, ties and
/// unparsable symbols are `Unknown`.
pub fn net_pair_bias(symbol: &str, proxies: &[ContextProxy], signals: &ContextSignals) -> Bias {
    let Some(pair) = CurrencyPair::parse(symbol) else {
        return Bias::Unknown;
    };
    let votes: i32 = proxies
        .iter()
        .map(|p| match pair_bias(&pair, &p.currency, signals.get(&p.name)) {
            Bias::Bullish => 1,
            Bias::Bearish => -1,
            Bias::Unknown => 0,
        })
        .sum();
    match votes.signum() {
        1 => Bias::Bullish,
        -1 => Bias::Bearish,
        _ => Bias::Unknown,
    }
}

/// Bullish when the last close sits above its EMA, Bearish otherwise;
/// Unknown when the EMA is not yet defined.
pub fn bias_from_series(series: &PriceSeries, ema_period: usize) -> Bias {
    let ema = calculate_ema(series.points(), ema_period);
    let last = series.len().checked_sub(1);
    match (last.and_then(|i| ema.at(i)), series.last()) {
        (Some(ema), Some(bar)) if bar.close > ema => Bias::Bullish,
        (Some(_), Some(_)) => Bias::Bearish,
        _ => Bias::Unknown,
    }
}

/// Resolves every proxy through the port; failures degrade to `Unknown`.
pub fn build_context_signals(port: &dyn ContextPort, proxies: &[ContextProxy]) -> ContextSignals {
    proxies
        .iter()
        .fold(ContextSignals::new(), |signals, proxy| match port.resolve(proxy) {
            Ok(bias) => signals.with(&proxy.name, bias),
            Err(e) => {
                warn!(proxy = %proxy.name, error = %e, "context degraded to Unknown");
                signals.with(&proxy.name, Bias::Unknown)
            }
        })
}
