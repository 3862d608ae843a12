//! Symbol universe: parsing the configured symbol and timeframe lists, or
//! discovering symbols from the data source when none are configured.

use crate::domain::error::LevelscanError;
use crate::ports::data_port::DataPort;
use std::collections::{BTreeSet, HashSet};
use tracing::info;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in symbol list")]
    EmptyToken,

    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),

    #[error("no symbols available")]
    Empty,

    #[error("invalid timeframe '{0}'")]
    InvalidTimeframe(String),

    #[error("duplicate timeframe: {0}")]
    DuplicateTimeframe(String),
}

impl From<UniverseError> for LevelscanError {
    fn from(err: UniverseError) -> Self {
        let key = match err {
            UniverseError::InvalidTimeframe(_) | UniverseError::DuplicateTimeframe(_) => {
                "timeframes"
            }
            _ => "symbols",
        };
        LevelscanError::config_invalid("universe", key, err.to_string())
    }
}

pub fn parse_symbols(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let symbol = trimmed.to_uppercase();
        if !seen.insert(symbol.clone()) {
            return Err(UniverseError::DuplicateSymbol(symbol));
        }
        symbols.push(symbol);
    }

    Ok(symbols)
}

/// Timeframe names as given, in order. Names end up in file paths, so path
/// separators are rejected.
pub fn parse_timeframes(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut timeframes = Vec::new();
    for token in input.split(',') {
        let name = token.trim();
        if name.is_empty() || name.contains(['/', '\\']) {
            return Err(UniverseError::InvalidTimeframe(name.to_string()));
        }
        if timeframes.iter().any(|t| t == name) {
            return Err(UniverseError::DuplicateTimeframe(name.to_string()));
        }
        timeframes.push(name.to_string());
    }
    Ok(timeframes)
}

/// The configured list when present, otherwise every symbol the data port
/// offers for any of `timeframes`, sorted.
pub fn resolve_symbols(
    data_port: &dyn DataPort,
    configured: Option<&str>,
    timeframes: &[String],
) -> Result<Vec<String>, LevelscanError> {
    let symbols = match configured.map(str::trim).filter(|s| !s.is_empty()) {
        Some(list) => parse_symbols(list)?,
        None => {
            let mut discovered = BTreeSet::new();
            for timeframe in timeframes {
                discovered.extend(data_port.list_symbols(timeframe)?);
            }
            info!(count = discovered.len(), timeframes = %timeframes.join(","), "discovered symbols");
            discovered.into_iter().collect()
        }
    };

    if symbols.is_empty() {
        return Err(UniverseError::Empty.into());
    }
    Ok(symbols)
}
