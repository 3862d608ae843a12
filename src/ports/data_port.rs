//! Market data access port.

use crate::domain::error::LevelscanError;
use crate::domain::normalizer::RawBar;

/// Source of raw, un-normalized bars. Shared across batch workers.
pub trait DataPort: Send + Sync {
    fn fetch_raw(&self, symbol: &str, timeframe: &str) -> Result<Vec<RawBar>, LevelscanError>;

    fn list_symbols(&self, timeframe: &str) -> Result<Vec<String>, LevelscanError>;
}
