//! CSV file data adapter.
//!
//! Reads `{base_path}/{SYMBOL}_{timeframe}.csv`. Columns are located by header
//! name in any casing; cleaning is left to the normalizer.

use crate::domain::error::LevelscanError;
use crate::domain::normalizer::RawBar;
use crate::ports::data_port::DataPort;
use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

const DATE_COLUMNS: [&str; 3] = ["date", "datetime", "timestamp"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str, timeframe: &str) -> PathBuf {
        self.base_path.join(format!("{}_{}.csv", symbol, timeframe))
    }
}

fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(value, f).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn parse_value(value: &str) -> Option<f64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    value.parse().ok()
}

impl DataPort for CsvAdapter {
    fn fetch_raw(&self, symbol: &str, timeframe: &str) -> Result<Vec<RawBar>, LevelscanError> {
        let path = self.csv_path(symbol, timeframe);
        let content = fs::read_to_string(&path).map_err(|e| LevelscanError::DataSource {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers: Vec<String> = rdr
            .headers()
            .map_err(|e| LevelscanError::DataSource {
                reason: format!("CSV header error in {}: {}", path.display(), e),
            })?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let date_col = headers
            .iter()
            .position(|h| DATE_COLUMNS.contains(&h.to_lowercase().as_str()))
            .ok_or_else(|| LevelscanError::DataSource {
                reason: format!("no date column in {}", path.display()),
            })?;

        let mut rows = Vec::new();
        let mut unparsed = 0usize;

        for result in rdr.records() {
            let record = result.map_err(|e| LevelscanError::DataSource {
                reason: format!("CSV parse error: {}", e),
            })?;

            let Some(timestamp) = record.get(date_col).and_then(parse_timestamp) else {
                unparsed += 1;
                continue;
            };

            let bar = headers
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != date_col)
                .fold(RawBar::new(timestamp), |bar, (i, name)| {
                    bar.with(name, record.get(i).and_then(parse_value))
                });
            rows.push(bar);
        }

        if unparsed > 0 {
            debug!(symbol, unparsed, "rows with unparsable timestamps skipped");
        }
        debug!(symbol, timeframe, rows = rows.len(), path = %path.display(), "read csv");
        Ok(rows)
    }

    fn list_symbols(&self, timeframe: &str) -> Result<Vec<String>, LevelscanError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| LevelscanError::DataSource {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let suffix = format!("_{}.csv", timeframe);
        let mut symbols = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| LevelscanError::DataSource {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            if let Some(symbol) = name_str.strip_suffix(&suffix) {
                if !symbol.is_empty() {
                    symbols.push(symbol.to_string());
                }
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
