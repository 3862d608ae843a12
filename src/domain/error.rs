//! Domain error types.

/// Top-level error type for levelscan.
#[derive(Debug, thiserror::Error)]
pub enum LevelscanError {
    #[error("insufficient data for {symbol}: have {bars} bars, need {minimum}")]
    DataInsufficient {
        symbol: String,
        bars: usize,
        minimum: usize,
    },

    #[error("missing required field '{field}' for {symbol}")]
    MissingField { symbol: String, field: String },

    #[error("context proxy {proxy} unavailable: {reason}")]
    ContextUnavailable { proxy: String, reason: String },

    #[error("invalid price series: {reason}")]
    InvalidSeries { reason: String },

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl LevelscanError {
    pub(crate) fn config_invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        LevelscanError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&LevelscanError> for std::process::ExitCode {
    fn from(err: &LevelscanError) -> Self {
        let code: u8 = match err {
            LevelscanError::Io(_) | LevelscanError::Report { .. } => 1,
            LevelscanError::ConfigParse { .. }
            | LevelscanError::ConfigMissing { .. }
            | LevelscanError::ConfigInvalid { .. } => 2,
            LevelscanError::DataSource { .. } | LevelscanError::InvalidSeries { .. } => 3,
            LevelscanError::ContextUnavailable { .. } => 4,
            LevelscanError::DataInsufficient { .. } | LevelscanError::MissingField { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
