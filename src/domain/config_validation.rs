//! Configuration validation.
//!
//! Validates INI values before a run so that bad settings fail fast with the
//! offending section and key, rather than surfacing as odd analysis output.

use crate::domain::config::{ContextProxy, DispersionMethod};
use crate::domain::error::LevelscanError;
use crate::domain::universe::parse_timeframes;
use crate::ports::config_port::ConfigPort;

pub fn validate_universe_config(config: &dyn ConfigPort) -> Result<(), LevelscanError> {
    match config.get_string("universe", "data_dir") {
        Some(s) if !s.trim().is_empty() => {}
        _ => {
            return Err(LevelscanError::ConfigMissing {
                section: "universe".to_string(),
                key: "data_dir".to_string(),
            });
        }
    }
    for key in ["timeframes", "timeframe"] {
        if let Some(list) = config.get_string("universe", key) {
            parse_timeframes(&list)
                .map_err(|e| LevelscanError::config_invalid("universe", key, e.to_string()))?;
        }
    }
    Ok(())
}

pub fn validate_analysis_config(config: &dyn ConfigPort) -> Result<(), LevelscanError> {
    validate_periods(config)?;
    validate_detection(config)?;
    validate_momentum(config)?;
    validate_scoring(config)?;
    validate_selection(config)?;
    validate_trade_plan(config)?;
    validate_context(config)?;
    Ok(())
}

/// Integer value that must parse and be at least `min`.
fn int_at_least(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    min: i64,
) -> Result<(), LevelscanError> {
    let Some(raw) = config.get_string(section, key) else {
        return Ok(());
    };
    match raw.trim().parse::<i64>() {
        Ok(v) if v >= min => Ok(()),
        Ok(_) => Err(LevelscanError::config_invalid(
            section,
            key,
            format!("{key} must be at least {min}"),
        )),
        Err(_) => Err(LevelscanError::config_invalid(
            section,
            key,
            format!("{key} must be an integer"),
        )),
    }
}

fn float_value(config: &dyn ConfigPort, section: &str, key: &str) -> Result<Option<f64>, LevelscanError> {
    let Some(raw) = config.get_string(section, key) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(Some)
        .ok_or_else(|| LevelscanError::config_invalid(section, key, format!("{key} must be a number")))
}

fn float_at_least(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    min: f64,
) -> Result<(), LevelscanError> {
    match float_value(config, section, key)? {
        Some(v) if v < min => Err(LevelscanError::config_invalid(
            section,
            key,
            format!("{key} must be at least {min}"),
        )),
        _ => Ok(()),
    }
}

fn validate_periods(config: &dyn ConfigPort) -> Result<(), LevelscanError> {
    int_at_least(config, "analysis", "lookback_window", 3)?;
    int_at_least(config, "analysis", "atr_period", 1)?;
    int_at_least(config, "analysis", "rsi_period", 1)?;
    int_at_least(config, "analysis", "volume_period", 1)?;

    if let Some(raw) = config.get_string("analysis", "ema_periods") {
        let periods: Vec<Option<usize>> = raw
            .split(',')
            .map(|p| p.trim().parse::<usize>().ok().filter(|&p| p > 0))
            .collect();
        if periods.is_empty() || periods.iter().any(Option::is_none) {
            return Err(LevelscanError::config_invalid(
                "analysis",
                "ema_periods",
                "ema_periods must be a comma-separated list of positive integers",
            ));
        }
    }
    Ok(())
}

fn validate_detection(config: &dyn ConfigPort) -> Result<(), LevelscanError> {
    float_at_least(config, "analysis", "prominence_multiplier", 0.0)?;
    int_at_least(config, "analysis", "min_extremum_spacing", 1)?;
    float_at_least(config, "analysis", "confluence_tolerance", 0.0)?;

    if let Some(raw) = config.get_string("analysis", "dispersion") {
        if DispersionMethod::parse(&raw).is_none() {
            return Err(LevelscanError::config_invalid(
                "analysis",
                "dispersion",
                "dispersion must be stddev or atr",
            ));
        }
    }

    if let Some(raw) = config.get_string("analysis", "fibonacci_levels") {
        let valid = raw.split(',').all(|r| {
            r.trim()
                .parse::<f64>()
                .is_ok_and(|r| r > 0.0 && r < 1.0)
        });
        if !valid {
            return Err(LevelscanError::config_invalid(
                "analysis",
                "fibonacci_levels",
                "fibonacci_levels must be ratios between 0 and 1",
            ));
        }
    }
    Ok(())
}

fn validate_momentum(config: &dyn ConfigPort) -> Result<(), LevelscanError> {
    let overbought = float_value(config, "analysis", "overbought")?.unwrap_or(65.0);
    let oversold = float_value(config, "analysis", "oversold")?.unwrap_or(35.0);
    if !(0.0..=100.0).contains(&overbought) {
        return Err(LevelscanError::config_invalid(
            "analysis",
            "overbought",
            "overbought must be between 0 and 100",
        ));
    }
    if !(0.0..=100.0).contains(&oversold) {
        return Err(LevelscanError::config_invalid(
            "analysis",
            "oversold",
            "oversold must be between 0 and 100",
        ));
    }
    if oversold >= overbought {
        return Err(LevelscanError::config_invalid(
            "analysis",
            "oversold",
            "oversold must be below overbought",
        ));
    }
    float_at_least(config, "analysis", "volume_spike_ratio", 0.0)?;
    int_at_least(config, "analysis", "recency_bars", 0)?;
    Ok(())
}

fn validate_scoring(config: &dyn ConfigPort) -> Result<(), LevelscanError> {
    for key in [
        "weight_trend",
        "weight_context",
        "weight_fibonacci",
        "weight_ema",
        "weight_momentum",
        "weight_volume",
        "weight_recency",
    ] {
        float_value(config, "scoring", key)?;
    }
    if let Some(floor) = float_value(config, "scoring", "score_floor")? {
        if !(0.0..=100.0).contains(&floor) {
            return Err(LevelscanError::config_invalid(
                "scoring",
                "score_floor",
                "score_floor must be between 0 and 100",
            ));
        }
    }
    Ok(())
}

fn validate_selection(config: &dyn ConfigPort) -> Result<(), LevelscanError> {
    if let Some(mode) = config.get_string("selection", "mode") {
        if !matches!(mode.trim().to_lowercase().as_str(), "per_symbol" | "global") {
            return Err(LevelscanError::config_invalid(
                "selection",
                "mode",
                "mode must be per_symbol or global",
            ));
        }
    }
    int_at_least(config, "selection", "top_n_per_side", 1)?;
    int_at_least(config, "selection", "top_n", 1)?;
    Ok(())
}

fn validate_trade_plan(config: &dyn ConfigPort) -> Result<(), LevelscanError> {
    float_at_least(config, "trade_plan", "stop_atr_fraction", 0.0)?;
    int_at_least(config, "trade_plan", "max_targets", 1)?;
    Ok(())
}

fn validate_context(config: &dyn ConfigPort) -> Result<(), LevelscanError> {
    int_at_least(config, "context", "ema_period", 1)?;
    if let Some(raw) = config.get_string("context", "proxies") {
        for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            if ContextProxy::parse(entry).is_none() {
                return Err(LevelscanError::config_invalid(
                    "context",
                    "proxies",
                    format!("invalid proxy '{entry}', expected NAME:TICKER:CCY"),
                ));
            }
        }
    }
    Ok(())
}
