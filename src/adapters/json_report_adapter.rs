//! JSON report adapter implementing ReportPort.
//!
//! Layout: `{"analysis": {SYMBOL: {"trade_plans": [...]}}, "skipped": [...]}`.
//! Plans keep the batch's rank order within each symbol and carry their own
//! timeframe; skipped entries name the (symbol, timeframe) pair that failed.

use crate::domain::error::LevelscanError;
use crate::domain::level::{Direction, LiquidityLevel, TakeProfitTarget};
use crate::domain::pipeline::{BatchReport, SymbolOutcome};
use crate::ports::report_port::ReportPort;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::info;

#[derive(Debug, Serialize)]
struct TradePlan<'a> {
    #[serde(rename = "type")]
    direction: Direction,
    price: f64,
    score: f64,
    thesis: String,
    timeframe: &'a str,
    timestamp: NaiveDateTime,
    zone_high: f64,
    zone_low: f64,
    prominence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_loss: Option<f64>,
    #[serde(skip_serializing_if = "no_targets")]
    take_profit_targets: &'a [TakeProfitTarget],
}

fn no_targets(targets: &&[TakeProfitTarget]) -> bool {
    targets.is_empty()
}

impl<'a> From<&'a LiquidityLevel> for TradePlan<'a> {
    fn from(level: &'a LiquidityLevel) -> Self {
        Self {
            direction: level.direction,
            price: level.source.price,
            score: level.confidence_score,
            thesis: level.thesis(),
            timeframe: &level.timeframe,
            timestamp: level.source.timestamp,
            zone_high: level.zone_high,
            zone_low: level.zone_low,
            prominence: level.source.prominence,
            stop_loss: level.stop_loss,
            take_profit_targets: &level.take_profit_targets,
        }
    }
}

#[derive(Debug, Default, Serialize)]
struct SymbolPlans<'a> {
    trade_plans: Vec<TradePlan<'a>>,
}

#[derive(Debug, Serialize)]
struct Skipped<'a> {
    symbol: &'a str,
    timeframe: &'a str,
    reason: &'a str,
}

#[derive(Debug, Serialize)]
struct ReportDocument<'a> {
    analysis: BTreeMap<&'a str, SymbolPlans<'a>>,
    skipped: Vec<Skipped<'a>>,
}

fn build_document(report: &BatchReport) -> ReportDocument<'_> {
    let mut analysis: BTreeMap<&str, SymbolPlans> = BTreeMap::new();
    for level in &report.levels {
        analysis
            .entry(level.symbol.as_str())
            .or_default()
            .trade_plans
            .push(TradePlan::from(level));
    }

    let skipped = report
        .outcomes
        .iter()
        .filter_map(|o| match o {
            SymbolOutcome::Skipped {
                symbol,
                timeframe,
                reason,
            } => Some(Skipped {
                symbol,
                timeframe,
                reason,
            }),
            SymbolOutcome::Analyzed { .. } => None,
        })
        .collect();

    ReportDocument { analysis, skipped }
}

pub fn render_json(report: &BatchReport) -> Result<String, LevelscanError> {
    serde_json::to_string_pretty(&build_document(report)).map_err(|e| LevelscanError::Report {
        reason: format!("failed to serialize report: {e}"),
    })
}

pub struct JsonReportAdapter;

impl ReportPort for JsonReportAdapter {
    fn write(&self, report: &BatchReport, output_path: &str) -> Result<(), LevelscanError> {
        let json = render_json(report)?;
        let path = Path::new(output_path);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, json)?;
        info!(path = output_path, levels = report.levels.len(), "report written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::extremum::{Extremum, ExtremumKind};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn level(symbol: &str, kind: ExtremumKind, score: f64) -> LiquidityLevel {
        LiquidityLevel {
            symbol: symbol.into(),
            timeframe: "1d".into(),
            direction: Direction::for_kind(kind),
            zone_high: 1.0850,
            zone_low: 1.0830,
            stop_loss: None,
            take_profit_targets: vec![],
            confidence_score: score,
            thesis_factors: vec!["Trend".into(), "Overbought".into()],
            source: Extremum {
                index: 40,
                timestamp: NaiveDate::from_ymd_opt(2024, 6, 3)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap(),
                kind,
                price: 1.0850,
                prominence: 0.004,
                atr_at_point: 0.002,
            },
        }
    }

    fn sample_report() -> BatchReport {
        let mut planned = level("GBPUSD", ExtremumKind::Low, 75.0);
        planned.stop_loss = Some(1.0820);
        planned.take_profit_targets = vec![TakeProfitTarget {
            price: 1.0900,
            reward_risk: 1.67,
        }];
        BatchReport {
            timeframes: vec!["1d".into()],
            outcomes: vec![
                SymbolOutcome::Analyzed {
                    symbol: "EURUSD".into(),
                    timeframe: "1d".into(),
                    candidates: 4,
                },
                SymbolOutcome::Analyzed {
                    symbol: "GBPUSD".into(),
                    timeframe: "1d".into(),
                    candidates: 2,
                },
                SymbolOutcome::Skipped {
                    symbol: "USDJPY".into(),
                    timeframe: "1d".into(),
                    reason: "insufficient data".into(),
                },
            ],
            levels: vec![
                level("EURUSD", ExtremumKind::High, 90.0),
                planned,
                level("EURUSD", ExtremumKind::Low, 60.0),
            ],
        }
    }

    #[test]
    fn groups_plans_by_symbol() {
        let json: serde_json::Value =
            serde_json::from_str(&render_json(&sample_report()).unwrap()).unwrap();

        let eur = json["analysis"]["EURUSD"]["trade_plans"].as_array().unwrap();
        assert_eq!(eur.len(), 2);
        assert_eq!(eur[0]["type"], "SELL");
        assert_eq!(eur[0]["score"], 90.0);
        assert_eq!(eur[0]["thesis"], "Trend + Overbought");
        assert_eq!(eur[1]["type"], "BUY");
        assert!(eur[0].get("stop_loss").is_none());
        assert!(eur[0].get("take_profit_targets").is_none());

        let gbp = &json["analysis"]["GBPUSD"]["trade_plans"][0];
        assert_eq!(gbp["stop_loss"], 1.0820);
        assert_eq!(gbp["take_profit_targets"][0]["price"], 1.0900);
    }

    #[test]
    fn lists_skipped_symbols() {
        let json: serde_json::Value =
            serde_json::from_str(&render_json(&sample_report()).unwrap()).unwrap();
        let skipped = json["skipped"].as_array().unwrap();
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0]["symbol"], "USDJPY");
        assert_eq!(skipped[0]["timeframe"], "1d");
        assert!(json["analysis"].get("USDJPY").is_none());
    }

    #[test]
    fn write_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("levels.json");
        JsonReportAdapter
            .write(&sample_report(), path.to_str().unwrap())
            .unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"analysis\""));
    }
}
