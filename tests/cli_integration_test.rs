//! CLI integration tests.
//!
//! Tests cover:
//! - Config parsing (build_analysis_config, build_universe_settings)
//! - Validation through `prepare`
//! - Dispatch of `validate`, `list-symbols`, `analyze --dry-run` and `analyze`
//!   against real INI and CSV files on disk

mod common;

use common::*;
use levelscan::adapters::file_config_adapter::FileConfigAdapter;
use levelscan::cli::{self, Cli, Command};
use levelscan::domain::config::{AnalysisConfig, DispersionMethod, SelectionMode};
use levelscan::domain::error::LevelscanError;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tempfile::TempDir;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

const VALID_INI: &str = r#"
[universe]
symbols = EURUSD, GBPUSD
timeframe = 4h
data_dir = /var/data/fx

[analysis]
lookback_window = 300
ema_periods = 21, 50, 200
atr_period = 10
rsi_period = 9
dispersion = atr
prominence_multiplier = 0.8
min_extremum_spacing = 4
fibonacci_levels = 0.5, 0.618
confluence_tolerance = 0.3
overbought = 70
oversold = 30
volume_period = 10
volume_spike_ratio = 2.0
recency_bars = 15
enable_volume_rule = true

[scoring]
weight_trend = 20
weight_context = 30
score_floor = 55

[selection]
mode = global
top_n = 8

[trade_plan]
enabled = yes
stop_atr_fraction = 0.25
max_targets = 2

[context]
proxies = DXY:DX-Y.NYB:USD, EXY:EXY:EUR
ema_period = 34
"#;

mod config_loading {
    use super::*;

    #[test]
    fn build_analysis_config_valid_full() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let config = cli::build_analysis_config(&adapter).unwrap();

        assert_eq!(config.lookback_window, 300);
        assert_eq!(config.ema_periods, vec![21, 50, 200]);
        assert_eq!(config.atr_period, 10);
        assert_eq!(config.rsi_period, 9);
        assert_eq!(config.dispersion, DispersionMethod::MeanAtr);
        assert!((config.prominence_multiplier - 0.8).abs() < f64::EPSILON);
        assert_eq!(config.min_extremum_spacing, 4);
        assert_eq!(config.fibonacci_levels, vec![0.5, 0.618]);
        assert!((config.overbought - 70.0).abs() < f64::EPSILON);
        assert!((config.oversold - 30.0).abs() < f64::EPSILON);
        assert_eq!(config.volume_period, 10);
        assert_eq!(config.recency_bars, 15);
        assert!(config.enable_volume_rule);
        assert!((config.weights.trend - 20.0).abs() < f64::EPSILON);
        assert!((config.weights.context - 30.0).abs() < f64::EPSILON);
        assert!((config.weights.fibonacci - 15.0).abs() < f64::EPSILON);
        assert!((config.score_floor - 55.0).abs() < f64::EPSILON);
        assert_eq!(config.selection, SelectionMode::Global { top_n: 8 });
        assert!(config.enable_trade_plan);
        assert!((config.stop_atr_fraction - 0.25).abs() < f64::EPSILON);
        assert_eq!(config.max_targets, 2);
        assert_eq!(config.proxies.len(), 2);
        assert_eq!(config.proxies[1].currency, "EUR");
    }

    #[test]
    fn build_analysis_config_uses_defaults() {
        let adapter = FileConfigAdapter::from_string("[universe]\ndata_dir = d\n").unwrap();
        let config = cli::build_analysis_config(&adapter).unwrap();
        assert_eq!(config, AnalysisConfig::default());
    }

    #[test]
    fn per_symbol_selection_reads_side_limit() {
        let adapter =
            FileConfigAdapter::from_string("[selection]\nmode = per_symbol\ntop_n_per_side = 3\n")
                .unwrap();
        let config = cli::build_analysis_config(&adapter).unwrap();
        assert_eq!(config.selection, SelectionMode::PerSymbol { top_n_per_side: 3 });
    }

    #[test]
    fn negative_period_is_invalid() {
        let adapter = FileConfigAdapter::from_string("[analysis]\natr_period = -3\n").unwrap();
        let err = cli::build_analysis_config(&adapter).unwrap_err();
        assert!(matches!(err, LevelscanError::ConfigInvalid { key, .. } if key == "atr_period"));
    }

    #[test]
    fn context_ema_period_defaults_to_fifty() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        assert_eq!(cli::context_ema_period(&adapter).unwrap(), 34);
        let adapter = FileConfigAdapter::from_string("[context]\n").unwrap();
        assert_eq!(cli::context_ema_period(&adapter).unwrap(), 50);
    }
}

mod universe_settings {
    use super::*;

    #[test]
    fn reads_universe_section() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let settings = cli::build_universe_settings(&adapter, None, &[]).unwrap();
        assert_eq!(settings.symbols.as_deref(), Some("EURUSD, GBPUSD"));
        assert_eq!(settings.timeframes, vec!["4h"]);
        assert_eq!(settings.data_dir, PathBuf::from("/var/data/fx"));
    }

    #[test]
    fn overrides_take_precedence() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let overrides = vec!["1d".to_string(), "1h".to_string()];
        let settings = cli::build_universe_settings(&adapter, Some("USDJPY"), &overrides).unwrap();
        assert_eq!(settings.symbols.as_deref(), Some("USDJPY"));
        assert_eq!(settings.timeframes, overrides);
        assert_eq!(settings.primary_timeframe(), "1d");
    }

    #[test]
    fn timeframe_defaults_to_daily() {
        let adapter = FileConfigAdapter::from_string("[universe]\ndata_dir = d\n").unwrap();
        let settings = cli::build_universe_settings(&adapter, None, &[]).unwrap();
        assert_eq!(settings.timeframes, vec![cli::DEFAULT_TIMEFRAME]);
        assert_eq!(settings.symbols, None);
    }

    #[test]
    fn timeframes_list_wins_over_single_key() {
        let ini = "[universe]\ndata_dir = d\ntimeframe = 1d\ntimeframes = 4h, 1d\n";
        let adapter = FileConfigAdapter::from_string(ini).unwrap();
        let settings = cli::build_universe_settings(&adapter, None, &[]).unwrap();
        assert_eq!(settings.timeframes, vec!["4h", "1d"]);
        assert_eq!(settings.primary_timeframe(), "4h");
    }

    #[test]
    fn duplicate_timeframe_override_is_invalid() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let overrides = vec!["1d".to_string(), "1d".to_string()];
        let err = cli::build_universe_settings(&adapter, None, &overrides).unwrap_err();
        assert!(matches!(err, LevelscanError::ConfigInvalid { key, .. } if key == "timeframes"));
    }

    #[test]
    fn missing_data_dir_is_error() {
        let adapter = FileConfigAdapter::from_string("[universe]\nsymbols = EURUSD\n").unwrap();
        let err = cli::build_universe_settings(&adapter, None, &[]).unwrap_err();
        assert!(matches!(err, LevelscanError::ConfigMissing { key, .. } if key == "data_dir"));
    }

    #[test]
    fn prepare_rejects_invalid_values() {
        let ini = "[universe]\ndata_dir = d\n\n[analysis]\noverbought = 20\noversold = 80\n";
        let adapter = FileConfigAdapter::from_string(ini).unwrap();
        assert!(matches!(
            cli::prepare(&adapter, None, &[]),
            Err(LevelscanError::ConfigInvalid { .. })
        ));
    }
}

mod commands {
    use super::*;

    fn write_csv(dir: &Path, symbol: &str, timeframe: &str, closes: &[f64]) {
        let mut content = String::from("date,open,high,low,close,volume\n");
        for (i, &close) in closes.iter().enumerate() {
            let open = if i == 0 { close } else { closes[i - 1] };
            content.push_str(&format!(
                "{},{:.5},{:.5},{:.5},{:.5},1000\n",
                timestamp(i as i64).format("%Y-%m-%d"),
                open,
                open.max(close) + 0.0008,
                open.min(close) - 0.0008,
                close
            ));
        }
        fs::write(dir.join(format!("{symbol}_{timeframe}.csv")), content).unwrap();
    }

    fn workspace() -> (TempDir, tempfile::NamedTempFile) {
        let dir = TempDir::new().unwrap();
        write_csv(dir.path(), "EURUSD", "1d", &swing_closes(200, 1.10, 0.015, 0.0001));
        write_csv(dir.path(), "GBPUSD", "1d", &swing_closes(200, 1.27, 0.02, -0.0001));
        write_csv(dir.path(), "DX-Y.NYB", "1d", &swing_closes(200, 104.0, 1.0, 0.02));
        let ini = format!(
            "[universe]\nsymbols = EURUSD, GBPUSD\ndata_dir = {}\n\n\
             [analysis]\nlookback_window = 150\nema_periods = 10, 30\natr_period = 7\n\
             rsi_period = 7\nmin_extremum_spacing = 3\n\n\
             [context]\nproxies = DXY:DX-Y.NYB:USD\nema_period = 20\n",
            dir.path().display()
        );
        (dir, write_temp_ini(&ini))
    }

    fn run(command: Command) -> ExitCode {
        cli::run(Cli { command })
    }

    fn assert_exit(code: ExitCode, expected: u8) {
        assert_eq!(format!("{code:?}"), format!("{:?}", ExitCode::from(expected)));
    }

    #[test]
    fn validate_accepts_good_config() {
        let (_dir, ini) = workspace();
        let code = run(Command::Validate {
            config: ini.path().to_path_buf(),
        });
        assert_exit(code, 0);
    }

    #[test]
    fn validate_rejects_bad_config_with_config_exit_code() {
        let ini = write_temp_ini("[universe]\ndata_dir = d\n\n[selection]\nmode = best\n");
        let code = run(Command::Validate {
            config: ini.path().to_path_buf(),
        });
        assert_exit(code, 2);
    }

    #[test]
    fn missing_config_file_fails() {
        let code = run(Command::Validate {
            config: PathBuf::from("/nonexistent/levelscan.ini"),
        });
        assert_exit(code, 2);
    }

    #[test]
    fn list_symbols_succeeds() {
        let (_dir, ini) = workspace();
        let code = run(Command::ListSymbols {
            config: ini.path().to_path_buf(),
            timeframe: None,
        });
        assert_exit(code, 0);
    }

    #[test]
    fn dry_run_does_not_write_report() {
        let (dir, ini) = workspace();
        let out = dir.path().join("levels.json");
        let code = run(Command::Analyze {
            config: ini.path().to_path_buf(),
            output: Some(out.clone()),
            symbol: None,
            timeframes: vec![],
            dry_run: true,
        });
        assert_exit(code, 0);
        assert!(!out.exists());
    }

    #[test]
    fn analyze_writes_report() {
        let (dir, ini) = workspace();
        let out = dir.path().join("reports").join("levels.json");
        let code = run(Command::Analyze {
            config: ini.path().to_path_buf(),
            output: Some(out.clone()),
            symbol: None,
            timeframes: vec![],
            dry_run: false,
        });
        assert_exit(code, 0);

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        assert!(json["analysis"]["EURUSD"]["trade_plans"].is_array());
        assert!(json["analysis"]["GBPUSD"]["trade_plans"].is_array());
        assert_eq!(json["skipped"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn analyze_single_symbol_override() {
        let (dir, ini) = workspace();
        let out = dir.path().join("eur.json");
        let code = run(Command::Analyze {
            config: ini.path().to_path_buf(),
            output: Some(out.clone()),
            symbol: Some("EURUSD".into()),
            timeframes: vec![],
            dry_run: false,
        });
        assert_exit(code, 0);

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        assert!(json["analysis"].get("GBPUSD").is_none());
    }

    #[test]
    fn analyze_pools_timeframes_globally() {
        let (dir, _ini) = workspace();
        write_csv(dir.path(), "EURUSD", "4h", &swing_closes(200, 1.10, 0.015, -0.0001));
        write_csv(dir.path(), "DX-Y.NYB", "4h", &swing_closes(200, 104.0, 0.5, 0.01));
        let ini = write_temp_ini(&format!(
            "[universe]\nsymbols = EURUSD\ntimeframes = 1d, 4h\ndata_dir = {}\n\n\
             [analysis]\nlookback_window = 150\nema_periods = 10, 30\natr_period = 7\n\
             rsi_period = 7\nmin_extremum_spacing = 3\n\n\
             [selection]\nmode = global\ntop_n = 200\n\n\
             [context]\nproxies = DXY:DX-Y.NYB:USD\nema_period = 20\n",
            dir.path().display()
        ));
        let out = dir.path().join("pooled.json");
        let code = run(Command::Analyze {
            config: ini.path().to_path_buf(),
            output: Some(out.clone()),
            symbol: None,
            timeframes: vec![],
            dry_run: false,
        });
        assert_exit(code, 0);

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        let plans = json["analysis"]["EURUSD"]["trade_plans"].as_array().unwrap();
        assert!(plans.iter().any(|p| p["timeframe"] == "1d"));
        assert!(plans.iter().any(|p| p["timeframe"] == "4h"));
        let scores: Vec<f64> = plans.iter().map(|p| p["score"].as_f64().unwrap()).collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn missing_timeframe_data_is_reported_per_pair() {
        let (dir, ini) = workspace();
        let out = dir.path().join("partial.json");
        let code = run(Command::Analyze {
            config: ini.path().to_path_buf(),
            output: Some(out.clone()),
            symbol: Some("EURUSD".into()),
            timeframes: vec!["1d".into(), "1h".into()],
            dry_run: false,
        });
        assert_exit(code, 0);

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        let skipped = json["skipped"].as_array().unwrap();
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0]["symbol"], "EURUSD");
        assert_eq!(skipped[0]["timeframe"], "1h");
    }

    #[test]
    fn analyze_with_no_usable_symbols_fails() {
        let (_dir, ini) = workspace();
        let code = run(Command::Analyze {
            config: ini.path().to_path_buf(),
            output: None,
            symbol: Some("AUDUSD".into()),
            timeframes: vec![],
            dry_run: false,
        });
        assert_exit(code, 5);
    }
}
