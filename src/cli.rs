//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use tracing::{error, info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report_adapter::{render_json, JsonReportAdapter};
use crate::adapters::series_context_adapter::{SeriesContextAdapter, DEFAULT_CONTEXT_EMA};
use crate::domain::config::{
    AnalysisConfig, ContextProxy, DispersionMethod, RuleWeights, SelectionMode,
};
use crate::domain::config_validation::{validate_analysis_config, validate_universe_config};
use crate::domain::context::build_context_signals;
use crate::domain::error::LevelscanError;
use crate::domain::pipeline::analyze_batch;
use crate::domain::universe::{parse_timeframes, resolve_symbols};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

pub const DEFAULT_TIMEFRAME: &str = "1d";

#[derive(Parser, Debug)]
#[command(name = "levelscan", about = "Liquidity level detection and confluence scoring")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Detect, score and rank liquidity levels
    Analyze {
        #[arg(short, long)]
        config: PathBuf,
        /// Report path; JSON goes to stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Analyze a single symbol instead of the configured universe
        #[arg(long)]
        symbol: Option<String>,
        /// Timeframe to analyze; repeat to pool several into one ranking
        #[arg(long = "timeframe")]
        timeframes: Vec<String>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List symbols available in the data directory
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        timeframe: Option<String>,
    },
}

/// Installs a stderr `tracing` subscriber; `RUST_LOG` overrides the INFO default.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::filter::EnvFilter::builder()
                .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init()
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Analyze {
            config,
            output,
            symbol,
            timeframes,
            dry_run,
        } => {
            if dry_run {
                run_dry_run(&config, symbol.as_deref(), &timeframes)
            } else {
                run_analyze(&config, output.as_deref(), symbol.as_deref(), &timeframes)
            }
        }
        Command::Validate { config } => run_validate(&config),
        Command::ListSymbols { config, timeframe } => {
            run_list_symbols(&config, timeframe.as_deref())
        }
    }
}

fn fail(err: &LevelscanError) -> ExitCode {
    error!("{err}");
    err.into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    info!(path = %path.display(), "loading config");
    FileConfigAdapter::from_file(path).map_err(|e| fail(&e))
}

/// `[universe]` settings with command-line overrides applied.
#[derive(Debug, Clone, PartialEq)]
pub struct UniverseSettings {
    pub symbols: Option<String>,
    pub timeframes: Vec<String>,
    pub data_dir: PathBuf,
}

impl UniverseSettings {
    /// The first timeframe; context proxies are resolved on it.
    pub fn primary_timeframe(&self) -> &str {
        self.timeframes
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_TIMEFRAME)
    }
}

/// Command-line timeframes win; otherwise `[universe] timeframes`, then the
/// single `timeframe` key, then the daily default.
fn resolve_timeframes(
    adapter: &dyn ConfigPort,
    overrides: &[String],
) -> Result<Vec<String>, LevelscanError> {
    if !overrides.is_empty() {
        return Ok(parse_timeframes(&overrides.join(","))?);
    }
    for key in ["timeframes", "timeframe"] {
        if let Some(list) = adapter.get_string("universe", key) {
            return parse_timeframes(&list)
                .map_err(|e| LevelscanError::config_invalid("universe", key, e.to_string()));
        }
    }
    Ok(vec![DEFAULT_TIMEFRAME.to_string()])
}

pub fn build_universe_settings(
    adapter: &dyn ConfigPort,
    symbol: Option<&str>,
    timeframes: &[String],
) -> Result<UniverseSettings, LevelscanError> {
    let data_dir = adapter
        .get_string("universe", "data_dir")
        .ok_or_else(|| LevelscanError::ConfigMissing {
            section: "universe".into(),
            key: "data_dir".into(),
        })?;
    Ok(UniverseSettings {
        symbols: symbol
            .map(str::to_string)
            .or_else(|| adapter.get_string("universe", "symbols")),
        timeframes: resolve_timeframes(adapter, timeframes)?,
        data_dir: PathBuf::from(data_dir),
    })
}

fn get_usize(
    adapter: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, LevelscanError> {
    let value = adapter.get_int(section, key, default as i64);
    usize::try_from(value).map_err(|_| {
        LevelscanError::config_invalid(section, key, format!("{key} must be non-negative"))
    })
}

fn get_parsed_list<T: FromStr>(
    adapter: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<Vec<T>>, LevelscanError> {
    adapter
        .get_list(section, key)
        .map(|items| {
            items
                .iter()
                .map(|item| {
                    item.parse::<T>().map_err(|_| {
                        LevelscanError::config_invalid(section, key, format!("invalid entry '{item}'"))
                    })
                })
                .collect()
        })
        .transpose()
}

fn build_weights(adapter: &dyn ConfigPort) -> RuleWeights {
    let d = RuleWeights::default();
    RuleWeights {
        trend: adapter.get_double("scoring", "weight_trend", d.trend),
        context: adapter.get_double("scoring", "weight_context", d.context),
        fibonacci: adapter.get_double("scoring", "weight_fibonacci", d.fibonacci),
        ema: adapter.get_double("scoring", "weight_ema", d.ema),
        momentum: adapter.get_double("scoring", "weight_momentum", d.momentum),
        volume: adapter.get_double("scoring", "weight_volume", d.volume),
        recency: adapter.get_double("scoring", "weight_recency", d.recency),
    }
}

fn build_selection(adapter: &dyn ConfigPort) -> Result<SelectionMode, LevelscanError> {
    let mode = adapter
        .get_string("selection", "mode")
        .unwrap_or_else(|| "per_symbol".to_string());
    match mode.trim().to_lowercase().as_str() {
        "per_symbol" => Ok(SelectionMode::PerSymbol {
            top_n_per_side: get_usize(adapter, "selection", "top_n_per_side", 5)?,
        }),
        "global" => Ok(SelectionMode::Global {
            top_n: get_usize(adapter, "selection", "top_n", 5)?,
        }),
        other => Err(LevelscanError::config_invalid(
            "selection",
            "mode",
            format!("unknown mode '{other}'"),
        )),
    }
}

fn build_proxies(adapter: &dyn ConfigPort) -> Result<Option<Vec<ContextProxy>>, LevelscanError> {
    adapter
        .get_list("context", "proxies")
        .map(|entries| {
            entries
                .iter()
                .map(|entry| {
                    ContextProxy::parse(entry).ok_or_else(|| {
                        LevelscanError::config_invalid(
                            "context",
                            "proxies",
                            format!("invalid proxy '{entry}'"),
                        )
                    })
                })
                .collect()
        })
        .transpose()
}

pub fn build_analysis_config(adapter: &dyn ConfigPort) -> Result<AnalysisConfig, LevelscanError> {
    let d = AnalysisConfig::default();

    let dispersion = match adapter.get_string("analysis", "dispersion") {
        Some(raw) => DispersionMethod::parse(&raw).ok_or_else(|| {
            LevelscanError::config_invalid("analysis", "dispersion", format!("unknown method '{raw}'"))
        })?,
        None => d.dispersion,
    };

    Ok(AnalysisConfig {
        lookback_window: get_usize(adapter, "analysis", "lookback_window", d.lookback_window)?,
        ema_periods: get_parsed_list(adapter, "analysis", "ema_periods")?.unwrap_or(d.ema_periods),
        atr_period: get_usize(adapter, "analysis", "atr_period", d.atr_period)?,
        rsi_period: get_usize(adapter, "analysis", "rsi_period", d.rsi_period)?,
        dispersion,
        prominence_multiplier: adapter.get_double(
            "analysis",
            "prominence_multiplier",
            d.prominence_multiplier,
        ),
        min_extremum_spacing: get_usize(
            adapter,
            "analysis",
            "min_extremum_spacing",
            d.min_extremum_spacing,
        )?,
        fibonacci_levels: get_parsed_list(adapter, "analysis", "fibonacci_levels")?
            .unwrap_or(d.fibonacci_levels),
        confluence_tolerance: adapter.get_double(
            "analysis",
            "confluence_tolerance",
            d.confluence_tolerance,
        ),
        overbought: adapter.get_double("analysis", "overbought", d.overbought),
        oversold: adapter.get_double("analysis", "oversold", d.oversold),
        volume_period: get_usize(adapter, "analysis", "volume_period", d.volume_period)?,
        volume_spike_ratio: adapter.get_double(
            "analysis",
            "volume_spike_ratio",
            d.volume_spike_ratio,
        ),
        recency_bars: get_usize(adapter, "analysis", "recency_bars", d.recency_bars)?,
        weights: build_weights(adapter),
        score_floor: adapter.get_double("scoring", "score_floor", d.score_floor),
        selection: build_selection(adapter)?,
        enable_volume_rule: adapter.get_bool("analysis", "enable_volume_rule", d.enable_volume_rule),
        enable_trade_plan: adapter.get_bool("trade_plan", "enabled", d.enable_trade_plan),
        stop_atr_fraction: adapter.get_double(
            "trade_plan",
            "stop_atr_fraction",
            d.stop_atr_fraction,
        ),
        max_targets: get_usize(adapter, "trade_plan", "max_targets", d.max_targets)?,
        proxies: build_proxies(adapter)?.unwrap_or(d.proxies),
    })
}

pub fn context_ema_period(adapter: &dyn ConfigPort) -> Result<usize, LevelscanError> {
    get_usize(adapter, "context", "ema_period", DEFAULT_CONTEXT_EMA)
}

/// Validates every section, then builds the typed settings.
pub fn prepare(
    adapter: &dyn ConfigPort,
    symbol: Option<&str>,
    timeframes: &[String],
) -> Result<(UniverseSettings, AnalysisConfig), LevelscanError> {
    validate_universe_config(adapter)?;
    validate_analysis_config(adapter)?;
    let universe = build_universe_settings(adapter, symbol, timeframes)?;
    let analysis = build_analysis_config(adapter)?;
    Ok((universe, analysis))
}

fn run_analyze(
    config_path: &Path,
    output: Option<&Path>,
    symbol: Option<&str>,
    timeframes: &[String],
) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let (universe, config) = match prepare(&adapter, symbol, timeframes) {
        Ok(settings) => settings,
        Err(e) => return fail(&e),
    };
    let context_ema = match context_ema_period(&adapter) {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };

    let data = CsvAdapter::new(universe.data_dir.clone());
    let symbols = match resolve_symbols(&data, universe.symbols.as_deref(), &universe.timeframes) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    let context = SeriesContextAdapter::new(&data, universe.primary_timeframe(), context_ema);
    let signals = build_context_signals(&context, &config.proxies);
    for (proxy, bias) in signals.iter() {
        info!(proxy, ?bias, "context signal");
    }

    let report = analyze_batch(&data, &symbols, &universe.timeframes, &signals, &config);

    if report.outcomes.iter().all(|o| o.is_skipped()) {
        error!("no symbol could be analyzed");
        return ExitCode::from(5);
    }

    let written = match output {
        Some(path) => JsonReportAdapter.write(&report, &path.to_string_lossy()),
        None => render_json(&report).map(|json| println!("{json}")),
    };
    match written {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(&e),
    }
}

pub fn run_dry_run(config_path: &Path, symbol: Option<&str>, timeframes: &[String]) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let (universe, config) = match prepare(&adapter, symbol, timeframes) {
        Ok(settings) => settings,
        Err(e) => return fail(&e),
    };

    info!(
        timeframes = %universe.timeframes.join(","),
        data_dir = %universe.data_dir.display(),
        minimum_bars = config.longest_window(),
        selection = ?config.selection,
        trade_plan = config.enable_trade_plan,
        "configuration is valid"
    );

    let data = CsvAdapter::new(universe.data_dir.clone());
    match resolve_symbols(&data, universe.symbols.as_deref(), &universe.timeframes) {
        Ok(symbols) => {
            info!(symbols = %symbols.join(", "), "universe");
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    match prepare(&adapter, None, &[]).and_then(|_| context_ema_period(&adapter)) {
        Ok(_) => {
            info!("config validated successfully");
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn run_list_symbols(config_path: &Path, timeframe: Option<&str>) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let overrides: Vec<String> = timeframe.into_iter().map(str::to_string).collect();
    let universe = match build_universe_settings(&adapter, None, &overrides) {
        Ok(u) => u,
        Err(e) => return fail(&e),
    };

    let data = CsvAdapter::new(universe.data_dir.clone());
    let mut symbols = BTreeSet::new();
    for timeframe in &universe.timeframes {
        match data.list_symbols(timeframe) {
            Ok(found) => symbols.extend(found),
            Err(e) => return fail(&e),
        }
    }

    if symbols.is_empty() {
        warn!(timeframes = %universe.timeframes.join(","), "no symbols found");
    } else {
        for symbol in &symbols {
            println!("{}", symbol);
        }
        info!(count = symbols.len(), "symbols found");
    }
    ExitCode::SUCCESS
}
