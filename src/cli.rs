//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_event_adapter::CsvEventAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::BacktestConfig;
use crate::domain::engine;
use crate::domain::error::TradesightError;
use crate::domain::ohlcv::PriceBar;
use crate::domain::signal::{TemplateId, TemplateParams};
use crate::ports::config_port::ConfigPort;
use crate::ports::event_port::EventPort;
use crate::ports::price_port::PricePort;

#[derive(Parser, Debug)]
#[command(name = "tradesight", about = "Technical signal research and backtesting")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Explain all signal templates for a symbol
    Explain {
        #[arg(long)]
        symbol: String,
        /// Directory holding <symbol>.csv price files
        #[arg(long)]
        data_dir: PathBuf,
        /// Corporate-event calendar CSV
        #[arg(long)]
        events: Option<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Write the JSON report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Backtest one template over the full history
    Backtest {
        #[arg(long)]
        symbol: String,
        /// Template identifier (s1..s5 or long name)
        #[arg(long)]
        template: String,
        #[arg(long)]
        data_dir: PathBuf,
        #[arg(long)]
        events: Option<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Template parameter override, KEY=VALUE, repeatable
        #[arg(long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show the available history for a symbol
    Info {
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        data_dir: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Explain {
            symbol,
            data_dir,
            events,
            config,
            output,
        } => run_explain(&symbol, &data_dir, events.as_ref(), config.as_ref(), output.as_ref()),
        Command::Backtest {
            symbol,
            template,
            data_dir,
            events,
            config,
            params,
            output,
        } => run_backtest(
            &symbol,
            &template,
            &data_dir,
            events.as_ref(),
            config.as_ref(),
            &params,
            output.as_ref(),
        ),
        Command::Info { symbol, data_dir } => run_info(&symbol, &data_dir),
    }
}

fn fail(err: &TradesightError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

fn load_config(path: Option<&PathBuf>) -> Result<Option<FileConfigAdapter>, ExitCode> {
    let Some(path) = path else { return Ok(None) };
    FileConfigAdapter::from_file(path)
        .map(Some)
        .map_err(|e| {
            fail(&TradesightError::ConfigParse {
                file: path.display().to_string(),
                reason: e.to_string(),
            })
        })
}

fn load_bars(data_dir: &PathBuf, symbol: &str) -> Result<Vec<PriceBar>, ExitCode> {
    eprintln!("Loading prices for {symbol} from {}", data_dir.display());
    let adapter = CsvAdapter::new(data_dir.clone());
    adapter.fetch_daily(symbol).map_err(|e| fail(&e))
}

fn load_events(
    path: Option<&PathBuf>,
    symbol: &str,
    config: Option<&FileConfigAdapter>,
) -> Result<BTreeSet<NaiveDate>, ExitCode> {
    let Some(path) = path else {
        return Ok(BTreeSet::new());
    };
    let types = whitelist(config, "types");
    let licenses = whitelist(config, "licenses");
    let adapter = CsvEventAdapter::new(path.clone());
    adapter
        .qualifying_dates(symbol, &types, &licenses)
        .map_err(|e| fail(&e))
}

/// Comma-separated whitelist from the `[events]` section; empty means all.
fn whitelist(config: Option<&FileConfigAdapter>, key: &str) -> Vec<String> {
    config
        .and_then(|c| c.get_string("events", key))
        .map(|raw| {
            raw.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn emit_json<T: Serialize>(value: &T, output: Option<&PathBuf>) -> ExitCode {
    let payload = match serde_json::to_string_pretty(value) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: failed to serialize report: {e}");
            return ExitCode::from(1);
        }
    };
    match output {
        Some(path) => {
            if let Err(e) = fs::write(path, payload) {
                return fail(&TradesightError::Io(e));
            }
            eprintln!("Report written to {}", path.display());
            ExitCode::SUCCESS
        }
        None => {
            println!("{payload}");
            ExitCode::SUCCESS
        }
    }
}

fn run_explain(
    symbol: &str,
    data_dir: &PathBuf,
    events_path: Option<&PathBuf>,
    config_path: Option<&PathBuf>,
    output: Option<&PathBuf>,
) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let bars = match load_bars(data_dir, symbol) {
        Ok(b) => b,
        Err(code) => return code,
    };
    let events = match load_events(events_path, symbol, config.as_ref()) {
        Ok(e) => e,
        Err(code) => return code,
    };

    match engine::explain_signals(&bars, &events) {
        Ok(report) => emit_json(&report, output),
        Err(e) => fail(&e),
    }
}

fn run_backtest(
    symbol: &str,
    template_name: &str,
    data_dir: &PathBuf,
    events_path: Option<&PathBuf>,
    config_path: Option<&PathBuf>,
    param_overrides: &[String],
    output: Option<&PathBuf>,
) -> ExitCode {
    let template = match TemplateId::parse(template_name) {
        Ok(t) => t,
        Err(e) => return fail(&e),
    };
    let params = match parse_param_overrides(param_overrides) {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };

    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let bt_config = match &config {
        Some(adapter) => match BacktestConfig::from_config(adapter) {
            Ok(c) => c,
            Err(e) => return fail(&e),
        },
        None => BacktestConfig::default(),
    };

    let bars = match load_bars(data_dir, symbol) {
        Ok(b) => b,
        Err(code) => return code,
    };
    let events = match load_events(events_path, symbol, config.as_ref()) {
        Ok(e) => e,
        Err(code) => return code,
    };

    eprintln!(
        "Backtesting {} ({}) over {} bars",
        template.code(),
        template.label(),
        bars.len()
    );
    match engine::run_backtest(&bars, template, &params, &bt_config, &events) {
        Ok(report) => emit_json(&report, output),
        Err(e) => fail(&e),
    }
}

pub fn parse_param_overrides(overrides: &[String]) -> Result<TemplateParams, TradesightError> {
    let pairs: Vec<(&str, &str)> = overrides
        .iter()
        .map(|raw| {
            raw.split_once('=')
                .ok_or_else(|| TradesightError::InvalidParameters {
                    key: raw.clone(),
                    reason: "expected KEY=VALUE".into(),
                })
        })
        .collect::<Result<_, _>>()?;
    TemplateParams::from_pairs(pairs)
}

#[derive(Serialize)]
struct SymbolInfo {
    symbol: String,
    bars: usize,
    first: NaiveDate,
    last: NaiveDate,
}

fn run_info(symbol: &str, data_dir: &PathBuf) -> ExitCode {
    let bars = match load_bars(data_dir, symbol) {
        Ok(b) => b,
        Err(code) => return code,
    };
    let (Some(first), Some(last)) = (bars.first(), bars.last()) else {
        return fail(&TradesightError::DataFetch {
            reason: format!("no bars found for {symbol}"),
        });
    };
    let info = SymbolInfo {
        symbol: symbol.to_string(),
        bars: bars.len(),
        first: first.date,
        last: last.date,
    };
    emit_json(&info, None)
}
