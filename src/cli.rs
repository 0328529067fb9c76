//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::curve_csv_adapter::CurveCsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::text_report_adapter::TextReportAdapter;
use crate::domain::config_validation::{
    parse_date, validate_data_config, validate_statistics_config, validate_strategy_config,
};
use crate::domain::distribution::FitterKind;
use crate::domain::error::BackstatError;
use crate::domain::ohlcv::PriceSeries;
use crate::domain::report::{Evaluation, EvaluationRequest};
use crate::domain::strategy::{SmaTrend, StrategyKind};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "backstat", about = "Return statistics for position signals")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Evaluate a strategy over one symbol's price history
    Evaluate {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        exchange: Option<String>,
        /// First date (YYYY-MM-DD), overrides [data] start_date
        #[arg(long)]
        start: Option<String>,
        /// Last date (YYYY-MM-DD), overrides [data] end_date
        #[arg(long)]
        end: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List available symbols on an exchange
    ListSymbols {
        #[arg(long)]
        exchange: String,
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show data range for a symbol
    Info {
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        exchange: Option<String>,
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub code: Option<String>,
    pub exchange: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub output: Option<PathBuf>,
}

/// Everything an evaluation run needs, resolved from config and overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub data_path: PathBuf,
    pub code: String,
    pub exchange: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub strategy: StrategyKind,
    pub fitter: FitterKind,
    pub output: Option<PathBuf>,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Evaluate {
            config,
            code,
            exchange,
            start,
            end,
            output,
            dry_run,
        } => {
            let overrides = Overrides {
                code,
                exchange,
                start,
                end,
                output,
            };
            if dry_run {
                run_dry_run(&config, &overrides)
            } else {
                run_evaluate(&config, &overrides)
            }
        }
        Command::Validate { config } => run_validate(&config),
        Command::ListSymbols { exchange, config } => run_list_symbols(&exchange, &config),
        Command::Info {
            code,
            exchange,
            config,
        } => run_info(code.as_deref(), exchange.as_deref(), &config),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })
}

fn fail(err: BackstatError) -> ExitCode {
    eprintln!("error: {err}");
    (&err).into()
}

pub fn build_strategy(config: &dyn ConfigPort) -> Result<StrategyKind, BackstatError> {
    validate_strategy_config(config)?;
    let kind = config
        .get_string("strategy", "kind")
        .unwrap_or_else(|| "sma_trend".to_string());

    if kind.trim().eq_ignore_ascii_case("buy_and_hold") {
        return Ok(StrategyKind::BuyAndHold);
    }
    let defaults = SmaTrend::default();
    Ok(StrategyKind::SmaTrend(SmaTrend {
        period: config.get_int("strategy", "period", defaults.period as i64) as usize,
        long: config.get_double("strategy", "long", defaults.long),
        short: config.get_double("strategy", "short", defaults.short),
    }))
}

pub fn build_fitter(config: &dyn ConfigPort) -> Result<FitterKind, BackstatError> {
    validate_statistics_config(config)?;
    Ok(config
        .get_string("statistics", "fitter")
        .and_then(|s| FitterKind::parse(&s))
        .unwrap_or_default())
}

fn required(
    config: &dyn ConfigPort,
    key: &str,
    override_value: Option<&str>,
) -> Result<String, BackstatError> {
    override_value
        .map(str::to_string)
        .or_else(|| config.get_string("data", key))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| BackstatError::ConfigMissing {
            section: "data".into(),
            key: key.into(),
        })
}

pub fn build_run_settings(
    config: &dyn ConfigPort,
    overrides: &Overrides,
) -> Result<RunSettings, BackstatError> {
    let data_path = required(config, "path", None)?;
    let code = required(config, "code", overrides.code.as_deref())?.to_uppercase();
    let exchange = required(config, "exchange", overrides.exchange.as_deref())?.to_uppercase();

    let start_date = match overrides.start.as_deref() {
        Some(s) => parse_date(Some(s), "start_date")?,
        None => config.get_date("start_date")?,
    };
    let end_date = match overrides.end.as_deref() {
        Some(s) => parse_date(Some(s), "end_date")?,
        None => config.get_date("end_date")?,
    };
    if start_date > end_date {
        return Err(BackstatError::ConfigInvalid {
            section: "data".into(),
            key: "start_date".into(),
            reason: "start_date must not be after end_date".into(),
        });
    }

    let output = overrides
        .output
        .clone()
        .or_else(|| config.get_string("report", "output").map(PathBuf::from));

    Ok(RunSettings {
        data_path: PathBuf::from(data_path),
        code,
        exchange,
        start_date,
        end_date,
        strategy: build_strategy(config)?,
        fitter: build_fitter(config)?,
        output,
    })
}

/// Report writer for an output path: `.csv` selects the curve writer,
/// anything else the text summary.
pub fn report_writer(path: &Path) -> Box<dyn ReportPort> {
    let is_csv = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if is_csv {
        Box::new(CurveCsvAdapter)
    } else {
        Box::new(TextReportAdapter)
    }
}

/// Fetch, evaluate and return the result without printing anything.
pub fn evaluate(data_port: &dyn DataPort, settings: &RunSettings) -> Result<Evaluation, BackstatError> {
    let bars = data_port.fetch_ohlcv(
        &settings.code,
        &settings.exchange,
        settings.start_date,
        settings.end_date,
    )?;
    if bars.is_empty() {
        return Err(BackstatError::NoData {
            code: settings.code.clone(),
            exchange: settings.exchange.clone(),
        });
    }

    let prices = PriceSeries::new(bars)?;
    EvaluationRequest::new(prices, settings.strategy.build())
        .with_fitter(settings.fitter.build())
        .run()
}

pub fn run_evaluation_pipeline(data_port: &dyn DataPort, settings: &RunSettings) -> ExitCode {
    let label = format!("{}.{}", settings.code, settings.exchange);
    eprintln!(
        "Evaluating {} on {}: {} to {}",
        settings.strategy.build().name(),
        label,
        settings.start_date,
        settings.end_date,
    );

    let evaluation = match evaluate(data_port, settings) {
        Ok(e) => e,
        Err(e) => return fail(e),
    };
    if evaluation.report.discarded > 0 {
        eprintln!(
            "warning: {} non-finite returns discarded",
            evaluation.report.discarded
        );
    }

    match TextReportAdapter.render(&evaluation, &label) {
        Ok(summary) => print!("{summary}"),
        Err(e) => return fail(e),
    }

    if let Some(path) = &settings.output {
        if let Err(e) = report_writer(path).write(&evaluation, &label, path) {
            return fail(e);
        }
        eprintln!("Report written to {}", path.display());
    }

    ExitCode::SUCCESS
}

fn run_evaluate(config_path: &Path, overrides: &Overrides) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let settings = match build_run_settings(&config, overrides) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };

    let data_port = CsvAdapter::new(settings.data_path.clone());
    run_evaluation_pipeline(&data_port, &settings)
}

fn run_dry_run(config_path: &Path, overrides: &Overrides) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let settings = match build_run_settings(&config, overrides) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };

    eprintln!("\nData:");
    eprintln!("  path:     {}", settings.data_path.display());
    eprintln!("  symbol:   {}.{}", settings.code, settings.exchange);
    eprintln!("  range:    {} to {}", settings.start_date, settings.end_date);
    eprintln!("\nStrategy:");
    match &settings.strategy {
        StrategyKind::SmaTrend(s) => eprintln!(
            "  sma_trend: period {}, long {}, short {}",
            s.period, s.long, s.short
        ),
        StrategyKind::BuyAndHold => eprintln!("  buy_and_hold"),
    }
    eprintln!("\nFitter: {:?}", settings.fitter);
    if let Some(path) = &settings.output {
        eprintln!("Output: {}", path.display());
    }

    eprintln!("\nDry run complete: configuration is valid");
    ExitCode::SUCCESS
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let checks = [
        ("data", validate_data_config(&config)),
        ("strategy", validate_strategy_config(&config)),
        ("statistics", validate_statistics_config(&config)),
    ];
    for (section, result) in checks {
        match result {
            Ok(()) => eprintln!("  [{section}] ok"),
            Err(e) => return fail(e),
        }
    }

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn data_port_from(config: &dyn ConfigPort) -> Result<CsvAdapter, BackstatError> {
    let path = required(config, "path", None)?;
    Ok(CsvAdapter::new(PathBuf::from(path)))
}

fn run_list_symbols(exchange: &str, config_path: &Path) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let adapter = match data_port_from(&config) {
        Ok(a) => a,
        Err(e) => return fail(e),
    };

    let exchange = exchange.to_uppercase();
    let symbols = match adapter.list_symbols(&exchange) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };

    if symbols.is_empty() {
        eprintln!("No symbols found for exchange {}", exchange);
    } else {
        for symbol in &symbols {
            println!("{}", symbol);
        }
        eprintln!("{} symbols found", symbols.len());
    }
    ExitCode::SUCCESS
}

fn run_info(code: Option<&str>, exchange: Option<&str>, config_path: &Path) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let adapter = match data_port_from(&config) {
        Ok(a) => a,
        Err(e) => return fail(e),
    };

    let (code, exchange) = match (
        required(&config, "code", code),
        required(&config, "exchange", exchange),
    ) {
        (Ok(c), Ok(e)) => (c.to_uppercase(), e.to_uppercase()),
        (Err(e), _) | (_, Err(e)) => return fail(e),
    };

    match adapter.get_data_range(&code, &exchange) {
        Ok(Some((min_date, max_date, count))) => {
            println!(
                "{}.{}: {} bars, {} to {}",
                code, exchange, count, min_date, max_date
            );
            ExitCode::SUCCESS
        }
        Ok(None) => {
            eprintln!("{}.{}: no data found", code, exchange);
            (&BackstatError::NoData { code, exchange }).into()
        }
        Err(e) => fail(e),
    }
}
