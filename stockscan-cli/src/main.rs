//! Stockscan CLI: run the daily stock scan once.
//!
//! Loads tickers, fetches daily bars (Yahoo Finance, or a local CSV directory
//! with `--bars-dir`), computes signals, writes CSV/HTML artifacts, and
//! e-mails them when SMTP is configured.
//!
//! Exit codes: 0 success, 2 configuration, 3 artifact write, 4 delivery,
//! 1 anything else.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use stockscan_core::data::{CsvDirProvider, DataProvider, LogProgress, YahooProvider};
use stockscan_runner::{
    run_pipeline, ConfigError, DeliveryStatus, Notifier, RunError, RunSummary, ScanConfig,
    SmtpNotifier,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "stockscan",
    about = "Daily stock scan: golden cross, volume anomaly, trend filter"
)]
struct Cli {
    /// TOML config file with [scan] and [signals] sections.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Ticker list, one symbol per line. Overrides TICKERS_FILE.
    #[arg(long)]
    tickers: Option<PathBuf>,

    /// Directory for the CSV/HTML report. Overrides OUTPUT_DIR.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Calendar days of history to request per ticker.
    #[arg(long)]
    lookback_days: Option<u32>,

    /// Read `<DIR>/<TICKER>.csv` instead of fetching from Yahoo Finance.
    #[arg(long)]
    bars_dir: Option<PathBuf>,

    /// Write the report but do not send e-mail.
    #[arg(long, default_value_t = false)]
    no_email: bool,
}

fn main() {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();
    init_logging();

    if let Err(err) = run(&cli) {
        eprintln!("Error: {err:#}");
        std::process::exit(exit_code(&err));
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("stockscan=info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let config = build_config(cli)?;

    let provider: Box<dyn DataProvider> = match &cli.bars_dir {
        Some(dir) => Box::new(CsvDirProvider::new(dir)),
        None => Box::new(
            YahooProvider::new(config.fetch_timeout).context("failed to set up Yahoo Finance client")?,
        ),
    };

    let notifier = match (&config.smtp, cli.no_email) {
        (Some(smtp), false) => Some(SmtpNotifier::new(smtp.clone())),
        (Some(_), true) => {
            tracing::info!("--no-email set; report will not be sent");
            None
        }
        (None, _) => None,
    };

    let now = chrono::Local::now().fixed_offset();
    let summary = run_pipeline(
        &config,
        provider.as_ref(),
        notifier.as_ref().map(|n| n as &dyn Notifier),
        &LogProgress,
        now,
    )?;

    print_summary(&summary);
    Ok(())
}

/// Defaults, then the TOML file, then the environment, then flags.
fn build_config(cli: &Cli) -> Result<ScanConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => ScanConfig::from_file(path)?,
        None => ScanConfig::default(),
    };
    config.apply_env(|key| std::env::var(key).ok())?;

    if let Some(path) = &cli.tickers {
        config.tickers_file = path.clone();
    }
    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(days) = cli.lookback_days {
        config.lookback_days = days;
    }
    Ok(config)
}

fn print_summary(summary: &RunSummary) {
    let report = &summary.report;
    println!(
        "Scanned {} tickers: {} computed, {} skipped, {} with signals",
        report.results.len() + report.failures.len(),
        report.results.len(),
        report.failures.len(),
        report.signal_count()
    );
    for failure in &report.failures {
        println!("  skipped {} ({}): {}", failure.ticker, failure.kind, failure.reason);
    }
    println!("CSV:  {}", summary.artifacts.csv.display());
    println!("HTML: {}", summary.artifacts.html.display());
    match &summary.delivery {
        DeliveryStatus::Sent { channel } => println!("Report sent via {channel}"),
        DeliveryStatus::Skipped => println!("E-mail not sent"),
    }
}

fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<RunError>() {
        Some(RunError::Config(_)) => 2,
        Some(RunError::Render(_)) => 3,
        Some(RunError::Delivery { .. }) => 4,
        None if err.downcast_ref::<ConfigError>().is_some() => 2,
        None => 1,
    }
}
