//! Scan pipeline — tickers → fetch → signals → artifacts → e-mail.
//!
//! Two entry points:
//! - `scan()`: the per-ticker fold. Every ticker ends up either as a
//!   `SignalResult` or as a `TickerFailure`, never silently dropped.
//! - `run_pipeline()`: the full run used by the CLI. Config problems abort
//!   before any fetch, artifact write failures abort the run, and a delivery
//!   failure is reported after the artifacts are safely on disk.

use chrono::{DateTime, FixedOffset, NaiveDate};
use stockscan_core::data::{fetch_all, DataProvider, FetchProgress};
use stockscan_core::signals::{compute_signals, SignalError, SignalParams, SignalResult};
use thiserror::Error;

use crate::config::{ConfigError, ScanConfig};
use crate::export::{save_artifacts, ArtifactPaths, RenderError};
use crate::notify::{compose_email, DeliveryError, Notifier};
use crate::report::{FailureKind, Report, TickerFailure};
use crate::tickers::load_tickers;

/// Errors that end a run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// Artifacts were written before delivery was attempted and are kept.
    #[error("delivery error: {source} (report kept at {})", artifacts.csv.display())]
    Delivery {
        #[source]
        source: DeliveryError,
        artifacts: ArtifactPaths,
    },
}

/// Per-ticker results and failures from one scan.
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    pub results: Vec<SignalResult>,
    pub failures: Vec<TickerFailure>,
}

/// What happened at the notification step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryStatus {
    Sent { channel: String },
    Skipped,
}

/// Outcome of a successful run.
#[derive(Debug)]
pub struct RunSummary {
    pub report: Report,
    pub artifacts: ArtifactPaths,
    pub delivery: DeliveryStatus,
}

/// Fetch and compute signals for every ticker, collecting failures.
pub fn scan(
    provider: &dyn DataProvider,
    tickers: &[String],
    start: NaiveDate,
    end: NaiveDate,
    params: &SignalParams,
    progress: &dyn FetchProgress,
) -> ScanOutcome {
    let summary = fetch_all(provider, tickers, start, end, progress);
    tracing::debug!(
        total = summary.total,
        fetched = summary.fetched.len(),
        failed = summary.errors.len(),
        "fetch stage done"
    );
    let mut outcome = ScanOutcome::default();

    for (ticker, err) in summary.errors {
        outcome.failures.push(TickerFailure {
            ticker,
            kind: FailureKind::Fetch,
            reason: err.to_string(),
        });
    }

    for fetched in summary.fetched {
        match compute_signals(&fetched.symbol, &fetched.bars, params) {
            Ok(result) => {
                tracing::debug!(
                    ticker = %result.ticker,
                    golden_cross = result.golden_cross,
                    volume_anomaly = result.volume_anomaly,
                    above_trend = result.above_trend,
                    "signals computed"
                );
                outcome.results.push(result);
            }
            Err(err) => {
                let kind = match err {
                    SignalError::InsufficientData { .. } => FailureKind::InsufficientData,
                    SignalError::InvalidParams(_) => FailureKind::Compute,
                };
                tracing::warn!(ticker = %fetched.symbol, stage = "signals", error = %err, "ticker skipped");
                outcome.failures.push(TickerFailure {
                    ticker: fetched.symbol,
                    kind,
                    reason: err.to_string(),
                });
            }
        }
    }

    outcome
}

/// Run one complete scan.
///
/// `notifier` is `None` when e-mail is disabled. `now` stamps the report and
/// ends the fetch window.
pub fn run_pipeline(
    config: &ScanConfig,
    provider: &dyn DataProvider,
    notifier: Option<&dyn Notifier>,
    progress: &dyn FetchProgress,
    now: DateTime<FixedOffset>,
) -> Result<RunSummary, RunError> {
    config.validate()?;
    let tickers = load_tickers(&config.tickers_file)?;
    tracing::info!(
        count = tickers.len(),
        file = %config.tickers_file.display(),
        provider = provider.name(),
        "loaded tickers"
    );

    let (start, end) = config.date_range(now.date_naive());
    let outcome = scan(provider, &tickers, start, end, &config.signals, progress);
    tracing::info!(
        computed = outcome.results.len(),
        skipped = outcome.failures.len(),
        "scan complete"
    );

    let report = Report::new(now, config.signals.clone(), outcome.results, outcome.failures);
    let artifacts = save_artifacts(&report, &config.output_dir)?;
    tracing::info!(
        csv = %artifacts.csv.display(),
        html = %artifacts.html.display(),
        "artifacts written"
    );

    let delivery = match notifier {
        Some(notifier) => {
            let message = compose_email(&report, &artifacts, config.email_top_n);
            if let Err(source) = notifier.send(&message) {
                tracing::error!(channel = notifier.name(), stage = "notify", error = %source, "delivery failed");
                return Err(RunError::Delivery { source, artifacts });
            }
            tracing::info!(channel = notifier.name(), "report sent");
            DeliveryStatus::Sent {
                channel: notifier.name().to_string(),
            }
        }
        None => {
            tracing::warn!(stage = "notify", "e-mail disabled; skipping delivery");
            DeliveryStatus::Skipped
        }
    };

    Ok(RunSummary {
        report,
        artifacts,
        delivery,
    })
}
