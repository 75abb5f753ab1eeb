//! Stockscan runner: the daily scan around `stockscan-core`.
//!
//! This crate provides:
//! - Layered configuration (defaults, TOML, environment)
//! - Ticker list loading
//! - The scan pipeline folding per-ticker failures into the report
//! - CSV/HTML report rendering with atomic writes
//! - SMTP delivery of the finished report

pub mod config;
pub mod export;
pub mod notify;
pub mod pipeline;
pub mod report;
pub mod tickers;

pub use config::{ConfigError, ScanConfig, SmtpConfig};
pub use export::{render_csv, render_html, save_artifacts, ArtifactPaths, RenderError};
pub use notify::{compose_email, DeliveryError, EmailMessage, Notifier, SmtpNotifier};
pub use pipeline::{run_pipeline, scan, DeliveryStatus, RunError, RunSummary, ScanOutcome};
pub use report::{FailureKind, Report, TickerFailure};
pub use tickers::{load_tickers, parse_tickers};
