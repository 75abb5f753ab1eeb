//! StockScan Core — domain types, market data, indicators, and daily signals.
//!
//! This crate contains everything needed to turn a ticker into a signal row:
//! - Domain types (daily OHLCV bars)
//! - Data providers (Yahoo Finance chart API, CSV directory import)
//! - Batch fetching with per-ticker failure isolation and progress reporting
//! - Rolling-mean indicators over close and volume
//! - Signal computation (golden cross, volume anomaly, trend filter)

pub mod data;
pub mod domain;
pub mod indicators;
pub mod signals;
