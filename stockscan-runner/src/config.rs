//! Scan configuration: defaults, optional TOML file, environment overrides.
//!
//! Precedence, lowest first: built-in defaults, TOML file, environment, CLI
//! flags (applied by the binary). SMTP settings come from the environment
//! only, since they carry credentials.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{Days, NaiveDate};
use lettre::message::Mailbox;
use serde::Deserialize;
use stockscan_core::signals::SignalParams;
use thiserror::Error;

pub const DEFAULT_TICKERS_FILE: &str = "tickers.txt";
pub const DEFAULT_OUTPUT_DIR: &str = "output";
pub const DEFAULT_LOOKBACK_DAYS: u32 = 180;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_EMAIL_TOP_N: usize = 10;
pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
pub const DEFAULT_SMTP_PORT: u16 = 587;

/// Configuration errors. All of them abort the run before any fetch.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("ticker file not found: {}", .0.display())]
    TickersMissing(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("ticker file {} has no usable symbols", .0.display())]
    NoTickers(PathBuf),

    #[error("invalid config file {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("incomplete SMTP configuration: {0} not set")]
    IncompleteSmtp(String),

    #[error("invalid {var}: {reason}")]
    Env { var: String, reason: String },
}

/// SMTP submission settings.
#[derive(Clone, PartialEq)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: Mailbox,
    pub recipients: Vec<Mailbox>,
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("from", &self.from.to_string())
            .field("recipients", &self.recipients.len())
            .finish()
    }
}

impl SmtpConfig {
    /// Build from `SMTP_*` variables looked up through `lookup`.
    ///
    /// Returns `Ok(None)` when none of `SMTP_USER`, `SMTP_PASS`, `SMTP_TO` is
    /// set (e-mail disabled). Setting only some of them is an error.
    pub fn from_lookup<F>(lookup: F) -> Result<Option<Self>, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let user = get("SMTP_USER");
        let pass = get("SMTP_PASS");
        let to = get("SMTP_TO");

        let (username, password, to) = match (user, pass, to) {
            (None, None, None) => return Ok(None),
            (Some(u), Some(p), Some(t)) => (u, p, t),
            (u, p, t) => {
                let missing: Vec<&str> = [("SMTP_USER", u.is_none()), ("SMTP_PASS", p.is_none()), ("SMTP_TO", t.is_none())]
                    .iter()
                    .filter(|(_, absent)| *absent)
                    .map(|(name, _)| *name)
                    .collect();
                return Err(ConfigError::IncompleteSmtp(missing.join(", ")));
            }
        };

        let host = get("SMTP_HOST").unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string());
        let port = match get("SMTP_PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Env {
                var: "SMTP_PORT".into(),
                reason: format!("'{raw}': {e}"),
            })?,
            None => DEFAULT_SMTP_PORT,
        };

        let from_raw = get("SMTP_FROM").unwrap_or_else(|| username.clone());
        let from = parse_mailbox("SMTP_FROM", &from_raw)?;

        let recipients = to
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| parse_mailbox("SMTP_TO", s))
            .collect::<Result<Vec<_>, _>>()?;
        if recipients.is_empty() {
            return Err(ConfigError::IncompleteSmtp("SMTP_TO".into()));
        }

        Ok(Some(Self {
            host,
            port,
            username,
            password,
            from,
            recipients,
        }))
    }
}

fn parse_mailbox(var: &str, raw: &str) -> Result<Mailbox, ConfigError> {
    raw.parse::<Mailbox>().map_err(|e| ConfigError::Env {
        var: var.to_string(),
        reason: format!("'{raw}': {e}"),
    })
}

/// `[scan]` section of the TOML file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScanSection {
    tickers_file: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    lookback_days: Option<u32>,
    fetch_timeout_secs: Option<u64>,
    email_top_n: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    #[serde(default)]
    scan: ScanSection,
    #[serde(default)]
    signals: SignalParams,
}

/// Everything one scan run needs.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub tickers_file: PathBuf,
    pub output_dir: PathBuf,
    /// Calendar days of history requested per ticker.
    pub lookback_days: u32,
    pub fetch_timeout: Duration,
    /// Rows in the e-mail body's top table.
    pub email_top_n: usize,
    pub signals: SignalParams,
    /// `None` disables e-mail delivery.
    pub smtp: Option<SmtpConfig>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            tickers_file: PathBuf::from(DEFAULT_TICKERS_FILE),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            email_top_n: DEFAULT_EMAIL_TOP_N,
            signals: SignalParams::default(),
            smtp: None,
        }
    }
}

impl ScanConfig {
    /// Load defaults overlaid with a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content).map_err(|e| match e {
            ConfigError::Parse { reason, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })
    }

    /// Parse defaults overlaid with a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let file: FileConfig = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            reason: e.to_string(),
        })?;

        let mut config = Self {
            signals: file.signals,
            ..Self::default()
        };
        let scan = file.scan;
        if let Some(v) = scan.tickers_file {
            config.tickers_file = v;
        }
        if let Some(v) = scan.output_dir {
            config.output_dir = v;
        }
        if let Some(v) = scan.lookback_days {
            config.lookback_days = v;
        }
        if let Some(v) = scan.fetch_timeout_secs {
            config.fetch_timeout = Duration::from_secs(v);
        }
        if let Some(v) = scan.email_top_n {
            config.email_top_n = v;
        }
        Ok(config)
    }

    /// Apply `TICKERS_FILE`, `OUTPUT_DIR`, and the `SMTP_*` variables.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("TICKERS_FILE").filter(|v| !v.trim().is_empty()) {
            self.tickers_file = PathBuf::from(v.trim());
        }
        if let Some(v) = lookup("OUTPUT_DIR").filter(|v| !v.trim().is_empty()) {
            self.output_dir = PathBuf::from(v.trim());
        }
        self.smtp = SmtpConfig::from_lookup(&lookup)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.signals
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if self.lookback_days == 0 {
            return Err(ConfigError::Invalid("lookback_days must be >= 1".into()));
        }
        if self.fetch_timeout.is_zero() {
            return Err(ConfigError::Invalid("fetch_timeout_secs must be >= 1".into()));
        }
        Ok(())
    }

    /// Inclusive fetch window ending on `today`.
    pub fn date_range(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let start = today
            .checked_sub_days(Days::new(u64::from(self.lookback_days)))
            .unwrap_or(NaiveDate::MIN);
        (start, today)
    }
}
