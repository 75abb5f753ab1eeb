//! E-mail notification over authenticated SMTP.
//!
//! The notifier only reads the artifacts it attaches; a delivery failure
//! leaves everything under the output directory as it was.

use std::path::{Path, PathBuf};
use std::time::Duration;

use lettre::message::header::ContentType;
use lettre::message::{Attachment, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use thiserror::Error;

use crate::config::SmtpConfig;
use crate::export::{escape_html, results_table_html, ArtifactPaths};
use crate::report::Report;

/// Implicit-TLS submission port; every other port negotiates STARTTLS.
const SMTPS_PORT: u16 = 465;

/// Connect and command timeout for one submission.
const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Mail submission failures. Terminal for the notification step only.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("failed to read attachment {}: {source}", path.display())]
    Attachment {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build message: {0}")]
    Message(String),

    #[error("SMTP delivery failed: {0}")]
    Transport(String),
}

/// A composed e-mail, independent of the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub subject: String,
    pub html_body: String,
    pub attachments: Vec<PathBuf>,
}

/// Delivery channel for the finished report.
pub trait Notifier {
    /// Human-readable name of this channel.
    fn name(&self) -> &str;

    /// Deliver `message`. A single attempt; no retries.
    fn send(&self, message: &EmailMessage) -> Result<(), DeliveryError>;
}

/// Compose the report e-mail: top-N table, skipped tickers, attachments.
pub fn compose_email(report: &Report, artifacts: &ArtifactPaths, top_n: usize) -> EmailMessage {
    let subject = format!(
        "Daily stock scan ({})",
        report.generated_at.format("%Y-%m-%d %H:%M")
    );

    let mut body = String::with_capacity(4096);
    body.push_str("<p>Hello, here is the automated daily stock scan.</p>\n");
    body.push_str(&format!(
        "<p>{} tickers scanned, {} with a golden cross or volume anomaly, {} skipped.</p>\n",
        report.results.len() + report.failures.len(),
        report.signal_count(),
        report.failures.len()
    ));

    if report.results.is_empty() {
        body.push_str("<p>No tickers produced signals.</p>\n");
    } else {
        let ranked = report.ranked();
        let shown = ranked.len().min(top_n);
        body.push_str(&format!("<p>Top {shown}:</p>\n"));
        body.push_str(&results_table_html(
            &report.params,
            ranked.into_iter().take(top_n),
        ));
    }

    if !report.failures.is_empty() {
        body.push_str("<p>Skipped:</p>\n<ul>\n");
        for f in &report.failures {
            body.push_str(&format!(
                "<li>{} ({}): {}</li>\n",
                escape_html(&f.ticker),
                f.kind,
                escape_html(&f.reason)
            ));
        }
        body.push_str("</ul>\n");
    }

    body.push_str("<p>Full results are attached (CSV/HTML).</p>\n");

    EmailMessage {
        subject,
        html_body: body,
        attachments: artifacts.all().iter().map(|p| p.to_path_buf()).collect(),
    }
}

/// Notifier that submits over SMTP with username/password authentication.
pub struct SmtpNotifier {
    config: SmtpConfig,
}

impl SmtpNotifier {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    /// Build the MIME message: HTML body plus one part per attachment.
    pub fn build_message(&self, message: &EmailMessage) -> Result<Message, DeliveryError> {
        let mut builder = Message::builder()
            .from(self.config.from.clone())
            .subject(message.subject.clone());
        for to in &self.config.recipients {
            builder = builder.to(to.clone());
        }

        let mut parts = MultiPart::mixed().singlepart(SinglePart::html(message.html_body.clone()));
        for path in &message.attachments {
            parts = parts.singlepart(attachment_part(path)?);
        }

        builder
            .multipart(parts)
            .map_err(|e| DeliveryError::Message(e.to_string()))
    }

    fn transport(&self) -> Result<SmtpTransport, DeliveryError> {
        let builder = if self.config.port == SMTPS_PORT {
            SmtpTransport::relay(&self.config.host)
        } else {
            SmtpTransport::starttls_relay(&self.config.host)
        }
        .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        Ok(builder
            .port(self.config.port)
            .credentials(Credentials::new(
                self.config.username.clone(),
                self.config.password.clone(),
            ))
            .timeout(Some(SMTP_TIMEOUT))
            .build())
    }
}

impl Notifier for SmtpNotifier {
    fn name(&self) -> &str {
        "smtp"
    }

    fn send(&self, message: &EmailMessage) -> Result<(), DeliveryError> {
        let email = self.build_message(message)?;
        let transport = self.transport()?;
        transport
            .send(&email)
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;
        Ok(())
    }
}

fn attachment_part(path: &Path) -> Result<SinglePart, DeliveryError> {
    let content = std::fs::read(path).map_err(|source| DeliveryError::Attachment {
        path: path.to_path_buf(),
        source,
    })?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "attachment".to_string());
    let content_type = match path.extension().and_then(|e| e.to_str()) {
        Some("csv") => "text/csv; charset=utf-8",
        Some("html") => "text/html; charset=utf-8",
        _ => "application/octet-stream",
    };
    let content_type =
        ContentType::parse(content_type).map_err(|e| DeliveryError::Message(e.to_string()))?;
    Ok(Attachment::new(filename).body(content, content_type))
}
