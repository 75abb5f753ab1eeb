//! Report artifacts — CSV and HTML renderings of a [`Report`].
//!
//! Both formats are pure functions of the report, with fixed float
//! precision, so rendering the same report twice is byte-identical.
//! Files are written to a temporary name and renamed into place, so a file
//! at the final path is always complete.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use stockscan_core::signals::{SignalParams, SignalResult};
use thiserror::Error;

use crate::report::Report;

/// UTF-8 byte order mark; spreadsheet apps need it to detect UTF-8 CSV.
const UTF8_BOM: &str = "\u{feff}";

/// Artifact write failures. Fatal to the run: without artifacts there is
/// nothing to deliver.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to create output directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV encoding failed: {0}")]
    Csv(String),
}

/// Paths of the artifacts written for one report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub csv: PathBuf,
    pub html: PathBuf,
}

impl ArtifactPaths {
    pub fn all(&self) -> [&Path; 2] {
        [&self.csv, &self.html]
    }
}

// ─── Column layout ──────────────────────────────────────────────────

/// Header row; MA columns are named after the configured windows.
pub fn column_names(params: &SignalParams) -> Vec<String> {
    vec![
        "ticker".to_string(),
        "date".to_string(),
        "close".to_string(),
        "change_pct".to_string(),
        format!("ma{}", params.short_window),
        format!("ma{}", params.long_window),
        format!("ma{}", params.trend_window),
        "volume".to_string(),
        format!("avg_volume{}", params.volume_window),
        "golden_cross".to_string(),
        "volume_anomaly".to_string(),
        format!("above_ma{}", params.trend_window),
        format!("ma{}_distance_pct", params.trend_window),
    ]
}

fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.precision$}"),
        _ => String::new(),
    }
}

fn fmt_num(value: f64, precision: usize) -> String {
    fmt_opt(Some(value), precision)
}

/// One row of display values, in [`column_names`] order.
fn row_values(r: &SignalResult) -> [String; 13] {
    [
        r.ticker.clone(),
        r.date.to_string(),
        fmt_num(r.close, 4),
        fmt_opt(r.change_pct, 2),
        fmt_num(r.ma_short, 4),
        fmt_num(r.ma_long, 4),
        fmt_num(r.ma_trend, 4),
        fmt_opt(r.volume.map(|v| v as f64), 0),
        fmt_num(r.avg_volume, 0),
        r.golden_cross.to_string(),
        r.volume_anomaly.to_string(),
        r.above_trend.to_string(),
        fmt_num(r.trend_distance_pct, 2),
    ]
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Render the signal table as CSV (BOM-prefixed UTF-8), one row per ticker.
pub fn render_csv(report: &Report) -> Result<String, RenderError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(column_names(&report.params))
        .map_err(|e| RenderError::Csv(e.to_string()))?;
    for r in &report.results {
        wtr.write_record(row_values(r))
            .map_err(|e| RenderError::Csv(e.to_string()))?;
    }
    let data = wtr
        .into_inner()
        .map_err(|e| RenderError::Csv(e.to_string()))?;
    let body = String::from_utf8(data).map_err(|e| RenderError::Csv(e.to_string()))?;
    Ok(format!("{UTF8_BOM}{body}"))
}

// ─── HTML export ────────────────────────────────────────────────────

/// Escape text for HTML element content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// An HTML `<table>` of signal rows; flag cells that fired get class `hit`.
pub fn results_table_html<'a>(
    params: &SignalParams,
    rows: impl IntoIterator<Item = &'a SignalResult>,
) -> String {
    let mut html = String::with_capacity(4096);
    html.push_str("<table class=\"scan\">\n<thead><tr>");
    for name in column_names(params) {
        let _ = write!(html, "<th>{}</th>", escape_html(&name));
    }
    html.push_str("</tr></thead>\n<tbody>\n");

    for r in rows {
        let flags = [r.golden_cross, r.volume_anomaly, r.above_trend];
        html.push_str("<tr>");
        for (i, value) in row_values(r).iter().enumerate() {
            let hit = matches!(i, 9..=11) && flags[i - 9];
            if hit {
                let _ = write!(html, "<td class=\"hit\">{}</td>", escape_html(value));
            } else {
                let _ = write!(html, "<td>{}</td>", escape_html(value));
            }
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n</table>\n");
    html
}

/// Render the full HTML report: signal table, skipped tickers, timestamp.
pub fn render_html(report: &Report) -> String {
    let mut html = String::with_capacity(8192);
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Daily Stock Scan {date}</title>\n<style>\n\
         body {{ font-family: sans-serif; }}\n\
         table.scan {{ border-collapse: collapse; }}\n\
         table.scan th, table.scan td {{ border: 1px solid #ccc; padding: 2px 6px; text-align: right; }}\n\
         td.hit {{ background: #e6f4ea; font-weight: bold; }}\n\
         .meta {{ color: #666; }}\n\
         </style>\n</head>\n<body>\n<h2>Daily Stock Scan</h2>\n",
        date = report.run_date()
    );

    if report.results.is_empty() {
        html.push_str("<p>No tickers produced signals.</p>\n");
    } else {
        html.push_str(&results_table_html(&report.params, &report.results));
    }

    if !report.failures.is_empty() {
        html.push_str(&failures_table_html(report));
    }

    let _ = write!(
        html,
        "<p class=\"meta\">Generated at: {}</p>\n</body>\n</html>\n",
        report.generated_at.to_rfc3339()
    );
    html
}

/// HTML section listing skipped tickers.
pub fn failures_table_html(report: &Report) -> String {
    let mut html = String::new();
    html.push_str("<h3>Skipped tickers</h3>\n<table class=\"scan\">\n");
    html.push_str("<thead><tr><th>ticker</th><th>stage</th><th>reason</th></tr></thead>\n<tbody>\n");
    for f in &report.failures {
        let _ = writeln!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape_html(&f.ticker),
            escape_html(&f.kind.to_string()),
            escape_html(&f.reason)
        );
    }
    html.push_str("</tbody>\n</table>\n");
    html
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Write `contents` to `path` via a sibling temp file and rename.
fn write_atomic(path: &Path, contents: &str) -> Result<(), RenderError> {
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    std::fs::write(&tmp_path, contents).map_err(|source| RenderError::Write {
        path: tmp_path.clone(),
        source,
    })?;
    std::fs::rename(&tmp_path, path).map_err(|source| {
        let _ = std::fs::remove_file(&tmp_path);
        RenderError::Write {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Save the CSV and HTML artifacts for `report` under `output_dir`.
///
/// Creates `output_dir` if needed and writes `{stem}.csv` and `{stem}.html`
/// where the stem carries the run date and time. Returns both paths.
pub fn save_artifacts(report: &Report, output_dir: &Path) -> Result<ArtifactPaths, RenderError> {
    std::fs::create_dir_all(output_dir).map_err(|source| RenderError::CreateDir {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let stem = report.file_stem();
    let paths = ArtifactPaths {
        csv: output_dir.join(format!("{stem}.csv")),
        html: output_dir.join(format!("{stem}.html")),
    };

    let csv = render_csv(report)?;
    write_atomic(&paths.csv, &csv)?;

    let html = render_html(report);
    write_atomic(&paths.html, &html)?;

    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::fixtures::{at, result};
    use crate::report::{FailureKind, TickerFailure};

    fn sample_report() -> Report {
        Report::new(
            at(2024, 7, 1, 18, 30),
            SignalParams::default(),
            vec![
                result("MSFT", false, true, 2.5),
                result("2330.TW", true, false, 4.5),
            ],
            vec![TickerFailure {
                ticker: "<BAD>".into(),
                kind: FailureKind::Fetch,
                reason: "symbol not found: <BAD>".into(),
            }],
        )
    }

    #[test]
    fn csv_header_names_windows() {
        let csv = render_csv(&sample_report()).unwrap();
        let header = csv.trim_start_matches(UTF8_BOM).lines().next().unwrap();
        assert_eq!(
            header,
            "ticker,date,close,change_pct,ma5,ma20,ma60,volume,avg_volume20,\
             golden_cross,volume_anomaly,above_ma60,ma60_distance_pct"
        );
    }

    #[test]
    fn csv_rows_sorted_and_formatted() {
        let csv = render_csv(&sample_report()).unwrap();
        let rows: Vec<&str> = csv.lines().skip(1).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0],
            "2330.TW,2024-07-01,104.5000,0.45,101.0000,100.5000,100.0000,2000000,1000000,true,false,true,4.50"
        );
        assert!(rows[1].starts_with("MSFT,"));
    }

    #[test]
    fn csv_starts_with_bom() {
        assert!(render_csv(&sample_report()).unwrap().starts_with(UTF8_BOM));
    }

    #[test]
    fn missing_change_renders_empty_cell() {
        let mut r = result("AAA", false, false, 1.0);
        r.change_pct = None;
        let report = Report::new(at(2024, 7, 1, 0, 0), SignalParams::default(), vec![r], vec![]);
        let csv = render_csv(&report).unwrap();
        assert!(csv.lines().nth(1).unwrap().starts_with("AAA,2024-07-01,101.0000,,"));
    }

    #[test]
    fn html_escapes_and_lists_failures() {
        let html = render_html(&sample_report());
        assert!(html.contains("<h3>Skipped tickers</h3>"));
        assert!(html.contains("&lt;BAD&gt;"));
        assert!(!html.contains("<BAD>"));
        assert!(html.contains("<td class=\"hit\">true</td>"));
        assert!(html.contains("Generated at: 2024-07-01T18:30:00+08:00"));
    }

    #[test]
    fn html_without_results_says_so() {
        let report = Report::new(at(2024, 7, 1, 0, 0), SignalParams::default(), vec![], vec![]);
        let html = render_html(&report);
        assert!(html.contains("No tickers produced signals."));
        assert!(!html.contains("Skipped tickers"));
    }

    #[test]
    fn save_artifacts_writes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested/output");
        let report = sample_report();
        let paths = save_artifacts(&report, &out).unwrap();

        assert_eq!(paths.csv, out.join("scan_20240701_1830.csv"));
        assert_eq!(paths.html, out.join("scan_20240701_1830.html"));
        assert_eq!(std::fs::read_to_string(&paths.csv).unwrap(), render_csv(&report).unwrap());
        assert_eq!(std::fs::read_to_string(&paths.html).unwrap(), render_html(&report));
        assert!(!out.join("scan_20240701_1830.csv.tmp").exists());
    }

    #[test]
    fn unwritable_output_dir_is_render_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "not a directory").unwrap();
        let err = save_artifacts(&sample_report(), &blocker.join("out")).unwrap_err();
        assert!(matches!(err, RenderError::CreateDir { .. }));
    }

    #[test]
    fn failed_rename_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("output");
        // A non-empty directory squatting on the CSV name makes the rename fail.
        let squatter = out.join("scan_20240701_1830.csv");
        std::fs::create_dir_all(&squatter).unwrap();
        std::fs::write(squatter.join("keep"), "x").unwrap();

        let err = save_artifacts(&sample_report(), &out).unwrap_err();
        assert!(matches!(err, RenderError::Write { ref path, .. } if *path == squatter));
        assert!(!out.join("scan_20240701_1830.csv.tmp").exists());
    }
}
