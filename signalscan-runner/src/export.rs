//! CSV and JSON export of scan results.
//!
//! Files are named by evaluation time so repeated `scan --csv-dir` runs do not
//! overwrite each other: `signals_20240304T060000Z.csv`,
//! `movers_20240304T060000Z.csv`, `alerts_20240304T060000Z.csv`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use thiserror::Error;

use signalscan_core::movers::MoverRecord;

use crate::alerts::AlertLogEntry;
use crate::scanner::{ReportRow, ScanOutput};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Undefined indicator values are written as empty cells.
fn number(value: f64, decimals: usize) -> String {
    if value.is_nan() {
        String::new()
    } else {
        format!("{value:.decimals$}")
    }
}

/// The writer buffers into memory, so a flush failure is a CSV error and
/// has no path to report.
fn flush_failed(source: std::io::Error) -> ExportError {
    ExportError::Csv(csv::Error::from(source))
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String, ExportError> {
    let bytes = wtr.into_inner().map_err(|e| flush_failed(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Columns: symbol, price, vwap, ema9, ema21, rsi6, volume_ratio, signal,
/// reason, timestamp
pub fn report_csv(rows: &[ReportRow]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "symbol",
        "price",
        "vwap",
        "ema9",
        "ema21",
        "rsi6",
        "volume_ratio",
        "signal",
        "reason",
        "timestamp",
    ])?;

    for r in rows {
        wtr.write_record([
            r.symbol.clone(),
            number(r.price, 2),
            number(r.vwap, 4),
            number(r.ema9, 4),
            number(r.ema21, 4),
            number(r.rsi6, 2),
            number(r.volume_ratio, 3),
            r.signal.to_string(),
            r.reason.clone(),
            r.timestamp.to_rfc3339(),
        ])?;
    }

    finish(wtr)
}

/// Columns: rank, symbol, percent_change, volume_ratio, atr_percent, price, score
pub fn movers_csv(movers: &[MoverRecord]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "rank",
        "symbol",
        "percent_change",
        "volume_ratio",
        "atr_percent",
        "price",
        "score",
    ])?;

    for (i, m) in movers.iter().enumerate() {
        wtr.write_record([
            (i + 1).to_string(),
            m.symbol.clone(),
            number(m.percent_change, 3),
            number(m.volume_ratio, 3),
            number(m.atr_percent, 3),
            number(m.price, 2),
            number(m.score, 4),
        ])?;
    }

    finish(wtr)
}

pub fn alert_log_csv(entries: &[AlertLogEntry]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["time", "symbol", "signal", "sent", "response"])?;
    for e in entries {
        wtr.write_record([
            e.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            e.symbol.clone(),
            e.signal.to_string(),
            e.sent.to_string(),
            e.response_excerpt.clone(),
        ])?;
    }
    finish(wtr)
}

fn stamp(now: DateTime<Utc>) -> impl std::fmt::Display {
    now.format("%Y%m%dT%H%M%SZ")
}

fn create_dir(dir: &Path) -> Result<(), ExportError> {
    std::fs::create_dir_all(dir).map_err(|source| ExportError::Io {
        path: dir.to_path_buf(),
        source,
    })
}

pub fn scan_json(output: &ScanOutput) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(output)?)
}

fn write_file(path: PathBuf, content: &str) -> Result<PathBuf, ExportError> {
    std::fs::write(&path, content).map_err(|source| ExportError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// Write the report and the movers table into `dir`, creating it if needed.
/// Returns the written paths (movers first when present).
pub fn write_scan_csv(dir: &Path, output: &ScanOutput, now: DateTime<Utc>) -> Result<Vec<PathBuf>, ExportError> {
    create_dir(dir)?;

    let stamp = stamp(now);
    let mut written = Vec::new();
    if !output.movers.is_empty() {
        written.push(write_file(
            dir.join(format!("movers_{stamp}.csv")),
            &movers_csv(&output.movers)?,
        )?);
    }
    written.push(write_file(
        dir.join(format!("signals_{stamp}.csv")),
        &report_csv(&output.report)?,
    )?);

    tracing::debug!(files = written.len(), dir = %dir.display(), "scan exported");
    Ok(written)
}

/// Write the alert log next to a scan export.
pub fn write_alert_log_csv(
    dir: &Path,
    entries: &[AlertLogEntry],
    now: DateTime<Utc>,
) -> Result<PathBuf, ExportError> {
    create_dir(dir)?;
    let path = write_file(
        dir.join(format!("alerts_{}.csv", stamp(now))),
        &alert_log_csv(entries)?,
    )?;
    tracing::debug!(entries = entries.len(), path = %path.display(), "alert log exported");
    Ok(path)
}
