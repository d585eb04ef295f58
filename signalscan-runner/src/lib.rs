//! SignalScan Runner: scan orchestration, alerting, refresh, configuration, export.
//!
//! This crate builds on `signalscan-core` to provide:
//! - `Scanner`: movers selection and signal scans over a data provider
//! - Alert dispatch into a shared, append-only alert log
//! - A background refresh scheduler for recurring cycles
//! - TOML configuration with environment overrides
//! - CSV / JSON export of scan results

pub mod alerts;
pub mod config;
pub mod export;
pub mod scanner;
pub mod scheduler;

pub use alerts::{dispatch_alerts, AlertLog, AlertLogEntry, AlertTarget, DispatchSummary};
pub use config::{ConfigError, ScannerConfig, TelegramConfig};
pub use export::{write_alert_log_csv, write_scan_csv, ExportError};
pub use scanner::{ReportRow, ScanError, ScanOutput, Scanner, SkippedSymbol, SymbolOutcome};
pub use scheduler::RefreshScheduler;
