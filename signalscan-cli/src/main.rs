//! SignalScan CLI: intraday mover selection and BUY/SELL/HOLD scans.
//!
//! Commands:
//! - `movers`: rank the universe by short-term activity
//! - `scan`: one cycle: movers, then signals for the selected movers
//! - `watch`: repeat `scan` every `refresh_secs` on a background thread

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};

use signalscan_core::data::{CircuitBreaker, MarketDataProvider, SyntheticProvider, YahooProvider};
use signalscan_core::domain::Signal;
use signalscan_core::movers::MoverRecord;
use signalscan_core::notify::{Notifier, TelegramNotifier};
use signalscan_runner::alerts::RECENT_WINDOW;
use signalscan_runner::export::scan_json;
use signalscan_runner::{
    dispatch_alerts, write_alert_log_csv, write_scan_csv, AlertLog, AlertTarget, RefreshScheduler, ReportRow,
    ScanOutput, Scanner, ScannerConfig,
};

const LOG_ENV: &str = "SIGNALSCAN_LOG";

#[derive(Parser)]
#[command(
    name = "signalscan",
    about = "SignalScan: intraday mover selection and BUY/SELL/HOLD signals"
)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct CommonArgs {
    /// Path to a TOML config file. Defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Universe override, comma separated (e.g. TCS.NS,INFY.NS).
    #[arg(long, global = true)]
    symbols: Option<String>,

    /// Number of movers to keep (3-15).
    #[arg(long, global = true)]
    top_n: Option<usize>,

    /// Signal bar interval in minutes (1 or 5).
    #[arg(long, global = true)]
    interval: Option<u32>,

    /// Use deterministic synthetic bars instead of Yahoo Finance.
    #[arg(long, global = true, default_value_t = false)]
    synthetic: bool,

    /// Log filter when SIGNALSCAN_LOG is unset.
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Log output format: text or json.
    #[arg(long, global = true, default_value = "text")]
    log_format: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank the universe by volume spike, ATR% and % change.
    Movers {
        /// Print JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Run one scan cycle: movers, then signals for the selected movers.
    Scan {
        /// Send a Telegram alert for each report row.
        #[arg(long, default_value_t = false)]
        alert: bool,

        /// Only alert on BUY and SELL rows.
        #[arg(long, default_value_t = false)]
        actionable_only: bool,

        /// Scan the universe directly, without mover selection.
        #[arg(long, default_value_t = false)]
        no_movers: bool,

        /// Write movers and signals CSV files into this directory, plus the
        /// alert log when alerting.
        #[arg(long)]
        csv_dir: Option<PathBuf>,

        /// Print JSON instead of tables.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Re-run the scan cycle every refresh_secs.
    Watch {
        /// Stop after this many cycles (at least 1). Runs until interrupted
        /// when omitted.
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        cycles: Option<u64>,

        /// Send a Telegram alert for each report row.
        #[arg(long, default_value_t = false)]
        alert: bool,

        /// Only alert on BUY and SELL rows.
        #[arg(long, default_value_t = false)]
        actionable_only: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.common.log_level, &cli.common.log_format)?;

    let alerting = matches!(
        cli.command,
        Commands::Scan { alert: true, .. } | Commands::Watch { alert: true, .. }
    );
    let config = load_config(&cli.common, alerting)?;
    let scanner = Scanner::new(build_provider(&config, cli.common.synthetic)?, &config)?;

    match cli.command {
        Commands::Movers { json } => run_movers(&scanner, &config, json),
        Commands::Scan {
            alert,
            actionable_only,
            no_movers,
            csv_dir,
            json,
        } => run_scan(
            &scanner,
            &config,
            alert,
            actionable_only,
            no_movers,
            csv_dir.as_deref(),
            json,
        ),
        Commands::Watch {
            cycles,
            alert,
            actionable_only,
        } => run_watch(scanner, config, cycles, alert, actionable_only),
    }
}

fn init_tracing(log_level: &str, log_format: &str) -> Result<()> {
    let filter = std::env::var(LOG_ENV).unwrap_or_else(|_| log_level.to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_new(filter).context("invalid log filter")?;

    match log_format.trim().to_lowercase().as_str() {
        "json" => tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .json()
            .init(),
        "text" => tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init(),
        other => bail!("unknown --log-format '{other}'. Valid: text, json"),
    }
    Ok(())
}

/// File (or defaults), then environment, then flags; validated last.
fn load_config(args: &CommonArgs, alerting: bool) -> Result<ScannerConfig> {
    let mut config = match &args.config {
        Some(path) => ScannerConfig::from_file(path)?,
        None => ScannerConfig::default(),
    };
    config.apply_env_overrides();

    if let Some(symbols) = &args.symbols {
        config.universe = ScannerConfig::parse_symbols(symbols);
    }
    if let Some(top_n) = args.top_n {
        config.top_n = top_n;
    }
    if let Some(interval) = args.interval {
        config.interval_minutes = interval;
    }
    if alerting {
        config.telegram.enabled = true;
    }

    config.validate().context("invalid configuration")?;
    tracing::debug!(?config, "configuration loaded");
    Ok(config)
}

fn build_provider(config: &ScannerConfig, synthetic: bool) -> Result<Arc<dyn MarketDataProvider>> {
    if synthetic {
        return Ok(Arc::new(SyntheticProvider::default()));
    }
    let circuit_breaker = Arc::new(CircuitBreaker::default_provider());
    let provider = YahooProvider::new(circuit_breaker, Duration::from_secs(config.fetch_timeout_secs))?;
    Ok(Arc::new(provider))
}

fn build_notifier(config: &ScannerConfig) -> Result<TelegramNotifier> {
    Ok(TelegramNotifier::new(
        config.telegram.bot_token.clone(),
        Duration::from_secs(config.telegram.timeout_secs),
    )?)
}

fn alert_target(config: &ScannerConfig) -> AlertTarget {
    AlertTarget {
        destination: config.telegram.chat_id.clone(),
        currency: config.currency.clone(),
    }
}

fn run_movers(scanner: &Scanner, config: &ScannerConfig, json: bool) -> Result<()> {
    let output = scanner.select_movers(&config.universe, Utc::now())?;
    if json {
        println!("{}", serde_json::to_string_pretty(&output.movers)?);
        return Ok(());
    }
    print_movers(&output.movers);
    print_skipped(&output);
    Ok(())
}

fn run_scan(
    scanner: &Scanner,
    config: &ScannerConfig,
    alert: bool,
    actionable_only: bool,
    no_movers: bool,
    csv_dir: Option<&Path>,
    json: bool,
) -> Result<()> {
    let now = Utc::now();
    let output = if no_movers {
        scanner.scan_signals(&config.universe, now)?
    } else {
        scanner.run_cycle(&config.universe, now)?
    };

    if json {
        println!("{}", scan_json(&output)?);
    } else {
        print_scan(&output);
    }

    if let Some(dir) = csv_dir {
        for path in write_scan_csv(dir, &output, now)? {
            println!("Wrote {}", path.display());
        }
    }

    if alert {
        let notifier = build_notifier(config)?;
        let log = AlertLog::new();
        send_alerts(&output.report, &notifier, config, &log, actionable_only);
        print_alert_log(&log);
        if let Some(dir) = csv_dir {
            let path = write_alert_log_csv(dir, &log.entries(), now)?;
            println!("Wrote {}", path.display());
        }
    }
    Ok(())
}

fn run_watch(
    scanner: Scanner,
    config: ScannerConfig,
    cycles: Option<u64>,
    alert: bool,
    actionable_only: bool,
) -> Result<()> {
    let notifier = if alert { Some(build_notifier(&config)?) } else { None };
    let log = AlertLog::new();
    let job_log = log.clone();
    let period = Duration::from_secs(config.refresh_secs);

    println!(
        "Refreshing every {}s via {}{}",
        config.refresh_secs,
        scanner.provider_name(),
        cycles.map(|n| format!(" for {n} cycles")).unwrap_or_default()
    );

    let scheduler = RefreshScheduler::spawn(period, move |run| {
        let now = Utc::now();
        println!("\n=== Cycle {run} @ {} ===", now.format("%Y-%m-%d %H:%M:%S UTC"));
        match scanner.run_cycle(&config.universe, now) {
            Ok(output) => {
                print_scan(&output);
                if let Some(notifier) = &notifier {
                    send_alerts(&output.report, notifier, &config, &job_log, actionable_only);
                }
            }
            Err(e) => {
                tracing::error!(error = %e, run, "scan cycle failed");
                eprintln!("Cycle {run} failed: {e}");
            }
        }
        keep_running(run, cycles)
    })?;

    let runs = scheduler.join();
    println!("\nCompleted {runs} cycles.");
    if alert {
        print_alert_log(&log);
    }
    Ok(())
}

/// `run` is the 1-based number of the cycle that just finished.
fn keep_running(run: usize, cycles: Option<u64>) -> bool {
    cycles.map_or(true, |limit| (run as u64) < limit)
}

fn send_alerts(
    rows: &[ReportRow],
    notifier: &dyn Notifier,
    config: &ScannerConfig,
    log: &AlertLog,
    actionable_only: bool,
) {
    let selected: Vec<ReportRow> = rows
        .iter()
        .filter(|r| !actionable_only || r.signal != Signal::Hold)
        .cloned()
        .collect();
    let summary = dispatch_alerts(&selected, notifier, &alert_target(config), log, Utc::now());
    println!("Alerts attempted: {} | Sent: {}", summary.attempted, summary.sent);
}

// ─── Table rendering ────────────────────────────────────────────────

fn cell(value: f64, decimals: usize) -> String {
    if value.is_nan() {
        "-".to_string()
    } else {
        format!("{value:.decimals$}")
    }
}

fn print_scan(output: &ScanOutput) {
    if !output.movers.is_empty() {
        print_movers(&output.movers);
        println!();
    }
    print_report(&output.report);
    print_skipped(output);
}

fn print_movers(movers: &[MoverRecord]) {
    if movers.is_empty() {
        println!("No movers found or data fetch failed.");
        return;
    }
    println!("Top movers");
    println!(
        "{:<14} {:>9} {:>9} {:>7} {:>11} {:>8}",
        "Symbol", "%Change", "VolRatio", "ATR%", "Price", "Score"
    );
    println!("{}", "-".repeat(63));
    for m in movers {
        println!(
            "{:<14} {:>9} {:>9} {:>7} {:>11} {:>8}",
            m.symbol,
            cell(m.percent_change, 2),
            cell(m.volume_ratio, 2),
            cell(m.atr_percent, 2),
            cell(m.price, 2),
            cell(m.score, 2),
        );
    }
}

fn print_report(rows: &[ReportRow]) {
    if rows.is_empty() {
        println!("No live signals available now.");
        return;
    }
    println!("Live signals");
    println!(
        "{:<14} {:>10} {:>10} {:>10} {:>10} {:>6} {:>8} {:<5} Reason",
        "Symbol", "Price", "VWAP", "EMA9", "EMA21", "RSI6", "VolRatio", "Sig"
    );
    println!("{}", "-".repeat(100));
    for r in rows {
        println!(
            "{:<14} {:>10} {:>10} {:>10} {:>10} {:>6} {:>8} {:<5} {}",
            r.symbol,
            cell(r.price, 2),
            cell(r.vwap, 2),
            cell(r.ema9, 2),
            cell(r.ema21, 2),
            cell(r.rsi6, 1),
            cell(r.volume_ratio, 2),
            r.signal,
            r.reason,
        );
    }
}

fn print_skipped(output: &ScanOutput) {
    for s in &output.skipped {
        eprintln!("Skipped {}: {}", s.symbol, s.reason);
    }
}

fn print_alert_log(log: &AlertLog) {
    let recent = log.recent(RECENT_WINDOW);
    if recent.is_empty() {
        println!("No alerts sent yet.");
        return;
    }
    println!("\nAlert log (recent)");
    println!("{:<19} {:<14} {:<5} {:<5} Response", "Time", "Symbol", "Sig", "Sent");
    println!("{}", "-".repeat(70));
    for e in recent {
        println!(
            "{:<19} {:<14} {:<5} {:<5} {}",
            e.timestamp.format("%Y-%m-%d %H:%M:%S"),
            e.symbol,
            e.signal,
            e.sent,
            e.response_excerpt,
        );
    }
}
