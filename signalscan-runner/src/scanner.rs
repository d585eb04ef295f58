//! Scan orchestration: fetch → enrich → classify / rank, one symbol at a time.
//!
//! Each symbol ends in an explicit [`SymbolOutcome`]. A fetch error or an
//! empty window skips that symbol and the batch carries on. Only input
//! validation (an empty watch list) fails a whole scan.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use signalscan_core::classify;
use signalscan_core::data::{Interval, MarketDataProvider};
use signalscan_core::domain::{EnrichedSeries, Signal};
use signalscan_core::indicators::compute_indicators;
use signalscan_core::movers::{rank_movers, MoverInput, MoverRecord};

use crate::config::{ConfigError, ScannerConfig};

pub const REASON_NO_DATA: &str = "no data in window";
pub const REASON_PROVIDER_UNAVAILABLE: &str = "data provider unavailable";

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("watch list is empty")]
    EmptyWatchList,

    #[error("universe is empty")]
    EmptyUniverse,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// One line of the signal report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub symbol: String,
    pub price: f64,
    pub vwap: f64,
    pub ema9: f64,
    pub ema21: f64,
    pub rsi6: f64,
    pub volume_ratio: f64,
    pub signal: Signal,
    pub reason: String,
    /// Evaluation time of the scan, not the bar time.
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SymbolOutcome {
    Row(ReportRow),
    Skip { symbol: String, reason: String },
}

/// Everything one scan produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanOutput {
    pub movers: Vec<MoverRecord>,
    pub report: Vec<ReportRow>,
    pub skipped: Vec<SkippedSymbol>,
}

impl ScanOutput {
    pub fn count(&self, signal: Signal) -> usize {
        self.report.iter().filter(|r| r.signal == signal).count()
    }

    fn push(&mut self, outcome: SymbolOutcome) {
        match outcome {
            SymbolOutcome::Row(row) => self.report.push(row),
            SymbolOutcome::Skip { symbol, reason } => {
                self.skipped.push(SkippedSymbol { symbol, reason })
            }
        }
    }
}

pub struct Scanner {
    provider: Arc<dyn MarketDataProvider>,
    top_n: usize,
    interval: Interval,
    movers_window: Duration,
    signal_window: Duration,
}

impl Scanner {
    pub fn new(provider: Arc<dyn MarketDataProvider>, config: &ScannerConfig) -> Result<Self, ScanError> {
        Ok(Self {
            provider,
            top_n: config.top_n,
            interval: config.interval()?,
            movers_window: Duration::minutes(i64::from(config.movers_window_minutes)),
            signal_window: Duration::minutes(i64::from(config.signal_window_minutes)),
        })
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Fetch and enrich one symbol's window. Errors and empty windows become
    /// the skip reason. A provider that reports itself unavailable (e.g. an
    /// open circuit breaker) is not called at all.
    fn enriched_window(
        &self,
        symbol: &str,
        interval: Interval,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<EnrichedSeries, String> {
        if !self.provider.is_available() {
            return Err(REASON_PROVIDER_UNAVAILABLE.to_string());
        }
        match self.provider.fetch(symbol, interval, start, end) {
            Ok(fetched) if fetched.series.is_empty() => Err(REASON_NO_DATA.to_string()),
            Ok(fetched) => Ok(compute_indicators(&fetched.series)),
            Err(e) => Err(e.to_string()),
        }
    }

    /// Rank the universe by short-term activity and keep the top N.
    ///
    /// Bars are always 1-minute over twice the movers window, independent of
    /// the signal interval.
    pub fn select_movers(&self, universe: &[String], now: DateTime<Utc>) -> Result<ScanOutput, ScanError> {
        if universe.is_empty() {
            return Err(ScanError::EmptyUniverse);
        }

        let start = now - self.movers_window * 2;
        let mut output = ScanOutput::default();
        let mut inputs: BTreeMap<String, Option<MoverInput>> = BTreeMap::new();

        for symbol in universe {
            if inputs.contains_key(symbol) {
                continue;
            }
            let input = match self.enriched_window(symbol, Interval::OneMinute, start, now) {
                Ok(enriched) => MoverInput::from_series(&enriched),
                Err(reason) => {
                    tracing::warn!(symbol = %symbol, %reason, "mover skipped");
                    output.push(SymbolOutcome::Skip {
                        symbol: symbol.clone(),
                        reason,
                    });
                    None
                }
            };
            inputs.insert(symbol.clone(), input);
        }

        output.movers = rank_movers(&inputs, self.top_n);
        tracing::info!(
            universe = universe.len(),
            ranked = output.movers.len(),
            skipped = output.skipped.len(),
            "movers selected"
        );
        Ok(output)
    }

    /// Evaluate one symbol over the signal window.
    pub fn evaluate_symbol(&self, symbol: &str, now: DateTime<Utc>) -> SymbolOutcome {
        let start = now - self.signal_window;
        let enriched = match self.enriched_window(symbol, self.interval, start, now) {
            Ok(enriched) => enriched,
            Err(reason) => {
                return SymbolOutcome::Skip {
                    symbol: symbol.to_string(),
                    reason,
                }
            }
        };
        let Some(latest) = enriched.latest() else {
            return SymbolOutcome::Skip {
                symbol: symbol.to_string(),
                reason: REASON_NO_DATA.to_string(),
            };
        };

        let classification = classify(latest);
        tracing::debug!(
            symbol,
            bars = enriched.len(),
            signal = %classification.signal,
            "symbol classified"
        );
        SymbolOutcome::Row(ReportRow {
            symbol: symbol.to_string(),
            price: latest.close,
            vwap: latest.vwap,
            ema9: latest.ema9,
            ema21: latest.ema21,
            rsi6: latest.rsi6,
            volume_ratio: latest.vol_ratio,
            signal: classification.signal,
            reason: classification.reason,
            timestamp: now,
        })
    }

    /// Classify the latest bar of every watched symbol.
    pub fn scan_signals(&self, watch_list: &[String], now: DateTime<Utc>) -> Result<ScanOutput, ScanError> {
        if watch_list.is_empty() {
            return Err(ScanError::EmptyWatchList);
        }

        let mut output = ScanOutput::default();
        for symbol in watch_list {
            let outcome = self.evaluate_symbol(symbol, now);
            if let SymbolOutcome::Skip { reason, .. } = &outcome {
                tracing::warn!(symbol = %symbol, %reason, "signal scan skipped symbol");
            }
            output.push(outcome);
        }

        tracing::info!(
            watched = watch_list.len(),
            buy = output.count(Signal::Buy),
            sell = output.count(Signal::Sell),
            hold = output.count(Signal::Hold),
            skipped = output.skipped.len(),
            "signal scan complete"
        );
        Ok(output)
    }

    /// One full cycle: pick movers from the universe, then scan them.
    ///
    /// When no mover qualifies the report is empty; that is a normal outcome.
    pub fn run_cycle(&self, universe: &[String], now: DateTime<Utc>) -> Result<ScanOutput, ScanError> {
        let mut output = self.select_movers(universe, now)?;
        if output.movers.is_empty() {
            tracing::warn!("no movers found, skipping signal scan");
            return Ok(output);
        }

        let watch_list: Vec<String> = output.movers.iter().map(|m| m.symbol.clone()).collect();
        let signals = self.scan_signals(&watch_list, now)?;
        output.report = signals.report;
        output.skipped.extend(signals.skipped);
        Ok(output)
    }
}
