//! Alert dispatch and the in-memory alert log.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use signalscan_core::domain::Signal;
use signalscan_core::notify::{format_alert, Notifier};

use crate::scanner::ReportRow;

/// Transport responses are cut to this many characters in the log.
pub const RESPONSE_EXCERPT_CHARS: usize = 200;

/// Rows shown by the alert log panel.
pub const RECENT_WINDOW: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertLogEntry {
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub signal: Signal,
    pub sent: bool,
    pub response_excerpt: String,
}

/// Append-only log of delivery attempts, shared between the manual and the
/// timed refresh paths. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct AlertLog {
    entries: Arc<Mutex<Vec<AlertLogEntry>>>,
}

impl AlertLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, entry: AlertLogEntry) {
        self.entries.lock().push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// The last `n` entries in append order.
    pub fn recent(&self, n: usize) -> Vec<AlertLogEntry> {
        let entries = self.entries.lock();
        let skip = entries.len().saturating_sub(n);
        entries[skip..].to_vec()
    }

    pub fn entries(&self) -> Vec<AlertLogEntry> {
        self.entries.lock().clone()
    }
}

/// Where and how alerts are rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertTarget {
    /// Transport-specific address, e.g. a Telegram chat id.
    pub destination: String,
    pub currency: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchSummary {
    pub attempted: usize,
    pub sent: usize,
}

pub fn excerpt(text: &str) -> String {
    text.chars().take(RESPONSE_EXCERPT_CHARS).collect()
}

/// Send one alert per report row, logging every attempt.
///
/// Rows are sent in order; a failed delivery is logged and the next row is
/// still attempted.
pub fn dispatch_alerts(
    rows: &[ReportRow],
    notifier: &dyn Notifier,
    target: &AlertTarget,
    log: &AlertLog,
    now: DateTime<Utc>,
) -> DispatchSummary {
    let mut summary = DispatchSummary::default();

    for row in rows {
        let text = format_alert(
            &row.symbol,
            row.signal,
            &row.reason,
            row.price,
            row.timestamp,
            &target.currency,
        );
        let outcome = notifier.deliver(&text, &target.destination);

        summary.attempted += 1;
        if outcome.sent {
            summary.sent += 1;
        } else {
            tracing::warn!(
                symbol = %row.symbol,
                notifier = notifier.name(),
                response = %excerpt(&outcome.response),
                "alert not delivered"
            );
        }

        log.append(AlertLogEntry {
            timestamp: now,
            symbol: row.symbol.clone(),
            signal: row.signal,
            sent: outcome.sent,
            response_excerpt: excerpt(&outcome.response),
        });
    }

    tracing::info!(attempted = summary.attempted, sent = summary.sent, "alerts dispatched");
    summary
}
