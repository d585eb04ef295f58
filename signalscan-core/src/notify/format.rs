//! Alert text formatting for HTML-mode messaging channels.

use chrono::{DateTime, Utc};

use crate::domain::Signal;

pub const DEFAULT_CURRENCY: &str = "₹";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

pub fn signal_emoji(signal: Signal) -> &'static str {
    match signal {
        Signal::Buy => "🟢",
        Signal::Sell => "🔴",
        Signal::Hold => "⚪",
    }
}

/// Escape the three characters HTML parse mode treats as markup.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render one classified signal as an alert message.
///
/// ```text
/// 🟢 <b>BUY Signal</b>
/// Symbol: <b>INFY.NS</b>
/// Time: 2024-03-04 05:00:00 UTC
/// Price: ₹1502.35
/// Reason: ...
/// ```
pub fn format_alert(
    symbol: &str,
    signal: Signal,
    reason: &str,
    price: f64,
    timestamp: DateTime<Utc>,
    currency: &str,
) -> String {
    format!(
        "{emoji} <b>{signal} Signal</b>\nSymbol: <b>{symbol}</b>\nTime: {time}\nPrice: {currency}{price:.2}\nReason: {reason}",
        emoji = signal_emoji(signal),
        symbol = escape_html(symbol),
        time = timestamp.format(TIMESTAMP_FORMAT),
        currency = escape_html(currency),
        reason = escape_html(reason),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, 5, 0, 0).unwrap()
    }

    #[test]
    fn buy_alert_layout() {
        let text = format_alert("INFY.NS", Signal::Buy, "momentum", 1502.346, ts(), DEFAULT_CURRENCY);
        assert_eq!(
            text,
            "🟢 <b>BUY Signal</b>\nSymbol: <b>INFY.NS</b>\nTime: 2024-03-04 05:00:00 UTC\nPrice: ₹1502.35\nReason: momentum"
        );
    }

    #[test]
    fn emoji_per_signal() {
        assert!(format_alert("X", Signal::Sell, "", 1.0, ts(), "$").starts_with("🔴 <b>SELL"));
        assert!(format_alert("X", Signal::Hold, "", 1.0, ts(), "$").starts_with("⚪ <b>HOLD"));
    }

    #[test]
    fn price_has_two_decimals_and_currency() {
        let text = format_alert("X", Signal::Hold, "", 7.0, ts(), "$");
        assert!(text.contains("Price: $7.00"));
    }

    #[test]
    fn reason_markup_is_escaped() {
        let text = format_alert("X", Signal::Buy, "EMA9>EMA21 & Vol<2x", 1.0, ts(), "$");
        assert!(text.ends_with("Reason: EMA9&gt;EMA21 &amp; Vol&lt;2x"));
    }
}
