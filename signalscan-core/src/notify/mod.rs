//! Alert formatting and delivery.

pub mod format;
pub mod telegram;
pub mod transport;

pub use format::{escape_html, format_alert, signal_emoji, DEFAULT_CURRENCY, TIMESTAMP_FORMAT};
pub use telegram::TelegramNotifier;
pub use transport::{DeliveryOutcome, Notifier};
