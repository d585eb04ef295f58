//! Notification transport trait.

use serde::{Deserialize, Serialize};

/// Result of one delivery attempt. Transport failures are data, not errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryOutcome {
    pub sent: bool,
    /// Opaque response body or error text, for the alert log only.
    pub response: String,
}

impl DeliveryOutcome {
    pub fn sent(response: impl Into<String>) -> Self {
        Self {
            sent: true,
            response: response.into(),
        }
    }

    pub fn failed(response: impl Into<String>) -> Self {
        Self {
            sent: false,
            response: response.into(),
        }
    }
}

/// A channel that can deliver formatted alert text to a destination.
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    /// Attempt delivery. Must not panic and must not block longer than the
    /// transport's own timeout.
    fn deliver(&self, text: &str, destination: &str) -> DeliveryOutcome;
}
