// src/notify/mod.rs
// =============================================================================
// Alerts for changed pages.
//
// The crawl only ever calls `notify(event)` and moves on: it never waits for
// delivery and never learns whether anyone was listening. Connecting,
// reconnecting and dropping undeliverable alerts is the channel's business.
//
// Submodules:
// - contactor: TCP channel to the external "contactor" process
// =============================================================================

mod contactor;

pub use contactor::ContactorChannel;

use url::Url;

/// Identifies this program to the contactor.
pub const SOURCE_ID: &str = "site-watchdog";

/// One page whose content changed during a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub url: Url,
    /// 1-based position of this change within its scan
    pub sequence: usize,
}

impl ChangeEvent {
    /// Human-readable alert text.
    pub fn message(&self) -> String {
        format!("[SiteWatchdog] - Change detected on: {}", self.url)
    }
}

/// A one-way, fire-and-forget alert sink.
pub trait Notifier: Send + Sync {
    fn notify(&self, event: ChangeEvent);
}

/// Sink used when no contactor is configured: the change is only logged.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, event: ChangeEvent) {
        tracing::info!(url = %event.url, sequence = event.sequence, "alert not forwarded (no contactor)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_names_the_page() {
        let event = ChangeEvent {
            url: Url::parse("https://example.com/news").unwrap(),
            sequence: 1,
        };
        assert_eq!(
            event.message(),
            "[SiteWatchdog] - Change detected on: https://example.com/news"
        );
    }
}
