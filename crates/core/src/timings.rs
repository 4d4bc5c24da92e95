use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::pagination::DEFAULT_PAGE_SIZE;

/// Artificial delays of the simulated backend, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    pub otp_send_delay_ms: u64,
    pub otp_verify_delay_ms: u64,
    pub reply_delay_ms: u64,
    pub page_load_delay_ms: u64,
    pub search_debounce_ms: u64,
    pub page_size: usize,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            otp_send_delay_ms: 2_000,
            otp_verify_delay_ms: 2_000,
            reply_delay_ms: 1_500,
            page_load_delay_ms: 500,
            search_debounce_ms: 300,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Timings {
    pub fn otp_send_delay(&self) -> Duration {
        Duration::from_millis(self.otp_send_delay_ms)
    }

    pub fn otp_verify_delay(&self) -> Duration {
        Duration::from_millis(self.otp_verify_delay_ms)
    }

    pub fn reply_delay(&self) -> Duration {
        Duration::from_millis(self.reply_delay_ms)
    }

    pub fn page_load_delay(&self) -> Duration {
        Duration::from_millis(self.page_load_delay_ms)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_settings_keep_remaining_defaults() {
        let timings: Timings = serde_json::from_str(r#"{"reply_delay_ms": 10}"#).unwrap();
        assert_eq!(timings.reply_delay(), Duration::from_millis(10));
        assert_eq!(timings.otp_send_delay(), Duration::from_secs(2));
        assert_eq!(timings.page_size, 20);
    }
}
