//! Client configuration and JSON loading.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Settings for one agency's client run.
///
/// Every field has a default, so a configuration file only needs the values
/// that differ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
#[non_exhaustive]
pub struct ClientConfig {
    /// Agency identifier stamped on every bet.
    pub agency: u32,
    /// `host:port` of the lottery server.
    pub server_address: String,
    /// Maximum bets per `MultipleBet` frame.
    pub batch_size: usize,
    /// First wait between result polls, in milliseconds.
    pub poll_interval_ms: u64,
    /// Ceiling for the doubling poll wait, in milliseconds.
    pub max_poll_interval_ms: u64,
    /// Extra attempts for the end-of-submission frame.
    pub end_retries: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            agency: 1,
            server_address: "127.0.0.1:12345".to_owned(),
            batch_size: 100,
            poll_interval_ms: 1_000,
            max_poll_interval_ms: 8_000,
            end_retries: 3,
        }
    }
}

impl ClientConfig {
    /// Loads and validates a JSON configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be at least 1".into()));
        }
        if self.server_address.is_empty() {
            return Err(Error::InvalidConfig("server_address is empty".into()));
        }
        if self.poll_interval_ms > self.max_poll_interval_ms {
            return Err(Error::InvalidConfig(format!(
                "poll_interval_ms ({}) exceeds max_poll_interval_ms ({})",
                self.poll_interval_ms, self.max_poll_interval_ms
            )));
        }
        Ok(())
    }

    /// First wait between result polls.
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Ceiling for the poll wait.
    pub const fn max_poll_interval(&self) -> Duration {
        Duration::from_millis(self.max_poll_interval_ms)
    }
}
