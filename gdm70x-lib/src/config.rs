use crate::constants::{DEFAULT_BAUDRATE, DEFAULT_READ_TIMEOUT, SYNC_PROBE_BUDGET};
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Connection settings.
///
/// The meter always sends `.` as its decimal point. `decimal_separator` names
/// an additional character accepted as the radix, so captures that went
/// through locale-aware tooling still decode the same way.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Config {
    pub decimal_separator: char,
    pub sync_probe_budget: usize,
    pub baud_rate: u32,
    pub read_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            decimal_separator: '.',
            sync_probe_budget: SYNC_PROBE_BUDGET,
            baud_rate: DEFAULT_BAUDRATE,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

impl Config {
    pub fn with_decimal_separator(mut self, separator: char) -> Self {
        self.decimal_separator = separator;
        self
    }

    pub fn with_sync_probe_budget(mut self, budget: usize) -> Self {
        self.sync_probe_budget = budget;
        self
    }

    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }
}
