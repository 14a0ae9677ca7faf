//! Serial port settings.

use std::time::Duration;

pub const DEFAULT_PORT: &str = "/dev/ttyACM1";
pub const DEFAULT_BAUD_RATE: u32 = 115_200;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10);

/// Baud rates the lamp firmware is known to run at.
pub const STANDARD_BAUD_RATES: [u32; 5] = [9600, 19200, 38400, 57600, 115_200];

#[derive(Debug, Clone, PartialEq)]
pub struct PortConfig {
    /// Device path, e.g. `/dev/ttyACM1` or `COM3`.
    pub path: String,
    pub baud_rate: u32,
    /// Read timeout. A read that times out is treated as "no data yet".
    pub timeout: Duration,
    /// Lock the device against other openers (Unix only).
    pub exclusive: bool,
}

impl Default for PortConfig {
    fn default() -> Self {
        Self {
            path: String::from(DEFAULT_PORT),
            baud_rate: DEFAULT_BAUD_RATE,
            timeout: DEFAULT_TIMEOUT,
            exclusive: false,
        }
    }
}

impl PortConfig {
    pub fn new(path: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            path: path.into(),
            baud_rate,
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_exclusive(mut self, exclusive: bool) -> Self {
        self.exclusive = exclusive;
        self
    }

    pub fn is_standard_baud(&self) -> bool {
        STANDARD_BAUD_RATES.contains(&self.baud_rate)
    }
}
