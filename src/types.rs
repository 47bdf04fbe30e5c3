use std::fmt;
use std::net::Ipv4Addr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_TIMEOUT_SECS: i64 = 1;
pub const DEFAULT_WORKERS: i64 = 10;
pub const MAX_WORKERS: i64 = 1000;

const MAX_PORT: i64 = 65535;

/// Classification of a single connect attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanOutcome {
    Open,
    Closed,
    Timeout,
    Error,
}

impl ScanOutcome {
    pub fn is_open(self) -> bool {
        matches!(self, ScanOutcome::Open)
    }
}

/// Target address and inclusive port range. Always satisfies `1 <= start <= end <= 65535`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanRange {
    address: Ipv4Addr,
    start: u16,
    end: u16,
}

impl ScanRange {
    pub fn new(address: Ipv4Addr, start: i64, end: i64) -> Result<Self, ConfigError> {
        if start < 1 || end > MAX_PORT || start > end {
            return Err(ConfigError::InvalidRange { start, end });
        }
        Ok(Self {
            address,
            start: start as u16,
            end: end as u16,
        })
    }

    pub fn address(&self) -> Ipv4Addr {
        self.address
    }

    pub fn start(&self) -> u16 {
        self.start
    }

    pub fn end(&self) -> u16 {
        self.end
    }

    /// Number of ports in the range (never zero).
    pub fn port_count(&self) -> u32 {
        u32::from(self.end) - u32::from(self.start) + 1
    }
}

/// Per-run tuning knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanConfig {
    timeout: Duration,
    workers: usize,
}

impl ScanConfig {
    /// Validate raw CLI values: timeout in seconds must be positive and the
    /// worker count must lie in `1..=1000`.
    pub fn new(timeout_secs: i64, workers: i64) -> Result<Self, ConfigError> {
        if timeout_secs <= 0 {
            return Err(ConfigError::InvalidTimeout(timeout_secs));
        }
        if !(1..=MAX_WORKERS).contains(&workers) {
            return Err(ConfigError::InvalidWorkerCount(workers));
        }
        Ok(Self {
            timeout: Duration::from_secs(timeout_secs as u64),
            workers: workers as usize,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn workers(&self) -> usize {
        self.workers
    }
}

/// How a run ended.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    Complete,
    Aborted,
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanStatus::Complete => f.write_str("complete"),
            ScanStatus::Aborted => f.write_str("aborted"),
        }
    }
}

/// Lifecycle of one run, used for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    Validating,
    Scanning,
    Aborting,
    Draining,
    Reporting,
    Done,
}

impl fmt::Display for ScanPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScanPhase::Validating => "validating",
            ScanPhase::Scanning => "scanning",
            ScanPhase::Aborting => "aborting",
            ScanPhase::Draining => "draining",
            ScanPhase::Reporting => "reporting",
            ScanPhase::Done => "done",
        };
        f.write_str(name)
    }
}

/// Final summary of a run. `open_ports` is sorted ascending.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ScanReport {
    pub target: String,
    pub address: Ipv4Addr,
    pub start_port: u16,
    pub end_port: u16,
    pub status: ScanStatus,
    pub open_ports: Vec<u16>,
    pub ports_claimed: u32,
    pub ports_probed: u32,
    pub started_at: String,
    pub finished_at: String,
}

const SEPARATOR: &str = "--------------------------";

impl ScanReport {
    /// Human-readable summary block printed at the end of a run.
    pub fn summary_text(&self) -> String {
        let ports = if self.open_ports.is_empty() {
            "No open ports found.".to_string()
        } else {
            self.open_ports
                .iter()
                .map(u16::to_string)
                .collect::<Vec<_>>()
                .join(" ")
        };
        let footer = match self.status {
            ScanStatus::Complete => "--- Scan Complete ---",
            ScanStatus::Aborted => "--- Scan Aborted by User ---",
        };
        format!("{SEPARATOR}\nSummary of Open Ports:\n{ports}\n{SEPARATOR}\n{footer}\n")
    }
}
