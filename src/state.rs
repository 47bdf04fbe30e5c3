//! Shared state handed to every worker: the port frontier, the open-port
//! collector and the cancellation token, bundled in a [`ScanContext`].

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::types::{ScanConfig, ScanRange};

/// Cursor over the not-yet-claimed ports of a range.
///
/// Claims are serialized by the internal lock, so every port is handed out
/// exactly once and in strictly increasing order. The claimed count is also
/// published through an atomic so progress readers never take the lock.
#[derive(Debug)]
pub struct Frontier {
    next: Mutex<u32>,
    end: u32,
    start: u32,
    claimed: AtomicU32,
}

impl Frontier {
    pub fn new(range: &ScanRange) -> Self {
        let start = u32::from(range.start());
        Self {
            next: Mutex::new(start),
            end: u32::from(range.end()),
            start,
            claimed: AtomicU32::new(0),
        }
    }

    /// Hand out the next unscanned port, or `None` once the range is exhausted.
    /// Calling again after exhaustion keeps returning `None`.
    pub fn claim_next(&self) -> Option<u16> {
        let mut next = self.next.lock();
        if *next > self.end {
            return None;
        }
        let port = *next as u16;
        *next += 1;
        self.claimed.store(*next - self.start, Ordering::Relaxed);
        Some(port)
    }

    /// Ports claimed so far. May lag a concurrent claim slightly.
    pub fn claimed(&self) -> u32 {
        self.claimed.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> u32 {
        self.end - self.start + 1
    }
}

/// Append-only list of ports found open.
#[derive(Debug, Default)]
pub struct ResultCollector {
    open: Mutex<Vec<u16>>,
}

impl ResultCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_open(&self, port: u16) {
        self.open.lock().push(port);
    }

    /// Ports recorded so far, sorted ascending. Only meaningful once every
    /// worker has stopped.
    pub fn snapshot_sorted(&self) -> Vec<u16> {
        let mut ports = self.open.lock().clone();
        ports.sort_unstable();
        ports
    }
}

/// Everything a worker needs, owned once per run and shared through an `Arc`.
#[derive(Debug)]
pub struct ScanContext {
    pub range: ScanRange,
    pub config: ScanConfig,
    pub frontier: Arc<Frontier>,
    pub collector: ResultCollector,
    pub cancel: CancellationToken,
    pub probed: AtomicU32,
}

impl ScanContext {
    pub fn new(range: ScanRange, config: ScanConfig, cancel: CancellationToken) -> Self {
        Self {
            frontier: Arc::new(Frontier::new(&range)),
            collector: ResultCollector::new(),
            range,
            config,
            cancel,
            probed: AtomicU32::new(0),
        }
    }

    pub fn probed(&self) -> u32 {
        self.probed.load(Ordering::Relaxed)
    }
}
