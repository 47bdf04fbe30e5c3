use crate::error::Result;
use crate::probe::probe;
use crate::state::{Frontier, ScanContext};
use crate::types::{ScanConfig, ScanPhase, ScanRange, ScanReport, ScanStatus};
use std::net::SocketAddrV4;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};
use ::time::{format_description::well_known, OffsetDateTime};

/// Receives open-port notifications as soon as a worker finds one.
///
/// Called concurrently from many workers; discovery order is arbitrary.
pub trait ScanObserver: Send + Sync {
    fn port_open(&self, addr: SocketAddrV4);
}

/// Observer that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ScanObserver for NoopObserver {
    fn port_open(&self, _addr: SocketAddrV4) {}
}

/// One scan run: a fixed pool of workers draining a shared port frontier.
///
/// - Each worker claims the next port, probes it with a bounded connect and
///   records open ports in the shared collector.
/// - The cancellation token stops new claims; probes already in flight finish
///   on their own timeout.
/// - The report lists open ports in ascending order whatever order they were
///   found in.
#[derive(Debug)]
pub struct Scanner {
    target: String,
    ctx: Arc<ScanContext>,
}

impl Scanner {
    pub fn new(
        target: impl Into<String>,
        range: ScanRange,
        config: ScanConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            target: target.into(),
            ctx: Arc::new(ScanContext::new(range, config, cancel)),
        }
    }

    /// Read-only handle for progress reporting.
    pub fn frontier(&self) -> Arc<Frontier> {
        self.ctx.frontier.clone()
    }

    /// Launch the worker pool, wait for every worker and build the report.
    ///
    /// A worker that fails to join cancels the rest; once they have drained
    /// the failure is returned instead of a report.
    pub async fn run(self, observer: Arc<dyn ScanObserver>) -> Result<ScanReport> {
        let ctx = self.ctx;
        let started_at = now_rfc3339();
        let workers = ctx.config.workers();

        debug!(
            phase = %ScanPhase::Scanning,
            address = %ctx.range.address(),
            start = ctx.range.start(),
            end = ctx.range.end(),
            workers,
            "starting worker pool"
        );

        let mut set = JoinSet::new();
        for id in 0..workers {
            set.spawn(run_worker(id, ctx.clone(), observer.clone()));
        }

        let mut failure = None;
        let mut aborting = false;
        loop {
            tokio::select! {
                joined = set.join_next() => match joined {
                    None => break,
                    Some(Ok(())) => {}
                    Some(Err(e)) => {
                        warn!(error = %e, "worker failed, cancelling scan");
                        ctx.cancel.cancel();
                        failure.get_or_insert(e);
                    }
                },
                _ = ctx.cancel.cancelled(), if !aborting => {
                    aborting = true;
                    debug!(
                        phase = %ScanPhase::Aborting,
                        claimed = ctx.frontier.claimed(),
                        "cancellation requested"
                    );
                    debug!(phase = %ScanPhase::Draining, "waiting for in-flight probes");
                }
            }
        }

        if let Some(e) = failure {
            return Err(e.into());
        }

        debug!(phase = %ScanPhase::Reporting, probed = ctx.probed(), "all workers joined");
        let status = if ctx.cancel.is_cancelled() {
            ScanStatus::Aborted
        } else {
            ScanStatus::Complete
        };

        let report = ScanReport {
            target: self.target,
            address: ctx.range.address(),
            start_port: ctx.range.start(),
            end_port: ctx.range.end(),
            status,
            open_ports: ctx.collector.snapshot_sorted(),
            ports_claimed: ctx.frontier.claimed(),
            ports_probed: ctx.probed(),
            started_at,
            finished_at: now_rfc3339(),
        };
        debug!(phase = %ScanPhase::Done, %status, open = report.open_ports.len(), "scan finished");
        Ok(report)
    }
}

async fn run_worker(id: usize, ctx: Arc<ScanContext>, observer: Arc<dyn ScanObserver>) {
    let mut probed = 0u32;
    loop {
        if ctx.cancel.is_cancelled() {
            break;
        }
        let Some(port) = ctx.frontier.claim_next() else {
            break;
        };
        // The claimed port is dropped unscanned if an abort raced the claim.
        if ctx.cancel.is_cancelled() {
            trace!(worker = id, port, "abort after claim, port skipped");
            break;
        }

        let addr = SocketAddrV4::new(ctx.range.address(), port);
        let outcome = probe(addr, ctx.config.timeout()).await;
        probed += 1;
        ctx.probed.fetch_add(1, Ordering::Relaxed);
        trace!(worker = id, port, ?outcome, "probe finished");

        if outcome.is_open() {
            info!(%addr, "open port");
            observer.port_open(addr);
            ctx.collector.record_open(port);
        }
    }
    debug!(worker = id, probed, "worker exiting");
}

fn now_rfc3339() -> String {
    let now = OffsetDateTime::now_utc();
    now.format(&well_known::Rfc3339)
        .unwrap_or_else(|_| String::from("1970-01-01T00:00:00Z"))
}
