use std::net::SocketAddrV4;
use std::process::ExitCode;
use std::sync::Arc;

use tcp_sweep_rs::monitor::{self, TerminalGuard};
use tcp_sweep_rs::ports::parse_port_arg;
use tcp_sweep_rs::resolve::resolve_ipv4;
use tcp_sweep_rs::scanner::{NoopObserver, ScanObserver, Scanner};
use tcp_sweep_rs::types::{ScanConfig, ScanPhase, ScanRange, DEFAULT_TIMEOUT_SECS, DEFAULT_WORKERS};

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::ProgressBar;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// tcp-sweep-rs — concurrent TCP connect prober for one host and a port range.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "tcp-sweep-rs",
    version,
    about = "Concurrent TCP connect prober for one host and an inclusive port range.",
    long_about = None,
    allow_negative_numbers = true,
    after_help = "Example: tcp-sweep-rs -t 2 -j 50 example.com 80 443\n\nPress 'q' or ESC during a scan to stop it."
)]
struct Cli {
    /// Hostname or IPv4 address to scan.
    host: String,

    /// First port of the range (1-65535).
    start_port: String,

    /// Last port of the range, inclusive (1-65535).
    end_port: String,

    /// Timeout per port in seconds.
    #[arg(short = 't', long = "timeout", value_name = "SECONDS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout: i64,

    /// Number of concurrent workers (1-1000).
    #[arg(short = 'j', long = "jobs", value_name = "THREADS", default_value_t = DEFAULT_WORKERS)]
    jobs: i64,

    /// Print the final report as JSON instead of text.
    #[arg(long, default_value_t = false)]
    json: bool,
}

/// Prints `[OPEN] ip:port` lines above the progress bar.
struct OpenPortPrinter {
    pb: ProgressBar,
}

impl ScanObserver for OpenPortPrinter {
    fn port_open(&self, addr: SocketAddrV4) {
        let line = format!("[OPEN] {addr}");
        if self.pb.is_hidden() {
            println!("{line}");
        } else {
            self.pb.println(line);
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    init_tracing();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    debug!(phase = %ScanPhase::Validating, ?cli, "validating input");
    let config = ScanConfig::new(cli.timeout, cli.jobs)?;
    let start = parse_port_arg("start", &cli.start_port)?;
    let end = parse_port_arg("end", &cli.end_port)?;
    let address = resolve_ipv4(&cli.host).await?;
    let range = ScanRange::new(address, start, end)?;

    let cancel = CancellationToken::new();
    let done = CancellationToken::new();

    let guard = TerminalGuard::enable();
    monitor::spawn_abort_listener(cancel.clone(), done.clone(), guard.is_active());

    if !cli.json {
        println!("--- Starting Port Scan ---");
        println!(
            "Target: {} ({}) | Range: {} to {} | Timeout: {} sec | Threads: {}",
            cli.host,
            address,
            range.start(),
            range.end(),
            config.timeout().as_secs(),
            config.workers()
        );
        if guard.is_active() {
            println!("Press 'q' or ESC to stop scanning.");
        }
        println!("--------------------------");
    }

    let scanner = Scanner::new(cli.host.clone(), range, config, cancel);
    let (pb, observer): (ProgressBar, Arc<dyn ScanObserver>) = if cli.json {
        (ProgressBar::hidden(), Arc::new(NoopObserver))
    } else {
        let pb = monitor::progress_bar(range.port_count());
        (pb.clone(), Arc::new(OpenPortPrinter { pb }))
    };
    let progress = monitor::spawn_progress(scanner.frontier(), pb, done.clone());

    let outcome = scanner.run(observer).await;
    done.cancel();
    let _ = progress.await;
    drop(guard);

    let report = outcome.context("scan failed")?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("\n{}", report.summary_text());
    }
    Ok(())
}
