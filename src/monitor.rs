//! Collaborators that run next to a scan: the abort-key listener and the
//! progress bar. Neither touches scan state except through the cancellation
//! token and read-only frontier counters.

use std::io::{IsTerminal, Read};
use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::state::Frontier;

const ESC: u8 = 0x1b;
const PROGRESS_TICK: Duration = Duration::from_millis(100);

/// True for the keys that request an abort: `q`, `Q` and ESC.
pub fn is_abort_key(byte: u8) -> bool {
    matches!(byte, b'q' | b'Q' | ESC)
}

/// Puts the controlling terminal in non-canonical, no-echo mode so single
/// keypresses reach the listener. The previous settings come back on drop.
pub struct TerminalGuard {
    #[cfg(unix)]
    saved: Option<nix::sys::termios::Termios>,
}

impl TerminalGuard {
    /// Does nothing when stdin is not a terminal or the mode cannot be changed.
    #[cfg(unix)]
    pub fn enable() -> Self {
        use nix::sys::termios::{tcgetattr, tcsetattr, LocalFlags, SetArg};

        let stdin = std::io::stdin();
        if !stdin.is_terminal() {
            return Self { saved: None };
        }
        let saved = match tcgetattr(&stdin) {
            Ok(t) => t,
            Err(e) => {
                debug!(error = %e, "tcgetattr failed, abort key disabled");
                return Self { saved: None };
            }
        };
        let mut raw = saved.clone();
        raw.local_flags.remove(LocalFlags::ECHO | LocalFlags::ICANON);
        if let Err(e) = tcsetattr(&stdin, SetArg::TCSAFLUSH, &raw) {
            debug!(error = %e, "tcsetattr failed, abort key disabled");
            return Self { saved: None };
        }
        Self { saved: Some(saved) }
    }

    #[cfg(not(unix))]
    pub fn enable() -> Self {
        Self {}
    }

    #[cfg(unix)]
    pub fn is_active(&self) -> bool {
        self.saved.is_some()
    }

    #[cfg(not(unix))]
    pub fn is_active(&self) -> bool {
        false
    }
}

#[cfg(unix)]
impl Drop for TerminalGuard {
    fn drop(&mut self) {
        use nix::sys::termios::{tcsetattr, SetArg};

        if let Some(saved) = self.saved.take() {
            let _ = tcsetattr(std::io::stdin(), SetArg::TCSAFLUSH, &saved);
        }
    }
}

/// Cancel `cancel` when an abort key arrives on `input`.
///
/// Returns once an abort key is seen, the input hits EOF or fails, or `done`
/// is cancelled (checked between bytes).
pub fn watch_abort_keys<R: Read>(
    mut input: R,
    cancel: &CancellationToken,
    done: &CancellationToken,
) {
    let mut buf = [0u8; 1];
    while !cancel.is_cancelled() && !done.is_cancelled() {
        match input.read(&mut buf) {
            Ok(0) | Err(_) => break,
            Ok(_) if is_abort_key(buf[0]) => {
                debug!(key = buf[0], "abort key pressed");
                cancel.cancel();
                break;
            }
            Ok(_) => {}
        }
    }
}

/// Listen for abort keys on stdin and for Ctrl-C.
///
/// The stdin reader is a detached OS thread since a blocking read cannot be
/// interrupted; it is left behind when the process exits.
pub fn spawn_abort_listener(cancel: CancellationToken, done: CancellationToken, keys: bool) {
    if keys {
        let (cancel, done) = (cancel.clone(), done.clone());
        let spawned = std::thread::Builder::new()
            .name("abort-keys".into())
            .spawn(move || watch_abort_keys(std::io::stdin().lock(), &cancel, &done));
        if let Err(e) = spawned {
            debug!(error = %e, "could not start key listener");
        }
    }

    tokio::spawn(async move {
        tokio::select! {
            res = tokio::signal::ctrl_c() => {
                if res.is_ok() {
                    debug!("ctrl-c received");
                    cancel.cancel();
                }
            }
            _ = done.cancelled() => {}
        }
    });
}

/// Progress bar on stdout sized to the frontier. Hidden when stdout is not a
/// terminal.
pub fn progress_bar(total: u32) -> ProgressBar {
    let pb = ProgressBar::with_draw_target(Some(u64::from(total)), ProgressDrawTarget::stdout());
    let style = ProgressStyle::default_bar()
        .template("[{bar:40}] {percent:>3}% ({pos}/{len})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
    pb.set_style(style);
    pb
}

/// Refresh `pb` from the frontier every 100 ms until `done` fires.
pub fn spawn_progress(
    frontier: Arc<Frontier>,
    pb: ProgressBar,
    done: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(PROGRESS_TICK);
        loop {
            tokio::select! {
                _ = done.cancelled() => break,
                _ = tick.tick() => pb.set_position(u64::from(frontier.claimed())),
            }
        }
        pb.set_position(u64::from(frontier.claimed()));
        pb.finish();
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ScanRange;
    use std::io::Cursor;
    use std::net::Ipv4Addr;

    #[test]
    fn abort_keys() {
        assert!(is_abort_key(b'q'));
        assert!(is_abort_key(b'Q'));
        assert!(is_abort_key(0x1b));
        assert!(!is_abort_key(b'x'));
        assert!(!is_abort_key(b'\n'));
    }

    #[test]
    fn abort_key_cancels() {
        let cancel = CancellationToken::new();
        let done = CancellationToken::new();
        watch_abort_keys(Cursor::new(b"abq".to_vec()), &cancel, &done);
        assert!(cancel.is_cancelled());
    }

    #[test]
    fn eof_without_abort_key_leaves_scan_running() {
        let cancel = CancellationToken::new();
        let done = CancellationToken::new();
        watch_abort_keys(Cursor::new(b"hello\n".to_vec()), &cancel, &done);
        assert!(!cancel.is_cancelled());
    }

    #[tokio::test]
    async fn progress_finishes_at_claimed_count() {
        let range = ScanRange::new(Ipv4Addr::LOCALHOST, 1, 10).unwrap();
        let frontier = Arc::new(Frontier::new(&range));
        for _ in 0..4 {
            frontier.claim_next();
        }
        let pb = ProgressBar::hidden();
        pb.set_length(u64::from(frontier.total()));
        let done = CancellationToken::new();
        let handle = spawn_progress(frontier.clone(), pb.clone(), done.clone());
        done.cancel();
        handle.await.unwrap();
        assert_eq!(pb.position(), 4);
        assert!(pb.is_finished());
    }
}
