use std::future::Future;
use std::io;
use std::net::{SocketAddr, SocketAddrV4};
use std::time::Duration;

use tokio::net::TcpSocket;
use tokio::time;
use tracing::trace;

use crate::types::ScanOutcome;

/// Attempt one TCP connect to `addr`, waiting at most `timeout`.
///
/// - Socket creation failure maps to `Error`.
/// - A refused or otherwise failed connect maps to `Closed`.
/// - No answer before the deadline maps to `Timeout`.
/// - A completed handshake maps to `Open`.
///
/// The socket is owned by this call and dropped before it returns, so it is
/// closed exactly once on every path. There are no retries.
pub async fn probe(addr: SocketAddrV4, timeout: Duration) -> ScanOutcome {
    let socket = match TcpSocket::new_v4() {
        Ok(s) => s,
        Err(e) => {
            trace!(%addr, error = %e, "socket creation failed");
            return ScanOutcome::Error;
        }
    };

    connect_within(addr, socket.connect(SocketAddr::V4(addr)), timeout).await
}

/// Drive a pending connect to completion or until `timeout` elapses.
/// The connection, if any, is dropped before returning.
async fn connect_within<F, S>(addr: SocketAddrV4, connect: F, timeout: Duration) -> ScanOutcome
where
    F: Future<Output = io::Result<S>>,
{
    match time::timeout(timeout, connect).await {
        Ok(Ok(_stream)) => ScanOutcome::Open,
        Ok(Err(e)) => {
            trace!(%addr, error = %e, "connect failed");
            ScanOutcome::Closed
        }
        Err(_) => {
            trace!(%addr, ?timeout, "connect timed out");
            ScanOutcome::Timeout
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, TcpListener};
    use std::time::Instant;

    fn local(port: u16) -> SocketAddrV4 {
        SocketAddrV4::new(Ipv4Addr::LOCALHOST, port)
    }

    #[tokio::test]
    async fn listening_port_is_open() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let outcome = probe(local(port), Duration::from_secs(1)).await;
        assert_eq!(outcome, ScanOutcome::Open);
    }

    #[tokio::test]
    async fn refused_port_is_closed() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let outcome = probe(local(port), Duration::from_secs(1)).await;
        assert_eq!(outcome, ScanOutcome::Closed);
    }

    #[tokio::test]
    async fn unanswered_connect_times_out_on_deadline() {
        let timeout = Duration::from_millis(50);
        let started = Instant::now();
        let outcome =
            connect_within(local(9), std::future::pending::<io::Result<()>>(), timeout).await;
        let elapsed = started.elapsed();

        assert_eq!(outcome, ScanOutcome::Timeout);
        assert!(elapsed >= timeout, "returned early after {elapsed:?}");
        assert!(elapsed < timeout + Duration::from_millis(500), "took {elapsed:?}");
    }

    #[tokio::test]
    async fn failed_connect_is_closed_not_error() {
        let refused = async { Err::<(), _>(io::Error::from(io::ErrorKind::ConnectionRefused)) };
        let outcome = connect_within(local(9), refused, Duration::from_secs(1)).await;
        assert_eq!(outcome, ScanOutcome::Closed);
    }
}
