use std::net::{IpAddr, Ipv4Addr};

use tokio::net::lookup_host;
use tracing::debug;

use crate::error::ConfigError;

/// Resolve a hostname or IPv4 literal to a single IPv4 address.
///
/// Literals are returned without a lookup. Otherwise the system resolver is
/// asked and the first IPv4 answer wins. IPv6 literals and hosts with only
/// IPv6 records are reported as unresolved.
pub async fn resolve_ipv4(host: &str) -> Result<Ipv4Addr, ConfigError> {
    let host = host.trim();
    match host.parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => return Ok(v4),
        Ok(IpAddr::V6(_)) => return Err(ConfigError::Unresolved(host.to_string())),
        Err(_) => {}
    }
    if host.is_empty() {
        return Err(ConfigError::Unresolved(host.to_string()));
    }

    let addrs = lookup_host((host, 0)).await.map_err(|e| {
        debug!(host, error = %e, "name lookup failed");
        ConfigError::Unresolved(host.to_string())
    })?;

    addrs
        .filter_map(|sa| match sa.ip() {
            IpAddr::V4(v4) => Some(v4),
            IpAddr::V6(_) => None,
        })
        .next()
        .ok_or_else(|| ConfigError::Unresolved(host.to_string()))
}
