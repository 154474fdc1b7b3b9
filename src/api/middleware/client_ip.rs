//! Client address resolution

use std::net::SocketAddr;

use axum::http::HeaderMap;

pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Fallback when neither a forwarding header nor the peer address is known
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Resolves the address a session is bound to
///
/// Uses the first entry of `X-Forwarded-For` with any port removed, otherwise
/// the peer address of the connection.
pub fn resolve_client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get(FORWARDED_FOR_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|first| !first.is_empty());

    match (forwarded, peer) {
        (Some(first), _) => strip_port(first),
        (None, Some(peer)) => peer.ip().to_string(),
        (None, None) => UNKNOWN_CLIENT.to_string(),
    }
}

fn strip_port(address: &str) -> String {
    if let Ok(socket) = address.parse::<SocketAddr>() {
        return socket.ip().to_string();
    }

    // `host:port` with a single colon; bare IPv6 addresses are left alone
    match address.split_once(':') {
        Some((host, port)) if !port.contains(':') => host.to_string(),
        _ => address.to_string(),
    }
}
