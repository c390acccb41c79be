use crate::GatewayRequest;

use std::net::{IpAddr, SocketAddr};

use log::warn;

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Resolve the client address behind up to `max_trusted_index` proxies.
///
/// `X-Forwarded-For` entries are read right to left and the entry at
/// `min(len, max_trusted_index) - 1` is the client. Without the header (or
/// with more than one of them) the socket peer address is used.
pub fn resolve_client_ip(request: &GatewayRequest<'_>, max_trusted_index: usize) -> Option<IpAddr> {
    let mut forwarded = request.headers().get_all(X_FORWARDED_FOR).iter();
    let first = forwarded.next();

    if forwarded.next().is_some() {
        warn!("Multiple X-Forwarded-For headers found, falling back to the peer address");
        return peer_ip(request);
    }

    let Some(header) = first.and_then(|v| v.to_str().ok()) else {
        return peer_ip(request);
    };

    let hops: Vec<&str> = header
        .split(',')
        .map(str::trim)
        .filter(|hop| !hop.is_empty())
        .rev()
        .collect();

    if hops.is_empty() {
        return peer_ip(request);
    }

    let index = hops.len().min(max_trusted_index.max(1)) - 1;
    parse_hop(hops[index])
}

fn peer_ip(request: &GatewayRequest<'_>) -> Option<IpAddr> {
    request.remote_addr().map(|addr| addr.ip())
}

// Hops may carry a port
fn parse_hop(hop: &str) -> Option<IpAddr> {
    hop.parse::<IpAddr>()
        .ok()
        .or_else(|| hop.parse::<SocketAddr>().ok().map(|addr| addr.ip()))
        .or_else(|| {
            warn!("Ignoring unparseable X-Forwarded-For entry '{}'", hop);
            None
        })
}
