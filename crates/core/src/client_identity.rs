//! Client identity resolution for rate limiting.
//!
//! Precedence is `X-Real-IP` > first hop of `X-Forwarded-For` > peer
//! address. Each source is applied in that literal order and the last one
//! present wins.

/// Identity used when the peer address is unknown.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Resolve the identity string a request is rate limited under.
///
/// Empty or whitespace-only header values are ignored.
pub fn resolve_client_identity(
    peer_addr: Option<&str>,
    forwarded_for: Option<&str>,
    real_ip: Option<&str>,
) -> String {
    let mut client = peer_addr.unwrap_or(UNKNOWN_CLIENT).to_string();

    if let Some(first_hop) = forwarded_for
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        client = first_hop.to_string();
    }

    if let Some(real) = real_ip.map(str::trim).filter(|v| !v.is_empty()) {
        client = real.to_string();
    }

    client
}
