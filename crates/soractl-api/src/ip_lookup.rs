// Best-effort public IP discovery.
//
// Used to narrow a port mapping's allowed source range to the operator's
// own address. Failure here is never fatal: the caller falls back to the
// open range and the mapping still works, just less tightly scoped.

use std::net::IpAddr;
use std::time::Duration;

use tracing::{debug, warn};

/// IP echo services, tried in order.
const PROVIDERS: [&str; 2] = ["https://api.ipify.org", "https://ifconfig.me/ip"];

/// Timeout per lookup attempt. Short on purpose: this runs inline before
/// opening a remote session and must not stall the operation.
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(3);

/// Discover the caller's public IP address.
///
/// Tries each provider in turn with a short timeout; returns `None` when
/// all fail.
pub async fn discover_public_ip() -> Option<IpAddr> {
    let client = reqwest::Client::builder()
        .timeout(LOOKUP_TIMEOUT)
        .build()
        .ok()?;

    for provider in PROVIDERS {
        match fetch_ip(&client, provider).await {
            Some(ip) => {
                debug!(%ip, provider, "discovered public IP");
                return Some(ip);
            }
            None => warn!(provider, "public IP lookup failed, trying next provider"),
        }
    }

    warn!("unable to determine public IP; falling back to open source range");
    None
}

/// Discover the caller's public IP as a /32 source range.
pub async fn discover_source_range() -> Option<String> {
    discover_public_ip().await.map(|ip| format!("{ip}/32"))
}

async fn fetch_ip(client: &reqwest::Client, provider: &str) -> Option<IpAddr> {
    let resp = client.get(provider).send().await.ok()?;
    if !resp.status().is_success() {
        return None;
    }
    let body = resp.text().await.ok()?;
    body.trim().parse().ok()
}
