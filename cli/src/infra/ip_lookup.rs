//! Public address lookup — implements `PublicIpLookup` over HTTP.

use std::net::Ipv4Addr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::application::ports::PublicIpLookup;

/// Echo service returning the caller's address as plain text.
pub const CHECKIP_URL: &str = "http://checkip.amazonaws.com";

/// Production implementation that asks an echo service, using
/// `spawn_blocking` around the blocking HTTP client.
pub struct CheckIpLookup {
    url: String,
}

impl CheckIpLookup {
    #[must_use]
    pub fn new() -> Self {
        Self {
            url: std::env::var("SPARKCTL_CHECKIP_URL").unwrap_or_else(|_| CHECKIP_URL.to_string()),
        }
    }
}

impl Default for CheckIpLookup {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse the echo service body: one IPv4 address, surrounding whitespace
/// ignored.
///
/// # Errors
///
/// Returns an error if the body is not an IPv4 address.
pub fn parse_address(body: &str) -> Result<Ipv4Addr> {
    body.trim()
        .parse()
        .with_context(|| format!("unexpected address {:?}", body.trim()))
}

impl PublicIpLookup for CheckIpLookup {
    async fn public_ip(&self) -> Result<Ipv4Addr> {
        let url = self.url.clone();
        let body = tokio::task::spawn_blocking(move || {
            let resp = ureq::get(&url)
                .timeout(Duration::from_secs(10))
                .set("User-Agent", "sparkctl")
                .call();
            match resp {
                Ok(resp) => resp.into_string().context("reading response"),
                Err(ureq::Error::Status(code, _)) => anyhow::bail!("{url} returned HTTP {code}"),
                Err(e) => Err(anyhow::anyhow!("cannot reach {url}: {e}")),
            }
        })
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking panicked: {e}"))??;
        parse_address(&body)
    }
}
