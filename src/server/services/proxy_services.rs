use std::sync::Arc;

use axum::http::{HeaderMap, HeaderName, header};
use tracing::{debug, error};

use crate::server::{
    error::{AppResult, Error},
    utils::proxy_target::ProxyTarget,
};

/// the only request headers a player gets to pass upstream. `Host` is never one of them, the
/// client fills it in from the target url on every hop (redirects included)
pub const FORWARDED_REQUEST_HEADERS: [HeaderName; 3] =
    [header::RANGE, header::USER_AGENT, header::REFERER];

/// connection scoped headers that must not be copied from the upstream response
const HOP_BY_HOP_HEADERS: [HeaderName; 6] = [
    header::CONNECTION,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
    header::TE,
    header::TRAILER,
    header::PROXY_AUTHENTICATE,
];

pub type DynProxyService = Arc<dyn ProxyServiceTrait + Send + Sync>;

#[async_trait::async_trait]
pub trait ProxyServiceTrait {
    /// one GET against the target. fails only when the origin can't be reached, any status the
    /// origin answers with comes back in the response
    async fn fetch(&self, target: &ProxyTarget, inbound: &HeaderMap) -> AppResult<reqwest::Response>;
}

/// copies the allow-listed headers off the player's request
pub fn forwarded_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut forwarded = HeaderMap::new();
    for name in FORWARDED_REQUEST_HEADERS {
        if let Some(value) = inbound.get(&name) {
            forwarded.insert(name, value.clone());
        }
    }
    forwarded
}

/// upstream response headers minus the hop-by-hop ones
pub fn relayed_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut relayed = upstream.clone();
    for name in HOP_BY_HOP_HEADERS {
        relayed.remove(name);
    }
    relayed.remove("keep-alive");
    relayed.remove("proxy-connection");
    relayed
}

/// hls manifests are served as application/vnd.apple.mpegurl, application/x-mpegurl,
/// audio/mpegurl and a few more spellings, they all share this
pub fn is_manifest_content_type(content_type: &str) -> bool {
    content_type.to_ascii_lowercase().contains("mpegurl")
}

pub struct ProxyService {
    http: reqwest::Client,
}

impl ProxyService {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait::async_trait]
impl ProxyServiceTrait for ProxyService {
    async fn fetch(&self, target: &ProxyTarget, inbound: &HeaderMap) -> AppResult<reqwest::Response> {
        let target_url = target.url();
        let headers = forwarded_headers(inbound);

        debug!(
            "Sending request to {} (forwarding {} headers)",
            target_url,
            headers.len()
        );

        let response = self
            .http
            .get(&target_url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| {
                error!("Request to {} failed: {}", target_url, e);
                Error::UpstreamFetch(e.to_string())
            })?;

        debug!("Received response with status: {}", response.status());
        Ok(response)
    }
}
