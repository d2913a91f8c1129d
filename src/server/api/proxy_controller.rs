// the same-origin tunnel the player goes through. every url is encoded as
// /proxy/<scheme>/<host>/<path>?<query> and manifests get rewritten so their entries come back here too
use axum::{
    Router,
    body::Body,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use futures::TryStreamExt;
use metrics::counter;
use tracing::{debug, error, warn};

use crate::server::{
    error::{AppResult, Error},
    extractors::ProxyRequest,
    services::{
        AppServices,
        proxy_services::{is_manifest_content_type, relayed_headers},
    },
    utils::{manifest_rewriter::rewrite_manifest, proxy_target::ProxyTarget},
};

/// hls.js needs to read range and length headers cross-origin
const EXPOSED_HEADERS: &str = "*";

pub struct ProxyController;

impl ProxyController {
    pub fn app() -> Router {
        Router::new().route(
            "/{scheme}/{*rest}",
            get(Self::proxy_get).options(Self::proxy_options),
        )
    }

    /// forces the cors headers the player depends on, whatever upstream sent
    pub fn apply_cors_headers(headers: &mut HeaderMap) {
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        );
        headers.insert(
            header::ACCESS_CONTROL_EXPOSE_HEADERS,
            HeaderValue::from_static(EXPOSED_HEADERS),
        );
    }

    async fn proxy_get(request: AppResult<ProxyRequest>, headers: HeaderMap) -> Response {
        let result = match request {
            Ok(ProxyRequest {
                target,
                origin,
                services,
            }) => Self::forward(&target, &origin, &services, &headers).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(response) => response,
            Err(e) => {
                // players decide on retries from the status so it goes back as is, cors included
                let mut response = e.into_response();
                Self::apply_cors_headers(response.headers_mut());
                response
            }
        }
    }

    async fn forward(
        target: &ProxyTarget,
        origin: &str,
        services: &AppServices,
        headers: &HeaderMap,
    ) -> AppResult<Response> {
        let target_response = services.proxy.fetch(target, headers).await.inspect_err(|_| {
            counter!("proxy_upstream_failures_total", "reason" => "transport").increment(1);
        })?;

        // 206 is already a 2xx but range responses are the whole point for segments, spell it out
        let status = target_response.status();
        if !status.is_success() && status != StatusCode::PARTIAL_CONTENT {
            warn!("Upstream {} answered {}", target.url(), status);
            counter!("proxy_upstream_failures_total", "reason" => "status").increment(1);
            return Err(Error::UpstreamStatus(status));
        }

        let mut response_headers = relayed_headers(target_response.headers());
        Self::apply_cors_headers(&mut response_headers);

        let content_type = response_headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if is_manifest_content_type(&content_type) {
            counter!("proxy_requests_total", "kind" => "manifest").increment(1);
            debug!("Processing {} as manifest ({})", target.url(), content_type);

            // a manifest has to be complete before any of it can be rewritten, they're small
            let text = target_response.text().await.map_err(|e| {
                error!("Failed to read manifest from {}: {}", target.url(), e);
                Error::UpstreamFetch(e.to_string())
            })?;

            let rewritten = rewrite_manifest(&text, &target.base_directory(), origin);

            // the old length is wrong now, hyper works out the new one
            response_headers.remove(header::CONTENT_LENGTH);

            return Ok((status, response_headers, rewritten).into_response());
        }

        counter!("proxy_requests_total", "kind" => "passthrough").increment(1);
        debug!(
            "Streaming {} untouched ({}, status {})",
            target.url(),
            content_type,
            status
        );

        // segments go through chunk by chunk. when the player hangs up hyper drops this body,
        // which drops the upstream response and with it the upstream connection
        let target_url = target.url();
        let stream = target_response.bytes_stream().inspect_err(move |e| {
            warn!("Upstream stream from {} broke off: {}", target_url, e);
        });

        Ok((status, response_headers, Body::from_stream(stream)).into_response())
    }

    /// preflights from any origin, whatever headers the player asks for (usually `Range`) are allowed
    async fn proxy_options(request_headers: HeaderMap) -> impl IntoResponse {
        let mut headers = HeaderMap::new();
        Self::apply_cors_headers(&mut headers);
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, OPTIONS"),
        );

        let allowed_headers = request_headers
            .get(header::ACCESS_CONTROL_REQUEST_HEADERS)
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static("*"));
        headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, allowed_headers);
        headers.insert(
            header::ACCESS_CONTROL_MAX_AGE,
            HeaderValue::from_static("86400"),
        );

        (StatusCode::NO_CONTENT, headers)
    }
}
