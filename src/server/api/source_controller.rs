// lets the player read an m3u straight off a cors-hostile origin without storing it
use axum::{
    Extension, Router,
    extract::Query,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use tracing::warn;

use crate::server::{
    dtos::playlist_dto::FetchSourceQuery,
    error::Error,
    services::{AppServices, playlist_services::validate_source_url},
};

const DEFAULT_SOURCE_CONTENT_TYPE: &str = "application/vnd.apple.mpegurl; charset=utf-8";

pub struct SourceController;

impl SourceController {
    pub fn app() -> Router {
        Router::new().route("/", get(Self::fetch_source).options(Self::fetch_source_options))
    }

    async fn fetch_source(
        Extension(services): Extension<AppServices>,
        Query(params): Query<FetchSourceQuery>,
    ) -> Response {
        let Some(url) = params.url.filter(|u| !u.trim().is_empty()) else {
            return Self::text_response(
                StatusCode::BAD_REQUEST,
                "missing \"url\" query parameter".to_string(),
            );
        };

        if validate_source_url(&url).is_err() {
            return Self::text_response(
                StatusCode::BAD_REQUEST,
                "invalid \"url\" parameter".to_string(),
            );
        }

        match services.playlists.fetch_source(&url).await {
            Ok(source) => {
                let content_type = source
                    .content_type
                    .as_deref()
                    .and_then(|ct| HeaderValue::from_str(ct).ok())
                    .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_SOURCE_CONTENT_TYPE));

                let mut headers = Self::cors_headers();
                headers.insert(header::CONTENT_TYPE, content_type);
                (StatusCode::OK, headers, source.body).into_response()
            }
            Err(Error::UpstreamStatus(status)) => {
                warn!("source {} answered {}", url, status);
                Self::text_response(status, format!("failed to fetch source M3U: {}", status))
            }
            Err(e) => {
                let mut response = e.into_response();
                response.headers_mut().extend(Self::cors_headers());
                response
            }
        }
    }

    async fn fetch_source_options() -> impl IntoResponse {
        let mut headers = Self::cors_headers();
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, OPTIONS"),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        );
        headers.insert(
            header::ACCESS_CONTROL_MAX_AGE,
            HeaderValue::from_static("86400"),
        );
        (StatusCode::NO_CONTENT, headers)
    }

    fn cors_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        );
        headers
    }

    fn text_response(status: StatusCode, message: String) -> Response {
        let mut headers = Self::cors_headers();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        (status, headers, message).into_response()
    }
}
