use axum::Extension;
use axum::extract::{FromRequestParts, OriginalUri};
use axum::http::request::Parts;
use axum::http::{HeaderMap, header};
use tracing::debug;

use crate::server::error::Error;
use crate::server::services::app_services::AppServices;
use crate::server::utils::proxy_target::ProxyTarget;

/// a request on the proxy route: the upstream target, the origin to write into rewritten
/// manifests and the services
pub struct ProxyRequest {
    pub target: ProxyTarget,
    pub origin: String,
    pub services: AppServices,
}

/// origin the client used to reach us. a configured public origin always wins, otherwise it's
/// pieced together from forwarded headers and `Host`
pub fn request_origin(headers: &HeaderMap, public_origin: Option<&str>) -> String {
    if let Some(origin) = public_origin {
        return origin.trim_end_matches('/').to_string();
    }

    let first_value = |name: &str| {
        headers
            .get(name)
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.split(',').next())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    };

    let scheme = first_value("x-forwarded-proto").unwrap_or_else(|| "http".to_string());
    let host = first_value("x-forwarded-host")
        .or_else(|| first_value(header::HOST.as_str()))
        .unwrap_or_else(|| "localhost".to_string());

    format!("{}://{}", scheme, host)
}

impl<S> FromRequestParts<S> for ProxyRequest
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Extension(services): Extension<AppServices> =
            Extension::from_request_parts(parts, state)
                .await
                .map_err(|err| Error::InternalServerErrorWithContext(err.to_string()))?;

        // nesting strips the /proxy prefix from parts.uri, the original keeps it along with the
        // query string
        let uri = parts
            .extensions
            .get::<OriginalUri>()
            .map(|original| original.0.clone())
            .unwrap_or_else(|| parts.uri.clone());

        let target = ProxyTarget::from_request_path(uri.path(), uri.query())?;
        let origin = request_origin(&parts.headers, services.config.public_origin.as_deref());

        debug!("proxy target {} (origin {})", target.url(), origin);

        Ok(ProxyRequest {
            target,
            origin,
            services,
        })
    }
}
