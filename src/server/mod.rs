pub mod api;
pub mod dtos;
pub mod error;
pub mod extractors;
pub mod services;
pub mod utils;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use axum::http::{HeaderValue, Method, header};
use axum::routing::get;
use axum::{Extension, Router};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::database::DynKeyValueStore;
use api::{
    health_controller::health_endpoint, playlist_controller::PlaylistController,
    proxy_controller::ProxyController, source_controller::SourceController,
};
use services::AppServices;

static START_TIME: Lazy<Instant> = Lazy::new(Instant::now);

pub fn get_app_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub fn get_uptime_seconds() -> u64 {
    START_TIME.elapsed().as_secs()
}

pub struct ApplicationServer;

impl ApplicationServer {
    /// every route except /metrics, which needs the global recorder that only `serve` installs
    pub fn router(services: AppServices) -> Router {
        // fetch-m3u is open to any origin and answers its own preflight like the proxy does, only
        // the playlist routes go through the configured cors list
        let api = Router::new()
            .nest(
                "/playlist",
                PlaylistController::app().layer(Self::api_cors(&services.config)),
            )
            .nest("/fetch-m3u", SourceController::app());

        Router::new()
            .nest("/api", api)
            .nest("/proxy", ProxyController::app())
            .route("/health", get(health_endpoint))
            .layer(Extension(services))
            .layer(TraceLayer::new_for_http())
    }

    pub async fn serve(config: Arc<AppConfig>, store: DynKeyValueStore) -> anyhow::Result<()> {
        Lazy::force(&START_TIME);

        let services = AppServices::new(store, config.clone());
        let mut app = Self::router(services);

        match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                app = app.route(
                    "/metrics",
                    get(|Extension(handle): Extension<PrometheusHandle>| async move {
                        handle.render()
                    })
                    .layer(Extension(handle)),
                );
            }
            Err(e) => warn!("metrics recorder not installed: {}", e),
        }

        let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {}", addr))?;

        info!("listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("server error")?;

        info!("server stopped");
        Ok(())
    }

    fn api_cors(config: &AppConfig) -> CorsLayer {
        let cors = CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE]);

        match config.cors_origins() {
            None => cors.allow_origin(Any),
            Some(origins) => {
                let origins: Vec<HeaderValue> = origins
                    .iter()
                    .filter_map(|origin| match HeaderValue::from_str(origin) {
                        Ok(value) => Some(value),
                        Err(_) => {
                            warn!("ignoring invalid cors origin {}", origin);
                            None
                        }
                    })
                    .collect();
                cors.allow_origin(AllowOrigin::list(origins))
            }
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("failed to listen for sigterm: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}
