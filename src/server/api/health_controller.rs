use axum::Extension;
use axum::Json;
use axum::http::StatusCode;
use chrono::Utc;
use tracing::error;

use crate::server::dtos::health_dto::{
    HealthResponse, HealthStatus, ServiceHealthDetails, StoreHealth,
};
use crate::server::services::AppServices;
use crate::server::{get_app_version, get_uptime_seconds};

/// health endpoint, the only dependency worth checking is the store
pub async fn health_endpoint(
    Extension(services): Extension<AppServices>,
) -> (StatusCode, Json<HealthResponse>) {
    let store_health = check_store_health(&services).await;
    let overall_status = store_health.status;

    let response = HealthResponse {
        status: overall_status,
        timestamp: Utc::now(),
        uptime_seconds: get_uptime_seconds(),
        version: get_app_version().to_string(),
        environment: services.config.cargo_env.as_str().to_string(),
        services: ServiceHealthDetails {
            store: store_health,
        },
    };

    let http_status = match overall_status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (http_status, Json(response))
}

async fn check_store_health(services: &AppServices) -> StoreHealth {
    let backend = services.store.backend().to_string();

    match services.store.health_check().await {
        Ok(response_time) => StoreHealth {
            status: HealthStatus::Healthy,
            backend,
            response_time_ms: response_time,
        },
        Err(e) => {
            error!("Store health check failed: {:#}", e);
            StoreHealth {
                status: HealthStatus::Unhealthy,
                backend,
                response_time_ms: 0.0,
            }
        }
    }
}
