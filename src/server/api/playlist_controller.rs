use axum::{
    Extension, Json, Router,
    extract::Path,
    http::{StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use tracing::{debug, info};

use crate::{
    database::{Channel, PlaylistSummary},
    server::{
        dtos::playlist_dto::{CreatePlaylistRequest, CreatePlaylistResponse},
        error::{AppResult, Error},
        extractors::ValidatedJson,
        services::AppServices,
        utils::m3u::render_m3u,
    },
};

pub struct PlaylistController;

impl PlaylistController {
    pub fn app() -> Router {
        Router::new()
            .route("/", get(Self::list_playlists).post(Self::create_playlist))
            .route("/{id}", get(Self::get_playlist))
            .route("/{id}/m3u", get(Self::export_playlist))
    }

    async fn create_playlist(
        Extension(services): Extension<AppServices>,
        ValidatedJson(request): ValidatedJson<CreatePlaylistRequest>,
    ) -> AppResult<(StatusCode, Json<CreatePlaylistResponse>)> {
        // required() already ran, this is just to get at the value
        let url = request
            .url
            .ok_or_else(|| Error::BadRequest("url missing".to_string()))?;

        info!("ingesting playlist from {}", url);
        let id = services.playlists.ingest(&url, request.name).await?;

        Ok((StatusCode::CREATED, Json(CreatePlaylistResponse { id })))
    }

    async fn list_playlists(
        Extension(services): Extension<AppServices>,
    ) -> AppResult<Json<Vec<PlaylistSummary>>> {
        let summaries = services.playlists.list().await?;
        debug!("listing {} playlists", summaries.len());
        Ok(Json(summaries))
    }

    async fn get_playlist(
        Extension(services): Extension<AppServices>,
        Path(id): Path<String>,
    ) -> AppResult<Json<Vec<Channel>>> {
        Ok(Json(services.playlists.get(&id).await?))
    }

    async fn export_playlist(
        Extension(services): Extension<AppServices>,
        Path(id): Path<String>,
    ) -> AppResult<impl IntoResponse> {
        let channels = services.playlists.get(&id).await?;
        Ok((
            [(header::CONTENT_TYPE, "audio/x-mpegurl; charset=utf-8")],
            render_m3u(&channels),
        ))
    }
}
