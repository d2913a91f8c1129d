use async_trait::async_trait;
use metrics::counter;
use mockall::automock;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::{
    database::{Channel, DynPlaylistRepository, PlaylistSummary},
    server::{
        error::{AppResult, Error},
        utils::m3u::parse_m3u,
    },
};

pub type DynPlaylistService = Arc<dyn PlaylistServiceTrait + Send + Sync>;

/// body of a fetched m3u source along with the content type it was served as
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub content_type: Option<String>,
    pub body: String,
}

#[automock]
#[async_trait]
pub trait PlaylistServiceTrait {
    /// fetch, parse and store a remote m3u, giving back the new playlist id
    async fn ingest(&self, url: &str, name: Option<String>) -> AppResult<String>;
    async fn list(&self) -> AppResult<Vec<PlaylistSummary>>;
    async fn get(&self, id: &str) -> AppResult<Vec<Channel>>;
    /// fetch a remote m3u as text without storing anything
    async fn fetch_source(&self, url: &str) -> AppResult<SourceDocument>;
}

/// only absolute http(s) urls with a host make it past here
pub fn validate_source_url(raw: &str) -> AppResult<url::Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(Error::BadRequest("url missing".to_string()));
    }

    let url = url::Url::parse(raw)
        .map_err(|e| Error::BadRequest(format!("url is not a valid URL: {}", e)))?;

    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(Error::BadRequest(
            "url must be an absolute http or https URL".to_string(),
        ));
    }

    Ok(url)
}

pub struct PlaylistService {
    repository: DynPlaylistRepository,
    http_client: reqwest::Client,
}

impl PlaylistService {
    pub fn new(repository: DynPlaylistRepository, http_client: reqwest::Client) -> Self {
        Self {
            repository,
            http_client,
        }
    }
}

#[async_trait]
impl PlaylistServiceTrait for PlaylistService {
    async fn ingest(&self, url: &str, name: Option<String>) -> AppResult<String> {
        let source = match self.fetch_source(url).await {
            Ok(source) => source,
            Err(e) => {
                let outcome = match e {
                    Error::BadRequest(_) => "rejected",
                    _ => "upstream_failed",
                };
                counter!("playlist_ingests_total", "outcome" => outcome).increment(1);
                return Err(e);
            }
        };

        // empty lists are kept, some providers serve an empty document between refreshes
        let channels = parse_m3u(&source.body);
        let id = nanoid::nanoid!();

        // the playlist goes in before the index, a crash in between leaves an orphan record but
        // never an index entry pointing at nothing
        self.repository.store_channels(&id, &channels).await?;

        let name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| url.trim().to_string());

        self.repository
            .append_summary(PlaylistSummary {
                id: id.clone(),
                name,
                count: channels.len(),
            })
            .await?;

        counter!("playlist_ingests_total", "outcome" => "created").increment(1);
        info!("ingested playlist {} with {} channels", id, channels.len());

        Ok(id)
    }

    async fn list(&self) -> AppResult<Vec<PlaylistSummary>> {
        self.repository.get_summaries().await.map_err(|e| {
            error!("failed to read playlist index: {:#}", e);
            Error::from(e)
        })
    }

    async fn get(&self, id: &str) -> AppResult<Vec<Channel>> {
        self.repository
            .get_channels(id)
            .await?
            .ok_or_else(|| Error::NotFound("not found".to_string()))
    }

    async fn fetch_source(&self, url: &str) -> AppResult<SourceDocument> {
        let url = validate_source_url(url)?;

        info!("fetching m3u source {}", url);

        let response = self
            .http_client
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "*/*")
            .send()
            .await
            .map_err(|e| {
                error!("failed to fetch m3u source {}: {}", url, e);
                Error::UpstreamFetch(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!("m3u source {} answered with {}", url, status);
            return Err(Error::UpstreamStatus(status));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let body = response.text().await.map_err(|e| {
            error!("failed to read m3u source {}: {}", url, e);
            Error::UpstreamFetch(e.to_string())
        })?;

        Ok(SourceDocument { content_type, body })
    }
}
