use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// one entry of an ingested m3u document. `url` is whatever the document pointed at, usually a
/// manifest but sometimes a plain segment or progressive file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub name: String,
    pub url: String,
}

/// what the index keeps per playlist so listing never has to open the playlists themselves
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistSummary {
    pub id: String,
    pub name: String,
    pub count: usize,
}

pub type DynPlaylistRepository = Arc<dyn PlaylistRepository + Send + Sync>;

#[async_trait::async_trait]
pub trait PlaylistRepository {
    async fn store_channels(&self, id: &str, channels: &[Channel]) -> Result<()>;
    async fn get_channels(&self, id: &str) -> Result<Option<Vec<Channel>>>;
    async fn get_summaries(&self) -> Result<Vec<PlaylistSummary>>;
    // read-modify-write of the index, two concurrent appends can lose one of them
    async fn append_summary(&self, summary: PlaylistSummary) -> Result<()>;
}
