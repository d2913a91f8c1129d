use anyhow::{Context, Result};
use tracing::debug;

use super::{Channel, PlaylistRepository, PlaylistSummary};
use crate::database::DynKeyValueStore;

/// the index of every playlist lives under this one key. ids are nanoids and playlist records
/// are prefixed, so nothing generated can ever land on it
pub const PLAYLIST_INDEX_KEY: &str = "playlists";

const PLAYLIST_KEY_PREFIX: &str = "playlist:";

pub fn playlist_key(id: &str) -> String {
    format!("{}{}", PLAYLIST_KEY_PREFIX, id)
}

/// playlists stored as json strings on top of any key value store
pub struct KvPlaylistRepository {
    store: DynKeyValueStore,
}

impl KvPlaylistRepository {
    pub fn new(store: DynKeyValueStore) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl PlaylistRepository for KvPlaylistRepository {
    async fn store_channels(&self, id: &str, channels: &[Channel]) -> Result<()> {
        let value = serde_json::to_string(channels).context("Failed to serialize channels")?;
        self.store.put(&playlist_key(id), &value).await?;
        debug!("stored {} channels for playlist {}", channels.len(), id);
        Ok(())
    }

    async fn get_channels(&self, id: &str) -> Result<Option<Vec<Channel>>> {
        let Some(raw) = self.store.get(&playlist_key(id)).await? else {
            return Ok(None);
        };

        let channels = serde_json::from_str(&raw)
            .with_context(|| format!("Stored playlist {} is not valid json", id))?;
        Ok(Some(channels))
    }

    async fn get_summaries(&self) -> Result<Vec<PlaylistSummary>> {
        // first use, nothing ingested yet
        let Some(raw) = self.store.get(PLAYLIST_INDEX_KEY).await? else {
            return Ok(Vec::new());
        };

        serde_json::from_str(&raw).context("Stored playlist index is not valid json")
    }

    async fn append_summary(&self, summary: PlaylistSummary) -> Result<()> {
        let mut summaries = self.get_summaries().await?;
        summaries.push(summary);

        let value =
            serde_json::to_string(&summaries).context("Failed to serialize playlist index")?;
        self.store.put(PLAYLIST_INDEX_KEY, &value).await?;
        debug!("playlist index now has {} entries", summaries.len());
        Ok(())
    }
}
