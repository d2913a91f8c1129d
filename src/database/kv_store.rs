use std::sync::Arc;

use anyhow::Result;

pub type DynKeyValueStore = Arc<dyn KeyValueStore + Send + Sync>;

/// the only thing playlists need from storage: single key reads and writes of strings.
/// there's no delete, no prefix listing and no transactions across keys
#[async_trait::async_trait]
pub trait KeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn put(&self, key: &str, value: &str) -> Result<()>;

    /// round trip time in milliseconds, for /health
    async fn health_check(&self) -> Result<f64>;

    /// short name of the backend, also for /health
    fn backend(&self) -> &'static str;
}
