use std::collections::HashMap;
use std::time::Instant;

use anyhow::Result;
use tokio::sync::RwLock;
use tracing::debug;

use super::KeyValueStore;

/// in process store used when there is no redis url, and by the tests
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        debug!("memory store put {} ({} bytes)", key, value.len());
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn health_check(&self) -> Result<f64> {
        let start = Instant::now();
        let _ = self.entries.read().await.len();
        Ok(start.elapsed().as_secs_f64() * 1000.0)
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
