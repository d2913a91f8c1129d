use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    config::AppConfig,
    database::{DynKeyValueStore, KvPlaylistRepository},
};

use super::{
    playlist_services::{DynPlaylistService, PlaylistService},
    proxy_services::{DynProxyService, ProxyService},
};

/// everything the handlers need, cloned into each request through an Extension
#[derive(Clone)]
pub struct AppServices {
    pub playlists: DynPlaylistService,
    pub proxy: DynProxyService,
    pub store: DynKeyValueStore,
    pub config: Arc<AppConfig>,
}

impl AppServices {
    pub fn new(store: DynKeyValueStore, config: Arc<AppConfig>) -> Self {
        info!("starting services on the {} store...", store.backend());

        // one client for everything so connections get pooled. redirects are followed by default
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .unwrap_or_else(|e| {
                warn!("failed to build http client ({}), using defaults", e);
                reqwest::Client::new()
            });

        let repository = Arc::new(KvPlaylistRepository::new(store.clone()));

        let playlists =
            Arc::new(PlaylistService::new(repository, http.clone())) as DynPlaylistService;
        let proxy = Arc::new(ProxyService::new(http)) as DynProxyService;

        Self {
            playlists,
            proxy,
            store,
            config,
        }
    }
}
