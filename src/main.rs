use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use dotenvy::dotenv;

use tracing::{info, warn};

use playlist_proxy::{
    AppConfig, ApplicationServer, DynKeyValueStore, Logger, MemoryStore, RedisDatabase,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let config = Arc::new(AppConfig::parse());

    // guards are kept alive to flush logs and keep the sentry client around
    let _guards = Logger::init(config.cargo_env, config.sentry_dsn.clone());

    info!("logger and env prepped...");

    let store: DynKeyValueStore = match config.redis_url.as_deref() {
        Some(redis_url) => {
            info!("connecting to redis...");
            let redis_db = RedisDatabase::connect(redis_url)
                .await
                .context("failed to connect to redis")?;
            Arc::new(redis_db)
        }
        None => {
            warn!("no REDIS_URL set, playlists will be kept in memory and lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    info!("storage ok, starting server...");

    ApplicationServer::serve(config, store)
        .await
        .context("server failed to start")?;

    Ok(())
}
