pub mod app_services;
pub mod playlist_services;
pub mod proxy_services;

pub use app_services::AppServices;
pub use playlist_services::{DynPlaylistService, MockPlaylistServiceTrait};
pub use proxy_services::DynProxyService;
